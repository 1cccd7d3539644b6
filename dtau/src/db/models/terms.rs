//! Database models for the technology and genre vocabularies.

use crate::types::TermId;
use serde::{Deserialize, Serialize};

/// Which vocabulary a term belongs to. Both share the same table shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    Technology,
    Genre,
}

impl TermKind {
    pub fn table(self) -> &'static str {
        match self {
            TermKind::Technology => "technologies",
            TermKind::Genre => "genres",
        }
    }

    /// Display name used in error messages
    pub fn label(self) -> &'static str {
        match self {
            TermKind::Technology => "Technology",
            TermKind::Genre => "Genre",
        }
    }
}

/// Database representation of a vocabulary term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Term {
    pub id: TermId,
    pub name: String,
}

/// Response from database after creating or updating a term
pub type TermDBResponse = Term;
