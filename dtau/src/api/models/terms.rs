//! API response models for the technology and genre vocabularies.

use crate::{db::models::terms::TermDBResponse, types::TermId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A vocabulary entry with its id, as listed to administrators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TermResponse {
    pub id: TermId,
    #[schema(example = "Rust")]
    pub name: String,
}

impl From<TermDBResponse> for TermResponse {
    fn from(term: TermDBResponse) -> Self {
        Self {
            id: term.id,
            name: term.name,
        }
    }
}
