//! Database models for categories.

use crate::types::CategoryId;
use serde::{Deserialize, Serialize};

/// Database representation of a category. `name` is the unique code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub name_ru: String,
    pub name_kz: String,
    pub name_en: String,
}

/// Request to create or update a category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryCreateDBRequest {
    pub code: String,
    pub name_ru: String,
    pub name_kz: String,
    pub name_en: String,
}

pub type CategoryUpdateDBRequest = CategoryCreateDBRequest;

/// Response from database after creating or updating a category
pub type CategoryDBResponse = Category;
