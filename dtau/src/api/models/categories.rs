//! API response models for categories.

use crate::{db::models::categories::CategoryDBResponse, types::CategoryId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A category with display names in every locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    /// Absent when the category is only derived from project data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<CategoryId>,
    #[schema(example = "aiml")]
    pub code: String,
    #[schema(example = "AI/ML")]
    pub name_ru: String,
    pub name_kz: String,
    pub name_en: String,
}

fn or_code(name: String, code: &str) -> String {
    if name.trim().is_empty() { code.to_string() } else { name }
}

impl CategoryResponse {
    /// A category known only by its code, as used on projects
    pub fn derived(code: String) -> Self {
        Self {
            id: None,
            name_ru: code.clone(),
            name_kz: code.clone(),
            name_en: code.clone(),
            code,
        }
    }
}

impl From<CategoryDBResponse> for CategoryResponse {
    fn from(category: CategoryDBResponse) -> Self {
        let code = category.name;
        Self {
            id: Some(category.id),
            name_ru: or_code(category.name_ru, &code),
            name_kz: or_code(category.name_kz, &code),
            name_en: or_code(category.name_en, &code),
            code,
        }
    }
}
