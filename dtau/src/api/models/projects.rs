//! API response models for projects.

use crate::db::{handlers::projects::DEFAULT_CATEGORY, models::projects::ProjectDBResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing projects
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListProjectsQuery {
    /// Primary category code; empty or `all` lists every project
    #[param(example = "iot")]
    pub category: Option<String>,
}

/// A project as presented to the public site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    /// Project identifier, serialized as a string
    #[schema(example = "42")]
    pub id: String,
    pub title_ru: String,
    pub title_kz: String,
    pub title_en: String,
    /// Sanitized HTML
    pub description_ru: String,
    /// Sanitized HTML
    pub description_kz: String,
    /// Sanitized HTML
    pub description_en: String,
    pub technologies: Vec<String>,
    pub genres: Vec<String>,
    /// Cover image path, empty when the project has none
    #[schema(example = "/static/uploads/3f2a9c0b1d4e_cover.png")]
    pub image: String,
    /// Gallery, cover first
    pub images: Vec<String>,
    /// Primary category code
    pub category: String,
    pub categories: Vec<String>,
    pub featured: bool,
    pub project_url: String,
}

impl From<ProjectDBResponse> for ProjectResponse {
    fn from(project: ProjectDBResponse) -> Self {
        let category = if project.category.is_empty() {
            project
                .categories
                .first()
                .cloned()
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string())
        } else {
            project.category
        };

        Self {
            id: project.id.to_string(),
            title_ru: project.title_ru,
            title_kz: project.title_kz,
            title_en: project.title_en,
            description_ru: project.description_ru,
            description_kz: project.description_kz,
            description_en: project.description_en,
            technologies: project.technologies,
            genres: project.genres,
            image: project.image,
            images: project.images,
            category,
            categories: project.categories,
            featured: project.featured,
            project_url: project.project_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::projects::Project;
    use serde_json::json;

    #[test]
    fn test_serializes_camel_case_with_string_id() {
        let response = ProjectResponse::from(Project {
            id: 42,
            title_en: "Robot".to_string(),
            technologies: vec!["Python".to_string()],
            category: "iot".to_string(),
            categories: vec!["iot".to_string()],
            featured: true,
            project_url: "https://example.com".to_string(),
            ..Default::default()
        });

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["id"], json!("42"));
        assert_eq!(value["titleEn"], json!("Robot"));
        assert_eq!(value["technologies"], json!(["Python"]));
        assert_eq!(value["featured"], json!(true));
        assert_eq!(value["projectUrl"], json!("https://example.com"));
        assert!(value.get("title_en").is_none());
    }

    #[test]
    fn test_category_falls_back_to_categories_then_web() {
        let from_list = ProjectResponse::from(Project {
            categories: vec!["mobile".to_string()],
            ..Default::default()
        });
        assert_eq!(from_list.category, "mobile");

        let from_default = ProjectResponse::from(Project::default());
        assert_eq!(from_default.category, "web");
    }
}
