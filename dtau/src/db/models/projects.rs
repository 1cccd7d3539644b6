//! Database models for projects.

use crate::{
    content::tags::{self, TagInput},
    types::ProjectId,
};
use sqlx::{FromRow, Row, postgres::PgRow};

/// Database representation of a project.
///
/// Decoding is lenient per column so rows written by older schema versions
/// still load: list columns accept `TEXT[]` or a text literal (`{a,b}` or
/// `a, b`), missing or NULL columns fall back to empty values, and `featured`
/// is coerced to a strict boolean.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Project {
    pub id: ProjectId,
    pub title_ru: String,
    pub title_kz: String,
    pub title_en: String,
    pub description_ru: String,
    pub description_kz: String,
    pub description_en: String,
    pub technologies: Vec<String>,
    pub genres: Vec<String>,
    pub image: String,
    pub images: Vec<String>,
    pub category: String,
    pub categories: Vec<String>,
    pub featured: bool,
    pub project_url: String,
}

impl<'r> FromRow<'r, PgRow> for Project {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title_ru: text_column(row, "title_ru")?,
            title_kz: text_column(row, "title_kz")?,
            title_en: text_column(row, "title_en")?,
            description_ru: text_column(row, "description_ru")?,
            description_kz: text_column(row, "description_kz")?,
            description_en: text_column(row, "description_en")?,
            technologies: list_column(row, "technologies")?,
            genres: list_column(row, "genres")?,
            image: text_column(row, "image")?.trim().to_string(),
            images: list_column(row, "images")?,
            category: text_column(row, "category")?.trim().to_string(),
            categories: list_column(row, "categories")?,
            featured: bool_column(row, "featured")?,
            project_url: text_column(row, "project_url")?.trim().to_string(),
        })
    }
}

fn is_missing(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::ColumnNotFound(_))
}

fn is_type_mismatch(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::ColumnDecode { .. })
}

fn text_column(row: &PgRow, column: &str) -> Result<String, sqlx::Error> {
    match row.try_get::<Option<String>, _>(column) {
        Ok(value) => Ok(value.unwrap_or_default()),
        Err(e) if is_missing(&e) => Ok(String::new()),
        Err(e) => Err(e),
    }
}

fn list_column(row: &PgRow, column: &str) -> Result<Vec<String>, sqlx::Error> {
    match row.try_get::<Option<Vec<String>>, _>(column) {
        Ok(values) => Ok(tags::normalize(values.map(TagInput::List).as_ref())),
        Err(e) if is_missing(&e) => Ok(Vec::new()),
        Err(e) if is_type_mismatch(&e) => {
            let text: Option<String> = row.try_get(column)?;
            Ok(tags::normalize(text.map(TagInput::Text).as_ref()))
        }
        Err(e) => Err(e),
    }
}

fn bool_column(row: &PgRow, column: &str) -> Result<bool, sqlx::Error> {
    match row.try_get::<Option<bool>, _>(column) {
        Ok(value) => Ok(value.unwrap_or(false)),
        Err(e) if is_missing(&e) => Ok(false),
        Err(e) if is_type_mismatch(&e) => match row.try_get::<Option<i32>, _>(column) {
            Ok(value) => Ok(value.is_some_and(|v| v != 0)),
            Err(_) => {
                let text: Option<String> = row.try_get(column)?;
                Ok(text.as_deref().is_some_and(is_truthy))
            }
        },
        Err(e) => Err(e),
    }
}

/// Form/text truthiness: `1`, `true`, `on`, `yes` (case-insensitive)
pub fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "on" | "yes")
}

/// Order a gallery so the cover comes first.
///
/// An empty cover leaves the gallery untouched; otherwise the cover is moved (or
/// inserted) to the front and blank or repeated entries are dropped.
pub fn gallery_with_cover(image: &str, images: Vec<String>) -> Vec<String> {
    let mut gallery: Vec<String> = Vec::with_capacity(images.len() + 1);
    let image = image.trim();
    if !image.is_empty() {
        gallery.push(image.to_string());
    }
    for entry in images {
        let entry = entry.trim();
        if !entry.is_empty() && !gallery.iter().any(|g| g == entry) {
            gallery.push(entry.to_string());
        }
    }
    gallery
}

/// Request to create a new project
#[derive(Debug, Clone, Default)]
pub struct ProjectCreateDBRequest {
    pub title_ru: String,
    pub title_kz: String,
    pub title_en: String,
    pub description_ru: String,
    pub description_kz: String,
    pub description_en: String,
    pub technologies: Vec<String>,
    pub genres: Vec<String>,
    pub image: String,
    pub images: Vec<String>,
    /// Non-empty; the first entry is stored as the primary category
    pub categories: Vec<String>,
    pub featured: bool,
    pub project_url: String,
}

/// Request to update an existing project; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdateDBRequest {
    pub title_ru: Option<String>,
    pub title_kz: Option<String>,
    pub title_en: Option<String>,
    pub description_ru: Option<String>,
    pub description_kz: Option<String>,
    pub description_en: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub genres: Option<Vec<String>>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    /// When set, must be non-empty; the first entry becomes the primary category
    pub categories: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub project_url: Option<String>,
}

/// Filter for listing projects
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    /// Primary category code; `None` lists everything
    pub category: Option<String>,
}

impl ProjectFilter {
    /// Build a filter from the public `category` query parameter, where an
    /// empty value or `all` means no filtering
    pub fn from_query(category: Option<&str>) -> Self {
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
            .map(str::to_string);
        Self { category }
    }
}

/// Response from database after creating or updating a project
pub type ProjectDBResponse = Project;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthy_values() {
        for value in ["1", "true", "TRUE", "on", "yes", " Yes "] {
            assert!(is_truthy(value), "{value:?} should be truthy");
        }
        for value in ["", "0", "false", "off", "no", "y"] {
            assert!(!is_truthy(value), "{value:?} should not be truthy");
        }
    }

    #[test]
    fn test_gallery_keeps_cover_first() {
        let gallery = gallery_with_cover("/static/uploads/b", vec!["/static/uploads/a".into(), "/static/uploads/b".into()]);
        assert_eq!(gallery, vec!["/static/uploads/b", "/static/uploads/a"]);

        let untouched = gallery_with_cover("", vec!["x".into(), " ".into(), "x".into(), "y".into()]);
        assert_eq!(untouched, vec!["x", "y"]);
    }

    #[test]
    fn test_filter_from_query() {
        assert_eq!(ProjectFilter::from_query(None).category, None);
        assert_eq!(ProjectFilter::from_query(Some("")).category, None);
        assert_eq!(ProjectFilter::from_query(Some("all")).category, None);
        assert_eq!(ProjectFilter::from_query(Some(" iot ")).category.as_deref(), Some("iot"));
    }
}
