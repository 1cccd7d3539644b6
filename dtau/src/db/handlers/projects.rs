//! Database repository for projects.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::{
            projects::{Project, ProjectCreateDBRequest, ProjectDBResponse, ProjectFilter, ProjectUpdateDBRequest},
            terms::TermKind,
        },
    },
    types::ProjectId,
};
use sqlx::PgConnection;
use tracing::instrument;

const PROJECT_COLUMNS: &str = "id, title_ru, title_kz, title_en, description_ru, description_kz, description_en, \
     technologies, genres, image, images, category, categories, featured, project_url";

/// Primary category used when a project is saved without one
pub const DEFAULT_CATEGORY: &str = "web";

pub struct Projects<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Projects<'c> {
    /// Create a new Projects repository instance
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Delete a project and return the removed row, so its upload files can be cleaned up
    #[instrument(skip(self), err)]
    pub async fn delete_returning(&mut self, id: ProjectId) -> Result<Option<ProjectDBResponse>> {
        let query = format!("DELETE FROM projects WHERE id = $1 RETURNING {PROJECT_COLUMNS}");
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(project)
    }

    /// Get a project and lock its row for the rest of the transaction
    #[instrument(skip(self), err)]
    pub async fn get_for_update(&mut self, id: ProjectId) -> Result<Option<ProjectDBResponse>> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1 FOR UPDATE");
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(project)
    }

    /// Stored cover and gallery of every project, as written, ordered by id
    #[instrument(skip(self), err)]
    pub async fn image_refs(&mut self) -> Result<Vec<(ProjectId, String, Vec<String>)>> {
        let refs = sqlx::query_as("SELECT id, image, images FROM projects ORDER BY id")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(refs)
    }

    /// Replace a project's cover and gallery only if they still hold the expected values.
    /// Returns false when the project is gone or was changed in the meantime.
    #[instrument(skip(self, expected_images, images), fields(images = images.len()), err)]
    pub async fn replace_images(
        &mut self,
        id: ProjectId,
        expected_image: &str,
        expected_images: &[String],
        image: &str,
        images: &[String],
    ) -> Result<bool> {
        let result = sqlx::query("UPDATE projects SET image = $2, images = $3 WHERE id = $1 AND image = $4 AND images = $5")
            .bind(id)
            .bind(image)
            .bind(images)
            .bind(expected_image)
            .bind(expected_images)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Total number of projects
    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    /// Number of distinct technology tags used across all projects
    #[instrument(skip(self), err)]
    pub async fn distinct_technology_count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT t)
            FROM projects
            LEFT JOIN LATERAL unnest(technologies) AS t ON TRUE
            WHERE btrim(t) <> ''
            "#,
        )
        .fetch_one(&mut *self.db)
        .await?;

        Ok(count)
    }

    /// Distinct non-empty tags of one vocabulary as used on projects, sorted by name
    #[instrument(skip(self), err)]
    pub async fn distinct_tags(&mut self, kind: TermKind) -> Result<Vec<String>> {
        // The project column shares its name with the vocabulary table
        let query = format!(
            "SELECT DISTINCT btrim(t) AS name FROM projects, unnest({}) AS t WHERE btrim(t) <> '' ORDER BY name",
            kind.table()
        );
        let names: Vec<String> = sqlx::query_scalar(&query).fetch_all(&mut *self.db).await?;

        Ok(names)
    }

    /// Distinct primary categories used on projects, sorted by code
    #[instrument(skip(self), err)]
    pub async fn distinct_categories(&mut self) -> Result<Vec<String>> {
        let codes: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT btrim(category) AS code FROM projects WHERE btrim(category) <> '' ORDER BY code",
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(codes)
    }
}

fn primary_category(categories: &[String]) -> &str {
    categories.first().map(String::as_str).unwrap_or(DEFAULT_CATEGORY)
}

#[async_trait::async_trait]
impl<'c> Repository for Projects<'c> {
    type CreateRequest = ProjectCreateDBRequest;
    type UpdateRequest = ProjectUpdateDBRequest;
    type Response = ProjectDBResponse;
    type Id = ProjectId;
    type Filter = ProjectFilter;

    #[instrument(skip(self, request), fields(title = %request.title_en), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let categories = if request.categories.is_empty() {
            vec![DEFAULT_CATEGORY.to_string()]
        } else {
            request.categories.clone()
        };

        let query = format!(
            r#"
            INSERT INTO projects (
                title_ru, title_kz, title_en, description_ru, description_kz, description_en,
                technologies, genres, image, images, category, categories, featured, project_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {PROJECT_COLUMNS}
            "#
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(&request.title_ru)
            .bind(&request.title_kz)
            .bind(&request.title_en)
            .bind(&request.description_ru)
            .bind(&request.description_kz)
            .bind(&request.description_en)
            .bind(&request.technologies)
            .bind(&request.genres)
            .bind(&request.image)
            .bind(&request.images)
            .bind(primary_category(&categories))
            .bind(&categories)
            .bind(request.featured)
            .bind(&request.project_url)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(project)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(project)
    }

    #[instrument(skip(self), fields(category = ?filter.category), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let query = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE ($1::text IS NULL OR category = $1) ORDER BY featured DESC, id ASC"
        );
        let projects = sqlx::query_as::<_, Project>(&query)
            .bind(filter.category.as_deref())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(projects)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let categories = request.categories.as_ref().filter(|c| !c.is_empty());
        let category = categories.map(|c| primary_category(c));

        let query = format!(
            r#"
            UPDATE projects SET
                title_ru = COALESCE($2, title_ru),
                title_kz = COALESCE($3, title_kz),
                title_en = COALESCE($4, title_en),
                description_ru = COALESCE($5, description_ru),
                description_kz = COALESCE($6, description_kz),
                description_en = COALESCE($7, description_en),
                technologies = COALESCE($8, technologies),
                genres = COALESCE($9, genres),
                image = COALESCE($10, image),
                images = COALESCE($11, images),
                category = COALESCE($12, category),
                categories = COALESCE($13, categories),
                featured = COALESCE($14, featured),
                project_url = COALESCE($15, project_url)
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(request.title_ru.as_deref())
            .bind(request.title_kz.as_deref())
            .bind(request.title_en.as_deref())
            .bind(request.description_ru.as_deref())
            .bind(request.description_kz.as_deref())
            .bind(request.description_en.as_deref())
            .bind(request.technologies.as_deref())
            .bind(request.genres.as_deref())
            .bind(request.image.as_deref())
            .bind(request.images.as_deref())
            .bind(category)
            .bind(categories.map(Vec::as_slice))
            .bind(request.featured)
            .bind(request.project_url.as_deref())
            .fetch_optional(&mut *self.db)
            .await?;

        project.ok_or(DbError::NotFound)
    }
}
