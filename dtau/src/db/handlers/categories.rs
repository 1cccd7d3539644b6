//! Database repository for categories.

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::repository::Repository,
        models::categories::{Category, CategoryCreateDBRequest, CategoryDBResponse, CategoryUpdateDBRequest},
    },
    types::CategoryId,
};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Categories<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Categories<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Categories<'c> {
    type CreateRequest = CategoryCreateDBRequest;
    type UpdateRequest = CategoryUpdateDBRequest;
    type Response = CategoryDBResponse;
    type Id = CategoryId;
    type Filter = ();

    /// Insert a category, or refresh the display names of the existing one with the same code
    #[instrument(skip(self, request), fields(code = %request.code), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, name_ru, name_kz, name_en)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO UPDATE SET
                name_ru = EXCLUDED.name_ru,
                name_kz = EXCLUDED.name_kz,
                name_en = EXCLUDED.name_en
            RETURNING id, name, name_ru, name_kz, name_en
            "#,
        )
        .bind(&request.code)
        .bind(&request.name_ru)
        .bind(&request.name_kz)
        .bind(&request.name_en)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(category)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, name, name_ru, name_kz, name_en FROM categories WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *self.db)
                .await?;

        Ok(category)
    }

    #[instrument(skip(self, _filter), err)]
    async fn list(&mut self, _filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name, name_ru, name_kz, name_en FROM categories ORDER BY name ASC")
                .fetch_all(&mut *self.db)
                .await?;

        Ok(categories)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Rename a category; renaming onto an existing code is a unique violation
    #[instrument(skip(self, request), fields(code = %request.code), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET name = $2, name_ru = $3, name_kz = $4, name_en = $5
            WHERE id = $1
            RETURNING id, name, name_ru, name_kz, name_en
            "#,
        )
        .bind(id)
        .bind(&request.code)
        .bind(&request.name_ru)
        .bind(&request.name_kz)
        .bind(&request.name_en)
        .fetch_optional(&mut *self.db)
        .await?;

        category.ok_or(DbError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::ensure_schema;
    use sqlx::PgPool;

    fn request(code: &str, name: &str) -> CategoryCreateDBRequest {
        CategoryCreateDBRequest {
            code: code.to_string(),
            name_ru: name.to_string(),
            name_kz: name.to_string(),
            name_en: name.to_string(),
        }
    }

    #[sqlx::test(migrations = false)]
    #[test_log::test]
    async fn test_seeded_categories_listed_by_code(pool: PgPool) {
        ensure_schema(&pool).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Categories::new(&mut conn);

        let codes: Vec<String> = repo.list(&()).await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(codes, vec!["aiml", "iot", "mobile", "vrar", "web"]);
    }

    #[sqlx::test(migrations = false)]
    #[test_log::test]
    async fn test_create_upserts_by_code(pool: PgPool) {
        ensure_schema(&pool).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Categories::new(&mut conn);

        let first = repo.create(&request("games", "Games")).await.unwrap();
        let second = repo.create(&request("games", "Игры")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name_ru, "Игры");
    }

    #[sqlx::test(migrations = false)]
    #[test_log::test]
    async fn test_update_missing_and_conflicting(pool: PgPool) {
        ensure_schema(&pool).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Categories::new(&mut conn);

        let games = repo.create(&request("games", "Games")).await.unwrap();

        let missing = repo.update(games.id + 1000, &request("other", "Other")).await;
        assert!(matches!(missing, Err(DbError::NotFound)));

        let conflict = repo.update(games.id, &request("web", "Web")).await;
        match conflict {
            Err(DbError::UniqueViolation { conflicting_value, .. }) => {
                assert_eq!(conflicting_value.as_deref(), Some("web"));
            }
            other => panic!("expected unique violation, got {other:?}"),
        }

        assert!(repo.delete(games.id).await.unwrap());
        assert!(repo.get_by_id(games.id).await.unwrap().is_none());
    }
}
