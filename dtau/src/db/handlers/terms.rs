//! Database repository for the technology and genre vocabularies.

use crate::{
    db::{
        errors::{DbError, Result},
        models::terms::{Term, TermDBResponse, TermKind},
    },
    types::TermId,
};
use sqlx::PgConnection;
use tracing::instrument;

/// Repository over one vocabulary table, selected by [`TermKind`]
pub struct Terms<'c> {
    db: &'c mut PgConnection,
    kind: TermKind,
}

impl<'c> Terms<'c> {
    pub fn new(db: &'c mut PgConnection, kind: TermKind) -> Self {
        Self { db, kind }
    }

    /// List all terms sorted by name
    #[instrument(skip(self), fields(kind = ?self.kind), err)]
    pub async fn list(&mut self) -> Result<Vec<TermDBResponse>> {
        let query = format!("SELECT id, name FROM {} ORDER BY name ASC", self.kind.table());
        let terms = sqlx::query_as::<_, Term>(&query).fetch_all(&mut *self.db).await?;

        Ok(terms)
    }

    /// Insert a term; returns `None` when the name already exists
    #[instrument(skip(self), fields(kind = ?self.kind), err)]
    pub async fn create(&mut self, name: &str) -> Result<Option<TermDBResponse>> {
        let query = format!(
            "INSERT INTO {} (name) VALUES ($1) ON CONFLICT (name) DO NOTHING RETURNING id, name",
            self.kind.table()
        );
        let term = sqlx::query_as::<_, Term>(&query)
            .bind(name)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(term)
    }

    /// Rename a term
    #[instrument(skip(self), fields(kind = ?self.kind), err)]
    pub async fn update(&mut self, id: TermId, name: &str) -> Result<TermDBResponse> {
        let query = format!("UPDATE {} SET name = $2 WHERE id = $1 RETURNING id, name", self.kind.table());
        let term = sqlx::query_as::<_, Term>(&query)
            .bind(id)
            .bind(name)
            .fetch_optional(&mut *self.db)
            .await?;

        term.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(kind = ?self.kind), err)]
    pub async fn delete(&mut self, id: TermId) -> Result<bool> {
        let query = format!("DELETE FROM {} WHERE id = $1", self.kind.table());
        let result = sqlx::query(&query).bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::ensure_schema;
    use sqlx::PgPool;

    #[sqlx::test(migrations = false)]
    #[test_log::test]
    async fn test_create_ignores_duplicates(pool: PgPool) {
        ensure_schema(&pool).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Terms::new(&mut conn, TermKind::Technology);

        let rust = repo.create("Rust").await.unwrap();
        assert!(rust.is_some());
        assert!(repo.create("Rust").await.unwrap().is_none());
        repo.create("Go").await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Go", "Rust"]);
    }

    #[sqlx::test(migrations = false)]
    #[test_log::test]
    async fn test_vocabularies_are_separate(pool: PgPool) {
        ensure_schema(&pool).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        Terms::new(&mut conn, TermKind::Genre).create("Puzzle").await.unwrap();
        assert!(Terms::new(&mut conn, TermKind::Technology).list().await.unwrap().is_empty());
        assert_eq!(Terms::new(&mut conn, TermKind::Genre).list().await.unwrap().len(), 1);
    }

    #[sqlx::test(migrations = false)]
    #[test_log::test]
    async fn test_update_and_delete(pool: PgPool) {
        ensure_schema(&pool).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Terms::new(&mut conn, TermKind::Genre);

        let puzzle = repo.create("Puzzle").await.unwrap().unwrap();
        let arcade = repo.create("Arcade").await.unwrap().unwrap();

        let renamed = repo.update(puzzle.id, "Logic").await.unwrap();
        assert_eq!(renamed.name, "Logic");

        assert!(matches!(repo.update(arcade.id, "Logic").await, Err(DbError::UniqueViolation { .. })));
        assert!(matches!(repo.update(arcade.id + 1000, "Other").await, Err(DbError::NotFound)));

        assert!(repo.delete(arcade.id).await.unwrap());
        assert!(!repo.delete(arcade.id).await.unwrap());
    }
}
