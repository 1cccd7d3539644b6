//! Repository implementations for database access.
//!
//! Each repository wraps a `&mut PgConnection`, so the same code runs against a pooled
//! connection or inside a transaction:
//!
//! ```ignore
//! use dtau::db::handlers::{Projects, Repository};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = Projects::new(&mut tx);
//!     let projects = repo.list(&Default::default()).await?;
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod categories;
pub mod projects;
pub mod repository;
pub mod terms;

pub use categories::Categories;
pub use projects::Projects;
pub use repository::Repository;
pub use terms::Terms;
