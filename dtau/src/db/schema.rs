//! Idempotent schema setup run at startup.
//!
//! Tables are created when absent and columns introduced by later versions are added
//! with safe defaults. Rows written before the list columns existed are backfilled and
//! the seed categories are upserted. Nothing is ever dropped.

use crate::db::errors::Result;
use sqlx::PgPool;
use tracing::{debug, info, instrument};

const STRUCTURE: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    "ALTER TABLE categories ADD COLUMN IF NOT EXISTS name_ru TEXT NOT NULL DEFAULT ''",
    "ALTER TABLE categories ADD COLUMN IF NOT EXISTS name_kz TEXT NOT NULL DEFAULT ''",
    "ALTER TABLE categories ADD COLUMN IF NOT EXISTS name_en TEXT NOT NULL DEFAULT ''",
    r#"
    CREATE TABLE IF NOT EXISTS technologies (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS genres (
        id SERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id SERIAL PRIMARY KEY,
        title_ru TEXT NOT NULL,
        title_kz TEXT NOT NULL,
        title_en TEXT NOT NULL,
        description_ru TEXT NOT NULL,
        description_kz TEXT NOT NULL,
        description_en TEXT NOT NULL,
        technologies TEXT[] NOT NULL DEFAULT '{}',
        genres TEXT[] NOT NULL DEFAULT '{}',
        image TEXT NOT NULL DEFAULT '',
        images TEXT[] NOT NULL DEFAULT '{}',
        category TEXT NOT NULL DEFAULT 'web',
        categories TEXT[] NOT NULL DEFAULT '{}',
        featured BOOLEAN NOT NULL DEFAULT FALSE,
        project_url TEXT NOT NULL DEFAULT ''
    )
    "#,
    "ALTER TABLE projects ADD COLUMN IF NOT EXISTS genres TEXT[] NOT NULL DEFAULT '{}'",
    "ALTER TABLE projects ADD COLUMN IF NOT EXISTS category TEXT NOT NULL DEFAULT 'web'",
    "ALTER TABLE projects ADD COLUMN IF NOT EXISTS categories TEXT[] NOT NULL DEFAULT '{}'",
    "ALTER TABLE projects ADD COLUMN IF NOT EXISTS images TEXT[] NOT NULL DEFAULT '{}'",
    "ALTER TABLE projects ADD COLUMN IF NOT EXISTS featured BOOLEAN NOT NULL DEFAULT FALSE",
    "ALTER TABLE projects ADD COLUMN IF NOT EXISTS project_url TEXT NOT NULL DEFAULT ''",
];

const BACKFILL: &[&str] = &[
    "UPDATE projects SET categories = ARRAY[btrim(category)] WHERE cardinality(categories) = 0 AND btrim(category) <> ''",
    "UPDATE projects SET images = ARRAY[btrim(image)] WHERE cardinality(images) = 0 AND btrim(image) <> ''",
];

/// Built-in categories: code and display name (same in every locale)
pub const SEED_CATEGORIES: &[(&str, &str)] = &[
    ("aiml", "AI/ML"),
    ("iot", "IoT"),
    ("web", "Web"),
    ("mobile", "Mobile"),
    ("vrar", "VR/AR"),
];

/// Bring the schema up to date.
///
/// Runs in a single transaction and returns the number of rows it backfilled or
/// seeded, which is zero when the database is already current.
#[instrument(skip(pool), err)]
pub async fn ensure_schema(pool: &PgPool) -> Result<u64> {
    let mut tx = pool.begin().await?;

    for statement in STRUCTURE {
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    let mut changed = 0;
    for statement in BACKFILL {
        changed += sqlx::query(statement).execute(&mut *tx).await?.rows_affected();
    }

    for (code, name) in SEED_CATEGORIES {
        changed += sqlx::query(
            r#"
            INSERT INTO categories (name, name_ru, name_kz, name_en)
            VALUES ($1, $2, $2, $2)
            ON CONFLICT (name) DO UPDATE SET
                name_ru = EXCLUDED.name_ru,
                name_kz = EXCLUDED.name_kz,
                name_en = EXCLUDED.name_en
            WHERE categories.name_ru IS DISTINCT FROM EXCLUDED.name_ru
               OR categories.name_kz IS DISTINCT FROM EXCLUDED.name_kz
               OR categories.name_en IS DISTINCT FROM EXCLUDED.name_en
            "#,
        )
        .bind(*code)
        .bind(*name)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;

    if changed > 0 {
        info!(changed, "Database schema updated");
    } else {
        debug!("Database schema already current");
    }

    Ok(changed)
}
