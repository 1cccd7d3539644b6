//! Test utilities for handler and integration tests.

use crate::{
    config::{Config, PoolSettings, UploadsConfig},
    db::{
        handlers::{Projects, Repository},
        models::projects::{Project, ProjectCreateDBRequest},
    },
    uploads::stored_name,
};
use axum::http::StatusCode;
use axum_test::TestServer;
use sqlx::PgPool;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const TEST_ADMIN_PASSWORD: &str = "test-password";

pub fn create_test_config(static_dir: &Path) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        // Unused: tests hand the application a pool
        database_url: Some("postgres://localhost/unused".to_string()),
        database: PoolSettings {
            max_connections: 1,
            min_connections: 0,
            ..Default::default()
        },
        admin_user: "admin".to_string(),
        admin_password: Some(TEST_ADMIN_PASSWORD.to_string()),
        admin_password_hash: None,
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        uploads: UploadsConfig {
            static_dir: static_dir.to_path_buf(),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Build the full application over `pool`, with uploads in a fresh temporary directory.
/// Keep the returned directory alive for the duration of the test.
pub async fn create_test_app(pool: PgPool) -> (TestServer, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let app = crate::Application::new_with_pool(create_test_config(dir.path()), Some(pool))
        .await
        .expect("Failed to create application");

    (app.into_test_server(), dir)
}

/// Log in as the test admin and return the `name=value` cookie pair
pub async fn login_cookie(server: &TestServer) -> String {
    let response = server
        .post("/api/admin/login")
        .form(&[("username", "admin"), ("password", TEST_ADMIN_PASSWORD)])
        .await;
    response.assert_status(StatusCode::SEE_OTHER);

    let header = response.header("set-cookie");
    let cookie = header.to_str().expect("Invalid set-cookie header");
    cookie.split(';').next().expect("Empty set-cookie header").to_string()
}

pub async fn seed_project(pool: &PgPool, title: &str, technologies: &[&str], categories: &[&str], featured: bool) -> Project {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Projects::new(&mut conn)
        .create(&ProjectCreateDBRequest {
            title_ru: title.to_string(),
            title_kz: title.to_string(),
            title_en: title.to_string(),
            description_ru: format!("<p>{title}</p>"),
            description_kz: format!("<p>{title}</p>"),
            description_en: format!("<p>{title}</p>"),
            technologies: technologies.iter().map(|t| t.to_string()).collect(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            featured,
            ..Default::default()
        })
        .await
        .expect("Failed to seed project")
}

/// Location on disk of an uploaded image reference
pub fn upload_path(dir: &TempDir, reference: &str) -> PathBuf {
    let name = stored_name(reference).expect("Not an uploaded image reference");
    dir.path().join("uploads").join(name)
}
