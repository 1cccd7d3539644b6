//! # dtau: Digital Tau portfolio backend
//!
//! `dtau` serves the data behind the Digital Tau project showcase and the tools its editors use
//! to maintain it. The public site reads projects, categories and tag vocabularies from a JSON
//! API; a single administrator manages that content through form-based endpoints that accept
//! image uploads.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses PostgreSQL for persistence. Uploaded images live on the local filesystem under the
//! configured static directory and are served from `/static/uploads/`.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) exposes the public read-only endpoints under `/api/*` and the
//! admin endpoints under `/api/admin/*`. Old page paths (`/`, `/projects`, ...) redirect to the
//! standalone frontend.
//!
//! The **authentication layer** ([`auth`]) checks the configured admin credentials and issues a
//! signed session cookie that admin handlers require through the
//! [`RequireAdmin`](auth::current_user::RequireAdmin) extractor.
//!
//! The **database layer** ([`db`]) uses the repository pattern over runtime SQLx queries. The
//! schema is brought up to date idempotently at startup by [`db::schema::ensure_schema`], which
//! also upgrades databases written by earlier versions in place.
//!
//! The **content layer** ([`content`]) normalizes tag input and sanitizes rich-text
//! descriptions before they are stored. Upload storage sits behind the
//! [`UploadStorage`](uploads::UploadStorage) trait in [`uploads`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use dtau::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = dtau::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     dtau::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See [`config`] for the YAML file layout and the environment variables that override it.

pub mod api;
pub mod auth;
pub mod config;
pub mod content;
pub mod db;
pub mod errors;
pub mod openapi;
pub mod telemetry;
pub mod types;
pub mod uploads;

#[cfg(test)]
mod test_utils;

use anyhow::Context;
use api::handlers::{auth as auth_handlers, categories, projects, public, terms};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{self, HeaderValue},
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use config::CorsOrigin;
use db::models::terms::TermKind;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument, warn};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};
use uuid::Uuid;

use auth::password::{ConfiguredAdmin, CredentialVerifier};
use uploads::{LocalUploads, UploadStorage};

pub use types::{CategoryId, ProjectId, TermId};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .uploads(Arc::new(LocalUploads::new("static/uploads")))
///     .credentials(Arc::new(ConfiguredAdmin::from_config(&config)?))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub uploads: Arc<dyn UploadStorage>,
    pub credentials: Arc<dyn CredentialVerifier>,
}

async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let url = config.database_url.as_deref().context("database_url is not configured")?;
    let settings = &config.database;

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout((settings.idle_timeout_secs > 0).then(|| Duration::from_secs(settings.idle_timeout_secs)))
        .connect(url)
        .await
        .context("Failed to connect to the database")?;

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([http::Method::GET, http::Method::POST])
        .allow_credentials(config.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    let cors = if config.cors.allowed_origins.contains(&CorsOrigin::Wildcard) {
        cors.allow_origin(Any)
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            origins.push(origin.header_value().parse::<HeaderValue>()?);
        }
        cors.allow_origin(origins)
    };

    Ok(match config.cors.max_age {
        Some(max_age) => cors.max_age(Duration::from_secs(max_age)),
        None => cors,
    })
}

/// Build the main application router with all endpoints and middleware.
///
/// This function constructs the complete Axum router with:
/// - Health checks and the public read-only API
/// - Admin authentication and content management routes
/// - Redirects from legacy page paths to the frontend
/// - Static file serving for uploaded images
/// - API documentation at `/docs`
/// - CORS and tracing middleware
///
/// # Errors
///
/// Returns an error if the CORS configuration is invalid.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let upload_limit = DefaultBodyLimit::max(state.config.uploads.max_upload_size);

    let public_routes = Router::new()
        .route("/health", get(public::health))
        .route("/api/health", get(public::health))
        .route("/api/stats", get(public::stats))
        .route("/api/projects", get(public::list_projects))
        .route("/api/projects/{id}", get(public::get_project))
        .route("/api/technologies", get(public::list_technologies))
        .route("/api/genres", get(public::list_genres))
        .route("/api/categories", get(public::list_categories));

    // Pages now rendered by the frontend
    let redirect_routes = Router::new()
        .route("/", get(public::redirect_to_frontend))
        .route("/projects", get(public::redirect_to_frontend))
        .route("/technologies", get(public::redirect_to_frontend))
        .route("/about", get(public::redirect_to_frontend));

    let auth_routes = Router::new()
        .route("/api/admin", get(auth_handlers::admin_index))
        .route("/api/admin/login", post(auth_handlers::login))
        .route("/api/admin/logout", get(auth_handlers::logout).post(auth_handlers::logout))
        .route("/api/admin/me", get(auth_handlers::me));

    let admin_routes = Router::new()
        .route("/api/admin/projects", get(projects::list_projects))
        .route("/api/admin/projects/new", post(projects::create_project).layer(upload_limit))
        .route("/api/admin/projects/{id}/edit", post(projects::edit_project).layer(upload_limit))
        .route("/api/admin/projects/{id}/delete", post(projects::delete_project))
        .route("/api/admin/projects/cleanup-uploads", post(projects::cleanup_uploads))
        .route("/api/admin/categories/json", get(categories::list_categories))
        .route("/api/admin/categories/new", post(categories::create_category))
        .route("/api/admin/categories/{id}/edit", post(categories::edit_category))
        .route("/api/admin/categories/{id}/delete", post(categories::delete_category))
        .nest("/api/admin/technologies", terms::routes(TermKind::Technology))
        .nest("/api/admin/genres", terms::routes(TermKind::Genre));

    let router = Router::new()
        .merge(public_routes)
        .merge(redirect_routes)
        .merge(auth_routes)
        .merge(admin_routes)
        .with_state(state.clone())
        .nest_service("/static", ServeDir::new(&state.config.uploads.static_dir))
        .merge(Scalar::with_url("/docs", openapi::ApiDoc::openapi()));

    let router = router.layer(create_cors_layer(&state.config)?);

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects to the database, brings the schema up to date,
///    prepares the uploads directory and builds the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown signal is received, in-flight requests finish and the
///    database pool is closed
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create an application, reusing `pool` instead of connecting when one is given
    pub async fn new_with_pool(mut config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting with configuration: {:#?}", config);

        if config.secret_key.is_none() {
            warn!("No secret_key configured; generated a random one. Sessions will not survive a restart.");
            config.secret_key = Some(format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()));
        }

        let pool = match pool {
            Some(pool) => pool,
            None => setup_database(&config).await?,
        };

        let changed = db::schema::ensure_schema(&pool).await.context("Failed to prepare database schema")?;
        info!(changed, "Database schema is up to date");

        let uploads_dir = config.uploads.uploads_dir();
        tokio::fs::create_dir_all(&uploads_dir)
            .await
            .with_context(|| format!("Failed to create uploads directory {}", uploads_dir.display()))?;

        let credentials = ConfiguredAdmin::from_config(&config)?;

        let state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .uploads(Arc::new(LocalUploads::new(uploads_dir)))
            .credentials(Arc::new(credentials))
            .build();

        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Digital Tau backend listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
