//! OpenAPI documentation, served with Scalar at `/docs`.

use utoipa::OpenApi;

use crate::{api, content::TagInput};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Digital Tau API",
        description = "Public showcase API and admin content management for the Digital Tau portfolio.",
    ),
    paths(
        api::handlers::public::health,
        api::handlers::public::stats,
        api::handlers::public::list_projects,
        api::handlers::public::get_project,
        api::handlers::public::list_technologies,
        api::handlers::public::list_genres,
        api::handlers::public::list_categories,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::auth::me,
        api::handlers::projects::list_projects,
        api::handlers::projects::create_project,
        api::handlers::projects::edit_project,
        api::handlers::projects::delete_project,
        api::handlers::projects::cleanup_uploads,
    ),
    components(schemas(
        api::models::projects::ProjectResponse,
        api::models::categories::CategoryResponse,
        api::models::terms::TermResponse,
        api::models::public::HealthResponse,
        api::models::public::StatsResponse,
        api::models::public::MeResponse,
        api::models::public::CleanupReport,
        TagInput,
    )),
    tags(
        (name = "public", description = "Read-only data for the showcase site"),
        (name = "admin", description = "Content management; requires the admin session cookie"),
    )
)]
pub struct ApiDoc;
