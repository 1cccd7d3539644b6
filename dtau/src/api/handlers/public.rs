//! Public read-only endpoints consumed by the showcase site.

use crate::{
    AppState,
    api::models::{
        categories::CategoryResponse,
        projects::{ListProjectsQuery, ProjectResponse},
        public::{HealthResponse, StatsResponse},
    },
    db::{
        handlers::{Categories, Projects, Repository, Terms},
        models::{projects::ProjectFilter, terms::TermKind},
    },
    errors::{Error, Result},
    types::ProjectId,
};
use axum::{
    Json,
    extract::{OriginalUri, Path, Query, State},
    http::{StatusCode, header::LOCATION},
    response::IntoResponse,
};
use tracing::debug;

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "public",
    summary = "Health check",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "public",
    summary = "Landing page statistics",
    responses(
        (status = 200, description = "Project, student and technology counts", body = StatsResponse),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Projects::new(&mut conn);

    let projects = repo.count().await?;
    let technologies = repo.distinct_technology_count().await?;

    Ok(Json(StatsResponse {
        projects,
        students: state.config.stats.students,
        technologies,
    }))
}

#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "public",
    summary = "List projects",
    description = "Featured projects first, then by id. Filters on the primary category unless `category` is empty or `all`.",
    params(ListProjectsQuery),
    responses(
        (status = 200, description = "Projects", body = Vec<ProjectResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ListProjectsQuery>,
) -> Result<Json<Vec<ProjectResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let filter = ProjectFilter::from_query(query.category.as_deref());

    let projects = Projects::new(&mut conn).list(&filter).await?;
    Ok(Json(projects.into_iter().map(ProjectResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    tag = "public",
    summary = "Get a project",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "The project", body = ProjectResponse),
        (status = 404, description = "Project not found")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_project(State(state): State<AppState>, Path(id): Path<ProjectId>) -> Result<Json<ProjectResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let project = Projects::new(&mut conn).get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Project".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(project.into()))
}

/// Vocabulary names, or the distinct tags used on projects when the vocabulary is empty
async fn vocabulary_names(state: &AppState, kind: TermKind) -> Result<Vec<String>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let names: Vec<String> = Terms::new(&mut conn, kind).list().await?.into_iter().map(|t| t.name).collect();
    if !names.is_empty() {
        return Ok(names);
    }

    debug!(kind = ?kind, "Vocabulary empty, deriving from projects");
    Ok(Projects::new(&mut conn).distinct_tags(kind).await?)
}

#[utoipa::path(
    get,
    path = "/api/technologies",
    tag = "public",
    summary = "List technologies",
    responses(
        (status = 200, description = "Technology names, sorted", body = Vec<String>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_technologies(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(vocabulary_names(&state, TermKind::Technology).await?))
}

#[utoipa::path(
    get,
    path = "/api/genres",
    tag = "public",
    summary = "List genres",
    responses(
        (status = 200, description = "Genre names, sorted", body = Vec<String>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_genres(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(vocabulary_names(&state, TermKind::Genre).await?))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "public",
    summary = "List categories",
    description = "Display names fall back to the code. When no categories are defined, the codes used on projects are returned without ids.",
    responses(
        (status = 200, description = "Categories sorted by code", body = Vec<CategoryResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let categories = Categories::new(&mut conn).list(&()).await?;
    if !categories.is_empty() {
        return Ok(Json(categories.into_iter().map(CategoryResponse::from).collect()));
    }

    let codes = Projects::new(&mut conn).distinct_categories().await?;
    Ok(Json(codes.into_iter().map(CategoryResponse::derived).collect()))
}

/// Page paths that now live on the frontend. Redirects to the same path there.
#[tracing::instrument(skip_all)]
pub async fn redirect_to_frontend(State(state): State<AppState>, OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    (StatusCode::FOUND, [(LOCATION, state.config.frontend_link(uri.path()))])
}
