//! Admin management of the technology and genre vocabularies.
//!
//! Both vocabularies expose the same endpoints, so the routes are built once per
//! [`TermKind`] and nested under `/api/admin/technologies` and `/api/admin/genres`.

use crate::{
    AppState,
    api::{form::FormData, models::terms::TermResponse},
    auth::current_user::RequireAdmin,
    db::{handlers::Terms, models::terms::TermKind},
    errors::{Error, Result},
    types::TermId,
};
use axum::{
    Json, Router,
    extract::{Path, State},
    response::Redirect,
    routing::{get, post},
};
use sqlx::Acquire;
use tracing::{debug, info};

/// Routes for one vocabulary, relative to its `/api/admin/<table>` prefix
pub fn routes(kind: TermKind) -> Router<AppState> {
    Router::new()
        .route(
            "/json",
            get(move |state: State<AppState>, _: RequireAdmin| list_terms(state, kind)),
        )
        .route(
            "/new",
            post(move |state: State<AppState>, _: RequireAdmin, form: FormData| create_term(state, kind, form)),
        )
        .route(
            "/{id}/edit",
            post(move |state: State<AppState>, _: RequireAdmin, id: Path<TermId>, form: FormData| {
                edit_term(state, kind, id, form)
            }),
        )
        .route(
            "/{id}/delete",
            post(move |state: State<AppState>, _: RequireAdmin, id: Path<TermId>| delete_term(state, kind, id)),
        )
}

fn listing_path(kind: TermKind) -> String {
    format!("/api/admin/{}/json", kind.table())
}

#[tracing::instrument(skip(state))]
async fn list_terms(State(state): State<AppState>, kind: TermKind) -> Result<Json<Vec<TermResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let terms = Terms::new(&mut conn, kind).list().await?;

    Ok(Json(terms.into_iter().map(TermResponse::from).collect()))
}

/// Add a term. Blank and duplicate names are ignored.
#[tracing::instrument(skip(state, form))]
async fn create_term(State(state): State<AppState>, kind: TermKind, form: FormData) -> Result<Redirect> {
    let name = form.trimmed("name");
    if name.is_empty() {
        debug!("Ignoring blank name");
        return Ok(Redirect::to(&listing_path(kind)));
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    match Terms::new(&mut conn, kind).create(name).await? {
        Some(term) => info!(id = term.id, name = %term.name, "{} created", kind.label()),
        None => debug!(name, "{} already exists", kind.label()),
    }

    Ok(Redirect::to(&listing_path(kind)))
}

#[tracing::instrument(skip(state, form))]
async fn edit_term(State(state): State<AppState>, kind: TermKind, Path(id): Path<TermId>, form: FormData) -> Result<Redirect> {
    let name = form.trimmed("name");
    if name.is_empty() {
        return Err(Error::BadRequest {
            message: format!("{} name cannot be empty", kind.label()),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let term = {
        let mut repo = Terms::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?, kind);
        match repo.update(id, name).await {
            Err(crate::db::errors::DbError::NotFound) => {
                return Err(Error::NotFound {
                    resource: kind.label().to_string(),
                    id: id.to_string(),
                });
            }
            other => other?,
        }
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    info!(id = term.id, name = %term.name, "{} renamed", kind.label());
    Ok(Redirect::to(&listing_path(kind)))
}

#[tracing::instrument(skip(state))]
async fn delete_term(State(state): State<AppState>, kind: TermKind, Path(id): Path<TermId>) -> Result<Redirect> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Terms::new(&mut conn, kind).delete(id).await? {
        info!(id, "{} deleted", kind.label());
    }

    Ok(Redirect::to(&listing_path(kind)))
}
