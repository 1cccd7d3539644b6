//! Admin project management: form-driven create, edit, delete and upload cleanup.

use crate::{
    AppState,
    api::{
        form::{FormData, UploadedFile},
        handlers::ADMIN_PROJECTS_PATH,
        models::{projects::ProjectResponse, public::CleanupReport},
    },
    auth::current_user::RequireAdmin,
    content::{TagInput, normalize_tags, sanitize_html, tags::normalize_values},
    db::{
        handlers::{Projects, Repository},
        models::projects::{ProjectCreateDBRequest, ProjectFilter, ProjectUpdateDBRequest, gallery_with_cover, is_truthy},
    },
    errors::{Error, Result},
    types::ProjectId,
    uploads::{UploadStorage, prune_missing_images},
};
use axum::{
    Json,
    extract::{Path, State},
    response::Redirect,
};
use sqlx::{Acquire, PgPool};
use std::collections::HashSet;
use tracing::{info, warn};

/// Tag list from a multi-value or comma-separated field; `None` when the field was not submitted
fn tag_field(form: &FormData, name: &str) -> Option<Vec<String>> {
    form.has(name).then(|| normalize_values(&form.values(name)))
}

/// `categories` (multi-value or comma-separated) with `category` as the single-value fallback
fn categories_field(form: &FormData) -> Option<Vec<String>> {
    if let Some(categories) = tag_field(form, "categories").filter(|c| !c.is_empty()) {
        return Some(categories);
    }
    let single = normalize_tags(Some(&TagInput::from(form.trimmed("category"))));
    (!single.is_empty()).then_some(single)
}

fn required_text(form: &FormData, name: &str) -> Result<String> {
    match form.trimmed(name) {
        "" => Err(Error::BadRequest {
            message: format!("Missing required field: {name}"),
        }),
        value => Ok(value.to_string()),
    }
}

/// Present and non-blank text field
fn optional_text(form: &FormData, name: &str) -> Option<String> {
    Some(form.trimmed(name)).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Store uploaded files, removing the ones already written if any write fails
async fn store_uploads(storage: &dyn UploadStorage, files: &[&UploadedFile]) -> Result<Vec<String>> {
    let mut stored = Vec::with_capacity(files.len());
    for file in files {
        match storage.store(&file.file_name, &file.content).await {
            Ok(reference) => stored.push(reference),
            Err(e) => {
                discard(storage, &stored).await;
                return Err(Error::Internal {
                    operation: format!("store upload '{}': {e}", file.file_name),
                });
            }
        }
    }
    Ok(stored)
}

async fn discard(storage: &dyn UploadStorage, references: &[String]) {
    for reference in references {
        storage.delete_best_effort(reference).await;
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/projects",
    tag = "admin",
    summary = "List projects for administration",
    responses(
        (status = 200, description = "All projects", body = Vec<ProjectResponse>),
        (status = 401, description = "Not authorized")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_projects(State(state): State<AppState>, _: RequireAdmin) -> Result<Json<Vec<ProjectResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let projects = Projects::new(&mut conn).list(&ProjectFilter::default()).await?;

    Ok(Json(projects.into_iter().map(ProjectResponse::from).collect()))
}

/// Create a project from the admin form
#[utoipa::path(
    post,
    path = "/api/admin/projects/new",
    tag = "admin",
    summary = "Create a project",
    description = "URL-encoded or multipart form. `image_file` is the cover; `images` adds gallery files.",
    responses(
        (status = 303, description = "Created"),
        (status = 400, description = "A required title or description is missing"),
        (status = 401, description = "Not authorized")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_project(State(state): State<AppState>, _: RequireAdmin, form: FormData) -> Result<Redirect> {
    let mut request = ProjectCreateDBRequest {
        title_ru: required_text(&form, "title_ru")?,
        title_kz: required_text(&form, "title_kz")?,
        title_en: required_text(&form, "title_en")?,
        description_ru: sanitize_html(&required_text(&form, "description_ru")?),
        description_kz: sanitize_html(&required_text(&form, "description_kz")?),
        description_en: sanitize_html(&required_text(&form, "description_en")?),
        technologies: tag_field(&form, "technologies").unwrap_or_default(),
        genres: tag_field(&form, "genres").unwrap_or_default(),
        categories: categories_field(&form).unwrap_or_default(),
        featured: form.text("featured").is_some_and(is_truthy),
        project_url: form.trimmed("project_url").to_string(),
        ..Default::default()
    };

    let storage = state.uploads.as_ref();
    let cover = store_uploads(storage, &form.file("image_file").into_iter().collect::<Vec<_>>()).await?;
    let gallery = match store_uploads(storage, &form.files("images").collect::<Vec<_>>()).await {
        Ok(gallery) => gallery,
        Err(e) => {
            discard(storage, &cover).await;
            return Err(e);
        }
    };
    let stored: Vec<String> = cover.iter().chain(&gallery).cloned().collect();

    // Without an explicit cover the first gallery image is used
    request.image = cover.first().or(gallery.first()).cloned().unwrap_or_default();
    request.images = gallery_with_cover(&request.image, gallery);

    let created = async {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Ok::<_, Error>(Projects::new(&mut conn).create(&request).await?)
    }
    .await;

    match created {
        Ok(project) => {
            info!(project_id = project.id, images = project.images.len(), "Project created");
            Ok(Redirect::to(ADMIN_PROJECTS_PATH))
        }
        Err(e) => {
            discard(storage, &stored).await;
            Err(e)
        }
    }
}

/// Update a project from the admin form. Fields that are not submitted keep their stored values.
#[utoipa::path(
    post,
    path = "/api/admin/projects/{id}/edit",
    tag = "admin",
    summary = "Edit a project",
    description = "A new `image_file` replaces the cover, `images` appends gallery files and `remove_images` drops gallery entries. Replaced or removed upload files are deleted.",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 303, description = "Updated"),
        (status = 401, description = "Not authorized"),
        (status = 404, description = "Project not found")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn edit_project(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(id): Path<ProjectId>,
    form: FormData,
) -> Result<Redirect> {
    let not_found = || Error::NotFound {
        resource: "Project".to_string(),
        id: id.to_string(),
    };

    // Checked up front so a missing project writes no files
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Projects::new(&mut conn).get_by_id(id).await?.is_none() {
        return Err(not_found());
    }
    drop(conn);

    // Files are written before the row is locked
    let storage = state.uploads.as_ref();
    let new_cover = store_uploads(storage, &form.file("image_file").into_iter().collect::<Vec<_>>()).await?;
    let added = match store_uploads(storage, &form.files("images").collect::<Vec<_>>()).await {
        Ok(added) => added,
        Err(e) => {
            discard(storage, &new_cover).await;
            return Err(e);
        }
    };
    let stored: Vec<String> = new_cover.iter().chain(&added).cloned().collect();

    let locked = async {
        let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
        let current = Projects::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?)
            .get_for_update(id)
            .await?
            .ok_or_else(not_found)?;
        Ok::<_, Error>((tx, current))
    }
    .await;
    let (mut tx, current) = match locked {
        Ok(locked) => locked,
        Err(e) => {
            discard(storage, &stored).await;
            return Err(e);
        }
    };

    let removed: HashSet<String> = normalize_values(&form.values("remove_images")).into_iter().collect();
    let mut gallery: Vec<String> = current.images.iter().filter(|r| !removed.contains(*r)).cloned().collect();
    let mut cover = match new_cover.first() {
        Some(reference) => {
            gallery.retain(|r| r != &current.image);
            reference.clone()
        }
        None if removed.contains(&current.image) => String::new(),
        None => current.image.clone(),
    };
    gallery.extend(added.iter().cloned());
    if cover.is_empty() {
        cover = gallery.first().cloned().unwrap_or_default();
    }
    let images = gallery_with_cover(&cover, gallery);

    let description = |locale: &str| optional_text(&form, &format!("description_{locale}")).map(|d| sanitize_html(&d));
    let request = ProjectUpdateDBRequest {
        title_ru: optional_text(&form, "title_ru"),
        title_kz: optional_text(&form, "title_kz"),
        title_en: optional_text(&form, "title_en"),
        description_ru: description("ru"),
        description_kz: description("kz"),
        description_en: description("en"),
        technologies: tag_field(&form, "technologies"),
        genres: tag_field(&form, "genres"),
        image: Some(cover),
        images: Some(images.clone()),
        categories: categories_field(&form),
        // An unchecked checkbox is not submitted at all
        featured: Some(form.text("featured").is_some_and(is_truthy)),
        project_url: form.has("project_url").then(|| form.trimmed("project_url").to_string()),
    };

    let updated = async {
        let project = Projects::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?)
            .update(id, &request)
            .await?;
        tx.commit().await.map_err(|e| Error::Database(e.into()))?;
        Ok::<_, Error>(project)
    }
    .await;

    if let Err(e) = updated {
        discard(storage, &stored).await;
        return Err(e);
    }

    // Files no longer referenced after the update
    let orphaned: Vec<String> = std::iter::once(&current.image)
        .chain(&current.images)
        .filter(|r| !r.is_empty() && !images.contains(r))
        .cloned()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    discard(storage, &orphaned).await;

    info!(project_id = id, orphaned = orphaned.len(), "Project updated");
    Ok(Redirect::to(ADMIN_PROJECTS_PATH))
}

/// Delete a project and its uploaded files. Deleting a missing project is not an error.
#[utoipa::path(
    post,
    path = "/api/admin/projects/{id}/delete",
    tag = "admin",
    summary = "Delete a project",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 303, description = "Deleted"),
        (status = 401, description = "Not authorized")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_project(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(id): Path<ProjectId>,
) -> Result<Redirect> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    match Projects::new(&mut conn).delete_returning(id).await? {
        Some(project) => {
            let references: HashSet<String> = std::iter::once(project.image)
                .chain(project.images)
                .filter(|r| !r.is_empty())
                .collect();
            for reference in &references {
                state.uploads.delete_best_effort(reference).await;
            }
            info!(project_id = id, files = references.len(), "Project deleted");
        }
        None => warn!(project_id = id, "Delete requested for missing project"),
    }

    Ok(Redirect::to(ADMIN_PROJECTS_PATH))
}

/// Drop image references whose upload files no longer exist
#[utoipa::path(
    post,
    path = "/api/admin/projects/cleanup-uploads",
    tag = "admin",
    summary = "Remove dangling image references",
    description = "Checks every project's managed image references and drops those whose file is missing. Never deletes files.",
    responses(
        (status = 200, description = "Cleanup report", body = CleanupReport),
        (status = 401, description = "Not authorized")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn cleanup_uploads(State(state): State<AppState>, _: RequireAdmin) -> Result<Json<CleanupReport>> {
    let report = prune_dangling_images(&state.db, state.uploads.as_ref()).await?;
    Ok(Json(report))
}

/// Rewrite every project whose managed image files are missing. A project edited while its
/// files are being checked is left alone and picked up by the next run.
pub async fn prune_dangling_images(db: &PgPool, storage: &dyn UploadStorage) -> Result<CleanupReport> {
    let mut conn = db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Projects::new(&mut conn);

    let projects = repo.image_refs().await?;
    let mut report = CleanupReport {
        ok: true,
        checked: projects.len(),
        ..Default::default()
    };

    for (id, image, images) in projects {
        let pruned = prune_missing_images(storage, &image, &images).await;
        if !pruned.changed() {
            continue;
        }
        if repo.replace_images(id, &image, &images, &pruned.image, &pruned.images).await? {
            report.updated += 1;
            report.removed_refs += pruned.removed;
        } else {
            warn!(project_id = id, "Project changed during upload cleanup, skipping");
        }
    }

    info!(checked = report.checked, updated = report.updated, removed_refs = report.removed_refs, "Upload cleanup finished");
    Ok(report)
}
