//! Admin management of categories.

use crate::{
    AppState,
    api::{form::FormData, models::categories::CategoryResponse},
    auth::current_user::RequireAdmin,
    db::{
        errors::DbError,
        handlers::{Categories, Repository},
        models::categories::{CategoryCreateDBRequest, CategoryUpdateDBRequest},
    },
    errors::{Error, Result},
    types::CategoryId,
};
use axum::{
    Json,
    extract::{Path, State},
    response::Redirect,
};
use sqlx::Acquire;
use tracing::{debug, info};

const CATEGORIES_PATH: &str = "/api/admin/categories/json";

/// Category fields from the form: `name` is the code, display names are optional
fn category_request(form: &FormData) -> CategoryCreateDBRequest {
    CategoryCreateDBRequest {
        code: form.trimmed("name").to_string(),
        name_ru: form.trimmed("name_ru").to_string(),
        name_kz: form.trimmed("name_kz").to_string(),
        name_en: form.trimmed("name_en").to_string(),
    }
}

#[tracing::instrument(skip_all)]
pub async fn list_categories(State(state): State<AppState>, _: RequireAdmin) -> Result<Json<Vec<CategoryResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let categories = Categories::new(&mut conn).list(&()).await?;

    Ok(Json(categories.into_iter().map(CategoryResponse::from).collect()))
}

/// Create a category, or update the display names of the one with the same code.
/// A blank code is ignored.
#[tracing::instrument(skip_all)]
pub async fn create_category(State(state): State<AppState>, _: RequireAdmin, form: FormData) -> Result<Redirect> {
    let request = category_request(&form);
    if request.code.is_empty() {
        debug!("Ignoring category without a code");
        return Ok(Redirect::to(CATEGORIES_PATH));
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let category = Categories::new(&mut conn).create(&request).await?;
    info!(id = category.id, code = %category.name, "Category saved");

    Ok(Redirect::to(CATEGORIES_PATH))
}

#[tracing::instrument(skip_all)]
pub async fn edit_category(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(id): Path<CategoryId>,
    form: FormData,
) -> Result<Redirect> {
    let request: CategoryUpdateDBRequest = category_request(&form);
    if request.code.is_empty() {
        return Err(Error::BadRequest {
            message: "Category code cannot be empty".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let category = match Categories::new(tx.acquire().await.map_err(|e| Error::Database(e.into()))?)
        .update(id, &request)
        .await
    {
        Err(DbError::NotFound) => {
            return Err(Error::NotFound {
                resource: "Category".to_string(),
                id: id.to_string(),
            });
        }
        other => other?,
    };
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    info!(id = category.id, code = %category.name, "Category updated");
    Ok(Redirect::to(CATEGORIES_PATH))
}

#[tracing::instrument(skip_all)]
pub async fn delete_category(State(state): State<AppState>, _: RequireAdmin, Path(id): Path<CategoryId>) -> Result<Redirect> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Categories::new(&mut conn).delete(id).await? {
        info!(id, "Category deleted");
    }

    Ok(Redirect::to(CATEGORIES_PATH))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_app, login_cookie};
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::PgPool;

    async fn categories(server: &axum_test::TestServer, cookie: &str) -> Vec<Value> {
        server
            .get("/api/admin/categories/json")
            .add_header("cookie", cookie)
            .await
            .json()
    }

    #[sqlx::test(migrations = false)]
    #[test_log::test]
    async fn test_create_upserts_and_ignores_blank_code(pool: PgPool) {
        let (server, _dir) = create_test_app(pool).await;
        let cookie = login_cookie(&server).await;

        for form in [
            vec![("name", "games"), ("name_en", "Games")],
            vec![("name", "games"), ("name_ru", "Игры"), ("name_en", "Games")],
            vec![("name", "  "), ("name_en", "Nothing")],
        ] {
            server
                .post("/api/admin/categories/new")
                .add_header("cookie", cookie.as_str())
                .form(&form)
                .await
                .assert_status(StatusCode::SEE_OTHER);
        }

        let all = categories(&server, &cookie).await;
        assert_eq!(all.len(), 6);
        let games = all.iter().find(|c| c["code"] == "games").unwrap();
        assert_eq!(games["nameRu"], json!("Игры"));
        assert_eq!(games["nameKz"], json!("games"));
        assert_eq!(games["nameEn"], json!("Games"));
    }

    #[sqlx::test(migrations = false)]
    #[test_log::test]
    async fn test_edit_and_delete(pool: PgPool) {
        let (server, _dir) = create_test_app(pool).await;
        let cookie = login_cookie(&server).await;

        let all = categories(&server, &cookie).await;
        let vrar = all.iter().find(|c| c["code"] == "vrar").unwrap()["id"].as_i64().unwrap();

        server
            .post(&format!("/api/admin/categories/{vrar}/edit"))
            .add_header("cookie", cookie.as_str())
            .form(&[("name", "xr"), ("name_en", "XR")])
            .await
            .assert_status(StatusCode::SEE_OTHER);

        server
            .post(&format!("/api/admin/categories/{vrar}/edit"))
            .add_header("cookie", cookie.as_str())
            .form(&[("name", "web")])
            .await
            .assert_status(StatusCode::CONFLICT);

        server
            .post("/api/admin/categories/9999/edit")
            .add_header("cookie", cookie.as_str())
            .form(&[("name", "other")])
            .await
            .assert_status(StatusCode::NOT_FOUND);

        server
            .post(&format!("/api/admin/categories/{vrar}/delete"))
            .add_header("cookie", cookie.as_str())
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let codes: Vec<String> = categories(&server, &cookie)
            .await
            .iter()
            .map(|c| c["code"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(codes, vec!["aiml", "iot", "mobile", "web"]);
    }
}
