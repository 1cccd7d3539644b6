//! Admin session endpoints: login, logout and session status.

use crate::{
    AppState,
    api::{form::FormData, handlers::ADMIN_PROJECTS_PATH, models::public::MeResponse},
    auth::{current_user::AdminSession, session},
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::State,
    http::{
        StatusCode,
        header::{LOCATION, SET_COOKIE},
    },
    response::{IntoResponse, Response},
};
use tracing::info;

fn invalid_credentials() -> Error {
    Error::Unauthenticated {
        message: Some("Invalid username or password".to_string()),
    }
}

/// Log in with the configured admin credentials
#[utoipa::path(
    post,
    path = "/api/admin/login",
    tag = "admin",
    summary = "Log in",
    description = "Form fields `username` and `password`. Sets the session cookie and redirects to the project list.",
    responses(
        (status = 303, description = "Logged in"),
        (status = 401, description = "Invalid username or password")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, form: FormData) -> Result<Response> {
    let username = form.trimmed("username").to_string();
    let password = form.text("password").unwrap_or_default().to_string();
    if username.is_empty() || password.is_empty() {
        return Err(invalid_credentials());
    }

    // Verify password on a blocking thread to avoid blocking async runtime
    let verifier = state.credentials.clone();
    let candidate = username.clone();
    let is_valid = tokio::task::spawn_blocking(move || verifier.verify(&candidate, &password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(invalid_credentials());
    }

    let token = session::create_session_token(&username, &state.config)?;
    info!(username = %username, "Admin logged in");

    Ok((
        StatusCode::SEE_OTHER,
        [
            (SET_COOKIE, session::session_cookie(&token, &state.config)),
            (LOCATION, ADMIN_PROJECTS_PATH.to_string()),
        ],
    )
        .into_response())
}

/// Clear the session and return to the public site
#[utoipa::path(
    post,
    path = "/api/admin/logout",
    tag = "admin",
    summary = "Log out",
    responses((status = 303, description = "Session cleared"))
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::SEE_OTHER,
        [
            (SET_COOKIE, session::clear_session_cookie(&state.config)),
            (LOCATION, state.config.frontend_url.clone()),
        ],
    )
}

/// Report whether the caller is logged in
#[utoipa::path(
    get,
    path = "/api/admin/me",
    tag = "admin",
    summary = "Session status",
    responses((status = 200, description = "Session status", body = MeResponse))
)]
pub async fn me(session: AdminSession) -> Json<MeResponse> {
    Json(MeResponse {
        logged_in: session.is_authenticated(),
    })
}

/// Admin entry point: the project list when logged in, otherwise the frontend login page
pub async fn admin_index(State(state): State<AppState>, session: AdminSession) -> impl IntoResponse {
    let target = if session.is_authenticated() {
        ADMIN_PROJECTS_PATH.to_string()
    } else {
        state.config.frontend_link("/admin/login")
    };
    (StatusCode::SEE_OTHER, [(LOCATION, target)])
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{create_test_app, login_cookie};
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::PgPool;

    #[sqlx::test(migrations = false)]
    #[test_log::test]
    async fn test_login_sets_cookie_and_redirects(pool: PgPool) {
        let (server, _dir) = create_test_app(pool).await;

        let response = server
            .post("/api/admin/login")
            .form(&[("username", "admin"), ("password", "test-password")])
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/api/admin/projects");
        let cookie = response.header("set-cookie");
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("dtau_session="));
        assert!(cookie.contains("HttpOnly"));
    }

    #[sqlx::test(migrations = false)]
    #[test_log::test]
    async fn test_login_rejects_bad_credentials(pool: PgPool) {
        let (server, _dir) = create_test_app(pool).await;

        for (username, password) in [("admin", "wrong"), ("intruder", "test-password"), ("", "")] {
            let response = server
                .post("/api/admin/login")
                .form(&[("username", username), ("password", password)])
                .await;
            response.assert_status(StatusCode::UNAUTHORIZED);
            assert!(response.headers().get("set-cookie").is_none());
        }
    }

    #[sqlx::test(migrations = false)]
    #[test_log::test]
    async fn test_me_reflects_session(pool: PgPool) {
        let (server, _dir) = create_test_app(pool).await;

        server.get("/api/admin/me").await.assert_json(&json!({"loggedIn": false}));

        let cookie = login_cookie(&server).await;
        server
            .get("/api/admin/me")
            .add_header("cookie", cookie.as_str())
            .await
            .assert_json(&json!({"loggedIn": true}));

        server
            .get("/api/admin/me")
            .add_header("cookie", "dtau_session=forged.token.value")
            .await
            .assert_json(&json!({"loggedIn": false}));
    }

    #[sqlx::test(migrations = false)]
    #[test_log::test]
    async fn test_logout_clears_cookie(pool: PgPool) {
        let (server, _dir) = create_test_app(pool).await;

        for response in [server.post("/api/admin/logout").await, server.get("/api/admin/logout").await] {
            response.assert_status(StatusCode::SEE_OTHER);
            assert_eq!(response.header("location"), "http://localhost:3000");
            assert!(response.header("set-cookie").to_str().unwrap().contains("Max-Age=0"));
        }
    }

    #[sqlx::test(migrations = false)]
    #[test_log::test]
    async fn test_admin_index_redirects(pool: PgPool) {
        let (server, _dir) = create_test_app(pool).await;

        let anonymous = server.get("/api/admin").await;
        anonymous.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(anonymous.header("location"), "http://localhost:3000/admin/login");

        let cookie = login_cookie(&server).await;
        let logged_in = server.get("/api/admin").add_header("cookie", cookie.as_str()).await;
        assert_eq!(logged_in.header("location"), "/api/admin/projects");
    }

    #[sqlx::test(migrations = false)]
    #[test_log::test]
    async fn test_protected_routes_require_session(pool: PgPool) {
        let (server, _dir) = create_test_app(pool).await;

        for path in [
            "/api/admin/projects",
            "/api/admin/technologies/json",
            "/api/admin/genres/json",
            "/api/admin/categories/json",
        ] {
            let response = server.get(path).await;
            response.assert_status(StatusCode::UNAUTHORIZED);
            response.assert_text("Not authorized");
        }

        server
            .post("/api/admin/projects/new")
            .form(&[("title_en", "x")])
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
