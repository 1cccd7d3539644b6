//! Extractors exposing the admin session to handlers.

use crate::{
    AppState,
    auth::session,
    config::Config,
    errors::{Error, Result},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;
use tracing::{instrument, trace};

/// Find the session cookie and verify it.
/// Returns the admin username when a valid session token is present.
fn session_username(parts: &Parts, config: &Config) -> Option<String> {
    let cookie_str = parts.headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    let cookie_name = &config.session.cookie_name;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=')
            && name == cookie_name
        {
            match session::verify_session_token(value, config) {
                Ok(claims) if claims.sub == config.admin_user => return Some(claims.sub),
                Ok(claims) => trace!(subject = %claims.sub, "Session for a different admin user"),
                // Expired or tampered tokens are expected; keep looking
                Err(e) => trace!("Session token rejected: {e}"),
            }
        }
    }
    None
}

/// The request's admin session, which may be anonymous. Never rejects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub username: Option<String>,
}

impl AdminSession {
    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Infallible;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        Ok(Self {
            username: session_username(parts, &state.config),
        })
    }
}

/// Requires a valid admin session; otherwise the request fails with 401.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub String);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        session_username(parts, &state.config)
            .map(RequireAdmin)
            .ok_or(Error::Unauthenticated { message: None })
    }
}
