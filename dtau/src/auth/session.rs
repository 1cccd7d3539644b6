//! JWT session token creation and verification, plus the session cookie.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, errors::Error};

/// JWT session claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String, // Admin username
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
}

impl SessionClaims {
    pub fn new(username: &str, config: &Config) -> Self {
        let now = Utc::now();
        let lifetime = chrono::Duration::from_std(config.session.timeout).unwrap_or(chrono::Duration::days(1));
        let exp = now + lifetime;

        Self {
            sub: username.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

fn secret_key(config: &Config) -> Result<&str, Error> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "JWT sessions: secret_key is required".to_string(),
    })
}

/// Create a JWT token for an admin session
pub fn create_session_token(username: &str, config: &Config) -> Result<String, Error> {
    let claims = SessionClaims::new(username, config);
    let key = EncodingKey::from_secret(secret_key(config)?.as_bytes());

    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })
}

/// Verify and decode a JWT session token
pub fn verify_session_token(token: &str, config: &Config) -> Result<SessionClaims, Error> {
    use jsonwebtoken::errors::ErrorKind;

    let key = DecodingKey::from_secret(secret_key(config)?.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Client errors (401) - malformed tokens, invalid claims, expired tokens
        ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::ExpiredSignature
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::InvalidSubject
        | ErrorKind::ImmatureSignature
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::InvalidAlgorithm => Error::Unauthenticated { message: None },

        // Server errors (500) - key issues, internal failures
        _ => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },
    })?;

    Ok(token_data.claims)
}

fn cookie_attributes(config: &Config, max_age: u64) -> String {
    let mut attributes = format!(
        "Path=/; HttpOnly; SameSite={}; Max-Age={max_age}",
        same_site_value(&config.session.cookie_same_site)
    );
    if config.session.cookie_secure {
        attributes.push_str("; Secure");
    }
    attributes
}

fn same_site_value(value: &str) -> &'static str {
    match value.to_ascii_lowercase().as_str() {
        "strict" => "Strict",
        "none" => "None",
        _ => "Lax",
    }
}

/// `Set-Cookie` value carrying a freshly issued session token
pub fn session_cookie(token: &str, config: &Config) -> String {
    format!(
        "{}={token}; {}",
        config.session.cookie_name,
        cookie_attributes(config, config.session.timeout.as_secs())
    )
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie(config: &Config) -> String {
    format!("{}=; {}", config.session.cookie_name, cookie_attributes(config, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn create_test_config() -> Config {
        Config {
            secret_key: Some("test-secret-key-for-jwt".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_token_round_trip() {
        let config = create_test_config();
        let token = create_session_token("admin", &config).unwrap();

        let claims = verify_session_token(&token, &config).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn test_token_signed_with_other_key_is_rejected() {
        let config = create_test_config();
        let token = create_session_token("admin", &config).unwrap();

        let other = Config {
            secret_key: Some("another-key".to_string()),
            ..Default::default()
        };
        let err = verify_session_token(&token, &other).unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
        assert!(matches!(
            verify_session_token("garbage", &config).unwrap_err(),
            Error::Unauthenticated { .. }
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let config = create_test_config();
        let claims = SessionClaims {
            sub: "admin".to_string(),
            exp: Utc::now().timestamp() - 3600,
            iat: Utc::now().timestamp() - 7200,
        };
        let key = EncodingKey::from_secret(b"test-secret-key-for-jwt");
        let token = encode(&Header::default(), &claims, &key).unwrap();

        assert!(matches!(
            verify_session_token(&token, &config).unwrap_err(),
            Error::Unauthenticated { .. }
        ));
    }

    #[test]
    fn test_missing_secret_is_internal() {
        let config = Config::default();
        assert!(matches!(
            create_session_token("admin", &config).unwrap_err(),
            Error::Internal { .. }
        ));
    }

    #[test]
    fn test_cookie_attributes() {
        let mut config = create_test_config();
        config.session.timeout = Duration::from_secs(3600);

        assert_eq!(
            session_cookie("tok", &config),
            "dtau_session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600"
        );

        config.session.cookie_secure = true;
        config.session.cookie_same_site = "strict".to_string();
        assert_eq!(
            clear_session_cookie(&config),
            "dtau_session=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0; Secure"
        );
    }
}
