//! Password hashing and credential verification.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::{config::Config, errors::Error};

/// Hash a string using Argon2 with default parameters.
pub fn hash_string(input: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(input.as_bytes(), &salt)
        .map_err(|e| Error::Internal {
            operation: format!("hash string: {e}"),
        })?;

    Ok(hash.to_string())
}

/// Verify a string against a hash.
///
/// Note: Verification uses the parameters embedded in the hash itself.
pub fn verify_string(input: &str, hash: &str) -> Result<bool, Error> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| Error::Internal {
        operation: format!("parse hash: {e}"),
    })?;

    Ok(Argon2::default().verify_password(input.as_bytes(), &parsed_hash).is_ok())
}

/// Checks a submitted username and password.
///
/// Verification is CPU-bound; callers run it on the blocking pool.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> Result<bool, Error>;
}

/// The administrator configured through `admin_user` and `admin_password[_hash]`
#[derive(Debug, Clone)]
pub struct ConfiguredAdmin {
    username: String,
    password_hash: String,
}

impl ConfiguredAdmin {
    /// Build the verifier from configuration. A configured hash takes precedence;
    /// a plaintext password is hashed here so it is never compared directly.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let password_hash = match (&config.admin_password_hash, &config.admin_password) {
            (Some(hash), _) => {
                PasswordHash::new(hash).map_err(|e| Error::Internal {
                    operation: format!("parse admin_password_hash: {e}"),
                })?;
                hash.clone()
            }
            (None, Some(password)) => hash_string(password)?,
            (None, None) => {
                return Err(Error::Internal {
                    operation: "configure admin: no admin_password or admin_password_hash".to_string(),
                });
            }
        };

        Ok(Self {
            username: config.admin_user.clone(),
            password_hash,
        })
    }
}

impl CredentialVerifier for ConfiguredAdmin {
    fn verify(&self, username: &str, password: &str) -> Result<bool, Error> {
        // Always run the hash check so timing does not reveal a wrong username
        let password_ok = verify_string(password, &self.password_hash)?;
        Ok(password_ok && username == self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_string("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_string("correct horse", &hash).unwrap());
        assert!(!verify_string("battery staple", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(verify_string("anything", "not-a-hash").is_err());
    }

    #[test]
    fn test_configured_admin_from_plaintext() {
        let config = Config {
            admin_user: "editor".to_string(),
            admin_password: Some("s3cret".to_string()),
            ..Default::default()
        };
        let admin = ConfiguredAdmin::from_config(&config).unwrap();

        assert!(admin.verify("editor", "s3cret").unwrap());
        assert!(!admin.verify("editor", "wrong").unwrap());
        assert!(!admin.verify("admin", "s3cret").unwrap());
    }

    #[test]
    fn test_configured_hash_takes_precedence() {
        let config = Config {
            admin_password: Some("ignored".to_string()),
            admin_password_hash: Some(hash_string("from-hash").unwrap()),
            ..Default::default()
        };
        let admin = ConfiguredAdmin::from_config(&config).unwrap();

        assert!(admin.verify("admin", "from-hash").unwrap());
        assert!(!admin.verify("admin", "ignored").unwrap());
    }

    #[test]
    fn test_invalid_configured_hash_is_an_error() {
        let config = Config {
            admin_password_hash: Some("plaintext-by-mistake".to_string()),
            ..Default::default()
        };
        assert!(ConfiguredAdmin::from_config(&config).is_err());
    }
}
