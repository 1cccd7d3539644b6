//! Admin authentication.
//!
//! There is a single administrator whose credentials come from configuration. A
//! successful login issues a signed JWT that is stored in an HTTP-only cookie; every
//! admin request re-verifies that cookie, so no session state is kept server-side.
//!
//! # Modules
//!
//! - [`current_user`]: Extractors exposing the session to handlers
//! - [`password`]: Argon2 hashing and the pluggable [`password::CredentialVerifier`]
//! - [`session`]: Session token and cookie handling
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use dtau::auth::current_user::RequireAdmin;
//!
//! async fn protected_handler(RequireAdmin(username): RequireAdmin) -> String {
//!     format!("Hello, {username}!")
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod session;
