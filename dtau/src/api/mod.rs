//! HTTP API layer.
//!
//! # Modules
//!
//! - [`form`]: form extraction shared by the admin endpoints (urlencoded and multipart)
//! - [`handlers`]: request handlers grouped by resource
//! - [`models`]: request and response data structures

pub mod form;
pub mod handlers;
pub mod models;
