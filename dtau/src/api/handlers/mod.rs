//! HTTP request handlers.
//!
//! - [`public`]: read-only endpoints for the showcase site
//! - [`auth`]: admin login, logout and session status
//! - [`projects`]: project management with image uploads
//! - [`categories`] and [`terms`]: vocabulary management

pub mod auth;
pub mod categories;
pub mod projects;
pub mod public;
pub mod terms;

/// Where admin actions land after a successful login or project change
pub const ADMIN_PROJECTS_PATH: &str = "/api/admin/projects";
