//! Request/response data structures for the HTTP API.

pub mod categories;
pub mod projects;
pub mod public;
pub mod terms;
