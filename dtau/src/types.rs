//! Identifier aliases shared by the API and database layers.

/// Surrogate key of a project row
pub type ProjectId = i32;

/// Surrogate key of a category row
pub type CategoryId = i32;

/// Surrogate key of a technology or genre row
pub type TermId = i32;
