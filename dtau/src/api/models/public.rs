//! Small response bodies shared by the public and admin endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
}

/// Landing page figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    /// Number of projects
    pub projects: i64,
    /// Configured number of students
    pub students: u32,
    /// Number of distinct technologies used across projects
    pub technologies: i64,
}

/// Whether the caller holds an admin session
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub logged_in: bool,
}

/// Outcome of a dangling-upload cleanup pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanupReport {
    pub ok: bool,
    /// Projects inspected
    pub checked: usize,
    /// Projects whose image references were rewritten
    pub updated: usize,
    /// Image references dropped
    pub removed_refs: usize,
}
