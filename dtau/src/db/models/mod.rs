//! Database record types, one module per table.

pub mod categories;
pub mod projects;
pub mod terms;
