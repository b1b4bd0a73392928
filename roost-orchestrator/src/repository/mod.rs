//! Repository Module
//!
//! Data access layer for the orchestrator.
//! Each repository handles database operations for a specific domain entity.

pub mod deployment;
pub mod run;

// Re-export for convenience
pub use deployment as deployment_repository;
pub use run as run_repository;
