//! Roost Orchestrator
//!
//! Deployment orchestration core: keeps a live set of scheduled jobs
//! consistent with a persisted set of deployments, executes script functions
//! through the isolated engine, injects per-owner credentials, and records
//! every execution attempt in the run ledger.
//!
//! This crate exposes no wire protocol of its own; it is consumed as an
//! embedded library by a request-handling layer.

pub mod config;
pub mod credentials;
pub mod db;
pub mod repository;
pub mod scheduler;
pub mod service;
