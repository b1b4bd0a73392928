//! Roost Core
//!
//! Core types and abstractions for the Roost script deployment platform.
//!
//! This crate contains:
//! - Domain types: Core business entities (Deployment, Trigger, Run, etc.)
//! - DTOs: Data transfer objects surfaced to the embedding request layer
//!
//! Note: Persistence logic lives in the orchestrator, execution logic in the
//! engine.

pub mod domain;
pub mod dto;
pub mod id;
