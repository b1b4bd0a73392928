//! Core domain types
//!
//! This module contains the core domain structures used across Roost
//! services. These types represent the fundamental business entities and are
//! shared between the orchestrator (for persistence) and the engine (for
//! execution).

pub mod deployment;
pub mod execution;
pub mod run;
