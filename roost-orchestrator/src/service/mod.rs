//! Business logic services
//!
//! Services sit between the repositories and the outer surfaces (daemon,
//! scheduler callback). Repositories stay mechanical; lifecycle rules,
//! trigger registration, and the execution pipeline live here.

pub mod deployment;
pub mod execution;
pub mod run;

pub use deployment::DeploymentService;
pub use execution::RunContext;
