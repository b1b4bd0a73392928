//! DTOs surfaced to the embedding request layer

pub mod deployment;
pub mod run;
