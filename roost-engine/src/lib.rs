//! Roost Engine
//!
//! Isolated execution of one script function in a separate OS process.
//! A crash, infinite loop, or resource exhaustion in the script can never
//! take down the orchestrating process.

pub mod executor;

pub use executor::Executor;
