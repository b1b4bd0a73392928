//! Trigger Scheduler
//!
//! Maintains the live set of timer jobs projected from schedule-type
//! triggers and fires the installed run callback at each occurrence.

pub mod cron;
pub mod jobs;

pub use jobs::{RunCallback, TriggerScheduler};
