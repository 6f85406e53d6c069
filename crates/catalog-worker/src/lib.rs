//! Scheduled publishing and archiving for the service catalog.
//!
//! This crate provides:
//! - A cron scheduler that runs registered jobs on their expressions
//! - The scheduled publishing job, which applies due publish and archive
//!   instants recorded by `ScheduleEntity`

pub mod jobs;
pub mod scheduler;

pub use jobs::{JobExecutionError, ScheduledJob, ScheduledPublishingJob};
pub use scheduler::CronScheduler;
