//! `upkeep-scheduler`: recurrence math and the materialization job.
//!
//! # Overview
//!
//! For every maintenance item the job keeps a fixed number of open future
//! events and unsent future reminders in the database. Each pass:
//!
//! 1. loads every item with the due dates already materialized for it,
//! 2. [`planner::plan_item`] works out which dates are missing,
//! 3. the store inserts them with `INSERT OR IGNORE`, so repeated or
//!    overlapping passes never duplicate a due date.
//!
//! [`engine::SchedulerEngine`] repeats the pass on a [`Cadence`] and records
//! every run in the `job_runs` table.
//!
//! # Cadence variants
//!
//! | Variant    | Behaviour                                 |
//! |------------|-------------------------------------------|
//! | `Interval` | Repeat every N seconds                    |
//! | `Hourly`   | Every hour at each listed minute (UTC)    |
//! | `Daily`    | Once a day at HH:MM UTC                   |
//!
//! [`Cadence`]: upkeep_core::Cadence

pub mod db;
pub mod engine;
pub mod error;
pub mod history;
pub mod planner;
pub mod recurrence;
pub mod schedule;
pub mod types;

pub use engine::{Materializer, SchedulerEngine};
pub use error::{Result, SchedulerError};
pub use history::RunHistory;
pub use types::{JobRun, RunStatus, RunSummary};
