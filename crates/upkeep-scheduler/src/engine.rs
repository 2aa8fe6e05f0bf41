use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};
use upkeep_core::Cadence;
use upkeep_maintenance::{MaintenanceItem, MaintenanceStore};

use crate::{
    error::{Result, SchedulerError},
    history::RunHistory,
    planner::{plan_item, Plan},
    recurrence::same_day,
    schedule::compute_next_run,
    types::RunSummary,
};

/// One materialization pass over every item.
///
/// Shared by the background engine and the `materialize` CLI command.
pub struct Materializer {
    store: Arc<MaintenanceStore>,
    history: Arc<RunHistory>,
    /// Open events / unsent reminders to keep per item.
    upcoming: usize,
}

impl Materializer {
    pub fn new(store: Arc<MaintenanceStore>, history: Arc<RunHistory>, upcoming: usize) -> Self {
        Self {
            store,
            history,
            upcoming,
        }
    }

    /// Plan and persist missing dates for every item as of `today`.
    ///
    /// An item that fails is logged and counted; the pass carries on with the
    /// rest. Only failing to load the items aborts the pass.
    #[instrument(skip(self))]
    pub fn run_once(&self, today: NaiveDate) -> Result<RunSummary> {
        let started_at = Utc::now();
        let schedules = match self.store.schedules() {
            Ok(schedules) => schedules,
            Err(e) => {
                let reason = e.to_string();
                if let Err(he) = self.history.record(started_at, Utc::now(), Err(&reason)) {
                    warn!("could not record failed run: {he}");
                }
                return Err(SchedulerError::Store(e));
            }
        };

        let mut summary = RunSummary {
            items: schedules.len(),
            ..RunSummary::default()
        };
        for schedule in &schedules {
            let plan = plan_item(schedule, today, self.upcoming);
            if plan.is_empty() {
                continue;
            }
            match self.persist(&schedule.item, &plan) {
                Ok((events, reminders)) => {
                    summary.events_created += events;
                    summary.reminders_created += reminders;
                }
                Err(e) => {
                    summary.failures += 1;
                    error!(maintenance_id = %schedule.item.id, "failed to materialize item: {e}");
                }
            }
        }

        info!(
            items = summary.items,
            events = summary.events_created,
            reminders = summary.reminders_created,
            failures = summary.failures,
            "materialization pass finished"
        );
        if let Err(e) = self.history.record(started_at, Utc::now(), Ok(&summary)) {
            warn!("could not record run: {e}");
        }
        Ok(summary)
    }

    fn persist(&self, item: &MaintenanceItem, plan: &Plan) -> Result<(usize, usize)> {
        let events = self.store.insert_events(item, &plan.events)?;
        let reminders = self.store.insert_reminders(item, &plan.reminders)?;
        Ok((events, reminders))
    }
}

/// Background loop running a [`Materializer`] pass on every cadence tick.
pub struct SchedulerEngine {
    materializer: Materializer,
    cadence: Cadence,
}

impl SchedulerEngine {
    pub fn new(materializer: Materializer, cadence: Cadence) -> Result<Self> {
        cadence.validate().map_err(SchedulerError::InvalidCadence)?;
        Ok(Self {
            materializer,
            cadence,
        })
    }

    /// Main loop. Runs one pass immediately, then one per cadence tick until
    /// `shutdown` broadcasts `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(cadence = ?self.cadence, "scheduler engine started");
        let mut last_pass = Utc::now();
        self.pass(last_pass.date_naive());

        loop {
            let now = Utc::now();
            let Some(next) = compute_next_run(&self.cadence, now) else {
                error!("cadence never fires; scheduler engine stopping");
                break;
            };
            let wait = (next - now).to_std().unwrap_or_default();

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    let now = Utc::now();
                    if !same_day(&last_pass, &now) {
                        info!(date = %now.date_naive(), "new day, materialization window advances");
                    }
                    last_pass = now;
                    self.pass(now.date_naive());
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("scheduler engine shutting down");
                        break;
                    }
                }
            }
        }
    }

    fn pass(&self, today: NaiveDate) {
        if let Err(e) = self.materializer.run_once(today) {
            error!("materialization pass failed: {e}");
        }
    }
}
