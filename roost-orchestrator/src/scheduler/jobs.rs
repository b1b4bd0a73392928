//! Live job set and timer loop
//!
//! One job per (deployment, schedule-trigger) pair, keyed
//! `"{deployment_id}:{func}"`. The job set is a transient projection of the
//! deployment store: it is never persisted and is rebuilt from the active
//! deployments at startup.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, info, warn};

use roost_core::domain::deployment::{Deployment, TriggerConfig};

use super::cron::{next_occurrence, parse_schedule, parse_timezone};

/// Future returned by the run callback.
pub type RunFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// The single fire handler: `(deployment_id, trigger_type, func_name)`.
pub type RunCallback = Arc<dyn Fn(String, String, String) -> RunFuture + Send + Sync>;

/// One live timer registration derived from a schedule trigger.
struct ScheduledJob {
    deployment_id: String,
    func: String,
    schedule: Schedule,
    timezone: Tz,
    next_fire: DateTime<Utc>,
}

/// Holds the live job set and drives the timer loop.
pub struct TriggerScheduler {
    jobs: Mutex<HashMap<String, ScheduledJob>>,
    callback: Mutex<Option<RunCallback>>,
    tick_interval: Duration,
    shutdown: watch::Sender<bool>,
    loop_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl TriggerScheduler {
    pub fn new() -> Self {
        Self::with_tick_interval(Duration::from_secs(1))
    }

    pub fn with_tick_interval(tick_interval: Duration) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            jobs: Mutex::new(HashMap::new()),
            callback: Mutex::new(None),
            tick_interval,
            shutdown,
            loop_handle: Mutex::new(None),
        }
    }

    /// Installs the fire handler invoked once per firing.
    pub fn set_callback(&self, callback: RunCallback) {
        *lock(&self.callback) = Some(callback);
    }

    /// Registers every schedule-type trigger of a deployment.
    ///
    /// A malformed trigger is skipped and logged, never raised: one bad
    /// trigger must not block the rest. Re-registering an existing job id
    /// replaces it atomically. Non-schedule trigger types are handled by
    /// other trigger paths and are no-ops here.
    ///
    /// Returns the number of triggers successfully registered.
    pub fn register(&self, deployment: &Deployment) -> usize {
        let mut registered = 0;

        for trigger in &deployment.triggers {
            let TriggerConfig::Schedule(config) = &trigger.config else {
                continue;
            };

            let schedule = match parse_schedule(&config.cron) {
                Ok(schedule) => schedule,
                Err(e) => {
                    warn!(
                        deployment_id = %deployment.id,
                        func = %trigger.func,
                        cron = %config.cron,
                        error = %e,
                        "skipping malformed schedule trigger"
                    );
                    continue;
                }
            };

            let timezone = match parse_timezone(&config.timezone) {
                Ok(tz) => tz,
                Err(e) => {
                    warn!(
                        deployment_id = %deployment.id,
                        func = %trigger.func,
                        error = %e,
                        "skipping schedule trigger with bad timezone"
                    );
                    continue;
                }
            };

            let Some(next_fire) = next_occurrence(&schedule, timezone, Utc::now()) else {
                warn!(
                    deployment_id = %deployment.id,
                    func = %trigger.func,
                    cron = %config.cron,
                    "skipping schedule trigger with no upcoming occurrence"
                );
                continue;
            };

            let job_id = format!("{}:{}", deployment.id, trigger.func);
            let job = ScheduledJob {
                deployment_id: deployment.id.clone(),
                func: trigger.func.clone(),
                schedule,
                timezone,
                next_fire,
            };

            // Replace, never duplicate: two overlapping timers for the same
            // logical job must not exist.
            lock(&self.jobs).insert(job_id.clone(), job);

            info!(
                job_id = %job_id,
                cron = %config.cron,
                timezone = %config.timezone,
                next_fire = %next_fire,
                "trigger registered"
            );
            registered += 1;
        }

        registered
    }

    /// Removes every job belonging to a deployment.
    ///
    /// Safe to call on a deployment with zero jobs. Returns the number of
    /// jobs removed.
    pub fn unregister(&self, deployment_id: &str) -> usize {
        let prefix = format!("{}:", deployment_id);
        let mut jobs = lock(&self.jobs);

        let before = jobs.len();
        jobs.retain(|job_id, _| {
            let keep = !job_id.starts_with(&prefix);
            if !keep {
                info!(job_id = %job_id, "trigger unregistered");
            }
            keep
        });

        before - jobs.len()
    }

    /// Minimum next-fire time across a deployment's live jobs.
    pub fn next_fire_time(&self, deployment_id: &str) -> Option<DateTime<Utc>> {
        let prefix = format!("{}:", deployment_id);
        lock(&self.jobs)
            .iter()
            .filter(|(job_id, _)| job_id.starts_with(&prefix))
            .map(|(_, job)| job.next_fire)
            .min()
    }

    /// Number of live jobs across all deployments.
    pub fn job_count(&self) -> usize {
        lock(&self.jobs).len()
    }

    /// Starts the timer loop.
    pub fn start(self: &Arc<Self>) {
        let mut handle = lock(&self.loop_handle);
        if handle.is_some() {
            warn!("scheduler already running");
            return;
        }

        let scheduler = Arc::clone(self);
        let mut shutdown_rx = self.shutdown.subscribe();

        *handle = Some(tokio::spawn(async move {
            let mut ticker = time::interval(scheduler.tick_interval);
            ticker.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        scheduler.fire_due(Utc::now());
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            debug!("scheduler loop exited");
        }));

        info!("scheduler started");
    }

    /// Stops the timer loop. With `wait`, the call returns only after the
    /// loop task has exited; in-flight run callbacks are not interrupted
    /// either way.
    pub async fn shutdown(&self, wait: bool) {
        let _ = self.shutdown.send(true);

        let handle = lock(&self.loop_handle).take();
        if let Some(handle) = handle {
            if wait {
                let _ = handle.await;
            } else {
                handle.abort();
            }
        }

        info!("scheduler shutdown");
    }

    /// Fires every job due at `now` and advances its next occurrence.
    ///
    /// Callbacks are dispatched as independent tasks so a slow or failing
    /// execution never delays the timer loop.
    pub(crate) fn fire_due(&self, now: DateTime<Utc>) {
        let mut due = Vec::new();

        {
            let mut jobs = lock(&self.jobs);
            let mut exhausted = Vec::new();

            for (job_id, job) in jobs.iter_mut() {
                if job.next_fire > now {
                    continue;
                }

                due.push((job_id.clone(), job.deployment_id.clone(), job.func.clone()));

                match next_occurrence(&job.schedule, job.timezone, now) {
                    Some(next) => job.next_fire = next,
                    None => exhausted.push(job_id.clone()),
                }
            }

            for job_id in exhausted {
                debug!(job_id = %job_id, "schedule exhausted, removing job");
                jobs.remove(&job_id);
            }
        }

        if due.is_empty() {
            return;
        }

        let callback = lock(&self.callback).clone();

        for (job_id, deployment_id, func) in due {
            info!(job_id = %job_id, "trigger fired");

            match &callback {
                Some(callback) => {
                    let fut = callback(deployment_id, "schedule".to_string(), func);
                    tokio::spawn(fut);
                }
                None => {
                    warn!(job_id = %job_id, "no run callback installed, dropping firing");
                }
            }
        }
    }
}

impl Default for TriggerScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Locks a mutex, recovering the inner state if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
