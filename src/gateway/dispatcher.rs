//! Schedule dispatcher: one recurring task per enabled schedule row.
//!
//! `rebuild` throws every job away and registers the current set again, so it
//! is safe to call after any schedule or settings change.

use super::BotSession;
use chrono::{DateTime, Utc};
use croner::Cron;
use lantern_core::config::SchedulerConfig;
use lantern_core::error::LanternError;
use lantern_memory::{Schedule, Store};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Stable job key for a schedule row.
pub fn job_id(schedule_id: i64) -> String {
    format!("schedule_{schedule_id}")
}

/// Parse a 5-field `minute hour day month weekday` expression.
///
/// Anything with a different field count, or that the cron engine rejects,
/// yields `None`. The engine wants a seconds field, so `0` is prepended.
pub fn parse_cron(expr: &str) -> Option<Cron> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if fields.len() != 5 {
        return None;
    }
    format!("0 {}", fields.join(" ")).parse::<Cron>().ok()
}

pub struct Dispatcher {
    store: Store,
    session: Arc<BotSession>,
    /// When false, `rebuild` only clears the job set.
    enabled: bool,
    jobs: Mutex<HashMap<String, CancellationToken>>,
}

impl Dispatcher {
    pub fn new(store: Store, session: Arc<BotSession>, config: &SchedulerConfig) -> Self {
        Self {
            store,
            session,
            enabled: config.enabled,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the live job set with one job per valid enabled schedule.
    /// Returns the number of jobs registered.
    ///
    /// The token and rows are loaded first; on a store error the previous
    /// job set is left running.
    pub async fn rebuild(&self) -> Result<usize, LanternError> {
        self.session.reload_token(&self.store).await?;
        let schedules = if self.enabled {
            self.store.list_schedules().await?
        } else {
            Vec::new()
        };

        let mut fresh = HashMap::new();
        for schedule in schedules {
            if !schedule.enabled {
                continue;
            }
            let Some(cron) = parse_cron(&schedule.cron) else {
                warn!(
                    "skipping schedule {} ({}): malformed cron {:?}",
                    schedule.id, schedule.name, schedule.cron
                );
                continue;
            };
            fresh.insert(job_id(schedule.id), (cron, schedule));
        }

        let mut jobs = self.jobs.lock().await;
        for (_, cancel) in jobs.drain() {
            cancel.cancel();
        }
        for (id, (cron, schedule)) in fresh {
            let cancel = CancellationToken::new();
            tokio::spawn(run_job(
                cron,
                schedule,
                self.store.clone(),
                Arc::clone(&self.session),
                cancel.clone(),
            ));
            jobs.insert(id, cancel);
        }

        if self.enabled {
            info!("dispatcher rebuilt: {} job(s)", jobs.len());
        } else {
            debug!("scheduler disabled, no jobs registered");
        }
        Ok(jobs.len())
    }

    /// Registered job keys, sorted.
    pub async fn job_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.jobs.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn job_count(&self) -> usize {
        self.jobs.lock().await.len()
    }

    /// Cancel every job.
    pub async fn shutdown(&self) {
        let mut jobs = self.jobs.lock().await;
        for (_, cancel) in jobs.drain() {
            cancel.cancel();
        }
        debug!("dispatcher shut down");
    }
}

/// Next occurrence after both the last firing and `now`.
///
/// Occurrences missed while the process was stalled collapse into one.
pub(super) fn next_fire(
    cron: &Cron,
    last: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    cron.iter_after(last.max(now)).next()
}

pub(super) async fn run_job(
    cron: Cron,
    schedule: Schedule,
    store: Store,
    session: Arc<BotSession>,
    cancel: CancellationToken,
) {
    let mut last: DateTime<Utc> = Utc::now();
    loop {
        let Some(next) = next_fire(&cron, last, Utc::now()) else {
            debug!("schedule {} has no further occurrences", schedule.id);
            return;
        };
        let wait = (next - Utc::now()).to_std().unwrap_or_default();

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(wait) => {}
        }

        fire(&store, &session, &schedule).await;
        last = next;
    }
}

/// One firing: refresh the token, then send. Failures are logged only.
pub(crate) async fn fire(store: &Store, session: &BotSession, schedule: &Schedule) {
    if let Err(e) = session.reload_token(store).await {
        warn!("schedule {}: token reload failed: {e}", schedule.id);
    }
    match session.send(&schedule.chat_id, &schedule.text).await {
        Ok(()) => info!("schedule {} ({}) sent to {}", schedule.id, schedule.name, schedule.chat_id),
        Err(e) => error!("schedule {} ({}) send failed: {e}", schedule.id, schedule.name),
    }
}
