//! Scheduler (spec §4.5): time-driven execution of fetch/grade/audit/
//! training jobs on an explicit `America/New_York` calendar. The
//! scheduler owns no business logic of its own — jobs are descriptors
//! that wrap a handler closure, a small struct plus atomic flags rather
//! than a framework.

pub mod trigger;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use serde::Serialize;
use tracing::{error, info, warn};

pub use trigger::Trigger;

/// One registered job (spec §4.5's table). The handler is a boxed async
/// closure so `GradeAndTune`, `SmokeTest`, etc. can each close over
/// whatever services they need without the scheduler knowing their types.
pub struct ScheduleEntry {
    pub name: &'static str,
    pub trigger: Trigger,
    pub cron_display: &'static str,
    handler: Box<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>,
    running: AtomicBool,
    misfire_grace_secs: u64,
    run_count: AtomicU64,
    panic_count: AtomicU64,
    dropped_count: AtomicU64,
}

impl ScheduleEntry {
    pub fn new(
        name: &'static str,
        trigger: Trigger,
        cron_display: &'static str,
        misfire_grace_secs: u64,
        handler: impl Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            trigger,
            cron_display,
            handler: Box::new(handler),
            running: AtomicBool::new(false),
            misfire_grace_secs,
            run_count: AtomicU64::new(0),
            panic_count: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobStatus {
    pub name: &'static str,
    pub next_run_et: String,
    pub trigger: &'static str,
    pub registered: bool,
    pub run_count: u64,
    pub panic_count: u64,
}

/// The job registry and tick loop (spec §4.5). Jobs are fired only if
/// the wall clock enters `[trigger, trigger + misfire_grace]`; a job
/// already running when its window reopens is dropped with a warning,
/// never run concurrently with itself; a handler panic is caught,
/// logged, and counted — it must never crash the scheduler.
pub struct Scheduler {
    jobs: Vec<Arc<ScheduleEntry>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self { jobs: Vec::new() }
    }

    pub fn register(&mut self, entry: ScheduleEntry) {
        self.jobs.push(Arc::new(entry));
    }

    /// `SchedulerStatus()` (spec §6.3): `(name, next_run_et, trigger, registered)` per job.
    pub fn status(&self, now: DateTime<Utc>) -> Vec<JobStatus> {
        self.jobs
            .iter()
            .map(|j| JobStatus {
                name: j.name,
                next_run_et: j.trigger.next_run_et(now),
                trigger: j.cron_display,
                registered: true,
                run_count: j.run_count.load(Ordering::Relaxed),
                panic_count: j.panic_count.load(Ordering::Relaxed),
            })
            .collect()
    }

    /// One tick of the scheduler loop: check every job's trigger against
    /// `now`, and for each one due and not already running, spawn it.
    /// Called every 60s from the owning `tokio::spawn` loop (SPEC_FULL.md §5).
    pub async fn tick(&self, now: DateTime<Utc>) {
        for job in &self.jobs {
            let grace = chrono::Duration::seconds(job.misfire_grace_secs as i64);
            if !job.trigger.due(now, grace) {
                continue;
            }
            if job
                .running
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                job.dropped_count.fetch_add(1, Ordering::Relaxed);
                warn!(job = job.name, "firing dropped: already running");
                continue;
            }

            let job = Arc::clone(job);
            tokio::spawn(async move {
                info!(job = job.name, "job firing");
                job.run_count.fetch_add(1, Ordering::Relaxed);
                let fut = (job.handler)();
                let result = std::panic::AssertUnwindSafe(fut).catch_unwind().await;
                match result {
                    Ok(Ok(())) => info!(job = job.name, "job completed"),
                    Ok(Err(err)) => error!(job = job.name, error = %err, "job returned an error"),
                    Err(panic) => {
                        job.panic_count.fetch_add(1, Ordering::Relaxed);
                        let msg = panic_message(&panic);
                        error!(job = job.name, panic = %msg, "job panicked; scheduler continues");
                    }
                }
                job.running.store(false, Ordering::SeqCst);
            });
        }
    }

    /// Spawn the 60-second tick loop (SPEC_FULL.md §5's single
    /// `tokio::spawn` + `tokio::time::interval` idiom, matching the
    /// teacher's existing polling loops in `main.rs`).
    pub fn spawn_loop(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                ticker.tick().await;
                self.tick(Utc::now()).await;
            }
        })
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

use futures_util::FutureExt;

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Build the fixed eleven-job registry (spec §4.5's table) given the
/// handler closures the caller assembles from its services. Kept as a
/// free function (rather than a method needing every service type) so
/// callers can construct exactly the closures they need.
#[derive(Default)]
pub struct JobHandlers {
    pub handlers: HashMap<&'static str, Box<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>>,
}

pub const JOB_NAMES: &[&str] = &[
    "grade_and_tune",
    "smoke_test",
    "jsonl_grading",
    "trap_evaluation",
    "daily_audit",
    "team_model_train",
    "training_verify",
    "props_fetch_morning",
    "props_fetch_noon",
    "props_fetch_afternoon",
    "props_fetch_evening",
];

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::AtomicUsize;

    fn noop_handler() -> impl Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync {
        || Box::pin(async { Ok(()) })
    }

    #[tokio::test]
    async fn due_job_runs_and_increments_count() {
        let mut scheduler = Scheduler::new();
        scheduler.register(ScheduleEntry::new(
            "grade_and_tune",
            Trigger::Daily { hour: 5, minute: 0 },
            "0 5 * * *",
            600,
            noop_handler(),
        ));
        let at_trigger = Utc.with_ymd_and_hms(2026, 1, 29, 10, 0, 0).unwrap();
        scheduler.tick(at_trigger).await;
        // Allow the spawned task to run.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let status = scheduler.status(at_trigger);
        assert_eq!(status[0].run_count, 1);
    }

    #[tokio::test]
    async fn concurrent_firing_is_dropped_not_queued() {
        let counter = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&counter);
        let mut scheduler = Scheduler::new();
        scheduler.register(ScheduleEntry::new(
            "smoke_test",
            Trigger::Daily { hour: 5, minute: 30 },
            "30 5 * * *",
            600,
            move || {
                let inner = Arc::clone(&inner);
                Box::pin(async move {
                    inner.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                    Ok(())
                })
            },
        ));
        let at_trigger = Utc.with_ymd_and_hms(2026, 1, 29, 10, 30, 0).unwrap();
        scheduler.tick(at_trigger).await;
        scheduler.tick(at_trigger).await;
        tokio::time::sleep(std::time::Duration::from_millis(350)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.jobs[0].dropped_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_panic_is_caught_and_counted() {
        let mut scheduler = Scheduler::new();
        scheduler.register(ScheduleEntry::new(
            "daily_audit",
            Trigger::Daily { hour: 6, minute: 30 },
            "30 6 * * *",
            600,
            || Box::pin(async { panic!("boom") }),
        ));
        let at_trigger = Utc.with_ymd_and_hms(2026, 1, 29, 11, 30, 0).unwrap();
        scheduler.tick(at_trigger).await;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(scheduler.jobs[0].panic_count.load(Ordering::SeqCst), 1);
    }
}
