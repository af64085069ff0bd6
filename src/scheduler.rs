//! Background delivery of scheduled digests.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::db::Database;
use crate::digest::{DeliveryKind, DeliveryOutcome, DigestService};
use crate::profile::{ProfileRepository, UserProfile, MIN_AUTO_INTERVAL_SECS};
use crate::Result;

/// Counters for one scheduler cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Profiles that were due.
    pub due: usize,
    /// Profiles that received a digest.
    pub delivered: usize,
    /// Profiles whose pass failed.
    pub failed: usize,
}

/// Periodically sends digests to every profile whose interval has elapsed.
pub struct DeliveryScheduler {
    db: Arc<Database>,
    digests: Arc<DigestService>,
    tick: Duration,
}

impl DeliveryScheduler {
    /// Create a scheduler ticking once a minute.
    pub fn new(db: Arc<Database>, digests: Arc<DigestService>) -> Self {
        Self::with_interval(db, digests, MIN_AUTO_INTERVAL_SECS as u64)
    }

    /// Create a scheduler with a custom tick, never shorter than a minute.
    pub fn with_interval(db: Arc<Database>, digests: Arc<DigestService>, tick_secs: u64) -> Self {
        let secs = tick_secs.max(MIN_AUTO_INTERVAL_SECS as u64);
        if secs != tick_secs {
            warn!(
                "Scheduler tick of {}s is below the minimum, using {}s",
                tick_secs, secs
            );
        }
        Self {
            db,
            digests,
            tick: Duration::from_secs(secs),
        }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Run forever. A failed cycle is logged and the next one runs on schedule.
    pub async fn run(&self) {
        info!(
            "Delivery scheduler started (tick: {} seconds)",
            self.tick.as_secs()
        );

        let mut timer = interval(self.tick);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            match self.run_cycle().await {
                Ok(report) if report.due > 0 => info!(
                    "Scheduler cycle: {} due, {} delivered, {} failed",
                    report.due, report.delivered, report.failed
                ),
                Ok(_) => debug!("Scheduler cycle: nothing due"),
                Err(e) => error!("Scheduler cycle failed: {}", e),
            }
        }
    }

    /// Process every due profile once.
    ///
    /// Only listing the profiles can fail the cycle; per-chat failures are
    /// logged and counted.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let profiles = ProfileRepository::new(self.db.pool()).list().await?;
        let now = Utc::now();
        let mut report = CycleReport::default();

        for profile in profiles.iter().filter(|p| p.is_due(now)) {
            report.due += 1;
            match self.process(profile).await {
                Ok(true) => report.delivered += 1,
                Ok(false) => {}
                Err(e) => {
                    report.failed += 1;
                    warn!("Scheduled digest for chat {} failed: {}", profile.chat_id, e);
                }
            }
        }

        Ok(report)
    }

    async fn process(&self, profile: &UserProfile) -> Result<bool> {
        let outcome = self
            .digests
            .deliver(profile, DeliveryKind::Scheduled)
            .await?;
        ProfileRepository::new(self.db.pool())
            .mark_auto_run(profile.chat_id, Utc::now())
            .await?;
        Ok(matches!(outcome, DeliveryOutcome::Delivered { .. }))
    }
}

/// Spawn the scheduler on the runtime.
pub fn start_scheduler(scheduler: DeliveryScheduler) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        scheduler.run().await;
    })
}
