use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::JobState;
use common::config::JobsAppConfig;
use common::retry::calculate_backoff;
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::JobRegistry;
use super::queue::JobQueue;
use crate::entity::job;

/// Longest pause between scans for abandoned `running` jobs.
const MAX_RESCUE_SCAN_SECS: u64 = 60;

/// Polls the job table and executes claimed jobs on a bounded pool.
pub struct JobRunner {
    db: DatabaseConnection,
    registry: Arc<JobRegistry>,
    config: JobsAppConfig,
    permits: Arc<Semaphore>,
}

impl JobRunner {
    pub fn new(db: DatabaseConnection, registry: JobRegistry, config: JobsAppConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_workers.max(1)));
        Self {
            db,
            registry: Arc::new(registry),
            config,
            permits,
        }
    }

    /// Run until `shutdown` is cancelled, then wait up to the configured grace
    /// period for in-flight jobs. Jobs still running after that are aborted and
    /// later rescued.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            max_workers = self.config.max_workers,
            poll_interval_ms = self.config.poll_interval_ms,
            kinds = ?self.registry.kinds(),
            "Starting job runner"
        );

        let mut poll = tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms));
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let rescue_every = self.config.rescue_after_secs.clamp(1, MAX_RESCUE_SCAN_SECS);
        let mut rescue = tokio::time::interval(Duration::from_secs(rescue_every));
        rescue.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut in_flight = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = poll.tick() => {
                    if let Err(e) = self.dispatch(&mut in_flight).await {
                        error!(error = %e, "Failed to claim jobs");
                    }
                }
                _ = rescue.tick() => {
                    if let Err(e) = self.rescue().await {
                        error!(error = %e, "Failed to rescue stuck jobs");
                    }
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Job task panicked");
                    }
                }
            }
        }

        info!(in_flight = in_flight.len(), "Job runner stopping");
        let grace = Duration::from_secs(self.config.shutdown_grace_secs);
        let drained = tokio::time::timeout(grace, drain(&mut in_flight)).await;
        if drained.is_err() {
            warn!(
                remaining = in_flight.len(),
                "Shutdown grace period elapsed, aborting in-flight jobs"
            );
            in_flight.abort_all();
        }
        info!("Job runner stopped");
    }

    /// Claim as many due jobs as there are free workers and spawn them.
    async fn dispatch(&self, in_flight: &mut JoinSet<()>) -> Result<(), DbErr> {
        let free = self.permits.available_permits();
        if free == 0 {
            return Ok(());
        }

        let txn = self.db.begin().await?;
        let jobs = JobQueue::new(&txn).claim(free as u64, Utc::now()).await?;
        txn.commit().await?;

        for job in jobs {
            // Only this loop acquires permits, so `free` of them are available.
            let Ok(permit) = self.permits.clone().acquire_owned().await else {
                break;
            };
            let db = self.db.clone();
            let registry = self.registry.clone();
            let config = self.config.clone();

            in_flight.spawn(async move {
                let _permit = permit;
                execute(&db, &registry, &config, job).await;
            });
        }

        Ok(())
    }

    async fn rescue(&self) -> Result<(), DbErr> {
        let now = Utc::now();
        let stale_before = now - chrono::Duration::seconds(self.config.rescue_after_secs as i64);
        let rescued = JobQueue::new(&self.db).rescue(stale_before, now).await?;
        if rescued > 0 {
            warn!(rescued, "Returned abandoned jobs to the queue");
        }
        Ok(())
    }
}

async fn drain(in_flight: &mut JoinSet<()>) {
    while in_flight.join_next().await.is_some() {}
}

async fn execute(
    db: &DatabaseConnection,
    registry: &JobRegistry,
    config: &JobsAppConfig,
    job: job::Model,
) {
    let queue = JobQueue::new(db);

    let Some(worker) = registry.get(&job.kind) else {
        warn!(job_id = job.id, kind = %job.kind, "No worker registered for job kind, discarding");
        if let Err(e) = queue.discard(job.id, Utc::now()).await {
            error!(job_id = job.id, error = %e, "Failed to discard job");
        }
        return;
    };

    match worker.run(db, job.args.clone()).await {
        Ok(()) => {
            if let Err(e) = queue.complete(job.id, Utc::now()).await {
                error!(job_id = job.id, error = %e, "Failed to mark job completed");
                return;
            }
            info!(job_id = job.id, kind = %job.kind, attempt = job.attempt, "Job completed");
        }
        Err(err) => {
            let retry_in = calculate_backoff(job.attempt, config.base_delay_ms, config.max_delay_ms);
            match queue
                .fail(&job, &format!("{err:#}"), retry_in, Utc::now())
                .await
            {
                Ok(JobState::Discarded) => error!(
                    job_id = job.id,
                    kind = %job.kind,
                    attempt = job.attempt,
                    error = %err,
                    "Job failed on its last attempt, discarded"
                ),
                Ok(_) => warn!(
                    job_id = job.id,
                    kind = %job.kind,
                    attempt = job.attempt,
                    retry_in_ms = retry_in.as_millis() as u64,
                    error = %err,
                    "Job failed, scheduled for retry"
                ),
                Err(e) => error!(job_id = job.id, error = %e, "Failed to record job failure"),
            }
        }
    }
}
