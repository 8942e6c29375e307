//! Database-backed background jobs.
//!
//! Jobs are rows in the `job` table. [`JobClient::insert_tx`] writes them
//! through the caller's transaction, so a job exists only if the write that
//! triggered it commits. [`runner::JobRunner`] claims due rows, runs the worker
//! registered for their kind and records the outcome. Execution is
//! at-least-once: workers must tolerate running twice.

pub mod points_granter;
pub mod queue;
pub mod runner;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::JobArgs;
use common::config::JobsAppConfig;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr};

use crate::entity::job;
use queue::JobQueue;

/// Handle for enqueuing jobs, carried in the request context.
#[derive(Debug, Clone)]
pub struct JobClient {
    max_attempts: i32,
}

impl JobClient {
    pub fn new(config: &JobsAppConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
        }
    }

    /// Enqueue `args` through `conn`, normally the triggering write's transaction.
    pub async fn insert_tx<C: ConnectionTrait, A: JobArgs>(
        &self,
        conn: &C,
        args: &A,
    ) -> Result<job::Model, DbErr> {
        JobQueue::new(conn)
            .insert(args, self.max_attempts, Utc::now())
            .await
    }
}

/// Typed job handler.
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    type Args: JobArgs;

    async fn work(&self, db: &DatabaseConnection, args: Self::Args) -> anyhow::Result<()>;
}

/// A [`Worker`] with its argument type erased, as stored in the registry.
#[async_trait]
pub trait ErasedWorker: Send + Sync {
    async fn run(&self, db: &DatabaseConnection, args: serde_json::Value) -> anyhow::Result<()>;
}

#[async_trait]
impl<W: Worker> ErasedWorker for W {
    async fn run(&self, db: &DatabaseConnection, args: serde_json::Value) -> anyhow::Result<()> {
        let args: W::Args = serde_json::from_value(args)?;
        self.work(db, args).await
    }
}

/// Workers by job kind.
#[derive(Default, Clone)]
pub struct JobRegistry {
    workers: HashMap<&'static str, Arc<dyn ErasedWorker>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<W: Worker>(mut self, worker: W) -> Self {
        self.workers.insert(W::Args::KIND, Arc::new(worker));
        self
    }

    pub fn get(&self, kind: &str) -> Option<Arc<dyn ErasedWorker>> {
        self.workers.get(kind).cloned()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.workers.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }
}

/// Registry with every worker this server runs.
pub fn default_registry() -> JobRegistry {
    JobRegistry::new().register(points_granter::PointsGranter)
}
