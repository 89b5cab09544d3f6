//! Redis-backed translation job queue
//!
//! At-least-once delivery with bounded attempts and exponential backoff.
//! One queue is four Redis keys:
//!
//! - `{name}:pending` — list of jobs ready to run (LPUSH / BLMOVE)
//! - `{name}:processing` — jobs currently held by a worker
//! - `{name}:delayed` — sorted set of failed jobs waiting out their backoff,
//!   scored by due time in unix milliseconds
//! - `{name}:dead` — jobs that exhausted their attempts, kept for operators
//!
//! Delivery moves a job atomically from `pending` to `processing` (BLMOVE),
//! so a worker crash leaves the job parked in `processing` rather than lost.
//! Workers acknowledge with [`RedisJobQueue::ack`] or hand the job back with
//! [`RedisJobQueue::fail`], which either schedules a retry or dead-letters.
//!
//! The queue promises at-least-once, not exactly-once: a redelivered job can
//! reach the worker twice, which downstream persistence absorbs with
//! find-or-create semantics.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::TranslationJob;

/// Name of the translation queue shared by producer and workers.
pub const TRANSLATION_QUEUE_NAME: &str = "translations_queue";

/// Per-queue delivery tuning.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Base queue name; storage keys are derived from it.
    pub name: String,
    /// Total attempts a job gets before it is dead-lettered.
    pub max_attempts: u32,
    /// Backoff delay after the first failed attempt; doubles per attempt.
    pub backoff_base: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: TRANSLATION_QUEUE_NAME.to_string(),
            max_attempts: 3,
            backoff_base: Duration::from_secs(5),
        }
    }
}

/// Backoff before attempt `attempts_made + 1`, doubling per failed attempt.
pub fn backoff_delay(base: Duration, attempts_made: u32) -> Duration {
    base * 2u32.saturating_pow(attempts_made.saturating_sub(1))
}

/// A job as stored on the queue: the payload plus delivery bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedJob {
    pub id: Uuid,
    /// Attempts that have already run and failed.
    pub attempts_made: u32,
    pub enqueued_at: DateTime<Utc>,
    pub payload: TranslationJob,
}

/// A job handed to a worker, retaining the exact serialized form so it can
/// be removed from the processing list on ack/fail.
#[derive(Debug)]
pub struct DeliveredJob {
    pub job: QueuedJob,
    raw: String,
}

/// Outcome of [`RedisJobQueue::fail`].
#[derive(Debug, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Another attempt was scheduled after `delay`.
    Retry { attempt: u32, delay: Duration },
    /// Attempts exhausted; job moved to the dead-letter list.
    DeadLettered,
}

/// Producer-side queue contract.
///
/// The request path only ever enqueues; the consumer loop lives in the
/// worker binary against the concrete queue.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Append one job to the queue.
    async fn enqueue(&self, job: TranslationJob) -> Result<()>;
}

fn queue_err(err: redis::RedisError) -> Error {
    Error::Queue(err.to_string())
}

/// Redis implementation of the translation job queue.
#[derive(Clone)]
pub struct RedisJobQueue {
    conn: ConnectionManager,
    config: QueueConfig,
}

impl RedisJobQueue {
    /// Connect to Redis at `url` with the given queue configuration.
    pub async fn connect(url: &str, config: QueueConfig) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| Error::Queue(format!("Invalid Redis URL: {}", e)))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::Queue(format!("Failed to connect to Redis: {}", e)))?;
        Ok(Self { conn, config })
    }

    /// Build a queue around an existing connection (shared with the cache).
    pub fn from_connection(conn: ConnectionManager, config: QueueConfig) -> Self {
        Self { conn, config }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    fn pending_key(&self) -> String {
        format!("{}:pending", self.config.name)
    }

    fn processing_key(&self) -> String {
        format!("{}:processing", self.config.name)
    }

    fn delayed_key(&self) -> String {
        format!("{}:delayed", self.config.name)
    }

    fn dead_key(&self) -> String {
        format!("{}:dead", self.config.name)
    }

    /// Move jobs whose backoff has elapsed back onto the pending list.
    ///
    /// ZREM is the claim: with several workers promoting concurrently, only
    /// the one that actually removed the member re-enqueues it.
    pub async fn promote_due(&self) -> Result<u32> {
        let mut conn = self.conn.clone();
        let now = Utc::now().timestamp_millis();

        let due: Vec<String> = redis::cmd("ZRANGEBYSCORE")
            .arg(self.delayed_key())
            .arg("-inf")
            .arg(now)
            .query_async(&mut conn)
            .await
            .map_err(queue_err)?;

        let mut promoted = 0;
        for raw in due {
            let removed: u32 = redis::cmd("ZREM")
                .arg(self.delayed_key())
                .arg(&raw)
                .query_async(&mut conn)
                .await
                .map_err(queue_err)?;
            if removed > 0 {
                let _: () = redis::cmd("LPUSH")
                    .arg(self.pending_key())
                    .arg(&raw)
                    .query_async(&mut conn)
                    .await
                    .map_err(queue_err)?;
                promoted += 1;
            }
        }

        if promoted > 0 {
            debug!(promoted, queue = %self.config.name, "Promoted delayed jobs");
        }
        Ok(promoted)
    }

    /// Block up to `block_for` waiting for the next job.
    ///
    /// Returns `None` when the wait timed out. A payload that no longer
    /// deserializes is dead-lettered immediately rather than poisoning the
    /// worker loop.
    pub async fn next_job(&self, block_for: Duration) -> Result<Option<DeliveredJob>> {
        self.promote_due().await?;

        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("BLMOVE")
            .arg(self.pending_key())
            .arg(self.processing_key())
            .arg("RIGHT")
            .arg("LEFT")
            .arg(block_for.as_secs_f64())
            .query_async(&mut conn)
            .await
            .map_err(queue_err)?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str::<QueuedJob>(&raw) {
            Ok(job) => Ok(Some(DeliveredJob { job, raw })),
            Err(e) => {
                warn!(error = %e, "Dead-lettering undecodable job payload");
                self.remove_from_processing(&raw).await?;
                let _: () = redis::cmd("LPUSH")
                    .arg(self.dead_key())
                    .arg(&raw)
                    .query_async(&mut conn)
                    .await
                    .map_err(queue_err)?;
                Ok(None)
            }
        }
    }

    /// Acknowledge successful processing: the job leaves the queue for good.
    pub async fn ack(&self, delivered: &DeliveredJob) -> Result<()> {
        self.remove_from_processing(&delivered.raw).await
    }

    /// Report failed processing.
    ///
    /// Schedules a retry with exponential backoff while attempts remain,
    /// otherwise moves the job to the dead-letter list.
    pub async fn fail(&self, delivered: &DeliveredJob, reason: &str) -> Result<FailureOutcome> {
        self.remove_from_processing(&delivered.raw).await?;

        let mut conn = self.conn.clone();
        let mut job = delivered.job.clone();
        job.attempts_made += 1;

        if job.attempts_made < self.config.max_attempts {
            let delay = backoff_delay(self.config.backoff_base, job.attempts_made);
            let due = Utc::now().timestamp_millis() + delay.as_millis() as i64;
            let raw = serde_json::to_string(&job)?;
            let _: () = redis::cmd("ZADD")
                .arg(self.delayed_key())
                .arg(due)
                .arg(&raw)
                .query_async(&mut conn)
                .await
                .map_err(queue_err)?;
            debug!(
                job_id = %job.id,
                attempt = job.attempts_made,
                delay_s = delay.as_secs(),
                reason,
                "Scheduled job retry"
            );
            Ok(FailureOutcome::Retry {
                attempt: job.attempts_made,
                delay,
            })
        } else {
            let raw = serde_json::to_string(&job)?;
            let _: () = redis::cmd("LPUSH")
                .arg(self.dead_key())
                .arg(&raw)
                .query_async(&mut conn)
                .await
                .map_err(queue_err)?;
            warn!(
                job_id = %job.id,
                attempts = job.attempts_made,
                reason,
                "Job exhausted attempts, moved to dead-letter list"
            );
            Ok(FailureOutcome::DeadLettered)
        }
    }

    async fn remove_from_processing(&self, raw: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("LREM")
            .arg(self.processing_key())
            .arg(1)
            .arg(raw)
            .query_async(&mut conn)
            .await
            .map_err(queue_err)?;
        Ok(())
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, job: TranslationJob) -> Result<()> {
        let queued = QueuedJob {
            id: Uuid::new_v4(),
            attempts_made: 0,
            enqueued_at: Utc::now(),
            payload: job,
        };
        let raw = serde_json::to_string(&queued)?;

        let mut conn = self.conn.clone();
        let _: () = redis::cmd("LPUSH")
            .arg(self.pending_key())
            .arg(&raw)
            .query_async(&mut conn)
            .await
            .map_err(queue_err)?;

        debug!(job_id = %queued.id, queue = %self.config.name, "Enqueued translation job");
        Ok(())
    }
}
