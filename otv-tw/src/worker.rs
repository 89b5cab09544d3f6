//! Translation worker loop
//!
//! Pulls jobs from the translation queue, runs the provider calls for name
//! and description concurrently, persists the result with find-or-create,
//! and releases the enqueue lock on every exit path. Failures are handed
//! back to the queue, whose backoff policy schedules further attempts until
//! the job dead-letters.
//!
//! Lock release on failure is deliberate: a fresh catalog request during the
//! retry window may re-enqueue the same key, producing a duplicate job that
//! find-or-create absorbs. That costs an extra provider call at worst, and
//! keeps a permanently failing key from blocking retries forever.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use otv_common::cache::{translation_key, translation_lock_key, Cache, TRANSLATION_CACHE_TTL};
use otv_common::db::translations::TranslationStore;
use otv_common::queue::{DeliveredJob, FailureOutcome, RedisJobQueue};
use otv_common::types::{Translation, TranslationBlock, TranslationJob};
use otv_common::Result;

use crate::provider::TranslationProvider;

/// How long one blocking queue poll waits before the loop re-checks for
/// shutdown.
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Pause after a queue transport error, so a dead Redis does not spin the
/// loop hot.
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Long-running queue consumer.
pub struct Worker {
    queue: RedisJobQueue,
    store: Arc<dyn TranslationStore>,
    cache: Arc<dyn Cache>,
    provider: Arc<dyn TranslationProvider>,
}

impl Worker {
    pub fn new(
        queue: RedisJobQueue,
        store: Arc<dyn TranslationStore>,
        cache: Arc<dyn Cache>,
        provider: Arc<dyn TranslationProvider>,
    ) -> Self {
        Self {
            queue,
            store,
            cache,
            provider,
        }
    }

    /// Consume jobs until `shutdown` flips to true.
    ///
    /// A job already being processed is finished before the loop exits; only
    /// the idle wait is interruptible.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            queue = %self.queue.config().name,
            "Worker started, waiting for translation jobs"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Worker shutting down");
                        break;
                    }
                }
                next = self.queue.next_job(POLL_INTERVAL) => {
                    match next {
                        Ok(Some(delivered)) => self.handle_delivery(delivered).await,
                        Ok(None) => {}
                        Err(e) => {
                            error!(error = %e, "Failed to poll queue");
                            tokio::time::sleep(ERROR_BACKOFF).await;
                        }
                    }
                }
            }
        }
    }

    async fn handle_delivery(&self, delivered: DeliveredJob) {
        let job = &delivered.job;
        info!(
            job_id = %job.id,
            attempt = job.attempts_made + 1,
            kind = %job.payload.item_kind,
            item_id = job.payload.item_id,
            lang = %job.payload.language_code,
            "Processing translation job"
        );

        match process_job(
            &job.payload,
            self.provider.as_ref(),
            self.store.as_ref(),
            self.cache.as_ref(),
        )
        .await
        {
            Ok(created) => {
                if created {
                    info!(job_id = %job.id, "Translation saved");
                } else {
                    info!(job_id = %job.id, "Translation already existed, no new entry created");
                }
                if let Err(e) = self.queue.ack(&delivered).await {
                    error!(job_id = %job.id, error = %e, "Failed to ack completed job");
                }
            }
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Translation job failed");
                match self.queue.fail(&delivered, &e.to_string()).await {
                    Ok(FailureOutcome::Retry { attempt, delay }) => {
                        info!(
                            job_id = %job.id,
                            attempt,
                            delay_s = delay.as_secs(),
                            "Job will be retried"
                        );
                    }
                    Ok(FailureOutcome::DeadLettered) => {
                        error!(job_id = %job.id, "Job dead-lettered");
                    }
                    Err(e) => {
                        error!(job_id = %job.id, error = %e, "Failed to report job failure");
                    }
                }
            }
        }
    }
}

/// Process one translation job.
///
/// Returns whether a new translation row was created. The enqueue lock for
/// the job's key is released before returning, success or failure, so a
/// future catalog request can always trigger a fresh attempt.
pub async fn process_job(
    job: &TranslationJob,
    provider: &dyn TranslationProvider,
    store: &dyn TranslationStore,
    cache: &dyn Cache,
) -> Result<bool> {
    let result = translate_and_persist(job, provider, store, cache).await;

    let lock_key = translation_lock_key(job.item_kind, job.item_id, &job.language_code);
    if let Err(e) = cache.delete(&lock_key).await {
        // The lock TTL still bounds the damage; nothing else to do here.
        warn!(lock_key, error = %e, "Failed to release translation lock");
    }

    result
}

async fn translate_and_persist(
    job: &TranslationJob,
    provider: &dyn TranslationProvider,
    store: &dyn TranslationStore,
    cache: &dyn Cache,
) -> Result<bool> {
    // Name and description are independent; translate them concurrently.
    let (translated_name, translated_description) = tokio::try_join!(
        provider.translate(&job.original_name, &job.language_code),
        provider.translate(&job.original_description, &job.language_code),
    )?;

    let (stored, created) = store
        .find_or_create(Translation {
            item_kind: job.item_kind,
            item_id: job.item_id,
            language_code: job.language_code.clone(),
            translated_name,
            translated_description,
        })
        .await?;

    warm_cache(&stored, cache).await;

    Ok(created)
}

/// Populate the result cache so the next read skips the store. Best effort;
/// the durable row is already in place.
async fn warm_cache(translation: &Translation, cache: &dyn Cache) {
    let key = translation_key(
        translation.item_kind,
        translation.item_id,
        &translation.language_code,
    );
    let block = TranslationBlock::completed(
        &translation.language_code,
        translation.translated_name.clone(),
        translation.translated_description.clone(),
    );
    let payload = match serde_json::to_string(&block) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(key, error = %e, "Failed to serialize cache payload");
            return;
        }
    };
    if let Err(e) = cache.set(&key, &payload, TRANSLATION_CACHE_TTL).await {
        warn!(key, error = %e, "Failed to warm translation cache");
    }
}
