//! Translation orchestrator
//!
//! Decides, per catalog read, whether a requested translation is served
//! from cache, from the durable store, or produced asynchronously:
//!
//! 1. Cache lookup — a hit returns immediately and touches nothing else.
//! 2. Store lookup — a hit is written through to the cache and returned.
//! 3. Lock-guarded enqueue — SET NX on the lock key decides which of any
//!    number of concurrent callers enqueues the single translation job;
//!    everyone gets a `pending` response and polls.
//!
//! The orchestrator never waits on the worker and never reports a
//! translation failure; a key that cannot be translated stays `pending`
//! until the job dead-letters and the lock expires.
//!
//! Failure policy: cache reads degrade to misses (translation still gets
//! produced, just slower), while lock writes and enqueues propagate —
//! pretending a lock write worked would either duplicate jobs or strand
//! the key with no job in flight.

use std::sync::Arc;

use tracing::{debug, info, warn};

use otv_common::cache::{
    translation_key, translation_lock_key, Cache, TRANSLATION_CACHE_TTL, TRANSLATION_LOCK_TTL,
};
use otv_common::db::translations::TranslationStore;
use otv_common::localization::pending_message;
use otv_common::queue::JobQueue;
use otv_common::types::{
    ItemKind, TranslatedItemView, TranslationBlock, TranslationJob,
};
use otv_common::{Error, Result};

use crate::db::catalog::CatalogLookup;

/// Value stored under the lock key; only its existence matters.
const LOCK_MARKER: &str = "1";

/// Coordinates catalog reads with the translation cache, store and queue.
///
/// All collaborators are injected, so tests can substitute doubles and
/// assert on interaction counts.
pub struct TranslationOrchestrator {
    catalog: Arc<dyn CatalogLookup>,
    cache: Arc<dyn Cache>,
    store: Arc<dyn TranslationStore>,
    queue: Arc<dyn JobQueue>,
}

impl TranslationOrchestrator {
    pub fn new(
        catalog: Arc<dyn CatalogLookup>,
        cache: Arc<dyn Cache>,
        store: Arc<dyn TranslationStore>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            catalog,
            cache,
            store,
            queue,
        }
    }

    /// Resolve a catalog item, optionally with its translation state.
    ///
    /// Without a language code this is a plain catalog lookup. With one, the
    /// response carries a `translation` block that is either `completed` or
    /// `pending`; the first caller to reach an untranslated key also
    /// enqueues the job that will eventually complete it.
    pub async fn resolve_translated_item(
        &self,
        kind: ItemKind,
        item_id: i64,
        language_code: Option<&str>,
    ) -> Result<TranslatedItemView> {
        let item = self
            .catalog
            .find_item(kind, item_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("{} with ID {} not found", kind, item_id)))?;

        let Some(lang) = language_code else {
            return Ok(TranslatedItemView {
                item,
                translation: None,
            });
        };

        // 1. Cache
        if let Some(block) = self.cached_translation(kind, item_id, lang).await {
            debug!(kind = %kind, item_id, lang, "Translation cache hit");
            return Ok(TranslatedItemView {
                item,
                translation: Some(block),
            });
        }

        // 2. Durable store
        if let Some(translation) = self.store.find_translation(kind, item_id, lang).await? {
            debug!(kind = %kind, item_id, lang, "Translation store hit");
            let block = TranslationBlock::completed(
                lang,
                translation.translated_name,
                translation.translated_description,
            );
            self.warm_cache(kind, item_id, lang, &block).await;
            return Ok(TranslatedItemView {
                item,
                translation: Some(block),
            });
        }

        // 3. Lock-guarded enqueue
        let lock_key = translation_lock_key(kind, item_id, lang);
        let acquired = self
            .cache
            .set_if_absent(&lock_key, LOCK_MARKER, TRANSLATION_LOCK_TTL)
            .await?;

        if acquired {
            info!(kind = %kind, item_id, lang, "Enqueueing translation job");
            self.queue
                .enqueue(TranslationJob {
                    item_kind: kind,
                    item_id,
                    language_code: lang.to_string(),
                    original_name: item.name.clone(),
                    original_description: item.description.clone(),
                })
                .await?;
        } else {
            debug!(kind = %kind, item_id, lang, "Translation already in flight");
        }

        Ok(TranslatedItemView {
            item,
            translation: Some(TranslationBlock::pending(
                lang,
                pending_message(lang).to_string(),
            )),
        })
    }

    /// Cache lookup that treats every failure mode as a miss.
    async fn cached_translation(
        &self,
        kind: ItemKind,
        item_id: i64,
        lang: &str,
    ) -> Option<TranslationBlock> {
        let key = translation_key(kind, item_id, lang);
        match self.cache.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<TranslationBlock>(&raw) {
                Ok(block) => Some(block),
                Err(e) => {
                    warn!(key, error = %e, "Corrupt cache payload, treating as miss");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Write-through warm after a store hit. Best effort: the response is
    /// already in hand, so a failed warm only costs the next reader a store
    /// lookup.
    async fn warm_cache(&self, kind: ItemKind, item_id: i64, lang: &str, block: &TranslationBlock) {
        let key = translation_key(kind, item_id, lang);
        let payload = match serde_json::to_string(block) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize cache payload");
                return;
            }
        };
        if let Err(e) = self.cache.set(&key, &payload, TRANSLATION_CACHE_TTL).await {
            warn!(key, error = %e, "Failed to warm translation cache");
        }
    }
}
