//! Worker job-processing tests
//!
//! Exercise `process_job` against the real translation store (in-memory
//! SQLite) with a scripted provider and an in-memory cache double. The
//! load-bearing property: the enqueue lock never survives job processing,
//! whatever the outcome.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use otv_common::cache::{translation_key, translation_lock_key, Cache};
use otv_common::db::translations::{SqliteTranslationStore, TranslationStore};
use otv_common::db::{bootstrap_schema, connect};
use otv_common::types::{ItemKind, TranslationJob};
use otv_common::{Error, Result};

use otv_tw::provider::TranslationProvider;
use otv_tw::worker::process_job;

#[derive(Default)]
struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    fn insert(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    fn value_of(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, _ttl: Duration) -> Result<()> {
        self.insert(key, value);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, _ttl: Duration) -> Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(key) {
            Ok(false)
        } else {
            entries.insert(key.to_string(), value.to_string());
            Ok(true)
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

enum ProviderMode {
    /// Translate by tagging the text with the target language.
    Succeed,
    /// Every call times out.
    Timeout,
    /// Every call is rejected by the provider.
    Reject,
    /// Only calls for this exact text fail.
    FailText(String),
}

struct ScriptedProvider {
    mode: ProviderMode,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(mode: ProviderMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TranslationProvider for ScriptedProvider {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            ProviderMode::Succeed => Ok(format!("{} [{}]", text, target_lang)),
            ProviderMode::Timeout => Err(Error::ProviderTimeout(10)),
            ProviderMode::Reject => Err(Error::ProviderResponse {
                status: 456,
                message: "Quota exceeded".to_string(),
            }),
            ProviderMode::FailText(bad) if bad == text => Err(Error::ProviderResponse {
                status: 400,
                message: "Unsupported text".to_string(),
            }),
            ProviderMode::FailText(_) => Ok(format!("{} [{}]", text, target_lang)),
        }
    }
}

async fn setup_store() -> SqliteTranslationStore {
    let pool = connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    bootstrap_schema(&pool)
        .await
        .expect("Failed to bootstrap schema");
    SqliteTranslationStore::new(pool)
}

fn job_for_package_seven() -> TranslationJob {
    TranslationJob {
        item_kind: ItemKind::Package,
        item_id: 7,
        language_code: "fr".to_string(),
        original_name: "Cosmic Comedy Central".to_string(),
        original_description: "The best of multiversal comedy".to_string(),
    }
}

/// Cache with the lock pre-set, as the orchestrator leaves it at enqueue.
fn cache_with_lock(job: &TranslationJob) -> MemoryCache {
    let cache = MemoryCache::default();
    cache.insert(
        &translation_lock_key(job.item_kind, job.item_id, &job.language_code),
        "1",
    );
    cache
}

#[tokio::test]
async fn successful_job_persists_translation_and_releases_lock() {
    let store = setup_store().await;
    let job = job_for_package_seven();
    let cache = cache_with_lock(&job);
    let provider = ScriptedProvider::new(ProviderMode::Succeed);

    let created = process_job(&job, &provider, &store, &cache).await.unwrap();
    assert!(created);

    let stored = store
        .find_translation(ItemKind::Package, 7, "fr")
        .await
        .unwrap()
        .expect("Translation should be persisted");
    assert_eq!(stored.translated_name, "Cosmic Comedy Central [fr]");
    assert_eq!(
        stored.translated_description,
        "The best of multiversal comedy [fr]"
    );

    // Both fields translated, lock gone, result cache warmed
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    assert!(!cache.contains(&translation_lock_key(ItemKind::Package, 7, "fr")));
    let warmed = cache
        .value_of(&translation_key(ItemKind::Package, 7, "fr"))
        .expect("Result cache should be warmed");
    assert!(warmed.contains("completed"));
}

#[tokio::test]
async fn provider_rejection_releases_lock_and_writes_nothing() {
    let store = setup_store().await;
    let job = job_for_package_seven();
    let cache = cache_with_lock(&job);
    let provider = ScriptedProvider::new(ProviderMode::Reject);

    let err = process_job(&job, &provider, &store, &cache)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ProviderResponse { status: 456, .. }));

    assert!(store
        .find_translation(ItemKind::Package, 7, "fr")
        .await
        .unwrap()
        .is_none());
    assert!(!cache.contains(&translation_lock_key(ItemKind::Package, 7, "fr")));
    assert!(!cache.contains(&translation_key(ItemKind::Package, 7, "fr")));
}

#[tokio::test]
async fn provider_timeout_is_distinguishable_and_releases_lock() {
    let store = setup_store().await;
    let job = job_for_package_seven();
    let cache = cache_with_lock(&job);
    let provider = ScriptedProvider::new(ProviderMode::Timeout);

    let err = process_job(&job, &provider, &store, &cache)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ProviderTimeout(_)));
    assert!(!cache.contains(&translation_lock_key(ItemKind::Package, 7, "fr")));
}

#[tokio::test]
async fn partial_provider_failure_writes_nothing() {
    let store = setup_store().await;
    let job = job_for_package_seven();
    let cache = cache_with_lock(&job);
    // Name succeeds, description fails
    let provider = ScriptedProvider::new(ProviderMode::FailText(
        "The best of multiversal comedy".to_string(),
    ));

    let result = process_job(&job, &provider, &store, &cache).await;
    assert!(result.is_err());

    assert!(store
        .find_translation(ItemKind::Package, 7, "fr")
        .await
        .unwrap()
        .is_none());
    assert!(!cache.contains(&translation_lock_key(ItemKind::Package, 7, "fr")));
}

#[tokio::test]
async fn redelivered_job_is_idempotent() {
    let store = setup_store().await;
    let job = job_for_package_seven();
    let cache = cache_with_lock(&job);
    let provider = ScriptedProvider::new(ProviderMode::Succeed);

    let created_first = process_job(&job, &provider, &store, &cache).await.unwrap();
    let created_second = process_job(&job, &provider, &store, &cache).await.unwrap();

    assert!(created_first);
    assert!(!created_second);

    let stored = store
        .find_translation(ItemKind::Package, 7, "fr")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.translated_name, "Cosmic Comedy Central [fr]");
}
