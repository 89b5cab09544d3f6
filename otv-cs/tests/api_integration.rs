//! Integration tests for the OmniverseTV Catalog Service API
//!
//! Drives the real router, catalog and translation store over in-memory
//! SQLite; cache and queue are in-memory doubles so no Redis is required.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use otv_common::cache::Cache;
use otv_common::db;
use otv_common::db::translations::{SqliteTranslationStore, TranslationStore};
use otv_common::queue::JobQueue;
use otv_common::types::{ItemKind, Translation, TranslationJob};
use otv_common::Result;

use otv_cs::api::{create_router, AppState};
use otv_cs::db::catalog::SqliteCatalog;
use otv_cs::seed::seed_catalog;
use otv_cs::translation::TranslationOrchestrator;

#[derive(Default)]
struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Duration)>>,
}

impl MemoryCache {
    fn ttl_of(&self, key: &str) -> Option<Duration> {
        self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(key)
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), ttl));
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        if entries.contains_key(key) {
            Ok(false)
        } else {
            entries.insert(key.to_string(), (value.to_string(), ttl));
            Ok(true)
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[derive(Default)]
struct MemoryQueue {
    jobs: Mutex<Vec<TranslationJob>>,
    enqueue_calls: AtomicUsize,
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn enqueue(&self, job: TranslationJob) -> Result<()> {
        self.enqueue_calls.fetch_add(1, Ordering::SeqCst);
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

struct TestApp {
    router: axum::Router,
    store: SqliteTranslationStore,
    cache: Arc<MemoryCache>,
    queue: Arc<MemoryQueue>,
}

/// Test helper to create a test server over a seeded in-memory catalog
async fn setup_test_app() -> TestApp {
    let pool = db::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    db::bootstrap_schema(&pool)
        .await
        .expect("Failed to bootstrap schema");
    seed_catalog(&pool).await.expect("Failed to seed catalog");

    let cache = Arc::new(MemoryCache::default());
    let queue = Arc::new(MemoryQueue::default());
    let store = SqliteTranslationStore::new(pool.clone());

    let orchestrator = Arc::new(TranslationOrchestrator::new(
        Arc::new(SqliteCatalog::new(pool)),
        cache.clone(),
        Arc::new(store.clone()),
        queue.clone(),
    ));

    TestApp {
        router: create_router(AppState { orchestrator }),
        store,
        cache,
        queue,
    }
}

/// Helper to GET a path and decode the JSON body
async fn get_json(router: &axum::Router, path: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_reports_module() {
    let app = setup_test_app().await;

    let (status, body) = get_json(&app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "catalog_service");
}

#[tokio::test]
async fn package_read_without_language_has_no_translation_block() {
    let app = setup_test_app().await;

    let (status, body) = get_json(&app.router, "/catalog/package/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Cosmic Comedy Central");
    assert_eq!(body["kind"], "package");
    assert!(body["price"].is_number());
    assert!(body.get("translation").is_none());
    assert_eq!(app.queue.enqueue_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn channel_read_carries_dimension_origin() {
    let app = setup_test_app().await;

    let (status, body) = get_json(&app.router, "/catalog/channel/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Quantum News 24");
    assert_eq!(body["dimension_origin"], "Dimension Q-42");
    assert!(body.get("price").is_none());
}

#[tokio::test]
async fn plural_kind_segments_are_accepted() {
    let app = setup_test_app().await;

    let (status, body) = get_json(&app.router, "/catalog/packages/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Basic Multiverse Bundle");
}

#[tokio::test]
async fn missing_item_returns_404() {
    let app = setup_test_app().await;

    let (status, body) = get_json(&app.router, "/catalog/package/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn unknown_kind_returns_400() {
    let app = setup_test_app().await;

    let (status, body) = get_json(&app.router, "/catalog/movie/1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn first_translated_read_is_pending_and_enqueues_once() {
    let app = setup_test_app().await;

    let (status, body) = get_json(&app.router, "/catalog/package/2?lang=fr").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["translation"]["status"], "pending");
    assert_eq!(body["translation"]["languageCode"], "fr");
    assert!(body["translation"]["message"]
        .as_str()
        .unwrap()
        .contains("français"));

    // Polling again does not enqueue a duplicate
    let (_, body) = get_json(&app.router, "/catalog/package/2?lang=fr").await;
    assert_eq!(body["translation"]["status"], "pending");

    assert_eq!(app.queue.enqueue_calls.load(Ordering::SeqCst), 1);
    let jobs = app.queue.jobs.lock().unwrap();
    assert_eq!(jobs[0].item_kind, ItemKind::Package);
    assert_eq!(jobs[0].item_id, 2);
    assert_eq!(jobs[0].original_name, "Cosmic Comedy Central");
}

#[tokio::test]
async fn persisted_translation_is_served_completed_and_warms_cache() {
    let app = setup_test_app().await;

    app.store
        .find_or_create(Translation {
            item_kind: ItemKind::Package,
            item_id: 2,
            language_code: "fr".to_string(),
            translated_name: "Central Comique Cosmique".to_string(),
            translated_description: "Le meilleur de la comédie multiverselle".to_string(),
        })
        .await
        .unwrap();

    let (status, body) = get_json(&app.router, "/catalog/package/2?lang=fr").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["translation"]["status"], "completed");
    assert_eq!(body["translation"]["name"], "Central Comique Cosmique");
    assert_eq!(body["name"], "Cosmic Comedy Central");

    // Write-through warm with the fixed result TTL
    let ttl = app
        .cache
        .ttl_of("translation:package:2:fr")
        .expect("Cache should have been warmed");
    assert_eq!(ttl, Duration::from_secs(3600));

    assert_eq!(app.queue.enqueue_calls.load(Ordering::SeqCst), 0);
}
