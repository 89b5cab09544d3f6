//! DeepL translation client
//!
//! Thin wrapper over the DeepL v2 translate endpoint. The client enforces a
//! hard deadline of its own (cancellation via `tokio::time::timeout`) so a
//! hung provider cannot stall a worker, and it never retries — retry policy
//! belongs to the queue, and stacking a second retry loop here would
//! compound backoff.

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

use otv_common::{Error, Result};

/// Hard deadline for a single translate call.
const REQUEST_DEADLINE: Duration = Duration::from_secs(10);

/// Translation provider contract used by the worker.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translate `text` into `target_lang`, returning the translated text.
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String>;
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    text: [&'a str; 1],
    target_lang: &'a str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    translations: Vec<TranslatedText>,
}

#[derive(Deserialize)]
struct TranslatedText {
    text: String,
}

/// Error body DeepL returns alongside non-success statuses.
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// DeepL API client.
pub struct DeepLClient {
    http_client: Client,
    api_url: String,
    api_key: String,
    deadline: Duration,
}

impl DeepLClient {
    /// Create a client against `api_url` authenticating with `api_key`.
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            http_client: Client::new(),
            api_url,
            api_key,
            deadline: REQUEST_DEADLINE,
        }
    }

    /// Override the request deadline (tests use short ones).
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

#[async_trait]
impl TranslationProvider for DeepLClient {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        debug!(target_lang, chars = text.len(), "Requesting translation");

        let request = self
            .http_client
            .post(&self.api_url)
            .header(AUTHORIZATION, format!("DeepL-Auth-Key {}", self.api_key))
            .json(&TranslateRequest {
                text: [text],
                target_lang,
            })
            .send();

        let response = timeout(self.deadline, request)
            .await
            .map_err(|_| Error::ProviderTimeout(self.deadline.as_secs()))?
            .map_err(|e| Error::ProviderResponse {
                // Status 0 marks transport-level failures (DNS, refused
                // connection) that never produced an HTTP status.
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                });
            return Err(Error::ProviderResponse {
                status: status.as_u16(),
                message,
            });
        }

        let body: TranslateResponse =
            response
                .json()
                .await
                .map_err(|e| Error::ProviderResponse {
                    status: status.as_u16(),
                    message: format!("Malformed response body: {}", e),
                })?;

        body.translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| Error::ProviderResponse {
                status: status.as_u16(),
                message: "Response contained no translations".to_string(),
            })
    }
}
