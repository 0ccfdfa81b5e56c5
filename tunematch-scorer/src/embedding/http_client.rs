//! HTTP client for the text embedding service
//!
//! Endpoints:
//! - `POST /embed` `{text, model_type}` -> `{embedding, model, dimensions}`
//! - `POST /embed/batch` `{texts, model_type}` -> `{embeddings, count, model}`
//! - `GET /health` -> `{status, models_loaded}`
//!
//! Concurrent requests are capped by a semaphore sized from
//! `embedding.max_in_flight`. Transient failures are retried with linear backoff.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};
use tunematch_common::config::EmbeddingConfig;
use tunematch_common::ModelVariant;

use super::{is_blank, Embedding, EmbeddingError, EmbeddingProvider};

const USER_AGENT: &str = "tunematch-scorer/0.1.0";
const RETRY_BACKOFF_MS: u64 = 250;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
    model_type: ModelVariant,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct EmbedBatchRequest<'a> {
    texts: Vec<&'a str>,
    model_type: ModelVariant,
}

#[derive(Debug, Deserialize)]
struct EmbedBatchResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedding service health report
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default)]
    pub models_loaded: bool,
}

/// Embedding provider backed by the vectorization HTTP service
pub struct HttpEmbeddingClient {
    http_client: reqwest::Client,
    base_url: String,
    in_flight: Arc<Semaphore>,
    retry_attempts: u32,
    retry_backoff: Duration,
}

impl HttpEmbeddingClient {
    /// Create client from embedding configuration
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| EmbeddingError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            in_flight: Arc::new(Semaphore::new(config.max_in_flight.max(1))),
            retry_attempts: config.retry_attempts,
            retry_backoff: Duration::from_millis(RETRY_BACKOFF_MS),
        })
    }

    /// Override the delay between retries (multiplied by the attempt number)
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query the service health endpoint
    pub async fn health(&self) -> Result<ServiceHealth, EmbeddingError> {
        let url = format!("{}/health", self.base_url);
        debug!(url = %url, "Checking embedding service health");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| EmbeddingError::Parse(format!("Failed to parse health response: {}", e)))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, EmbeddingError>
    where
        B: Serialize + Sync,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|_| EmbeddingError::Network("Embedding client is shut down".to_string()))?;

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| EmbeddingError::Parse(format!("Failed to parse {} response: {}", path, e)))
    }

    async fn with_retries<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, EmbeddingError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, EmbeddingError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.retry_attempts => {
                    attempt += 1;
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.retry_attempts,
                        error = %e,
                        "Embedding call failed, retrying"
                    );
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> EmbeddingError {
    if e.is_timeout() {
        EmbeddingError::Timeout
    } else {
        EmbeddingError::Network(e.to_string())
    }
}

fn check_dimension(vector: Vec<f32>, model: ModelVariant) -> Result<Embedding, EmbeddingError> {
    let expected = model.dimension();
    if vector.len() != expected {
        return Err(EmbeddingError::UnexpectedDimension {
            model,
            expected,
            actual: vector.len(),
        });
    }
    Ok(Embedding::new(vector, model))
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn embed(&self, text: &str, model: ModelVariant) -> Result<Embedding, EmbeddingError> {
        if is_blank(text) {
            return Ok(Embedding::zeros(model));
        }

        let request = EmbedRequest {
            text,
            model_type: model,
        };
        let response: EmbedResponse = self
            .with_retries("embed", || self.post_json("/embed", &request))
            .await?;

        debug!(model = %model, chars = text.len(), "Embedded text");
        check_dimension(response.embedding, model)
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        model: ModelVariant,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        let mut embeddings: Vec<Embedding> = texts.iter().map(|_| Embedding::zeros(model)).collect();

        let pending: Vec<usize> = (0..texts.len()).filter(|&i| !is_blank(&texts[i])).collect();
        if pending.is_empty() {
            return Ok(embeddings);
        }

        let request = EmbedBatchRequest {
            texts: pending.iter().map(|&i| texts[i].as_str()).collect(),
            model_type: model,
        };
        let response: EmbedBatchResponse = self
            .with_retries("embed_batch", || self.post_json("/embed/batch", &request))
            .await?;

        if response.embeddings.len() != pending.len() {
            return Err(EmbeddingError::Parse(format!(
                "Batch returned {} embeddings for {} texts",
                response.embeddings.len(),
                pending.len()
            )));
        }

        for (index, vector) in pending.into_iter().zip(response.embeddings) {
            embeddings[index] = check_dimension(vector, model)?;
        }

        debug!(model = %model, count = texts.len(), "Embedded batch");
        Ok(embeddings)
    }
}
