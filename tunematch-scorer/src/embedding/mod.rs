//! Embedding Provider seam
//!
//! The model that turns descriptive text into vectors runs outside this
//! process. Scoring components only see the [`EmbeddingProvider`] trait; the
//! binary constructs one [`HttpEmbeddingClient`] and hands it out as an
//! `Arc<dyn EmbeddingProvider>`.
//!
//! Contract every provider honors:
//! - identical (text, model) inputs produce identical vectors
//! - output length equals [`ModelVariant::dimension`]
//! - empty or whitespace-only text yields an all-zero vector without any
//!   call to the model

pub mod http_client;

pub use http_client::HttpEmbeddingClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tunematch_common::ModelVariant;

/// Embedding provider errors
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// Per-call timeout elapsed
    #[error("Embedding request timed out")]
    Timeout,

    /// Embedding service returned an error response
    #[error("API error {0}: {1}")]
    Api(u16, String),

    /// Failed to parse the service response
    #[error("Parse error: {0}")]
    Parse(String),

    /// Service returned a vector of the wrong length for the requested variant
    #[error("Model {model} returned {actual}-d vector, expected {expected}-d")]
    UnexpectedDimension {
        model: ModelVariant,
        expected: usize,
        actual: usize,
    },
}

impl EmbeddingError {
    /// Worth retrying: the same request may succeed later
    pub fn is_transient(&self) -> bool {
        match self {
            EmbeddingError::Network(_) | EmbeddingError::Timeout => true,
            EmbeddingError::Api(status, _) => *status >= 500,
            EmbeddingError::Parse(_) | EmbeddingError::UnexpectedDimension { .. } => false,
        }
    }
}

/// Vector representation of one text under one model variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub model: ModelVariant,
}

impl Embedding {
    pub fn new(vector: Vec<f32>, model: ModelVariant) -> Self {
        Self { vector, model }
    }

    /// All-zero vector standing for "no source text"
    pub fn zeros(model: ModelVariant) -> Self {
        Self {
            vector: vec![0.0; model.dimension()],
            model,
        }
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }

    pub fn is_zero(&self) -> bool {
        self.vector.iter().all(|v| *v == 0.0)
    }
}

/// True when `text` carries nothing worth embedding
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Text embedding service
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider identifier for logs
    fn name(&self) -> &'static str;

    /// Embed one text
    async fn embed(&self, text: &str, model: ModelVariant) -> Result<Embedding, EmbeddingError>;

    /// Embed several texts, preserving order
    ///
    /// The default issues one [`embed`](Self::embed) per text; providers with a
    /// batch endpoint override it.
    async fn embed_batch(
        &self,
        texts: &[String],
        model: ModelVariant,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text, model).await?);
        }
        Ok(embeddings)
    }
}
