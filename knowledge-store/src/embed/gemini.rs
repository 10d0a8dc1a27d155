//! Gemini embedding provider implementation.
//!
//! Talks to the Generative Language API (`embedContent` and
//! `batchEmbedContents`) via `reqwest::Client`.

use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::StoreFuture;
use crate::config::Config;
use crate::embed::EmbeddingsProvider;
use crate::errors::StoreError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini embedding provider (async).
#[derive(Clone)]
pub struct GeminiEmbedder {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    /// Expected embedding dimension, when configured.
    dim: Option<usize>,
}

impl GeminiEmbedder {
    /// Construct a new embedder from configuration.
    pub fn new(cfg: &Config) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| StoreError::Provider(format!("http client build: {e}")))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.into(),
            api_key: cfg.api_key.clone(),
            model: cfg.embedding_model.clone(),
            dim: cfg.embedding_dim,
        })
    }

    /// Point the embedder at a non-default API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn key(&self) -> Result<&str, StoreError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| StoreError::Provider("GOOGLE_API_KEY is not set".into()))
    }

    fn check_dim(&self, values: &[f32]) -> Result<(), StoreError> {
        if let Some(want) = self.dim {
            if values.len() != want {
                return Err(StoreError::VectorSizeMismatch {
                    got: values.len(),
                    want,
                });
            }
        }
        Ok(())
    }

    async fn post_embed<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<R, StoreError> {
        let url = format!(
            "{}/v1beta/models/{}:{endpoint}",
            self.base_url, self.model
        );

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.key()?)
            .json(body)
            .send()
            .await
            .map_err(|e| StoreError::Provider(format!("POST {url}: {e}")))?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".into());
            return Err(StoreError::RateLimited(format!(
                "gemini quota exhausted: {body}"
            )));
        }
        if status != StatusCode::OK {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".into());
            return Err(StoreError::Provider(format!(
                "gemini embeddings non-200: {status}; body: {body}"
            )));
        }

        resp.json()
            .await
            .map_err(|e| StoreError::Provider(format!("parse embeddings json: {e}")))
    }
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Serialize)]
struct BatchEmbedContentsRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedContentsResponse {
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

impl<'a> EmbedContentRequest<'a> {
    fn new(model: &str, text: &'a str) -> Self {
        Self {
            model: format!("models/{model}"),
            content: Content {
                parts: vec![Part { text }],
            },
        }
    }
}

impl EmbeddingsProvider for GeminiEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> StoreFuture<'a, Vec<f32>> {
        Box::pin(async move {
            let req = EmbedContentRequest::new(&self.model, text);
            let parsed: EmbedContentResponse = self.post_embed("embedContent", &req).await?;
            self.check_dim(&parsed.embedding.values)?;
            Ok(parsed.embedding.values)
        })
    }

    /// Uses the native `batchEmbedContents` endpoint: one request per
    /// batch keeps the request rate well under the provider quota.
    fn embed_batch<'a>(&'a self, texts: &'a [String]) -> StoreFuture<'a, Vec<Vec<f32>>> {
        Box::pin(async move {
            if texts.is_empty() {
                return Ok(Vec::new());
            }

            let req = BatchEmbedContentsRequest {
                requests: texts
                    .iter()
                    .map(|t| EmbedContentRequest::new(&self.model, t))
                    .collect(),
            };
            let parsed: BatchEmbedContentsResponse =
                self.post_embed("batchEmbedContents", &req).await?;

            if parsed.embeddings.len() != texts.len() {
                return Err(StoreError::Provider(format!(
                    "batch embed returned {} vectors for {} inputs",
                    parsed.embeddings.len(),
                    texts.len()
                )));
            }
            for e in &parsed.embeddings {
                self.check_dim(&e.values)?;
            }

            Ok(parsed.embeddings.into_iter().map(|e| e.values).collect())
        })
    }
}
