//! HTTP retrieval backend.
//!
//! Talks to a hosted retrieval API exposing `POST /retrievals`:
//!
//! ```json
//! {"query": "...", "top_k": 6, "rerank": false, "recency_bias": false,
//!  "partition": "tenant_1", "max_chunks_per_document": 4,
//!  "filter": {"document_name": {"$contains": "taylor_602c"}}}
//! ```
//!
//! and answering with `{"scored_chunks": [...]}`.

use async_trait::async_trait;
use ragctx_core::chunk::RetrievalResponse;
use ragctx_core::error::RetrievalError;
use ragctx_core::retrieval::{RetrievalBackend, RetrievalRequest};
use std::time::Duration;
use tracing::{debug, warn};

/// A retrieval backend reached over HTTPS with a bearer API key.
pub struct HttpRetrievalBackend {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpRetrievalBackend {
    /// Create a new HTTP backend.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RetrievalError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: "http".into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Build a backend from the `[retrieval]` config section.
    pub fn from_config(config: &ragctx_config::RetrievalConfig) -> Result<Self, RetrievalError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            RetrievalError::NotConfigured(
                "no API key; set retrieval.api_key or RAGCTX_API_KEY".into(),
            )
        })?;
        Self::new(
            &config.base_url,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Convert a request into the API's JSON body.
    fn to_body(request: &RetrievalRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "query": request.query,
            "top_k": request.top_k,
            "rerank": request.rerank,
            "recency_bias": request.recency_bias,
            "partition": request.partition,
        });

        if let Some(cap) = request.max_chunks_per_document {
            body["max_chunks_per_document"] = serde_json::json!(cap);
        }

        if let Some(name) = request
            .filter
            .as_ref()
            .and_then(|f| f.document_name_contains.as_deref())
        {
            body["filter"] = serde_json::json!({ "document_name": { "$contains": name } });
        }

        body
    }
}

#[async_trait]
impl RetrievalBackend for HttpRetrievalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn retrieve(
        &self,
        request: RetrievalRequest,
    ) -> std::result::Result<RetrievalResponse, RetrievalError> {
        let url = format!("{}/retrievals", self.base_url);
        let body = Self::to_body(&request);

        debug!(
            backend = %self.name,
            partition = %request.partition,
            top_k = request.top_k,
            rerank = request.rerank,
            filtered = request.filter.is_some(),
            "Sending retrieval request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("partition", &request.partition)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RetrievalError::Timeout(e.to_string())
                } else {
                    RetrievalError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(RetrievalError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(RetrievalError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Retrieval backend returned error");
            return Err(RetrievalError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        response
            .json::<RetrievalResponse>()
            .await
            .map_err(|e| RetrievalError::InvalidResponse(format!("Failed to parse response: {e}")))
    }
}
