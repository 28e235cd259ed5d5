//! Retrieval backend trait: the abstraction over document search services.
//!
//! A backend takes a query scoped to a tenant partition and returns scored
//! chunks. Everything about ranking is the backend's business; callers only
//! shape the request (result count, rerank, recency bias, per-document cap,
//! document-name filter).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::chunk::RetrievalResponse;
use crate::error::RetrievalError;

/// Parameters for a single retrieval call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalRequest {
    /// Tenant-scoped namespace in the backend.
    pub partition: String,

    /// The search text.
    pub query: String,

    /// Maximum number of chunks to return.
    pub top_k: u32,

    /// Ask the backend to rerank results.
    #[serde(default)]
    pub rerank: bool,

    /// Ask the backend to favor newer documents.
    #[serde(default)]
    pub recency_bias: bool,

    /// Cap on chunks returned per document (breadth search).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chunks_per_document: Option<u32>,

    /// Optional document filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<RetrievalFilter>,
}

impl RetrievalRequest {
    /// A plain request with reranking, recency bias, cap and filter all off.
    pub fn new(partition: impl Into<String>, query: impl Into<String>, top_k: u32) -> Self {
        Self {
            partition: partition.into(),
            query: query.into(),
            top_k,
            rerank: false,
            recency_bias: false,
            max_chunks_per_document: None,
            filter: None,
        }
    }
}

/// Filters a backend applies before ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalFilter {
    /// Only documents whose name contains this text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_name_contains: Option<String>,
}

impl RetrievalFilter {
    pub fn document_name_contains(text: impl Into<String>) -> Self {
        Self {
            document_name_contains: Some(text.into()),
        }
    }
}

/// The core RetrievalBackend trait.
///
/// Implementations: HTTP client for a hosted retrieval API, in-test mocks.
#[async_trait]
pub trait RetrievalBackend: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &str;

    /// Base endpoint of the backend API, used to build direct-fetch URLs
    /// for documents that carry no source URL of their own.
    fn base_url(&self) -> &str;

    /// Run one retrieval.
    async fn retrieve(
        &self,
        request: RetrievalRequest,
    ) -> std::result::Result<RetrievalResponse, RetrievalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_skips_empty_optionals() {
        let req = RetrievalRequest::new("tenant_1", "hello", 6);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["top_k"], 6);
        assert!(json.get("filter").is_none());
        assert!(json.get("max_chunks_per_document").is_none());
    }

    #[test]
    fn filter_constructor() {
        let f = RetrievalFilter::document_name_contains("taylor_602c");
        assert_eq!(f.document_name_contains.as_deref(), Some("taylor_602c"));
    }
}
