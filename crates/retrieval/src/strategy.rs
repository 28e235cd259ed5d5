//! Retrieval strategy: which backend calls to make for a query, and in what order.
//!
//! ```text
//!   filename-shaped? ──yes──▶ FilenameProbe ──response──▶ done
//!         │                   (filtered, then unfiltered if < 3 chunks)
//!         no                         │ absent (backend error)
//!         ▼                          ▼
//!   GeneralSearch ◀──────────────────┘
//!         │ zero chunks and rerank requested
//!         ▼
//!   RerankFallback ──▶ done
//! ```
//!
//! Calls are strictly sequential: each transition depends on the previous
//! result. Probe failures are absorbed into [`ProbeOutcome::Absent`];
//! failures in the general search and the rerank fallback propagate.

use ragctx_config::StrategyConfig;
use ragctx_core::chunk::RetrievalResponse;
use ragctx_core::error::RetrievalError;
use ragctx_core::retrieval::{RetrievalBackend, RetrievalFilter, RetrievalRequest};
use ragctx_core::tenant::QueryOptions;
use regex_lite::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

const FILE_EXTENSIONS: &str = "png|jpe?g|gif|webp|tiff?|bmp|svg|pdf|docx?|pptx?|xlsx?|csv|txt";

static FILENAME_QUERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\.({FILE_EXTENSIONS})($|\s)")).expect("valid regex")
});

static EXTENSION_AND_REST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?is)\.({FILE_EXTENSIONS})($|\s).*$")).expect("valid regex")
});

/// A query recognized as a request for a specific file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameQuery {
    /// Search text: lowercased, extension stripped, separators turned into spaces.
    pub normalized: String,

    /// Document-name filter: the normalized text with spaces turned back into
    /// underscores, matching how uploaded file names are usually spelled.
    pub name_filter: String,
}

impl FilenameQuery {
    /// Classify `query`; `None` when it does not name a file.
    pub fn parse(query: &str) -> Option<Self> {
        let trimmed = query.trim().to_lowercase();
        if !FILENAME_QUERY.is_match(&trimmed) {
            return None;
        }

        let normalized = EXTENSION_AND_REST
            .replace(&trimmed, "")
            .replace(['_', '-'], " ")
            .trim()
            .to_string();

        if normalized.is_empty() {
            return None;
        }

        let name_filter = normalized.replace(' ', "_");
        Some(Self {
            normalized,
            name_filter,
        })
    }
}

/// Whether `query` looks like a file name (`taylor_602c.png`, `see report.pdf`).
pub fn is_filename_query(query: &str) -> bool {
    FilenameQuery::parse(query).is_some()
}

/// Which state produced the terminal response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Filename search; `widened` when the name filter was dropped.
    FilenameProbe { widened: bool },
    GeneralSearch,
    RerankFallback,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::FilenameProbe { widened: false } => f.write_str("filename_probe"),
            Strategy::FilenameProbe { widened: true } => f.write_str("filename_probe_widened"),
            Strategy::GeneralSearch => f.write_str("general_search"),
            Strategy::RerankFallback => f.write_str("rerank_fallback"),
        }
    }
}

/// Result of the filename probe.
#[derive(Debug)]
pub enum ProbeOutcome {
    Found {
        response: RetrievalResponse,
        widened: bool,
    },
    /// A probe call failed; the caller moves on to general search.
    Absent,
}

/// The terminal response together with how it was obtained.
#[derive(Debug)]
pub struct StrategyOutcome {
    pub response: RetrievalResponse,
    pub resolved_by: Strategy,
    /// Backend calls issued, including failed probe calls.
    pub calls: usize,
}

/// Sequences retrieval backend calls for one query.
pub struct RetrievalStrategy {
    backend: Arc<dyn RetrievalBackend>,
    config: StrategyConfig,
}

impl RetrievalStrategy {
    pub fn new(backend: Arc<dyn RetrievalBackend>) -> Self {
        Self::with_config(backend, StrategyConfig::default())
    }

    pub fn with_config(backend: Arc<dyn RetrievalBackend>, config: StrategyConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &Arc<dyn RetrievalBackend> {
        &self.backend
    }

    /// Result count for the general search.
    fn top_k(&self, options: QueryOptions) -> u32 {
        if options.breadth || options.rerank {
            self.config.breadth_top_k
        } else {
            self.config.default_top_k
        }
    }

    fn breadth_cap(&self, options: QueryOptions) -> Option<u32> {
        options
            .breadth
            .then_some(self.config.breadth_max_chunks_per_document)
    }

    /// Run the strategy for `query` against `partition`.
    pub async fn retrieve(
        &self,
        partition: &str,
        query: &str,
        options: QueryOptions,
    ) -> Result<StrategyOutcome, RetrievalError> {
        let mut calls = 0;

        if let Some(filename) = FilenameQuery::parse(query) {
            info!(
                backend = self.backend.name(),
                query,
                normalized = %filename.normalized,
                "Query appears to be a filename search"
            );

            let (outcome, probe_calls) = self.probe(partition, &filename, options).await;
            calls += probe_calls;

            if let ProbeOutcome::Found { response, widened } = outcome {
                return Ok(StrategyOutcome {
                    response,
                    resolved_by: Strategy::FilenameProbe { widened },
                    calls,
                });
            }
        }

        let mut request = RetrievalRequest::new(partition, query, self.top_k(options));
        request.rerank = options.rerank;
        request.recency_bias = options.prioritize_recent;
        request.max_chunks_per_document = self.breadth_cap(options);

        calls += 1;
        let response = self.backend.retrieve(request).await?;
        info!(backend = self.backend.name(), chunks = response.len(), "Regular retrieval finished");

        if !(response.is_empty() && options.rerank) {
            return Ok(StrategyOutcome {
                response,
                resolved_by: Strategy::GeneralSearch,
                calls,
            });
        }

        info!(backend = self.backend.name(), "No chunks found, retrying with rerank disabled");

        let top_k = if options.breadth {
            self.config.breadth_top_k
        } else {
            self.config.default_top_k
        };
        let mut request = RetrievalRequest::new(partition, query, top_k);
        request.recency_bias = options.prioritize_recent;
        request.max_chunks_per_document = self.breadth_cap(options);

        calls += 1;
        let response = self.backend.retrieve(request).await?;
        info!(backend = self.backend.name(), chunks = response.len(), "Rerank fallback finished");

        Ok(StrategyOutcome {
            response,
            resolved_by: Strategy::RerankFallback,
            calls,
        })
    }

    /// Filtered filename search, widened to an unfiltered one when it comes
    /// back thin. Returns the outcome and the number of calls issued.
    async fn probe(
        &self,
        partition: &str,
        filename: &FilenameQuery,
        options: QueryOptions,
    ) -> (ProbeOutcome, usize) {
        let top_k = self.top_k(options).max(self.config.filename_min_top_k);

        let mut filtered = RetrievalRequest::new(partition, &filename.normalized, top_k);
        filtered.filter = Some(RetrievalFilter::document_name_contains(
            &filename.name_filter,
        ));

        let response = match self.backend.retrieve(filtered).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    backend = self.backend.name(),
                    error = %e,
                    "Filename-focused search failed, falling back to regular search"
                );
                return (ProbeOutcome::Absent, 1);
            }
        };

        info!(
            backend = self.backend.name(),
            chunks = response.len(),
            "Filename-focused search finished"
        );

        if response.len() >= self.config.filename_min_results {
            return (
                ProbeOutcome::Found {
                    response,
                    widened: false,
                },
                1,
            );
        }

        debug!(
            found = response.len(),
            threshold = self.config.filename_min_results,
            "Few results from filename filter, widening"
        );

        let widened = RetrievalRequest::new(partition, &filename.normalized, top_k);
        match self.backend.retrieve(widened).await {
            Ok(response) => {
                info!(
                    backend = self.backend.name(),
                    chunks = response.len(),
                    "Widened filename search finished"
                );
                (
                    ProbeOutcome::Found {
                        response,
                        widened: true,
                    },
                    2,
                )
            }
            Err(e) => {
                warn!(
                    backend = self.backend.name(),
                    error = %e,
                    "Widened filename search failed, falling back to regular search"
                );
                (ProbeOutcome::Absent, 2)
            }
        }
    }
}
