//! Context assembly: the single entry point for building a grounded turn.
//!
//! # Flow
//!
//! 1. Run the retrieval strategy against the tenant's partition
//! 2. Extract proxied media and deduplicate sources from the chunks
//! 3. Serialize the retrieval response and render the system prompt with it
//!
//! The assembler keeps no state between calls.

use std::sync::Arc;

use ragctx_config::AppConfig;
use ragctx_core::error::Result;
use ragctx_core::prompt::{Company, PromptContext, PromptRenderer};
use ragctx_core::retrieval::RetrievalBackend;
use ragctx_core::source::{ChatMedia, SourceMetadata};
use ragctx_core::tenant::{QueryOptions, Tenant};
use ragctx_retrieval::{RetrievalStrategy, Strategy};
use serde::Serialize;
use tracing::info;

use crate::consolidate::{MediaExtractor, SourceDeduplicator};
use crate::prompt::{self, TemplateRenderer};

/// Everything a chat turn needs from retrieval.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledContext {
    /// The rendered system prompt with the retrieved content embedded.
    pub content: String,
    /// One entry per retrieved document.
    pub sources: Vec<SourceMetadata>,
    /// Proxied media referenced by the retrieved chunks.
    pub media: Vec<ChatMedia>,
    /// Which retrieval state produced the chunks.
    #[serde(skip)]
    pub resolved_by: Option<Strategy>,
}

/// Builds [`AssembledContext`] for a tenant and query.
pub struct ContextAssembler {
    strategy: RetrievalStrategy,
    renderer: Arc<dyn PromptRenderer>,
    media: MediaExtractor,
    sources: SourceDeduplicator,
    system_prompt: Option<String>,
    grounding_prompt: Option<String>,
}

impl ContextAssembler {
    /// Create an assembler with default strategy parameters and prompts.
    pub fn new(backend: Arc<dyn RetrievalBackend>) -> Self {
        let sources = SourceDeduplicator::new(backend.base_url());
        Self {
            strategy: RetrievalStrategy::new(backend),
            renderer: Arc::new(TemplateRenderer::new()),
            media: MediaExtractor::default(),
            sources,
            system_prompt: None,
            grounding_prompt: None,
        }
    }

    /// Create an assembler using the strategy, media and prompt sections of `config`.
    pub fn from_config(backend: Arc<dyn RetrievalBackend>, config: &AppConfig) -> Self {
        let sources = SourceDeduplicator::new(backend.base_url());
        Self {
            strategy: RetrievalStrategy::with_config(backend, config.strategy),
            renderer: Arc::new(TemplateRenderer::new()),
            media: MediaExtractor::new(&config.media.stream_endpoint),
            sources,
            system_prompt: config.prompts.system_prompt.clone(),
            grounding_prompt: config.prompts.grounding_prompt.clone(),
        }
    }

    /// Replace the prompt renderer.
    pub fn with_renderer(mut self, renderer: Arc<dyn PromptRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// The system prompt template for `tenant`: its own, else the configured
    /// override, else the built-in default.
    fn system_template<'a>(&'a self, tenant: &'a Tenant) -> Option<&'a str> {
        tenant
            .system_prompt
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(self.system_prompt.as_deref())
    }

    /// Retrieve for `query` and assemble the turn's context.
    ///
    /// Backend failures outside the filename probe are returned as errors;
    /// callers show [`ragctx_core::FAILED_MESSAGE_CONTENT`] for them.
    pub async fn assemble(
        &self,
        tenant: &Tenant,
        query: &str,
        options: QueryOptions,
    ) -> Result<AssembledContext> {
        let partition = tenant.partition();
        info!(
            tenant = %tenant.id,
            partition,
            breadth = options.breadth,
            rerank = options.rerank,
            recent = options.prioritize_recent,
            "Assembling context"
        );

        let outcome = self.strategy.retrieve(partition, query, options).await?;
        let chunks = &outcome.response.scored_chunks;

        let media = self.media.extract(chunks, tenant.slug.as_deref());
        let sources = self.sources.deduplicate(chunks);

        let context = PromptContext {
            company: Company {
                name: tenant.name.clone(),
            },
            chunks: serde_json::to_string(&outcome.response)?,
        };
        let content =
            prompt::render_system_prompt(self.renderer.as_ref(), &context, self.system_template(tenant))?;

        info!(
            resolved_by = %outcome.resolved_by,
            calls = outcome.calls,
            chunks = chunks.len(),
            sources = sources.len(),
            media = media.len(),
            "Context assembled"
        );

        Ok(AssembledContext {
            content,
            sources,
            media,
            resolved_by: Some(outcome.resolved_by),
        })
    }

    /// Render the grounding prompt for a turn answered without retrieval.
    pub fn grounding_prompt(&self, tenant: &Tenant) -> Result<String> {
        let company = Company {
            name: tenant.name.clone(),
        };
        Ok(prompt::render_grounding_prompt(
            self.renderer.as_ref(),
            &company,
            self.grounding_prompt.as_deref(),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ragctx_core::chunk::{ChunkLinks, Link, LinkKind, RetrievalResponse, ScoredChunk};
    use ragctx_core::error::{Error, RenderError, RetrievalError};
    use ragctx_core::retrieval::RetrievalRequest;
    use ragctx_core::source::MediaKind;
    use serde_json::{Value, json};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Mock backend that replays scripted results and records requests.
    struct MockBackend {
        results: Mutex<VecDeque<std::result::Result<RetrievalResponse, RetrievalError>>>,
        requests: Mutex<Vec<RetrievalRequest>>,
    }

    impl MockBackend {
        fn new(results: Vec<std::result::Result<RetrievalResponse, RetrievalError>>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<RetrievalRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RetrievalBackend for MockBackend {
        fn name(&self) -> &str {
            "mock"
        }

        fn base_url(&self) -> &str {
            "https://api.example.com"
        }

        async fn retrieve(
            &self,
            request: RetrievalRequest,
        ) -> std::result::Result<RetrievalResponse, RetrievalError> {
            self.requests.lock().unwrap().push(request);
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(RetrievalResponse::default()))
        }
    }

    /// Renderer that echoes its variables as JSON.
    struct EchoRenderer;

    impl PromptRenderer for EchoRenderer {
        fn render(&self, _template: &str, variables: &Value) -> std::result::Result<String, RenderError> {
            Ok(variables.to_string())
        }
    }

    fn tenant() -> Tenant {
        Tenant::new("tenant_1", "Acme").with_slug("acme")
    }

    fn media_chunk(document_id: &str, page: i64) -> ScoredChunk {
        ScoredChunk {
            document_id: document_id.into(),
            document_name: format!("{document_id}.pdf"),
            metadata: json!({"start_page": page, "end_page": page})
                .as_object()
                .cloned()
                .unwrap(),
            links: ChunkLinks::new()
                .with(LinkKind::SelfImage, Link::new("https://cdn.example.com/p.png", "image/png")),
            text: format!("page {page}"),
            score: 0.5,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn plain_query_with_no_results() {
        let backend = MockBackend::new(vec![Ok(RetrievalResponse::default())]);
        let assembler = ContextAssembler::new(backend.clone());

        let result = assembler
            .assemble(&tenant(), "hello", QueryOptions::default())
            .await
            .unwrap();

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].top_k, 6);
        assert!(!requests[0].rerank);
        assert!(!requests[0].recency_bias);
        assert_eq!(requests[0].partition, "tenant_1");

        let expected = prompt::render_system_prompt(
            &TemplateRenderer::new(),
            &PromptContext {
                company: Company { name: "Acme".into() },
                chunks: r#"{"scored_chunks":[]}"#.into(),
            },
            None,
        )
        .unwrap();
        assert_eq!(result.content, expected);
        assert!(result.sources.is_empty());
        assert!(result.media.is_empty());
        assert_eq!(result.resolved_by, Some(Strategy::GeneralSearch));
    }

    #[tokio::test]
    async fn consolidates_sources_and_media() {
        let backend = MockBackend::new(vec![Ok(RetrievalResponse::new(vec![
            media_chunk("manual", 1),
            media_chunk("manual", 2),
            media_chunk("brochure", 5),
        ]))]);
        let assembler = ContextAssembler::new(backend);

        let result = assembler
            .assemble(&tenant(), "how do I reset it", QueryOptions::default())
            .await
            .unwrap();

        assert_eq!(result.sources.len(), 2);
        assert_eq!(result.sources[0].document_id, "manual");
        assert_eq!(result.sources[0].start_page, Some(1));
        assert_eq!(result.sources[0].end_page, Some(2));
        assert_eq!(result.media.len(), 3);
        assert!(result.media.iter().all(|m| m.kind == MediaKind::Image));
        assert!(result.media[0].url.ends_with("&tenant=acme"));
        assert!(result.content.contains("page 2"));
    }

    #[tokio::test]
    async fn renderer_receives_company_and_serialized_chunks() {
        let backend = MockBackend::new(vec![Ok(RetrievalResponse::new(vec![media_chunk("doc", 3)]))]);
        let assembler = ContextAssembler::new(backend).with_renderer(Arc::new(EchoRenderer));

        let result = assembler
            .assemble(&tenant(), "q", QueryOptions::default())
            .await
            .unwrap();

        let vars: Value = serde_json::from_str(&result.content).unwrap();
        assert_eq!(vars["company"]["name"], "Acme");
        let chunks: RetrievalResponse = serde_json::from_str(vars["chunks"].as_str().unwrap()).unwrap();
        assert_eq!(chunks.scored_chunks[0].document_id, "doc");
    }

    #[tokio::test]
    async fn tenant_prompt_overrides_config_prompt() {
        let mut config = AppConfig::default();
        config.prompts.system_prompt = Some("config: {{company.name}}".into());

        let backend = MockBackend::new(vec![]);
        let assembler = ContextAssembler::from_config(backend.clone(), &config);
        let result = assembler
            .assemble(&tenant(), "q", QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(result.content, "config: Acme");

        let custom = tenant().with_system_prompt("tenant: {{company.name}}");
        let result = assembler
            .assemble(&custom, "q", QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(result.content, "tenant: Acme");
    }

    #[tokio::test]
    async fn config_stream_endpoint_used_for_media() {
        let mut config = AppConfig::default();
        config.media.stream_endpoint = "/media".into();

        let backend = MockBackend::new(vec![Ok(RetrievalResponse::new(vec![media_chunk("doc", 1)]))]);
        let assembler = ContextAssembler::from_config(backend, &config);
        let result = assembler
            .assemble(&tenant(), "q", QueryOptions::default())
            .await
            .unwrap();

        assert!(result.media[0].url.starts_with("/media?url="));
    }

    #[tokio::test]
    async fn general_search_failure_propagates() {
        let backend = MockBackend::new(vec![Err(RetrievalError::Network("connection reset".into()))]);
        let assembler = ContextAssembler::new(backend);

        let err = assembler
            .assemble(&tenant(), "hello", QueryOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Retrieval(RetrievalError::Network(_))));
        assert_eq!(err.user_message(), ragctx_core::FAILED_MESSAGE_CONTENT);
    }

    #[tokio::test]
    async fn filename_probe_failure_falls_through() {
        let backend = MockBackend::new(vec![
            Err(RetrievalError::Timeout("slow".into())),
            Ok(RetrievalResponse::new(vec![media_chunk("doc", 1)])),
        ]);
        let assembler = ContextAssembler::new(backend.clone());

        let result = assembler
            .assemble(&tenant(), "Taylor_602C.png", QueryOptions::default())
            .await
            .unwrap();

        assert_eq!(backend.requests().len(), 2);
        assert_eq!(result.resolved_by, Some(Strategy::GeneralSearch));
        assert_eq!(result.sources.len(), 1);
    }

    #[tokio::test]
    async fn serializes_camel_case_without_strategy() {
        let backend = MockBackend::new(vec![]);
        let result = ContextAssembler::new(backend)
            .assemble(&tenant(), "q", QueryOptions::default())
            .await
            .unwrap();

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("content").is_some());
        assert_eq!(json["sources"], json!([]));
        assert_eq!(json["media"], json!([]));
        assert!(json.get("resolvedBy").is_none());
    }

    #[test]
    fn grounding_prompt_uses_config_override() {
        let mut config = AppConfig::default();
        config.prompts.grounding_prompt = Some("{{company.name}} at {{now}}".into());

        let assembler = ContextAssembler::from_config(MockBackend::new(vec![]), &config);
        let prompt = assembler.grounding_prompt(&tenant()).unwrap();

        assert!(prompt.starts_with("Acme at "));
        assert!(prompt.ends_with('Z'));
    }
}
