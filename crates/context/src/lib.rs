//! Context assembly for a retrieval-grounded chatbot.
//!
//! Given a tenant and a user query, the [`ContextAssembler`]:
//!
//! 1. **Retrieves** chunks through the retrieval strategy (filename probe,
//!    general search, rerank fallback)
//! 2. **Consolidates** them into one source per document with merged
//!    page/time ranges, plus proxied media references
//! 3. **Renders** the tenant's system prompt with the retrieved content
//!
//! The result is an [`AssembledContext`] ready to prepend to a model call.

pub mod assembler;
pub mod consolidate;
pub mod prompt;

pub use assembler::{AssembledContext, ContextAssembler};
pub use consolidate::{DEFAULT_STREAM_ENDPOINT, MediaExtractor, SourceDeduplicator};
pub use prompt::{
    DEFAULT_GROUNDING_PROMPT, DEFAULT_SYSTEM_PROMPT, TemplateRenderer, render_grounding_prompt,
    render_grounding_prompt_at, render_system_prompt,
};
