//! Prompt rendering trait and the variables context assembly supplies.

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// The company block every prompt template can reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
}

/// Variables for the retrieval system prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptContext {
    pub company: Company,

    /// The retrieval response serialized as JSON text.
    pub chunks: String,
}

/// Variables for the grounding prompt (no retrieved content).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingContext {
    pub company: Company,

    /// Render time as an RFC 3339 UTC timestamp.
    pub now: String,
}

/// Renders a prompt template against a JSON variable tree.
pub trait PromptRenderer: Send + Sync {
    fn render(
        &self,
        template: &str,
        variables: &serde_json::Value,
    ) -> std::result::Result<String, RenderError>;
}
