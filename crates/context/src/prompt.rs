//! Prompt templates and the Handlebars renderer.
//!
//! - `{{company.name}}` renders an HTML-escaped value
//! - `{{{chunks}}}` renders a value verbatim
//! - `{{#if}}`, `{{#unless}}`, `{{#each}}` and `{{#with}}` blocks work as in Handlebars

use chrono::{DateTime, SecondsFormat, Utc};
use handlebars::Handlebars;
use ragctx_core::error::RenderError;
use ragctx_core::prompt::{Company, GroundingContext, PromptContext, PromptRenderer};
use serde::Serialize;
use serde_json::Value;

/// System prompt used when neither the tenant nor the config supplies one.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an AI assistant for {{company.name}}. Answer the user's question using \
only the retrieved content below. When the content does not contain the answer, \
say so plainly instead of guessing. Cite the documents you rely on by name.

Retrieved content (JSON):
{{{chunks}}}";

/// Prompt for turns answered without retrieval.
pub const DEFAULT_GROUNDING_PROMPT: &str = "\
You are an AI assistant for {{company.name}}. The current time is {{now}}. \
No documents were retrieved for this message; answer from the conversation so \
far and say when you do not know.";

/// Renders tenant and default prompt templates with Handlebars.
///
/// Missing values render as empty text; `{{value}}` is HTML-escaped and
/// `{{{value}}}` is not.
pub struct TemplateRenderer {
    registry: Handlebars<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(handlebars::html_escape);
        Self { registry }
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer").finish_non_exhaustive()
    }
}

impl PromptRenderer for TemplateRenderer {
    fn render(&self, template: &str, variables: &Value) -> Result<String, RenderError> {
        self.registry
            .render_template(template, variables)
            .map_err(|e| RenderError::Template(e.to_string()))
    }
}

fn to_variables<T: Serialize>(context: &T) -> Result<Value, RenderError> {
    serde_json::to_value(context).map_err(|e| RenderError::InvalidVariables(e.to_string()))
}

/// Render the retrieval system prompt; `template` falls back to [`DEFAULT_SYSTEM_PROMPT`].
pub fn render_system_prompt(
    renderer: &dyn PromptRenderer,
    context: &PromptContext,
    template: Option<&str>,
) -> Result<String, RenderError> {
    renderer.render(
        template.unwrap_or(DEFAULT_SYSTEM_PROMPT),
        &to_variables(context)?,
    )
}

/// Render the grounding prompt stamped with the current time.
pub fn render_grounding_prompt(
    renderer: &dyn PromptRenderer,
    company: &Company,
    template: Option<&str>,
) -> Result<String, RenderError> {
    render_grounding_prompt_at(renderer, company, template, Utc::now())
}

/// Render the grounding prompt as of `now`.
pub fn render_grounding_prompt_at(
    renderer: &dyn PromptRenderer,
    company: &Company,
    template: Option<&str>,
    now: DateTime<Utc>,
) -> Result<String, RenderError> {
    let context = GroundingContext {
        company: company.clone(),
        now: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    };
    renderer.render(
        template.unwrap_or(DEFAULT_GROUNDING_PROMPT),
        &to_variables(&context)?,
    )
}
