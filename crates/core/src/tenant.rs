//! Tenant: the organization a chat turn runs on behalf of.
//!
//! Only the fields context assembly reads are modeled here; sessions,
//! profiles and persistence live with the caller.

use serde::{Deserialize, Serialize};

/// The slice of a tenant record context assembly needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Stable tenant identifier.
    pub id: String,

    /// Display name, injected into prompts as the company name.
    pub name: String,

    /// URL slug, forwarded to the media proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    /// Explicit backend partition; defaults to the tenant id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<String>,

    /// Per-tenant system prompt template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Tenant {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    pub fn with_system_prompt(mut self, template: impl Into<String>) -> Self {
        self.system_prompt = Some(template.into());
        self
    }

    /// The backend partition this tenant's documents live in.
    pub fn partition(&self) -> &str {
        self.partition
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.id)
    }
}

/// Query-shaping flags supplied with each chat turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Favor document diversity over depth.
    #[serde(default)]
    pub breadth: bool,

    /// Ask the backend to rerank.
    #[serde(default)]
    pub rerank: bool,

    /// Ask the backend to favor recent documents.
    #[serde(default)]
    pub prioritize_recent: bool,
}
