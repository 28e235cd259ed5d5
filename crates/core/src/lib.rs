//! # ragctx Core
//!
//! Domain types, traits, and error definitions for grounded chat context
//! assembly. This crate has **no I/O**; it defines the domain model that
//! the retrieval and context crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (retrieval backend, prompt renderer) is a
//! trait here. Implementations live in their respective crates, so tests
//! can swap in mocks and the dependency graph points inward on core.

pub mod attachments;
pub mod chunk;
pub mod error;
pub mod prompt;
pub mod retrieval;
pub mod source;
pub mod tenant;

// Re-export key types at crate root for ergonomics
pub use attachments::{Attachment, AttachmentKind};
pub use chunk::{ChunkLinks, DocumentRef, Link, LinkKind, RetrievalResponse, ScoredChunk};
pub use error::{Error, FAILED_MESSAGE_CONTENT, Result};
pub use prompt::{Company, GroundingContext, PromptContext, PromptRenderer};
pub use retrieval::{RetrievalBackend, RetrievalFilter, RetrievalRequest};
pub use source::{ChatMedia, MediaKind, PageRange, SourceMetadata, TimeRange};
pub use tenant::{QueryOptions, Tenant};
