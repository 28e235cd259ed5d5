//! Retrieval backends and the query strategy that drives them.
//!
//! - [`http::HttpRetrievalBackend`]: a [`RetrievalBackend`](ragctx_core::RetrievalBackend)
//!   over a hosted retrieval API.
//! - [`strategy::RetrievalStrategy`]: filename probe, general search and
//!   rerank fallback, issued one after another.

pub mod http;
pub mod strategy;

pub use http::HttpRetrievalBackend;
pub use strategy::{
    FilenameQuery, ProbeOutcome, RetrievalStrategy, Strategy, StrategyOutcome, is_filename_query,
};
