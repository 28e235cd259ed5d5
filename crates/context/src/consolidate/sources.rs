//! Source deduplication: one [`SourceMetadata`] per retrieved document.
//!
//! Chunks are grouped by `document_id` in first-seen order. Page and time
//! bounds across a group are merged; everything else comes from the first
//! chunk of the group.

use std::collections::HashMap;

use ragctx_core::chunk::{LinkKind, ScoredChunk};
use ragctx_core::source::{PageRange, SourceMetadata, TimeRange};
use tracing::{debug, trace};

use super::ranges::{self, Interval};

/// Which stream family a document's links describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    /// Resolve from the representative chunk.
    ///
    /// An announced `self_video_stream` slot decides the question on its own:
    /// a null video slot means no stream even if an audio slot exists.
    fn resolve(chunk: &ScoredChunk) -> Option<Self> {
        let links = &chunk.links;
        if links.contains(LinkKind::SelfVideoStream) {
            links.get(LinkKind::SelfVideoStream).map(|_| StreamKind::Video)
        } else {
            links.get(LinkKind::SelfAudioStream).map(|_| StreamKind::Audio)
        }
    }

    fn slots(self) -> StreamSlots {
        match self {
            StreamKind::Video => StreamSlots {
                stream: LinkKind::SelfVideoStream,
                download: LinkKind::SelfVideoDownload,
                document_stream: LinkKind::DocumentVideoStream,
                document_download: LinkKind::DocumentVideoDownload,
            },
            StreamKind::Audio => StreamSlots {
                stream: LinkKind::SelfAudioStream,
                download: LinkKind::SelfAudioDownload,
                document_stream: LinkKind::DocumentAudioStream,
                document_download: LinkKind::DocumentAudioDownload,
            },
        }
    }
}

struct StreamSlots {
    stream: LinkKind,
    download: LinkKind,
    document_stream: LinkKind,
    document_download: LinkKind,
}

/// Collapses chunks into per-document sources.
#[derive(Debug, Clone)]
pub struct SourceDeduplicator {
    backend_base_url: String,
}

impl SourceDeduplicator {
    /// `backend_base_url` is used to build direct-fetch URLs for documents
    /// without a `source_url`.
    pub fn new(backend_base_url: impl Into<String>) -> Self {
        Self {
            backend_base_url: backend_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Direct-fetch URL of a document's original file on the backend.
    pub fn source_url(&self, document_id: &str) -> String {
        format!(
            "{}/documents/{}/source",
            self.backend_base_url,
            urlencoding::encode(document_id)
        )
    }

    /// One source per distinct `document_id`, in order of first appearance.
    pub fn deduplicate(&self, chunks: &[ScoredChunk]) -> Vec<SourceMetadata> {
        let mut groups: HashMap<&str, Vec<&ScoredChunk>> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();

        for chunk in chunks {
            let id = chunk.document_id.as_str();
            groups
                .entry(id)
                .or_insert_with(|| {
                    order.push(id);
                    Vec::new()
                })
                .push(chunk);
        }

        let sources: Vec<SourceMetadata> = order
            .iter()
            .filter_map(|id| groups.get(id))
            .map(|group| self.consolidate(group))
            .collect();

        debug!(
            chunks = chunks.len(),
            sources = sources.len(),
            "Deduplicated retrieval sources"
        );
        sources
    }

    /// Build the source for one non-empty group.
    fn consolidate(&self, group: &[&ScoredChunk]) -> SourceMetadata {
        let representative = group[0];

        let mut pages = Vec::new();
        let mut times = Vec::new();
        for chunk in group {
            let (start, end) = chunk.page_bounds();
            match Interval::from_bounds(start, end) {
                Some(interval) => pages.push(interval),
                None if start.is_some() || end.is_some() => {
                    trace!(document_id = %chunk.document_id, ?start, ?end, "Skipping malformed page range");
                }
                None => {}
            }

            let (start, end) = chunk.time_bounds();
            match Interval::from_bounds(start, end) {
                Some(interval) => times.push(interval),
                None if start.is_some() || end.is_some() => {
                    trace!(document_id = %chunk.document_id, ?start, ?end, "Skipping malformed time range");
                }
                None => {}
            }
        }

        let merged_pages = ranges::merge(pages);
        let merged_times = ranges::merge(times);

        let (start_page, end_page) = match (merged_pages.first(), merged_pages.last()) {
            (Some(first), Some(last)) => (Some(first.start), Some(last.end)),
            _ => representative.page_bounds(),
        };
        let (start_time, end_time) = match (merged_times.first(), merged_times.last()) {
            (Some(first), Some(last)) => (Some(first.start), Some(last.end)),
            _ => representative.time_bounds(),
        };

        let links = &representative.links;
        let (stream_url, download_url, document_stream_url) =
            match StreamKind::resolve(representative) {
                Some(kind) => {
                    let slots = kind.slots();
                    let document_stream = links.href(slots.document_stream);
                    (
                        links.href(slots.stream).or(document_stream).map(str::to_string),
                        links
                            .href(slots.download)
                            .or_else(|| links.href(slots.document_download))
                            .map(str::to_string),
                        document_stream.map(str::to_string),
                    )
                }
                None => (None, None, None),
            };

        let backend_source_url = match representative.source_url() {
            Some(_) => None,
            None => Some(self.source_url(&representative.document_id)),
        };

        SourceMetadata {
            document_metadata: SourceMetadata::extra_metadata(&representative.document_metadata),
            document_id: representative.document_id.clone(),
            document_name: representative.document_name.clone(),
            stream_url,
            download_url,
            document_stream_url,
            image_url: links.href(LinkKind::SelfImage).map(str::to_string),
            backend_source_url,
            start_page,
            end_page,
            start_time,
            end_time,
            merged_ranges: merged_pages
                .iter()
                .map(|r| PageRange {
                    start_page: r.start,
                    end_page: r.end,
                })
                .collect(),
            merged_time_ranges: merged_times
                .iter()
                .map(|r| TimeRange {
                    start_time: r.start,
                    end_time: r.end,
                })
                .collect(),
        }
    }
}
