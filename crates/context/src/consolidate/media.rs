//! Media extraction: image, video and audio links behind a same-origin proxy.

use ragctx_core::chunk::{LinkKind, ScoredChunk};
use ragctx_core::source::{ChatMedia, MediaKind};
use tracing::trace;

/// Default proxy endpoint that fetches and streams upstream media.
pub const DEFAULT_STREAM_ENDPOINT: &str = "/api/ragie/stream";

/// Link slots checked per media kind, preferred slot first.
const SLOTS: [(MediaKind, [LinkKind; 2]); 3] = [
    (MediaKind::Image, [LinkKind::SelfImage, LinkKind::PreviewImage]),
    (MediaKind::Video, [LinkKind::SelfVideo, LinkKind::PreviewVideo]),
    (MediaKind::Audio, [LinkKind::SelfAudio, LinkKind::PreviewAudio]),
];

/// Turns chunk media links into [`ChatMedia`] with proxied URLs.
#[derive(Debug, Clone)]
pub struct MediaExtractor {
    stream_endpoint: String,
}

impl Default for MediaExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_STREAM_ENDPOINT)
    }
}

impl MediaExtractor {
    pub fn new(stream_endpoint: impl Into<String>) -> Self {
        Self {
            stream_endpoint: stream_endpoint.into(),
        }
    }

    pub fn stream_endpoint(&self) -> &str {
        &self.stream_endpoint
    }

    /// Extract media from `chunks` in chunk order.
    ///
    /// Each chunk contributes at most one item per kind, image then video
    /// then audio.
    pub fn extract(&self, chunks: &[ScoredChunk], slug: Option<&str>) -> Vec<ChatMedia> {
        let mut media = Vec::new();

        for chunk in chunks {
            for (kind, slots) in &SLOTS {
                let Some(link) = chunk.links.first_of(slots) else {
                    continue;
                };

                let (Some(href), Some(mime)) = (
                    link.href.as_deref().filter(|h| !h.is_empty()),
                    link.media_type.as_deref().filter(|m| !m.is_empty()),
                ) else {
                    trace!(document_id = %chunk.document_id, kind = %kind, "Link missing href or media type");
                    continue;
                };

                if !kind.accepts(mime) {
                    trace!(document_id = %chunk.document_id, kind = %kind, mime, "Media type does not match slot");
                    continue;
                }

                media.push(ChatMedia {
                    kind: *kind,
                    url: self.proxy_url(href, slug),
                    mime: mime.to_string(),
                    label: chunk.document_title().map(str::to_string),
                });
            }
        }

        media
    }

    /// Wrap an upstream URL in the proxy endpoint.
    pub fn proxy_url(&self, href: &str, slug: Option<&str>) -> String {
        let mut url = format!(
            "{}?url={}",
            self.stream_endpoint,
            urlencoding::encode(href)
        );
        if let Some(slug) = slug.filter(|s| !s.is_empty()) {
            url.push_str("&tenant=");
            url.push_str(&urlencoding::encode(slug));
        }
        url
    }
}
