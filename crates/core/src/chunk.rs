//! Scored chunks: the passages a retrieval backend returns.
//!
//! A chunk carries its document identity, free-form document metadata,
//! per-chunk positional metadata (pages, timestamps) and a set of typed
//! links to media renditions. Chunks are produced by a single retrieval
//! call and are never mutated afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// The response of one retrieval call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResponse {
    #[serde(default)]
    pub scored_chunks: Vec<ScoredChunk>,
}

impl RetrievalResponse {
    pub fn new(scored_chunks: Vec<ScoredChunk>) -> Self {
        Self { scored_chunks }
    }

    /// Number of chunks returned.
    pub fn len(&self) -> usize {
        self.scored_chunks.len()
    }

    /// Whether the backend returned nothing.
    pub fn is_empty(&self) -> bool {
        self.scored_chunks.is_empty()
    }
}

/// One retrieved passage of a source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// Stable identifier of the source document.
    pub document_id: String,

    /// Display name of the source document (usually its file name).
    #[serde(default)]
    pub document_name: String,

    /// Free-form document metadata (`source_url`, `source_type`, `file_path`, ...).
    #[serde(default)]
    pub document_metadata: Map<String, Value>,

    /// Per-chunk metadata. Kept as raw JSON so malformed positional
    /// fields can be told apart from absent ones.
    #[serde(default)]
    pub metadata: Map<String, Value>,

    /// Typed media links attached to this chunk.
    #[serde(default)]
    pub links: ChunkLinks,

    /// The passage text.
    #[serde(default)]
    pub text: String,

    /// Relevance score assigned by the backend.
    #[serde(default)]
    pub score: f64,

    /// Optional document reference carrying a human title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentRef>,
}

/// A lightweight reference to the chunk's document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ScoredChunk {
    /// Page bounds as `(start_page, end_page)`; `None` for absent or non-integer values.
    pub fn page_bounds(&self) -> (Option<i64>, Option<i64>) {
        (
            integer_field(&self.metadata, "start_page"),
            integer_field(&self.metadata, "end_page"),
        )
    }

    /// Time bounds in seconds as `(start_time, end_time)`; `None` for absent or non-numeric values.
    pub fn time_bounds(&self) -> (Option<f64>, Option<f64>) {
        (
            float_field(&self.metadata, "start_time"),
            float_field(&self.metadata, "end_time"),
        )
    }

    /// The `source_url` from document metadata, if it is a non-empty string.
    pub fn source_url(&self) -> Option<&str> {
        self.document_metadata
            .get("source_url")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// The document title used to label media, if any.
    pub fn document_title(&self) -> Option<&str> {
        self.document.as_ref().and_then(|d| d.title.as_deref())
    }
}

fn integer_field(map: &Map<String, Value>, key: &str) -> Option<i64> {
    let value = map.get(key)?;
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    // Backends occasionally encode whole pages as floats (3.0).
    value
        .as_f64()
        .filter(|f| f.is_finite() && f.fract() == 0.0)
        .map(|f| f as i64)
}

fn float_field(map: &Map<String, Value>, key: &str) -> Option<f64> {
    map.get(key)?.as_f64().filter(|f| f.is_finite())
}

/// A single media link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl Link {
    pub fn new(href: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            media_type: Some(media_type.into()),
        }
    }
}

/// The kinds of link a backend attaches to a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkKind {
    SelfImage,
    PreviewImage,
    SelfVideo,
    PreviewVideo,
    SelfAudio,
    PreviewAudio,
    SelfVideoStream,
    SelfVideoDownload,
    SelfAudioStream,
    SelfAudioDownload,
    DocumentVideoStream,
    DocumentVideoDownload,
    DocumentAudioStream,
    DocumentAudioDownload,
}

impl LinkKind {
    pub const ALL: [LinkKind; 14] = [
        LinkKind::SelfImage,
        LinkKind::PreviewImage,
        LinkKind::SelfVideo,
        LinkKind::PreviewVideo,
        LinkKind::SelfAudio,
        LinkKind::PreviewAudio,
        LinkKind::SelfVideoStream,
        LinkKind::SelfVideoDownload,
        LinkKind::SelfAudioStream,
        LinkKind::SelfAudioDownload,
        LinkKind::DocumentVideoStream,
        LinkKind::DocumentVideoDownload,
        LinkKind::DocumentAudioStream,
        LinkKind::DocumentAudioDownload,
    ];

    /// The wire key for this link kind.
    pub fn as_key(&self) -> &'static str {
        match self {
            LinkKind::SelfImage => "self_image",
            LinkKind::PreviewImage => "preview_image",
            LinkKind::SelfVideo => "self_video",
            LinkKind::PreviewVideo => "preview_video",
            LinkKind::SelfAudio => "self_audio",
            LinkKind::PreviewAudio => "preview_audio",
            LinkKind::SelfVideoStream => "self_video_stream",
            LinkKind::SelfVideoDownload => "self_video_download",
            LinkKind::SelfAudioStream => "self_audio_stream",
            LinkKind::SelfAudioDownload => "self_audio_download",
            LinkKind::DocumentVideoStream => "document_video_stream",
            LinkKind::DocumentVideoDownload => "document_video_download",
            LinkKind::DocumentAudioStream => "document_audio_stream",
            LinkKind::DocumentAudioDownload => "document_audio_download",
        }
    }

    /// Parse a wire key. Unknown keys yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_key() == key)
    }
}

/// The links attached to a chunk, keyed by [`LinkKind`].
///
/// A kind may be present with a `None` value: the backend announced the
/// slot but has nothing in it. `contains` and `get` distinguish the two.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "HashMap<String, Option<Link>>",
    into = "BTreeMap<String, Option<Link>>"
)]
pub struct ChunkLinks {
    slots: BTreeMap<LinkKind, Option<Link>>,
}

impl ChunkLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, kind: LinkKind, link: Link) -> Self {
        self.slots.insert(kind, Some(link));
        self
    }

    /// Builder-style insert of an announced but empty slot.
    pub fn with_empty(mut self, kind: LinkKind) -> Self {
        self.slots.insert(kind, None);
        self
    }

    /// Whether the backend announced this slot at all.
    pub fn contains(&self, kind: LinkKind) -> bool {
        self.slots.contains_key(&kind)
    }

    /// The link in this slot, if announced and non-null.
    pub fn get(&self, kind: LinkKind) -> Option<&Link> {
        self.slots.get(&kind).and_then(Option::as_ref)
    }

    /// The href in this slot, if any.
    pub fn href(&self, kind: LinkKind) -> Option<&str> {
        self.get(kind).and_then(|l| l.href.as_deref())
    }

    /// First non-null link among `kinds`, in order.
    pub fn first_of(&self, kinds: &[LinkKind]) -> Option<&Link> {
        kinds.iter().find_map(|k| self.get(*k))
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl From<HashMap<String, Option<Link>>> for ChunkLinks {
    fn from(raw: HashMap<String, Option<Link>>) -> Self {
        let slots = raw
            .into_iter()
            .filter_map(|(key, link)| LinkKind::from_key(&key).map(|kind| (kind, link)))
            .collect();
        Self { slots }
    }
}

impl From<ChunkLinks> for BTreeMap<String, Option<Link>> {
    fn from(links: ChunkLinks) -> Self {
        links
            .slots
            .into_iter()
            .map(|(kind, link)| (kind.as_key().to_string(), link))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_backend_chunk() {
        let json = r#"{
            "text": "Refunds are processed within 14 days.",
            "score": 0.82,
            "document_id": "doc_1",
            "document_name": "policy.pdf",
            "document_metadata": {"source_type": "google_drive"},
            "metadata": {"start_page": 3, "end_page": 4},
            "links": {
                "self_image": {"href": "https://api.example.com/img.png", "media_type": "image/png"},
                "self_video_stream": null,
                "self_text": {"href": "https://api.example.com/text", "media_type": "text/plain"}
            }
        }"#;
        let chunk: ScoredChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.document_id, "doc_1");
        assert_eq!(chunk.page_bounds(), (Some(3), Some(4)));
        assert_eq!(chunk.time_bounds(), (None, None));
        assert_eq!(
            chunk.links.href(LinkKind::SelfImage),
            Some("https://api.example.com/img.png")
        );
        assert!(chunk.links.contains(LinkKind::SelfVideoStream));
        assert!(chunk.links.get(LinkKind::SelfVideoStream).is_none());
        assert!(!chunk.links.contains(LinkKind::SelfAudioStream));
    }

    #[test]
    fn malformed_positions_are_none() {
        let chunk: ScoredChunk = serde_json::from_str(
            r#"{"document_id": "d", "metadata": {"start_page": "3", "end_page": 4.5, "start_time": 1.5}}"#,
        )
        .unwrap();
        assert_eq!(chunk.page_bounds(), (None, None));
        assert_eq!(chunk.time_bounds(), (Some(1.5), None));
    }

    #[test]
    fn whole_float_pages_accepted() {
        let chunk: ScoredChunk =
            serde_json::from_str(r#"{"document_id": "d", "metadata": {"start_page": 2.0, "end_page": 5}}"#)
                .unwrap();
        assert_eq!(chunk.page_bounds(), (Some(2), Some(5)));
    }

    #[test]
    fn empty_source_url_is_absent() {
        let mut chunk = ScoredChunk {
            document_id: "d".into(),
            ..Default::default()
        };
        chunk
            .document_metadata
            .insert("source_url".into(), Value::String(String::new()));
        assert!(chunk.source_url().is_none());
    }

    #[test]
    fn link_kind_keys_roundtrip() {
        for kind in LinkKind::ALL {
            assert_eq!(LinkKind::from_key(kind.as_key()), Some(kind));
        }
        assert_eq!(LinkKind::from_key("self_text"), None);
    }

    #[test]
    fn first_of_skips_null_slots() {
        let links = ChunkLinks::new()
            .with_empty(LinkKind::SelfImage)
            .with(LinkKind::PreviewImage, Link::new("https://x/p.png", "image/png"));
        let link = links
            .first_of(&[LinkKind::SelfImage, LinkKind::PreviewImage])
            .unwrap();
        assert_eq!(link.href.as_deref(), Some("https://x/p.png"));
    }
}
