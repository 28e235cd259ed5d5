//! Caller-facing results: consolidated sources and inline media.
//!
//! These are what a chat turn carries to its display layer, so they
//! serialize in camelCase.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One consolidated source per retrieved document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    /// The representative chunk's document metadata, flattened in.
    #[serde(flatten)]
    pub document_metadata: Map<String, Value>,

    pub document_id: String,

    pub document_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_stream_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Direct-fetch URL on the retrieval backend, set when the document has
    /// no `source_url` of its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_source_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_page: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_page: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,

    /// Every disjoint merged page range, in order.
    #[serde(default)]
    pub merged_ranges: Vec<PageRange>,

    /// Every disjoint merged time range, in order.
    #[serde(default)]
    pub merged_time_ranges: Vec<TimeRange>,
}

impl SourceMetadata {
    /// Serialized names of the explicit fields.
    pub const FIELD_KEYS: [&'static str; 13] = [
        "documentId",
        "documentName",
        "streamUrl",
        "downloadUrl",
        "documentStreamUrl",
        "imageUrl",
        "backendSourceUrl",
        "startPage",
        "endPage",
        "startTime",
        "endTime",
        "mergedRanges",
        "mergedTimeRanges",
    ];

    /// Copy `metadata` for flattening, minus keys an explicit field owns.
    pub fn extra_metadata(metadata: &Map<String, Value>) -> Map<String, Value> {
        metadata
            .iter()
            .filter(|(key, _)| !Self::FIELD_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRange {
    pub start_page: i64,
    pub end_page: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_time: f64,
    pub end_time: f64,
}

/// The kind of an inline media asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// The MIME primary type this kind accepts.
    pub fn primary_type(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }

    /// Whether `mime` (e.g. `Image/PNG`) belongs to this kind.
    pub fn accepts(&self, mime: &str) -> bool {
        mime.split_once('/')
            .is_some_and(|(primary, _)| primary.eq_ignore_ascii_case(self.primary_type()))
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.primary_type())
    }
}

/// A playable or viewable asset referenced by retrieved content.
///
/// `url` always points at the same-origin proxy, never at the upstream asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMedia {
    pub kind: MediaKind,
    pub url: String,
    pub mime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_accepts_case_insensitive() {
        assert!(MediaKind::Image.accepts("IMAGE/png"));
        assert!(MediaKind::Video.accepts("video/mp4"));
        assert!(!MediaKind::Audio.accepts("video/mp4"));
        assert!(!MediaKind::Image.accepts("image"));
        assert!(!MediaKind::Image.accepts("imagery/png"));
    }

    #[test]
    fn source_serializes_camel_case_with_flattened_metadata() {
        let mut meta = Map::new();
        meta.insert("source_type".into(), Value::String("notion".into()));
        let source = SourceMetadata {
            document_metadata: meta,
            document_id: "doc_1".into(),
            document_name: "Handbook".into(),
            start_page: Some(1),
            end_page: Some(6),
            merged_ranges: vec![PageRange {
                start_page: 1,
                end_page: 6,
            }],
            ..Default::default()
        };
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["documentId"], "doc_1");
        assert_eq!(json["source_type"], "notion");
        assert_eq!(json["mergedRanges"][0]["endPage"], 6);
        assert_eq!(json["mergedTimeRanges"], serde_json::json!([]));
        assert!(json.get("streamUrl").is_none());
    }

    #[test]
    fn explicit_fields_win_over_colliding_metadata() {
        let meta = serde_json::json!({
            "documentId": "stale",
            "startPage": 99,
            "source_type": "notion",
        });
        let source = SourceMetadata {
            document_metadata: SourceMetadata::extra_metadata(meta.as_object().unwrap()),
            document_id: "doc_1".into(),
            start_page: Some(3),
            ..Default::default()
        };

        let text = serde_json::to_string(&source).unwrap();
        assert_eq!(text.matches(r#""documentId""#).count(), 1);
        assert_eq!(text.matches(r#""startPage""#).count(), 1);

        let json: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["documentId"], "doc_1");
        assert_eq!(json["startPage"], 3);
        assert_eq!(json["source_type"], "notion");
    }

    #[test]
    fn chat_media_kind_serializes_lowercase() {
        let media = ChatMedia {
            kind: MediaKind::Audio,
            url: "/api/ragie/stream?url=x".into(),
            mime: "audio/mpeg".into(),
            label: None,
        };
        let json = serde_json::to_string(&media).unwrap();
        assert!(json.contains(r#""kind":"audio""#));
        assert!(!json.contains("label"));
    }
}
