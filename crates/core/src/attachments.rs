//! Chat attachments: media as the message list displays it.
//!
//! Retrieved [`ChatMedia`] is converted into attachments for a chat
//! message, and attachments arriving in later updates are merged by id.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::source::{ChatMedia, MediaKind};

static IMAGE_MIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^image/(png|jpe?g|gif|webp|bmp|tiff|svg\+xml)$").expect("valid regex")
});

static IMAGE_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(png|jpe?g|gif|webp|bmp|tiff|svg)$").expect("valid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub mime: String,
    pub kind: AttachmentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Whether a file is a displayable image.
///
/// A non-empty MIME type is authoritative; the file extension is only
/// consulted when no MIME type is known.
pub fn is_image(name: Option<&str>, mime: Option<&str>) -> bool {
    match mime.filter(|m| !m.is_empty()) {
        Some(mime) => IMAGE_MIME.is_match(mime),
        None => IMAGE_EXTENSION.is_match(name.unwrap_or_default()),
    }
}

/// Convert retrieved media into message attachments.
///
/// Ids are `<kind>-<index>`; the label doubles as filename and caption.
pub fn convert_media_to_attachments(media: &[ChatMedia]) -> Vec<Attachment> {
    media
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let id = format!("{}-{}", item.kind, index);
            Attachment {
                filename: item.label.clone().unwrap_or_else(|| id.clone()),
                id,
                mime: item.mime.clone(),
                kind: if item.kind == MediaKind::Image {
                    AttachmentKind::Image
                } else {
                    AttachmentKind::File
                },
                caption: item.label.clone(),
            }
        })
        .collect()
}

/// Append attachments whose id is not already present.
///
/// Existing entries are kept unchanged, including when a newer attachment
/// shares their id.
pub fn merge_attachments(existing: &[Attachment], incoming: &[Attachment]) -> Vec<Attachment> {
    let mut seen: HashSet<&str> = existing.iter().map(|a| a.id.as_str()).collect();
    let mut merged = existing.to_vec();

    for attachment in incoming {
        if seen.insert(attachment.id.as_str()) {
            merged.push(attachment.clone());
        }
    }

    merged
}
