//! Decoding of individual `message_N.json` part files
//!
//! Each part is parsed into a generic JSON tree first, every string in it
//! is repaired, and only then is it decoded into typed records. Decoding
//! the repaired tree keeps the typed layer free of encoding concerns and
//! lets unknown message kinds keep their full (repaired) payload.

use crate::error::{Error, Result};
use crate::repair::{repair, repair_value};
use crate::types::{Attachment, Message, MessageKind, Participant, Reaction, Share};
use serde::Deserialize;
use serde_json::Value;

/// The decoded content of one part file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationPart {
    pub title: String,
    pub participants: Vec<Participant>,
    pub messages: Vec<Message>,
}

impl ConversationPart {
    /// Decode and repair a part file.
    ///
    /// `dir` and `file` are only used to label errors.
    pub fn from_slice(dir: &str, file: &str, bytes: &[u8]) -> Result<Self> {
        let malformed = |e: serde_json::Error| Error::malformed(dir, format!("{file}: {e}"));

        let mut value: Value = serde_json::from_slice(bytes).map_err(malformed)?;
        repair_value(&mut value);

        let raw: RawPart = serde_json::from_value(value).map_err(malformed)?;
        let messages = raw
            .messages
            .into_iter()
            .map(decode_message)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(malformed)?;

        Ok(Self {
            title: raw.title,
            participants: raw.participants,
            messages,
        })
    }
}

/// Just enough of a part file to list its conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartHeader {
    pub title: String,
    /// Latest timestamp in this part (0 when it has no messages)
    pub last_sent: i64,
}

impl PartHeader {
    /// Decode the title and message timestamps, skipping message bodies.
    pub fn from_slice(dir: &str, file: &str, bytes: &[u8]) -> Result<Self> {
        let raw: RawPartHeader = serde_json::from_slice(bytes)
            .map_err(|e| Error::malformed(dir, format!("{file}: {e}")))?;

        Ok(Self {
            title: repair(&raw.title),
            last_sent: raw
                .messages
                .iter()
                .map(|m| m.timestamp_ms)
                .max()
                .unwrap_or(0),
        })
    }
}

// ============================================
// Raw JSON record types (serde deserialization)
// ============================================

#[derive(Debug, Deserialize)]
struct RawPart {
    title: String,
    participants: Vec<Participant>,
    messages: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawPartHeader {
    title: String,
    messages: Vec<RawTimestamp>,
}

#[derive(Debug, Deserialize)]
struct RawTimestamp {
    timestamp_ms: i64,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    sender_name: String,
    timestamp_ms: i64,
    #[serde(rename = "type")]
    kind: Option<String>,
    content: Option<String>,
    #[serde(default)]
    photos: Vec<Attachment>,
    #[serde(default)]
    gifs: Vec<Attachment>,
    #[serde(default)]
    videos: Vec<Attachment>,
    #[serde(default)]
    audio_files: Vec<Attachment>,
    #[serde(default)]
    files: Vec<Attachment>,
    sticker: Option<Attachment>,
    share: Option<Share>,
    #[serde(default)]
    reactions: Vec<Reaction>,
    #[serde(default)]
    is_unsent: bool,
}

fn decode_message(value: Value) -> std::result::Result<Message, serde_json::Error> {
    let raw = RawMessage::deserialize(&value)?;
    let kind = MessageKind::from_tag(raw.kind.as_deref(), || value.clone());

    Ok(Message {
        sender_name: raw.sender_name,
        timestamp_ms: raw.timestamp_ms,
        kind,
        content: raw.content,
        photos: raw.photos,
        gifs: raw.gifs,
        videos: raw.videos,
        audio_files: raw.audio_files,
        files: raw.files,
        sticker: raw.sticker,
        share: raw.share,
        reactions: raw.reactions,
        is_unsent: raw.is_unsent,
    })
}
