//! Core domain types for inboxview
//!
//! These types are the normalized form of an exported chat archive. Every
//! string they carry has already been through [`crate::repair`], so names
//! can be compared directly.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Archive** | The exported chat-history directory tree |
//! | **Conversation** | One chat thread, stored as a folder of numbered part files |
//! | **Part** | One `message_N.json` file within a conversation folder |
//! | **Participant** | A member of a conversation, identified by display name |
//! | **Attachment** | A media file referenced by an archive-relative URI |

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================
// Participants & attachments
// ============================================

/// A conversation member.
///
/// The archive has no stable numeric id for people; the repaired display
/// name is the identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
}

/// A media file referenced from a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Archive-relative path, including the export's leading `messages/`
    pub uri: String,
    /// When the media was created (seconds), if the export recorded it
    #[serde(default)]
    pub creation_timestamp: Option<i64>,
}

impl Attachment {
    /// File name component of the URI.
    pub fn file_name(&self) -> &str {
        self.uri.rsplit('/').next().unwrap_or(&self.uri)
    }
}

/// A shared link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub link: Option<String>,
    pub share_text: Option<String>,
}

/// An emoji reaction left on a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub reaction: String,
    pub actor: String,
}

// ============================================
// Messages
// ============================================

/// What kind of record a message is.
///
/// The archive tags messages with an open-ended `type` string. Anything
/// other than the kinds we model is kept as [`MessageKind::Unknown`] along
/// with its full decoded payload, and is displayed as plain text.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageKind {
    Generic,
    Share,
    Unknown { kind: String, raw: Value },
}

impl MessageKind {
    /// Classify a raw `type` tag. A missing tag means a generic message.
    pub fn from_tag(tag: Option<&str>, raw: impl FnOnce() -> Value) -> Self {
        match tag {
            None | Some("Generic") => MessageKind::Generic,
            Some("Share") => MessageKind::Share,
            Some(other) => MessageKind::Unknown {
                kind: other.to_string(),
                raw: raw(),
            },
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::Generic => "Generic",
            MessageKind::Share => "Share",
            MessageKind::Unknown { kind, .. } => kind,
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub sender_name: String,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
    pub kind: MessageKind,
    pub content: Option<String>,
    pub photos: Vec<Attachment>,
    pub gifs: Vec<Attachment>,
    pub videos: Vec<Attachment>,
    pub audio_files: Vec<Attachment>,
    pub files: Vec<Attachment>,
    pub sticker: Option<Attachment>,
    pub share: Option<Share>,
    pub reactions: Vec<Reaction>,
    /// The sender removed the message after sending it
    pub is_unsent: bool,
}

/// How a message should be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageBody<'a> {
    Text(&'a str),
    Photos(&'a [Attachment]),
    Sticker(&'a Attachment),
    Link { url: &'a str, text: &'a str },
}

impl Message {
    /// Create a plain generic text message.
    pub fn text(sender_name: impl Into<String>, timestamp_ms: i64, content: &str) -> Self {
        Self {
            sender_name: sender_name.into(),
            timestamp_ms,
            kind: MessageKind::Generic,
            content: Some(content.to_string()),
            photos: Vec::new(),
            gifs: Vec::new(),
            videos: Vec::new(),
            audio_files: Vec::new(),
            files: Vec::new(),
            sticker: None,
            share: None,
            reactions: Vec::new(),
            is_unsent: false,
        }
    }

    /// Text content, or the empty string.
    pub fn content_or_empty(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// Pick the display form for this message.
    ///
    /// Photos win over text for generic messages, stickers are shown only
    /// when there is neither, and shares render as links when they carry
    /// one. Unknown kinds always fall back to text.
    pub fn body(&self) -> MessageBody<'_> {
        let text = self.content_or_empty();
        match &self.kind {
            MessageKind::Generic => {
                if !self.photos.is_empty() {
                    MessageBody::Photos(&self.photos)
                } else if self.content.is_some() {
                    MessageBody::Text(text)
                } else if let Some(sticker) = &self.sticker {
                    MessageBody::Sticker(sticker)
                } else {
                    MessageBody::Text(text)
                }
            }
            MessageKind::Share => match self.share.as_ref().and_then(|s| s.link.as_deref()) {
                Some(url) => MessageBody::Link { url, text },
                None => MessageBody::Text(text),
            },
            MessageKind::Unknown { .. } => MessageBody::Text(text),
        }
    }

    /// Every attachment referenced by this message.
    pub fn attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.photos
            .iter()
            .chain(&self.gifs)
            .chain(&self.videos)
            .chain(&self.audio_files)
            .chain(&self.files)
            .chain(self.sticker.as_ref())
    }

    /// Send time as a UTC timestamp.
    pub fn sent_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp_ms).single()
    }

    /// First `max_chars` characters of the text content, single line.
    pub fn preview(&self, max_chars: usize) -> String {
        let flat = self.content_or_empty().replace('\n', " ");
        if flat.chars().count() <= max_chars {
            return flat;
        }
        let mut out: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

// ============================================
// Conversations
// ============================================

/// A fully merged conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    /// Folder name, the stable identifier for caching and selection
    pub dir_name: String,
    pub title: String,
    /// Deduplicated by name, in first-seen order
    pub participants: Vec<Participant>,
    /// Chronological, oldest first
    pub messages: Vec<Message>,
    /// Latest message timestamp (0 when there are no messages)
    pub last_sent: i64,
}

impl Conversation {
    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            dir_name: self.dir_name.clone(),
            title: self.title.clone(),
            last_sent: self.last_sent,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn has_participant(&self, name: &str) -> bool {
        self.participants.iter().any(|p| p.name == name)
    }
}

/// Cheap projection of a conversation used for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub dir_name: String,
    pub title: String,
    pub last_sent: i64,
}

impl ConversationSummary {
    /// Substring match against title or folder name.
    pub fn matches(&self, query: &str) -> bool {
        self.title.contains(query) || self.dir_name.contains(query)
    }

    pub fn last_sent_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.last_sent).single()
    }
}
