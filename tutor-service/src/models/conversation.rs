//! Conversation model for per-session message history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A conversation thread, keyed by session id. One document owns its full
/// message history, so deletion of the record and all its messages is a
/// single atomic write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Session identifier (document key).
    #[serde(rename = "_id")]
    pub session_id: String,

    /// When the conversation was first created. Set once on upsert, never
    /// reset by repeated ensure calls.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,

    /// Messages in this conversation, in append order.
    pub messages: Vec<StoredMessage>,

    /// Total number of messages.
    pub message_count: i32,
}

/// One turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Message identifier.
    pub id: String,

    /// Who produced this turn.
    pub role: Role,

    /// Ordered content parts.
    pub parts: Vec<Part>,

    /// Server-assigned timestamp; the sole ordering key for retrieval.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl StoredMessage {
    /// Create a message with a fresh id and server-now timestamp.
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            parts,
            timestamp: Utc::now(),
        }
    }
}

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// The smallest content unit within a message: text or inline image data.
///
/// The wire shape matches both the stored form and the Gemini REST part
/// shape, so parts flow from upload to storage to model request unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn inline_data(inline_data: InlineData) -> Self {
        Part::InlineData { inline_data }
    }
}

/// Base64-encoded binary payload with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Derived, informational view of a conversation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMetadata {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub message_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<DateTime<Utc>>,
}
