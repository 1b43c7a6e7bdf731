//! Domain models for the tutoring service.

pub mod conversation;

pub use conversation::{Conversation, ConversationMetadata, InlineData, Part, Role, StoredMessage};
