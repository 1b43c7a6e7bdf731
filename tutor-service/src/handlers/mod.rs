//! HTTP handlers for the tutoring service.

pub mod conversation;
pub mod health;

pub use conversation::{delete_conversation, get_conversation_metadata, get_messages, problem_solver};
pub use health::{health_check, readiness_check};
