//! Request/response DTOs for the conversation API.

use crate::models::{ConversationMetadata, Part, Role, StoredMessage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// JSON body accepted by the problem-solver endpoint (the multipart form
/// carries the same fields).
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSolverBody {
    /// Upper bound on a single text turn.
    #[validate(length(max = 20000))]
    pub message: Option<String>,
    pub session_id: Option<String>,
}

/// Which input shape produced the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    SessionOnly,
    ProblemSolverText,
    ProblemSolverImage,
    ProblemSolverImageAndText,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemSolverResponse {
    pub success: bool,
    pub message: String,
    pub mode: ResponseMode,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: String,
    pub role: Role,
    pub parts: Vec<Part>,
    pub timestamp: DateTime<Utc>,
}

impl From<StoredMessage> for MessageDto {
    fn from(message: StoredMessage) -> Self {
        Self {
            id: message.id,
            role: message.role,
            parts: message.parts,
            timestamp: message.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesResponse {
    pub success: bool,
    pub session_id: String,
    pub messages: Vec<MessageDto>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataResponse {
    pub success: bool,
    #[serde(flatten)]
    pub metadata: ConversationMetadata,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&ResponseMode::SessionOnly).unwrap(),
            "\"session_only\""
        );
        assert_eq!(
            serde_json::to_string(&ResponseMode::ProblemSolverText).unwrap(),
            "\"problem_solver_text\""
        );
        assert_eq!(
            serde_json::to_string(&ResponseMode::ProblemSolverImage).unwrap(),
            "\"problem_solver_image\""
        );
        assert_eq!(
            serde_json::to_string(&ResponseMode::ProblemSolverImageAndText).unwrap(),
            "\"problem_solver_image_and_text\""
        );
    }

    #[test]
    fn body_accepts_camel_case_session_id() {
        let body: ProblemSolverBody =
            serde_json::from_str(r#"{"message":"hi","sessionId":"session_1_a"}"#).unwrap();
        assert_eq!(body.message.as_deref(), Some("hi"));
        assert_eq!(body.session_id.as_deref(), Some("session_1_a"));
    }

    #[test]
    fn oversized_message_fails_validation() {
        let body = ProblemSolverBody {
            message: Some("x".repeat(20_001)),
            session_id: None,
        };
        assert!(body.validate().is_err());
    }

    #[test]
    fn solver_response_serializes_camel_case() {
        let response = ProblemSolverResponse {
            success: true,
            message: "ok".to_string(),
            mode: ResponseMode::ProblemSolverText,
            session_id: "session_1_a".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["sessionId"], "session_1_a");
        assert_eq!(json["mode"], "problem_solver_text");
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }
}
