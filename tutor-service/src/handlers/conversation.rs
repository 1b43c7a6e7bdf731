//! Conversation route handlers.
//!
//! The problem-solver handler orchestrates one tutoring turn in a fixed
//! sequential order: validate input, resolve the session, ensure the
//! conversation record, persist the user turn, fetch the full history,
//! invoke the model, persist the assistant turn, respond. The order
//! guarantees the just-sent user turn is part of the model context and that
//! the reply is durably stored before it reaches the client.

use crate::dtos::{
    DeleteResponse, MessagesResponse, MetadataResponse, ProblemSolverBody, ProblemSolverResponse,
    ResponseMode,
};
use crate::models::{Part, Role};
use crate::services::image;
use crate::services::providers::Content;
use crate::session;
use crate::startup::AppState;
use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::header::CONTENT_TYPE,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use service_core::error::AppError;
use validator::Validate;

/// Raster formats accepted for uploaded problem photos.
const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/bmp",
    "image/tiff",
];

/// Fixed tutoring system prompt sent with every model call.
const SYSTEM_INSTRUCTIONS: &str = "You are a Professional Math Tutor tasked with creating detailed guides on how to solve math problems. You must check the question and must structure your response in this way:

1. Identify the question being asked and try to predict the grade level of the math subject but do not mention it. Simplify your language to accommodate this prediction.
2. Broadly explain to the user what is being asked but don't give the method and solution

When prompted by the user to give a hint:
- Explain the method needed to solve the solution but do not give the solution, give an example that can help the user understand this method.

If the user asks for the solution:
- Give the user the detailed step-by-step guide with methods used to reach the solution.

The user may ask for an explanation of certain terms, in this case, explain in a simple manner in context with the problem.

When analyzing images containing math problems:
- First describe what you see in the image clearly
- Identify the mathematical problem or question
- Follow the same tutoring structure as above";

/// An uploaded image that passed the upload-layer checks.
struct UploadedImage {
    bytes: Vec<u8>,
    mime_type: String,
}

/// Parsed problem-solver input, independent of the request encoding.
struct SolverInput {
    body: ProblemSolverBody,
    image: Option<UploadedImage>,
}

fn mime_allowed(mime_type: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime_type.to_ascii_lowercase().as_str())
}

async fn parse_multipart(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<SolverInput, AppError> {
    let mut body = ProblemSolverBody::default();
    let mut uploaded = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(anyhow::anyhow!("Failed to read multipart field: {}", e))
    })? {
        match field.name().unwrap_or_default() {
            "message" => {
                body.message = Some(field.text().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Failed to read message field: {}", e))
                })?);
            }
            "sessionId" => {
                body.session_id = Some(field.text().await.map_err(|e| {
                    AppError::BadRequest(anyhow::anyhow!("Failed to read sessionId field: {}", e))
                })?);
            }
            "image" => {
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_ascii_lowercase();

                if !mime_allowed(&mime_type) {
                    return Err(AppError::BadRequest(anyhow::anyhow!(
                        "File type {} not allowed. Only image files (JPEG, PNG, WebP, BMP, TIFF) are supported.",
                        mime_type
                    )));
                }

                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| {
                        AppError::BadRequest(anyhow::anyhow!("Failed to read image file: {}", e))
                    })?
                    .to_vec();

                if bytes.len() > max_upload_bytes {
                    return Err(AppError::BadRequest(anyhow::anyhow!(
                        "Image file too large. Maximum file size: {}MB",
                        max_upload_bytes / (1024 * 1024)
                    )));
                }

                uploaded = Some(UploadedImage { bytes, mime_type });
            }
            // Unknown fields are ignored
            _ => {}
        }
    }

    Ok(SolverInput {
        body,
        image: uploaded,
    })
}

/// Parse either a multipart form or a JSON body into solver input. All
/// upload-layer validation (file type, file size) happens here, before any
/// persistence or model work begins.
async fn parse_input(state: &AppState, req: Request) -> Result<SolverInput, AppError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let input = if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid multipart body: {}", e)))?;
        parse_multipart(multipart, state.config.upload.max_bytes).await?
    } else {
        let Json(body) = Json::<ProblemSolverBody>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid request body: {}", e)))?;
        SolverInput { body, image: None }
    };

    input.body.validate()?;
    Ok(input)
}

// PROBLEM SOLVER MODE (POST /api/conversation/problem-solver) - unified text
// and image support
pub async fn problem_solver(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
) -> Result<(CookieJar, Json<ProblemSolverResponse>), AppError> {
    let input = parse_input(&state, req).await?;

    let resolved = session::resolve_session(input.body.session_id.as_deref(), &jar);
    if !resolved.is_valid {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Invalid session ID format"
        )));
    }
    let session_id = resolved.session_id;

    state.db.ensure_conversation(&session_id).await?;

    let message = input
        .body
        .message
        .filter(|m| !m.trim().is_empty());

    // Session-initialization probe: no text, no file. Return the resolved
    // session id without touching history or the model.
    if message.is_none() && input.image.is_none() {
        tracing::debug!(session_id = %session_id, "Session-only request");
        let jar = jar.add(session::session_cookie(&session_id));
        return Ok((
            jar,
            Json(ProblemSolverResponse {
                success: true,
                message: String::new(),
                mode: ResponseMode::SessionOnly,
                session_id,
                timestamp: Utc::now(),
            }),
        ));
    }

    let mode = match (&input.image, &message) {
        (Some(_), Some(_)) => ResponseMode::ProblemSolverImageAndText,
        (Some(_), None) => ResponseMode::ProblemSolverImage,
        (None, _) => ResponseMode::ProblemSolverText,
    };

    // Build the user turn: at most one text part followed by at most one
    // inline-data part.
    let mut parts = Vec::new();
    if let Some(text) = &message {
        parts.push(Part::text(text.clone()));
    }
    if let Some(uploaded) = &input.image {
        let compressed = image::compress(&uploaded.bytes)?;
        // Compression always re-encodes as JPEG regardless of the upload type
        parts.push(Part::inline_data(image::to_inline_payload(
            &compressed,
            "image/jpeg",
        )));
        tracing::debug!(
            session_id = %session_id,
            upload_mime = %uploaded.mime_type,
            upload_bytes = uploaded.bytes.len(),
            compressed_bytes = compressed.len(),
            "Attached compressed image to user turn"
        );
    }

    state
        .db
        .append_message(&session_id, Role::User, parts)
        .await?;

    let history = state.db.list_messages(&session_id).await?;
    let contents: Vec<Content> = history
        .into_iter()
        .map(|m| Content {
            role: m.role,
            parts: m.parts,
        })
        .collect();

    let text = state
        .text_provider
        .generate(SYSTEM_INSTRUCTIONS, &contents)
        .await
        .map_err(|e| {
            tracing::error!(session_id = %session_id, error = %e, "Model invocation failed");
            AppError::from(e)
        })?;

    state
        .db
        .append_message(&session_id, Role::Assistant, vec![Part::text(text.clone())])
        .await?;

    tracing::info!(
        session_id = %session_id,
        mode = ?mode,
        reply_chars = text.len(),
        "Problem-solver turn completed"
    );

    let jar = jar.add(session::session_cookie(&session_id));
    Ok((
        jar,
        Json(ProblemSolverResponse {
            success: true,
            message: text,
            mode,
            session_id,
            timestamp: Utc::now(),
        }),
    ))
}

// GET CONVERSATION MESSAGES (GET /api/conversation/:sessionId)
pub async fn get_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<MessagesResponse>, AppError> {
    let messages = state.db.list_messages(&session_id).await?;

    Ok(Json(MessagesResponse {
        success: true,
        session_id,
        messages: messages.into_iter().map(Into::into).collect(),
        timestamp: Utc::now(),
    }))
}

// DELETE CONVERSATION (DELETE /api/conversation/:sessionId)
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    state.db.delete_conversation(&session_id).await?;

    tracing::info!(session_id = %session_id, "Conversation deleted");

    Ok(Json(DeleteResponse {
        success: true,
        message: format!(
            "Conversation with sessionId {} deleted successfully",
            session_id
        ),
        timestamp: Utc::now(),
    }))
}

// CONVERSATION METADATA (GET /api/conversation/:sessionId/metadata)
pub async fn get_conversation_metadata(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<MetadataResponse>, AppError> {
    let metadata = state
        .db
        .metadata(&session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Conversation not found")))?;

    Ok(Json(MetadataResponse {
        success: true,
        metadata,
        timestamp: Utc::now(),
    }))
}
