use axum::{Extension, Json, extract::State};
use axum_extra::extract::WithRejection;
use tracing::{debug, error};

use magus_types::api::{ChatRequest, ChatResponse, SessionClaims};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::inference::{InferenceClient, InferenceError};

/// Reply used when no inference endpoint is configured.
pub const STUB_REPLY: &str = "Thank you";

/// Produces the assistant's side of a chat exchange.
#[derive(Debug, Clone)]
pub enum ChatResponder {
    /// Constant reply, no external call.
    Stub,
    /// Single pass-through call to a hosted model.
    Hosted(InferenceClient),
}

impl ChatResponder {
    pub async fn reply(&self, prompt: &str) -> Result<String, InferenceError> {
        match self {
            Self::Stub => Ok(STUB_REPLY.to_string()),
            Self::Hosted(client) => client.complete(prompt).await,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Stub => "stub".to_string(),
            Self::Hosted(client) => format!("hosted ({})", client.model()),
        }
    }
}

/// POST /api/chat — relay one prompt, return one reply. Session required.
pub async fn send(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    WithRejection(Json(req), _): WithRejection<Json<ChatRequest>, ApiError>,
) -> Result<Json<ChatResponse>, ApiError> {
    let prompt = req
        .prompt
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Prompt is required".into()))?;

    debug!("Chat prompt from {} ({} chars)", claims.email, prompt.chars().count());

    let message = state.responder.reply(&prompt).await.map_err(|e| {
        error!("Error processing chat message: {}", e);
        ApiError::Upstream("Failed to process message".into())
    })?;

    Ok(Json(ChatResponse { message }))
}
