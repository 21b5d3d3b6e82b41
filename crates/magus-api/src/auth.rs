use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{CookieJar, WithRejection};
use tracing::{error, info, warn};

use magus_db::Database;
use magus_types::api::{LoginRequest, SessionResponse, SuccessResponse};

use crate::chat::ChatResponder;
use crate::credentials::{normalize_email, normalize_password, required, verify_password};
use crate::error::ApiError;
use crate::session::Sessions;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub sessions: Sessions,
    pub responder: ChatResponder,
}

/// POST /api/auth/login — verify credentials, set the session cookie.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(email), Some(password)) = (required(req.email), required(req.password)) else {
        return Err(ApiError::BadRequest("Email and password are required".into()));
    };

    let email = normalize_email(&email);
    let password = normalize_password(&password).to_string();

    let db = state.db.clone();
    let lookup = email.clone();
    let verified = crate::blocking(move || {
        let Some(user) = db.get_user(&lookup)? else {
            return Ok(false);
        };
        if user.password_hash.is_empty() {
            return Ok(false);
        }
        Ok(verify_password(&password, &user.password_hash))
    })
    .await
    .map_err(|e| {
        error!("Login error: {}", e);
        ApiError::Internal("An error occurred during login".into())
    })?;

    if !verified {
        warn!("Failed login for {}", email);
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.sessions.issue(&email).map_err(|e| {
        error!("Failed to sign session token: {}", e);
        ApiError::Internal("An error occurred during login".into())
    })?;

    info!("User {} signed in", email);
    let jar = jar.add(state.sessions.cookie(token));
    Ok((jar, Json(SuccessResponse { success: true })))
}

/// GET /api/auth/session — report who the caller is, if anyone.
pub async fn session(State(state): State<AppState>, jar: CookieJar, headers: HeaderMap) -> Response {
    match state.sessions.from_request(&jar, &headers) {
        Some(claims) => Json(SessionResponse {
            authenticated: true,
            user: Some(claims),
        })
        .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(SessionResponse {
                authenticated: false,
                user: None,
            }),
        )
            .into_response(),
    }
}

/// POST /api/auth/logout — drop the session cookie. Always succeeds.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar.add(state.sessions.expired_cookie());
    (jar, Json(SuccessResponse { success: true }))
}
