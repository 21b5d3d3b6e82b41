use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use tracing::{debug, error};

use crate::auth::AppState;
use crate::error::ApiError;

/// API guard: 401 unless the request carries a valid session. The verified
/// claims are handed to the handler as an extension.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = state
        .sessions
        .from_request(&jar, req.headers())
        .ok_or(ApiError::Unauthorized)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Page guard: unauthenticated visitors are sent to the login page.
pub async fn require_page_session(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    if state.sessions.from_request(&jar, req.headers()).is_none() {
        return Redirect::to("/login").into_response();
    }
    next.run(req).await
}

/// User administration guard for the API.
pub async fn require_admin(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !admin_allowed(&state, &jar, req.headers(), req.uri().path()).await {
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(req).await)
}

/// User administration guard for the management page.
pub async fn require_admin_page(
    State(state): State<AppState>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Response {
    if !admin_allowed(&state, &jar, req.headers(), req.uri().path()).await {
        return Redirect::to("/login").into_response();
    }
    next.run(req).await
}

/// A signed-in user may administer accounts. While the store is empty
/// anyone may, so the first account can be created.
async fn admin_allowed(state: &AppState, jar: &CookieJar, headers: &HeaderMap, path: &str) -> bool {
    if state.sessions.from_request(jar, headers).is_some() {
        return true;
    }

    let db = state.db.clone();
    match crate::blocking(move || db.count_users()).await {
        Ok(0) => {
            debug!("Empty credential store, allowing bootstrap access to {}", path);
            true
        }
        Ok(_) => false,
        Err(e) => {
            error!("Failed to count users: {}", e);
            false
        }
    }
}
