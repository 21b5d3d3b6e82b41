use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde_json::json;

use crate::auth::AppState;

const LOGIN_PAGE: &str = include_str!("../assets/login.html");
const CHAT_PAGE: &str = include_str!("../assets/chat.html");
const USERS_PAGE: &str = include_str!("../assets/users.html");
const STYLESHEET: &str = include_str!("../assets/app.css");

/// GET / — straight to the chat when signed in, otherwise to the login page.
pub async fn index(State(state): State<AppState>, jar: CookieJar, headers: HeaderMap) -> Response {
    if state.sessions.from_request(&jar, &headers).is_some() {
        Redirect::to("/chat").into_response()
    } else {
        Redirect::to("/login").into_response()
    }
}

pub async fn login() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

pub async fn chat() -> Html<&'static str> {
    Html(CHAT_PAGE)
}

pub async fn users() -> Html<&'static str> {
    Html(USERS_PAGE)
}

pub async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLESHEET)
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
