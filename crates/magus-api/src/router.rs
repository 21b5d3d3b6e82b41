use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{self, AppState};
use crate::middleware::{require_admin, require_admin_page, require_page_session, require_session};
use crate::{chat, pages, users};

/// Every route the application serves. Guards are attached with
/// `route_layer` so unknown paths still 404 instead of 401.
pub fn build(state: AppState) -> Router {
    let public_routes: Router<AppState> = Router::new()
        .route("/", get(pages::index))
        .route("/login", get(pages::login))
        .route("/health", get(pages::health))
        .route("/assets/app.css", get(pages::stylesheet))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/session", get(auth::session))
        .route("/api/auth/logout", post(auth::logout));

    let chat_routes: Router<AppState> = Router::new()
        .route("/api/chat", post(chat::send))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    let chat_page: Router<AppState> = Router::new()
        .route("/chat", get(pages::chat))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_page_session));

    let admin_routes: Router<AppState> = Router::new()
        .route(
            "/api/users",
            get(users::list)
                .post(users::create)
                .put(users::reset_password)
                .delete(users::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let admin_page: Router<AppState> = Router::new()
        .route("/users", get(pages::users))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin_page));

    Router::new()
        .merge(public_routes)
        .merge(chat_routes)
        .merge(chat_page)
        .merge(admin_routes)
        .merge(admin_page)
        .with_state(state)
}
