pub mod auth;
pub mod chat;
pub mod credentials;
pub mod error;
pub mod inference;
pub mod middleware;
pub mod pages;
pub mod router;
pub mod session;
pub mod users;

/// Run a blocking closure (SQLite access, Argon2) off the async runtime.
pub(crate) async fn blocking<F, T>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow::anyhow!("spawn_blocking join error: {}", e))?
}
