pub mod auth;
pub mod comments;
pub mod error;
pub mod grams;
pub mod middleware;
pub mod pictures;
pub mod policy;
pub mod routes;
pub mod storage;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use grams_db::Database;

use crate::error::ApiError;
use crate::storage::PictureStore;

pub use routes::router;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub pictures: PictureStore,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub max_picture_bytes: usize,
}

/// Run a blocking DB call off the async runtime.
pub(crate) async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(|e| {
            error!("Database error: {}", e);
            ApiError::Internal
        })
}

/// Decode a JSON request body. Handlers take the raw bytes and call this
/// only after their lookup and ownership checks have passed.
pub(crate) fn parse_json<T: DeserializeOwned>(
    body: Result<Bytes, BytesRejection>,
) -> Result<T, ApiError> {
    let body = body.map_err(|e| {
        debug!("Unreadable request body: {}", e);
        ApiError::BadRequest("request body could not be read")
    })?;

    serde_json::from_slice(&body).map_err(|e| {
        debug!("Malformed request body: {}", e);
        ApiError::BadRequest("request body is not valid JSON for this action")
    })
}
