use axum::{
    Json,
    body::Bytes,
    extract::{Path, State, rejection::BytesRejection},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use tracing::{error, info};
use uuid::Uuid;

use grams_types::api::UploadPictureResponse;

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::with_db;

pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// POST /pictures: accepts the raw image bytes, stores them under a new id
/// and returns the reference a gram form can point at.
pub async fn upload_picture(
    user: CurrentUser,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| ALLOWED_CONTENT_TYPES.contains(&v.as_str()))
        .ok_or(ApiError::UnsupportedMediaType)?;

    // The router's body limit surfaces here as a rejection.
    let body = body.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(state.max_picture_bytes)
        } else {
            error!("Failed to read picture upload: {}", e);
            ApiError::BadRequest("picture could not be read")
        }
    })?;
    if body.is_empty() {
        return Err(ApiError::BadRequest("picture is empty"));
    }

    let picture_id = Uuid::new_v4();
    let size = body.len() as i64;

    let sha256 = state.pictures.save(&picture_id, &body).await.map_err(|e| {
        error!("Failed to store picture {}: {}", picture_id, e);
        ApiError::Internal
    })?;

    let pid = picture_id.to_string();
    let uid = user.id.to_string();
    let ct = content_type.clone();
    let recorded = with_db(&state, move |db| db.insert_picture(&pid, &uid, &ct, size, &sha256)).await;
    if let Err(e) = recorded {
        // Don't leave an unreferenced file behind.
        if let Err(cleanup) = state.pictures.delete(&picture_id).await {
            error!("Failed to remove picture {} after DB error: {}", picture_id, cleanup);
        }
        return Err(e);
    }

    info!(
        "Picture {} uploaded by {} ({}, {} bytes)",
        picture_id, user.username, content_type, size
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadPictureResponse {
            picture_id,
            size: size as u64,
            url: format!("/pictures/{}", picture_id),
        }),
    ))
}

/// GET /pictures/{id}: public, like the grams that show them.
pub async fn download_picture(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let picture_id: Uuid = raw_id.parse().map_err(|_| ApiError::NotFound)?;

    let pid = picture_id.to_string();
    let picture = with_db(&state, move |db| db.get_picture(&pid))
        .await?
        .ok_or(ApiError::NotFound)?;

    let bytes = state.pictures.read(&picture_id).await.map_err(|e| {
        error!("Failed to read picture {}: {}", picture_id, e);
        ApiError::NotFound
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, picture.content_type),
            (header::ETAG, format!("\"{}\"", picture.sha256)),
        ],
        bytes,
    ))
}
