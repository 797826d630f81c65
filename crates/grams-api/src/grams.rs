use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State, rejection::BytesRejection},
    response::Redirect,
};
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use grams_db::models::{CommentRow, GramRow};
use grams_types::api::{
    CommentResponse, CreateGramRequest, GramDraft, GramResponse, OwnerResponse, PictureResponse,
    UpdateGramRequest,
};

use crate::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::policy::{self, PictureStatus};
use crate::routes::ROOT_PATH;
use crate::{parse_json, with_db};

/// GET / and GET /grams: every gram with its comments. Open to anyone.
pub async fn list_grams(State(state): State<AppState>) -> Result<Json<Vec<GramResponse>>, ApiError> {
    let (rows, comment_rows) = with_db(&state, |db| {
        let rows = db.list_grams()?;
        let gram_ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let comment_rows = db.get_comments_for_grams(&gram_ids)?;
        Ok((rows, comment_rows))
    })
    .await?;

    let mut comments_by_gram: HashMap<String, Vec<CommentResponse>> = HashMap::new();
    for row in comment_rows {
        comments_by_gram
            .entry(row.gram_id.clone())
            .or_default()
            .push(comment_response(row));
    }

    let grams = rows
        .into_iter()
        .map(|row| {
            let comments = comments_by_gram.remove(&row.id).unwrap_or_default();
            gram_response(row, comments)
        })
        .collect();

    Ok(Json(grams))
}

/// GET /grams/new: a blank draft for the create form.
pub async fn new_gram(_user: CurrentUser) -> Json<GramDraft> {
    Json(GramDraft::default())
}

/// POST /grams
pub async fn create_gram(
    user: CurrentUser,
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Redirect, ApiError> {
    let req: CreateGramRequest = parse_json(body)?;
    let picture = resolve_picture(&state, &user, req.picture.as_deref()).await?;

    let valid = match policy::validate_gram(&req.message, &picture) {
        Ok(valid) => valid,
        Err(errors) => {
            return Err(ApiError::InvalidGram(GramDraft {
                id: None,
                message: req.message,
                picture: req.picture,
                errors,
            }));
        }
    };

    let gram_id = Uuid::new_v4();
    let gid = gram_id.to_string();
    let uid = user.id.to_string();
    with_db(&state, move |db| {
        db.insert_gram(&gid, &uid, &valid.message, &valid.picture_id)
    })
    .await?;

    info!("Gram {} created by {}", gram_id, user.username);
    Ok(Redirect::to(ROOT_PATH))
}

/// GET /grams/{id}: open to anyone.
pub async fn show_gram(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<GramResponse>, ApiError> {
    let (_, gram) = load_gram(&state, &raw_id).await?;

    let gid = gram.id.clone();
    let comment_rows = with_db(&state, move |db| db.get_comments_for_grams(&[gid])).await?;
    let comments = comment_rows.into_iter().map(comment_response).collect();

    Ok(Json(gram_response(gram, comments)))
}

/// GET /grams/{id}/edit: the stored gram as a draft, for its owner only.
pub async fn edit_gram(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<GramDraft>, ApiError> {
    let (gram_id, gram) = load_gram(&state, &raw_id).await?;
    policy::ensure_can_modify(&gram, &user)?;

    Ok(Json(GramDraft {
        id: Some(gram_id),
        message: gram.message,
        picture: Some(gram.picture_id),
        errors: vec![],
    }))
}

/// PATCH/PUT /grams/{id}: the body is only read once the caller owns the gram.
pub async fn update_gram(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Redirect, ApiError> {
    let (gram_id, gram) = load_gram(&state, &raw_id).await?;
    policy::ensure_can_modify(&gram, &user)?;
    let req: UpdateGramRequest = parse_json(body)?;

    let message = req.message.unwrap_or(gram.message);
    let (picture_ref, picture) = match req.picture {
        Some(raw) => {
            let status = resolve_picture(&state, &user, Some(raw.as_str())).await?;
            (raw, status)
        }
        None => (gram.picture_id.clone(), PictureStatus::Usable(gram.picture_id)),
    };

    let valid = match policy::validate_gram(&message, &picture) {
        Ok(valid) => valid,
        Err(errors) => {
            return Err(ApiError::InvalidGram(GramDraft {
                id: Some(gram_id),
                message,
                picture: Some(picture_ref),
                errors,
            }));
        }
    };

    let gid = gram_id.to_string();
    let updated = with_db(&state, move |db| {
        db.update_gram(&gid, &valid.message, &valid.picture_id)
    })
    .await?;

    // Destroyed between the lookup and the write.
    if !updated {
        return Err(ApiError::NotFound);
    }

    info!("Gram {} updated by {}", gram_id, user.username);
    Ok(Redirect::to(ROOT_PATH))
}

/// DELETE /grams/{id}: removes the gram, its comments and its picture.
pub async fn destroy_gram(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Redirect, ApiError> {
    let (gram_id, gram) = load_gram(&state, &raw_id).await?;
    policy::ensure_can_modify(&gram, &user)?;

    let gid = gram.id.clone();
    let deleted = with_db(&state, move |db| db.delete_gram(&gid))
        .await?
        .ok_or(ApiError::NotFound)?;

    if deleted.picture_released {
        match deleted.picture_id.parse::<Uuid>() {
            Ok(picture_id) => {
                if let Err(e) = state.pictures.delete(&picture_id).await {
                    warn!("Failed to delete picture {}: {}", picture_id, e);
                }
            }
            Err(e) => warn!("Corrupt picture id '{}' on gram {}: {}", deleted.picture_id, gram_id, e),
        }
    }

    info!(
        "Gram {} destroyed by {} ({} comments removed)",
        gram_id, user.username, deleted.comments_removed
    );
    Ok(Redirect::to(ROOT_PATH))
}

/// Look a gram up by its path id. Ids that are not UUIDs cannot exist,
/// so they are NotFound rather than a bad request.
pub(crate) async fn load_gram(state: &AppState, raw_id: &str) -> Result<(Uuid, GramRow), ApiError> {
    let gram_id: Uuid = raw_id.parse().map_err(|_| ApiError::NotFound)?;

    let gid = gram_id.to_string();
    let gram = with_db(state, move |db| db.get_gram(&gid))
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok((gram_id, gram))
}

/// A picture is usable when it exists and the caller uploaded it.
async fn resolve_picture(
    state: &AppState,
    user: &CurrentUser,
    raw: Option<&str>,
) -> Result<PictureStatus, ApiError> {
    let Some(raw) = raw.filter(|r| policy::is_present(r)) else {
        return Ok(PictureStatus::Missing);
    };
    let Ok(picture_id) = raw.trim().parse::<Uuid>() else {
        return Ok(PictureStatus::Unusable);
    };

    let pid = picture_id.to_string();
    let picture = with_db(state, move |db| db.get_picture(&pid)).await?;

    Ok(match picture {
        Some(p) if policy::is_owner(&p.uploader_id, user.id) => PictureStatus::Usable(p.id),
        _ => PictureStatus::Unusable,
    })
}

fn gram_response(row: GramRow, comments: Vec<CommentResponse>) -> GramResponse {
    let picture_id = parse_uuid(&row.picture_id, "picture_id", &row.id);

    GramResponse {
        id: parse_uuid(&row.id, "id", &row.id),
        message: row.message,
        picture: PictureResponse {
            id: picture_id,
            url: format!("/pictures/{}", picture_id),
        },
        owner: OwnerResponse {
            id: parse_uuid(&row.user_id, "user_id", &row.id),
            username: row.username,
        },
        created_at: parse_timestamp(&row.created_at, &row.id),
        updated_at: parse_timestamp(&row.updated_at, &row.id),
        comments,
    }
}

fn comment_response(row: CommentRow) -> CommentResponse {
    CommentResponse {
        id: parse_uuid(&row.id, "id", &row.id),
        gram_id: parse_uuid(&row.gram_id, "gram_id", &row.id),
        message: row.message,
        created_at: parse_timestamp(&row.created_at, &row.id),
    }
}

fn parse_uuid(raw: &str, column: &str, row_id: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}' on row '{}': {}", column, raw, row_id, e);
        Uuid::default()
    })
}

fn parse_timestamp(raw: &str, row_id: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on row '{}': {}", raw, row_id, e);
            DateTime::default()
        })
}
