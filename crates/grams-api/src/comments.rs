use axum::{
    body::Bytes,
    extract::{Path, State, rejection::BytesRejection},
    response::Redirect,
};
use tracing::info;
use uuid::Uuid;

use grams_types::api::{CommentDraft, CreateCommentRequest};

use crate::AppState;
use crate::error::ApiError;
use crate::grams::load_gram;
use crate::middleware::CurrentUser;
use crate::policy;
use crate::routes::ROOT_PATH;
use crate::{parse_json, with_db};

/// POST /grams/{id}/comments: any signed-in user may comment on any gram.
/// Comments have no owner and cannot be edited or deleted.
pub async fn create_comment(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(raw_gram_id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Redirect, ApiError> {
    let (gram_id, _gram) = load_gram(&state, &raw_gram_id).await?;
    let req: CreateCommentRequest = parse_json(body)?;

    if let Err(errors) = policy::validate_comment(&req.message) {
        return Err(ApiError::InvalidComment(CommentDraft {
            gram_id,
            message: req.message,
            errors,
        }));
    }

    let comment_id = Uuid::new_v4();
    let cid = comment_id.to_string();
    let gid = gram_id.to_string();
    let message = req.message;
    with_db(&state, move |db| db.insert_comment(&cid, &gid, &message)).await?;

    info!("Comment {} on gram {} by {}", comment_id, gram_id, user.username);
    Ok(Redirect::to(ROOT_PATH))
}
