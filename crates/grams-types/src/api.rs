use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// Claims carried by every bearer token. `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

/// Describes where and how to sign in. Served to callers that were
/// bounced off an authenticated action.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginForm {
    pub action: String,
    pub method: String,
    pub fields: Vec<String>,
}

// -- Grams --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateGramRequest {
    #[serde(default)]
    pub message: String,
    /// Picture reference returned by `POST /pictures`.
    #[serde(default)]
    pub picture: Option<String>,
}

/// Absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateGramRequest {
    pub message: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerResponse {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PictureResponse {
    pub id: Uuid,
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GramResponse {
    pub id: Uuid,
    pub message: String,
    pub picture: PictureResponse,
    pub owner: OwnerResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub comments: Vec<CommentResponse>,
}

/// A gram as it sits in a form: either blank (new), loaded for editing,
/// or bounced back with validation errors.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GramDraft {
    pub id: Option<Uuid>,
    pub message: String,
    pub picture: Option<String>,
    pub errors: Vec<String>,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCommentRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub gram_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentDraft {
    pub gram_id: Uuid,
    pub message: String,
    pub errors: Vec<String>,
}

// -- Pictures --

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadPictureResponse {
    pub picture_id: Uuid,
    pub size: u64,
    pub url: String,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub errors: Vec<String>,
}
