//! Database row types: these map directly to SQLite rows.
//! Distinct from grams-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct PictureRow {
    pub id: String,
    pub uploader_id: String,
    pub content_type: String,
    pub size: i64,
    pub sha256: String,
    pub created_at: String,
}

/// A gram joined with its owner's username.
pub struct GramRow {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub message: String,
    pub picture_id: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct CommentRow {
    pub id: String,
    pub gram_id: String,
    pub message: String,
    pub created_at: String,
}

/// What a gram destruction removed.
pub struct DeletedGram {
    pub picture_id: String,
    pub comments_removed: usize,
    /// False when another gram still references the picture.
    pub picture_released: bool,
}
