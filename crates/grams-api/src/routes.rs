use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::{AppState, auth, comments, grams, pictures, with_db};

/// Where successful gram and comment actions redirect to.
pub const ROOT_PATH: &str = "/";
/// Where unauthenticated callers are redirected to.
pub const LOGIN_PATH: &str = "/auth/login";

pub fn router(state: AppState) -> Router {
    let body_limit = state.max_picture_bytes;

    Router::new()
        .route("/", get(grams::list_grams))
        .route("/grams", get(grams::list_grams).post(grams::create_gram))
        .route("/grams/new", get(grams::new_gram))
        .route(
            "/grams/{id}",
            get(grams::show_gram)
                .patch(grams::update_gram)
                .put(grams::update_gram)
                .delete(grams::destroy_gram),
        )
        .route("/grams/{id}/edit", get(grams::edit_gram))
        .route("/grams/{id}/comments", post(comments::create_comment))
        .route("/pictures", post(pictures::upload_picture))
        .route("/pictures/{id}", get(pictures::download_picture))
        .route("/auth/register", post(auth::register))
        .route(LOGIN_PATH, get(auth::login_form).post(auth::login))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let grams = with_db(&state, |db| db.count_grams()).await?;
    Ok(Json(json!({ "status": "ok", "grams": grams })))
}
