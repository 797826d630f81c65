use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use grams_types::api::{CommentDraft, ErrorResponse, GramDraft};

use crate::routes::LOGIN_PATH;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    BadRequest(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("Not Found :(")]
    NotFound,

    #[error("Forbidden :(")]
    Forbidden,

    #[error("gram is invalid: {}", .0.errors.join(", "))]
    InvalidGram(GramDraft),

    #[error("comment is invalid: {}", .0.errors.join(", "))]
    InvalidComment(CommentDraft),

    #[error("picture exceeds the {0} byte limit")]
    PayloadTooLarge(usize),

    #[error("picture must be image/jpeg, image/jpg or image/png")]
    UnsupportedMediaType,

    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::SEE_OTHER,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::InvalidGram(_) | ApiError::InvalidComment(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!("{}", self);

        let status = self.status();
        match self {
            // Challenge: send the caller to the login form.
            ApiError::Unauthenticated => (
                status,
                [
                    (header::LOCATION, LOGIN_PATH),
                    (header::WWW_AUTHENTICATE, "Bearer"),
                ],
            )
                .into_response(),
            ApiError::InvalidGram(draft) => (status, Json(draft)).into_response(),
            ApiError::InvalidComment(draft) => (status, Json(draft)).into_response(),
            other => (
                status,
                Json(ErrorResponse {
                    errors: vec![other.to_string()],
                }),
            )
                .into_response(),
        }
    }
}
