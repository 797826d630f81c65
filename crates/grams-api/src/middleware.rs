use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::debug;
use uuid::Uuid;

use crate::AppState;
use crate::auth::decode_token;
use crate::error::ApiError;
use crate::with_db;

/// The authenticated caller, resolved from the `Authorization: Bearer`
/// header and looked up in the database.
///
/// Taking this as the first handler argument rejects anonymous requests
/// before anything else about the request is inspected.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Unauthenticated)?;

        let claims = decode_token(&state.jwt_secret, bearer.token()).map_err(|e| {
            debug!("Rejected bearer token: {}", e);
            ApiError::Unauthenticated
        })?;

        // Tokens outlive accounts; the user must still exist.
        let user_id = claims.sub.to_string();
        let user = with_db(state, move |db| db.get_user_by_id(&user_id))
            .await?
            .ok_or_else(|| {
                debug!("Token for unknown user {}", claims.sub);
                ApiError::Unauthenticated
            })?;

        Ok(CurrentUser {
            id: claims.sub,
            username: user.username,
        })
    }
}
