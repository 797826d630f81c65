//! Access and validation rules for grams and comments.
//!
//! Handlers apply these in a fixed order: authentication (the
//! [`CurrentUser`] extractor), existence, ownership, then validation.

use tracing::warn;
use uuid::Uuid;

use grams_db::models::GramRow;

use crate::error::ApiError;
use crate::middleware::CurrentUser;

pub const BLANK_MESSAGE: &str = "Message can't be blank";
pub const BLANK_PICTURE: &str = "Picture can't be blank";
pub const INVALID_PICTURE: &str = "Picture is invalid";

/// What a picture reference on a gram form resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PictureStatus {
    Missing,
    /// Malformed, unknown, or uploaded by someone else.
    Unusable,
    Usable(String),
}

/// A gram that passed validation and may be written.
#[derive(Debug, PartialEq, Eq)]
pub struct ValidGram {
    pub message: String,
    pub picture_id: String,
}

/// Blank strings (empty or whitespace only) count as absent.
pub fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn is_owner(owner_id: &str, caller: Uuid) -> bool {
    owner_id.parse::<Uuid>().is_ok_and(|owner| owner == caller)
}

/// Only the owner may edit, update or destroy a gram.
pub fn can_modify(gram: &GramRow, caller: &CurrentUser) -> bool {
    is_owner(&gram.user_id, caller.id)
}

pub fn ensure_can_modify(gram: &GramRow, caller: &CurrentUser) -> Result<(), ApiError> {
    if can_modify(gram, caller) {
        Ok(())
    } else {
        warn!("{} tried to modify gram {} owned by {}", caller.username, gram.id, gram.username);
        Err(ApiError::Forbidden)
    }
}

pub fn validate_gram(message: &str, picture: &PictureStatus) -> Result<ValidGram, Vec<String>> {
    let mut errors = Vec::new();

    if !is_present(message) {
        errors.push(BLANK_MESSAGE.to_string());
    }

    let picture_id = match picture {
        PictureStatus::Missing => {
            errors.push(BLANK_PICTURE.to_string());
            None
        }
        PictureStatus::Unusable => {
            errors.push(INVALID_PICTURE.to_string());
            None
        }
        PictureStatus::Usable(id) => Some(id.clone()),
    };

    match picture_id {
        Some(picture_id) if errors.is_empty() => Ok(ValidGram {
            message: message.to_string(),
            picture_id,
        }),
        _ => Err(errors),
    }
}

pub fn validate_comment(message: &str) -> Result<(), Vec<String>> {
    if is_present(message) {
        Ok(())
    } else {
        Err(vec![BLANK_MESSAGE.to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gram_owned_by(owner: Uuid) -> GramRow {
        GramRow {
            id: Uuid::new_v4().to_string(),
            user_id: owner.to_string(),
            username: "owner".into(),
            message: "Hello!".into(),
            picture_id: Uuid::new_v4().to_string(),
            created_at: "2024-01-01 00:00:00".into(),
            updated_at: "2024-01-01 00:00:00".into(),
        }
    }

    fn caller(id: Uuid) -> CurrentUser {
        CurrentUser {
            id,
            username: "caller".into(),
        }
    }

    #[test]
    fn owner_may_modify() {
        let owner = Uuid::new_v4();
        let gram = gram_owned_by(owner);
        assert!(can_modify(&gram, &caller(owner)));
        assert!(ensure_can_modify(&gram, &caller(owner)).is_ok());
    }

    #[test]
    fn stranger_is_forbidden() {
        let gram = gram_owned_by(Uuid::new_v4());
        let result = ensure_can_modify(&gram, &caller(Uuid::new_v4()));
        assert!(matches!(result, Err(ApiError::Forbidden)));
    }

    #[test]
    fn corrupt_owner_id_matches_nobody() {
        assert!(!is_owner("not-a-uuid", Uuid::nil()));
    }

    #[test]
    fn whitespace_is_blank() {
        assert!(!is_present(""));
        assert!(!is_present("  \n\t"));
        assert!(is_present(" hi "));
    }

    #[test]
    fn valid_gram_keeps_message_verbatim() {
        let picture = PictureStatus::Usable("pic".into());
        let valid = validate_gram(" Hello! ", &picture).unwrap();
        assert_eq!(valid.message, " Hello! ");
        assert_eq!(valid.picture_id, "pic");
    }

    #[test]
    fn gram_errors_accumulate() {
        let errors = validate_gram("", &PictureStatus::Missing).unwrap_err();
        assert_eq!(errors, vec![BLANK_MESSAGE.to_string(), BLANK_PICTURE.to_string()]);

        let errors = validate_gram("Hello!", &PictureStatus::Unusable).unwrap_err();
        assert_eq!(errors, vec![INVALID_PICTURE.to_string()]);

        let errors = validate_gram(" ", &PictureStatus::Usable("pic".into())).unwrap_err();
        assert_eq!(errors, vec![BLANK_MESSAGE.to_string()]);
    }

    #[test]
    fn comment_needs_a_message() {
        assert!(validate_comment("cool!").is_ok());
        assert_eq!(validate_comment("").unwrap_err(), vec![BLANK_MESSAGE.to_string()]);
    }
}
