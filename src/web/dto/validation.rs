//! Validating JSON extractor and custom field validators.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::web::error::ApiError;

const MAX_TOPIC_KEY_LEN: usize = 64;

/// A JSON extractor that validates the request body.
///
/// Malformed JSON is a 400; a body that fails validation is a 422 with
/// field-level details.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e)))?;

        body.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedJson(body))
    }
}

/// A topic key: ASCII letters, digits, `_` or `-`.
///
/// Whether the key names a known topic is decided by the handler.
pub fn topic_key(value: &str) -> Result<(), ValidationError> {
    let well_formed = !value.is_empty()
        && value.len() <= MAX_TOPIC_KEY_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if well_formed {
        Ok(())
    } else {
        Err(ValidationError::new("topic_key").with_message("Invalid topic key".into()))
    }
}
