pub mod auth;
pub mod certificates;

use serde::Serialize;
use serde_json::Value;

use crate::gateway::{ApiError, ApiResult};

/// Erase the payload type so every command prints the same envelope.
pub fn into_envelope<T: Serialize>(result: ApiResult<T>) -> ApiResult<Value> {
    result.and_then(|data| match serde_json::to_value(data) {
        Ok(value) => ApiResult::Success(value),
        Err(e) => ApiResult::Failure(ApiError::Encode(e.to_string())),
    })
}
