use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

/// Surfaced when the transport could not produce a response at all.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error occurred";

/// Why a call failed. `Display` is exactly the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// HTTP 401. The session has already been torn down when the caller
    /// sees this.
    #[error("{0}")]
    Unauthorized(String),

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("{0}")]
    Network(String),

    /// The response body was not what the endpoint promises.
    #[error("{0}")]
    Decode(String),

    /// The request could not be built: body, headers or a local file.
    #[error("{0}")]
    Encode(String),

    /// Client-side validation; never sent.
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    pub fn network() -> Self {
        ApiError::Network(NETWORK_ERROR_MESSAGE.to_string())
    }
}

/// Uniform outcome of every API call.
///
/// Serializes to `{"success": true, "data": ...}` or
/// `{"success": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult<T> {
    Success(T),
    Failure(ApiError),
}

impl<T> ApiResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiResult::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ApiResult::Success(data) => Some(data),
            ApiResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            ApiResult::Success(_) => None,
            ApiResult::Failure(err) => Some(err),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ApiResult<U> {
        match self {
            ApiResult::Success(data) => ApiResult::Success(f(data)),
            ApiResult::Failure(err) => ApiResult::Failure(err),
        }
    }

    pub fn and_then<U, F: FnOnce(T) -> ApiResult<U>>(self, f: F) -> ApiResult<U> {
        match self {
            ApiResult::Success(data) => f(data),
            ApiResult::Failure(err) => ApiResult::Failure(err),
        }
    }

    pub fn into_result(self) -> Result<T, ApiError> {
        self.into()
    }
}

impl<T> From<Result<T, ApiError>> for ApiResult<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => ApiResult::Success(data),
            Err(err) => ApiResult::Failure(err),
        }
    }
}

impl<T> From<ApiResult<T>> for Result<T, ApiError> {
    fn from(result: ApiResult<T>) -> Self {
        match result {
            ApiResult::Success(data) => Ok(data),
            ApiResult::Failure(err) => Err(err),
        }
    }
}

impl<T: Serialize> Serialize for ApiResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            ApiResult::Success(data) => {
                map.serialize_entry("success", &true)?;
                map.serialize_entry("data", data)?;
            }
            ApiResult::Failure(err) => {
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", &err.to_string())?;
            }
        }
        map.end()
    }
}
