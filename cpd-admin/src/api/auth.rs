use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::gateway::{ApiError, ApiGateway, ApiResult, RequestBody, RequestOptions};
use crate::models::{LoginResponse, UserData};

pub const LOGIN_ENDPOINT: &str = "/login";
pub const LOGOUT_ENDPOINT: &str = "/logout";
pub const PROFILE_ENDPOINT: &str = "/user";

/// `GET /user` answers either `{"user": {...}}` or the bare record.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileEnvelope {
    Wrapped { user: UserData },
    Bare(UserData),
}

#[derive(Clone)]
pub struct AuthApi {
    gateway: Arc<ApiGateway>,
}

impl AuthApi {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    /// `POST /login`. A 2xx without an access token is treated as a bad
    /// response rather than a login.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        let body = match RequestBody::json(&json!({ "email": email, "password": password })) {
            Ok(body) => body,
            Err(err) => return ApiResult::Failure(err),
        };

        self.gateway
            .request_as::<LoginResponse>(LOGIN_ENDPOINT, RequestOptions::post(body))
            .await
            .and_then(|response| {
                if response.access_token.is_empty() {
                    ApiResult::Failure(ApiError::Decode(
                        "Login response did not include an access token".to_string(),
                    ))
                } else {
                    ApiResult::Success(response)
                }
            })
    }

    /// `POST /logout` with the current credential.
    pub async fn logout(&self) -> ApiResult<Value> {
        self.gateway
            .request(LOGOUT_ENDPOINT, RequestOptions::post(RequestBody::Empty))
            .await
    }

    pub async fn profile(&self) -> ApiResult<UserData> {
        self.gateway
            .request_as::<ProfileEnvelope>(PROFILE_ENDPOINT, RequestOptions::get())
            .await
            .map(|envelope| match envelope {
                ProfileEnvelope::Wrapped { user } => user,
                ProfileEnvelope::Bare(user) => user,
            })
    }
}
