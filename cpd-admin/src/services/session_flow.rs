//! Login and logout as the dashboard performs them: the API call plus the
//! session bookkeeping around it.

use std::sync::Arc;

use crate::api::AuthApi;
use crate::gateway::{ApiGateway, ApiResult};
use crate::models::{LoginForm, UserData, UserProfile};
use crate::session::{SessionStore, TokenData, DEFAULT_TOKEN_TTL_DAYS};

pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful!";
pub const LOGOUT_SUCCESS_MESSAGE: &str = "Logged out successfully";

pub struct SessionFlow {
    gateway: Arc<ApiGateway>,
    auth: AuthApi,
    token_ttl_days: i64,
}

impl SessionFlow {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self {
            auth: AuthApi::new(gateway.clone()),
            gateway,
            token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
        }
    }

    pub fn with_token_ttl_days(mut self, days: i64) -> Self {
        self.token_ttl_days = days;
        self
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        self.gateway.session()
    }

    /// Validate, authenticate, then store credential, profile and the
    /// remember-me choice. Returns the message to show the user.
    pub async fn login(&self, form: &LoginForm) -> ApiResult<String> {
        if let Err(err) = form.check() {
            return ApiResult::Failure(err);
        }

        let response = match self.auth.login(&form.email, &form.password).await {
            ApiResult::Success(response) => response,
            ApiResult::Failure(err) => {
                tracing::warn!(email = %form.email, error = %err, "Login failed");
                return ApiResult::Failure(err);
            }
        };

        let session = self.session();
        session.set_credential(&TokenData {
            access_token: response.access_token,
            token_type: response.token_type,
            expires_in: Some(self.token_ttl_days),
        });

        let user = response.user.unwrap_or_else(|| UserData {
            email: Some(form.email.clone()),
            ..UserData::default()
        });
        session.set_user(&user);

        if form.remember_me {
            session.remember_login(&form.email);
        } else {
            session.forget_login();
        }

        tracing::info!(email = %form.email, "User logged in successfully");

        ApiResult::Success(
            response
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| LOGIN_SUCCESS_MESSAGE.to_string()),
        )
    }

    /// Revoke the token server-side, then end the local session whatever
    /// the server said. Navigates to the login route exactly once.
    pub async fn logout(&self) -> ApiResult<String> {
        let result = self.auth.logout().await;
        match result.error() {
            // The gateway already cleared the session and navigated.
            Some(err) if err.is_unauthorized() => {
                tracing::info!("Session was already invalid on the server");
            }
            Some(err) => {
                tracing::error!(error = %err, "Failed to revoke token during logout");
                self.gateway.force_logout();
            }
            None => {
                tracing::info!("Token revoked successfully");
                self.gateway.force_logout();
            }
        }
        ApiResult::Success(LOGOUT_SUCCESS_MESSAGE.to_string())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.session().get_user()
    }

    /// Re-fetch `GET /user` and overwrite the stored profile.
    pub async fn refresh_profile(&self) -> ApiResult<UserProfile> {
        self.auth.profile().await.map(|user| {
            self.session().set_user(&user);
            self.session().get_user().unwrap_or_default()
        })
    }
}
