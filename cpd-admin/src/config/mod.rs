use dashboard_core::config::{configuration_directory, load_layered};
use dashboard_core::error::CoreError;
use secrecy::Secret;
use serde::Deserialize;
use std::path::PathBuf;

use crate::gateway::DEFAULT_LOGIN_ROUTE;
use crate::session::DEFAULT_TOKEN_TTL_DAYS;

pub const DEFAULT_BASE_URL: &str = "https://urbanviewre.com/cpd_certificate_backend/public/api";

#[derive(Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub log: LogSettings,
    #[serde(default)]
    pub login: LoginSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApiSettings {
    /// Prefix every endpoint path is appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Where the shell is sent when the session ends.
    #[serde(default = "default_login_route")]
    pub login_route: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_login_route() -> String {
    DEFAULT_LOGIN_ROUTE.to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_route: default_login_route(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct SessionSettings {
    /// Directory holding the cookie jar and session file. Defaults to the
    /// platform config dir.
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: i64,
    /// Unset means "secure iff the API is served over https".
    #[serde(default)]
    pub secure_cookies: Option<bool>,
}

fn default_token_ttl_days() -> i64 {
    DEFAULT_TOKEN_TTL_DAYS
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            storage_dir: None,
            token_ttl_days: default_token_ttl_days(),
            secure_cookies: None,
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Non-interactive login, e.g. `APP_LOGIN__PASSWORD`.
#[derive(Deserialize, Clone, Default)]
pub struct LoginSettings {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<Secret<String>>,
}

impl Settings {
    pub fn secure_cookies(&self) -> bool {
        self.session
            .secure_cookies
            .unwrap_or_else(|| self.api.base_url.starts_with("https://"))
    }

    pub fn storage_dir(&self) -> Result<PathBuf, CoreError> {
        match &self.session.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(env!("CARGO_PKG_NAME")))
                .ok_or_else(|| {
                    CoreError::Storage("No configuration directory on this platform".to_string())
                }),
        }
    }
}

pub fn get_configuration() -> Result<Settings, CoreError> {
    let directory = configuration_directory(env!("CARGO_PKG_NAME"))?;
    load_layered(&directory)
}
