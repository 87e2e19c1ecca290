use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{string_or_number, validation_message};
use crate::gateway::ApiError;

/// User record as returned by `POST /login` and `GET /user`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl UserData {
    /// `full_name` wins over `name`; blank values are skipped.
    pub fn display_name(&self) -> &str {
        [&self.full_name, &self.name]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|n| !n.is_empty())
            .unwrap_or("")
    }
}

/// The profile half of the session, read back from session storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl UserProfile {
    /// Name shown in the header; falls back to the email's local part.
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        self.email.split('@').next().unwrap_or("User").to_string()
    }

    pub fn initials(&self) -> String {
        let name = self.display_name();
        let letters: String = name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .collect();
        if letters.chars().count() >= 2 {
            letters.to_uppercase()
        } else {
            let fallback: String = name.chars().take(2).collect();
            if fallback.is_empty() {
                "U".to_string()
            } else {
                fallback.to_uppercase()
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub user: Option<UserData>,
}

/// Same shape check the dashboard's login page applies: something, `@`,
/// something, `.`, something. Stricter than RFC 5321 about dotless domains.
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid"));

/// Login form as submitted by the user. The email is trimmed on
/// construction.
#[derive(Clone, Validate)]
pub struct LoginForm {
    #[validate(regex(path = *EMAIL_PATTERN, message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    pub remember_me: bool,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("remember_me", &self.remember_me)
            .finish()
    }
}

impl LoginForm {
    pub fn new(email: impl AsRef<str>, password: impl Into<String>, remember_me: bool) -> Self {
        Self {
            email: email.as_ref().trim().to_string(),
            password: password.into(),
            remember_me,
        }
    }

    /// Client-side checks; a failing form never reaches the network.
    pub fn check(&self) -> Result<(), ApiError> {
        if self.email.is_empty() {
            let mut messages = vec!["Email is required".to_string()];
            if self.password.is_empty() {
                messages.push("Password is required".to_string());
            }
            return Err(ApiError::Validation(messages.join("; ")));
        }

        self.validate()
            .map_err(|e| ApiError::Validation(validation_message(&e)))
    }
}
