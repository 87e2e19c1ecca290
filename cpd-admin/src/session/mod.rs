//! Authentication state: the credential half (cookies) and the profile half
//! (session storage), kept consistent with each other.
//!
//! Both halves are injected, so tests and the shell choose their own
//! backends. Composite reads take the read lock and [`SessionStore::clear_all`]
//! takes the write lock, so no observer ever sees one half cleared without
//! the other.

pub mod cookie;
pub mod file;
pub mod monitor;
pub mod storage;

pub use cookie::{
    Cookie, AUTH_COOKIES, AUTH_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE, REMEMBER_EMAIL_COOKIE,
    REMEMBER_ME_COOKIE, TOKEN_TYPE_COOKIE,
};
pub use file::{FileCookieStore, FileSessionStorage};
pub use monitor::AuthMonitor;
pub use storage::{CookieStore, MemoryCookieStore, MemorySessionStorage, SessionStorage};

use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use crate::models::{UserData, UserProfile};
use dashboard_core::error::CoreError;

pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 30;
pub const REMEMBER_ME_DAYS: i64 = 30;

pub const USER_ID_KEY: &str = "user_id";
pub const USER_NAME_KEY: &str = "user_name";
pub const USER_EMAIL_KEY: &str = "user_email";
pub const USER_ROLE_KEY: &str = "user_role";
pub const IS_AUTHENTICATED_KEY: &str = "isAuthenticated";

const PROFILE_KEYS: [&str; 5] = [
    USER_ID_KEY,
    USER_NAME_KEY,
    USER_EMAIL_KEY,
    USER_ROLE_KEY,
    IS_AUTHENTICATED_KEY,
];

/// Token payload handed over by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenData {
    pub access_token: String,
    pub token_type: Option<String>,
    /// Lifetime in days.
    pub expires_in: Option<i64>,
}

impl TokenData {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: None,
            expires_in: None,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub token_type: String,
}

impl Credential {
    /// `Authorization` header value, e.g. `Bearer abc`.
    pub fn authorization_value(&self) -> String {
        format!("{} {}", self.token_type, self.token)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

pub struct SessionStore {
    cookies: Arc<dyn CookieStore>,
    storage: Arc<dyn SessionStorage>,
    secure_cookies: bool,
    lock: RwLock<()>,
}

impl SessionStore {
    pub fn new(cookies: Arc<dyn CookieStore>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            cookies,
            storage,
            secure_cookies: false,
            lock: RwLock::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryCookieStore::new()),
            Arc::new(MemorySessionStorage::new()),
        )
    }

    /// Cookie jar and session file under `dir`.
    pub fn open_dir(dir: &Path) -> Result<Self, CoreError> {
        let cookies = FileCookieStore::open(dir.join(file::COOKIE_FILE))?;
        let storage = FileSessionStorage::open(dir.join(file::SESSION_FILE))?;
        Ok(Self::new(Arc::new(cookies), Arc::new(storage)))
    }

    /// Mark cookie writes `Secure` (TLS deployments).
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    // Credential

    /// Store token and type. Does nothing when the token is empty.
    pub fn set_credential(&self, token: &TokenData) {
        if token.access_token.is_empty() {
            return;
        }
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);

        let days = token.expires_in.unwrap_or(DEFAULT_TOKEN_TTL_DAYS);
        let token_type = token
            .token_type
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TOKEN_TYPE);

        self.cookies.set(Cookie::new(
            AUTH_TOKEN_COOKIE,
            token.access_token.as_str(),
            days,
            self.secure_cookies,
        ));
        self.cookies
            .set(Cookie::new(TOKEN_TYPE_COOKIE, token_type, days, self.secure_cookies));
    }

    pub fn get_credential(&self) -> Option<Credential> {
        let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        self.read_credential()
    }

    /// Delete every auth cookie. Idempotent.
    pub fn clear_credential(&self) {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        self.remove_cookies();
    }

    pub fn is_credential_valid(&self) -> bool {
        let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        self.read_credential().is_some()
    }

    // Profile

    pub fn set_user(&self, user: &UserData) {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        self.storage
            .set(USER_ID_KEY, user.id.as_deref().unwrap_or_default());
        self.storage.set(USER_NAME_KEY, user.display_name());
        self.storage
            .set(USER_EMAIL_KEY, user.email.as_deref().unwrap_or_default());
        self.storage
            .set(USER_ROLE_KEY, user.role.as_deref().unwrap_or_default());
        self.storage.set(IS_AUTHENTICATED_KEY, "true");
    }

    /// The stored profile, only while the authenticated flag is `"true"`.
    pub fn get_user(&self) -> Option<UserProfile> {
        let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        self.read_user()
    }

    pub fn clear_user(&self) {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        self.remove_profile();
    }

    // Composite

    pub fn is_authenticated(&self) -> bool {
        let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        self.profile_flag_set() && self.read_credential().is_some()
    }

    pub fn auth_state(&self) -> AuthState {
        if self.is_authenticated() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        }
    }

    /// Clear credential and profile as one step.
    pub fn clear_all(&self) {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        self.remove_cookies();
        self.remove_profile();
    }

    // Remember me

    pub fn remember_login(&self, email: &str) {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        self.cookies.set(Cookie::new(
            REMEMBER_ME_COOKIE,
            "true",
            REMEMBER_ME_DAYS,
            self.secure_cookies,
        ));
        self.cookies.set(Cookie::new(
            REMEMBER_EMAIL_COOKIE,
            email,
            REMEMBER_ME_DAYS,
            self.secure_cookies,
        ));
    }

    pub fn forget_login(&self) {
        let _guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        self.cookies
            .set(Cookie::removal(REMEMBER_ME_COOKIE, self.secure_cookies));
        self.cookies
            .set(Cookie::removal(REMEMBER_EMAIL_COOKIE, self.secure_cookies));
    }

    /// Email to prefill the login form with, if the user asked to be
    /// remembered.
    pub fn remembered_email(&self) -> Option<String> {
        let _guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        if self.cookies.get(REMEMBER_ME_COOKIE).as_deref() != Some("true") {
            return None;
        }
        self.cookies
            .get(REMEMBER_EMAIL_COOKIE)
            .filter(|email| !email.is_empty())
    }

    // Callers hold the lock.

    fn read_credential(&self) -> Option<Credential> {
        let token = self
            .cookies
            .get(AUTH_TOKEN_COOKIE)
            .filter(|t| !t.is_empty())?;
        let token_type = self
            .cookies
            .get(TOKEN_TYPE_COOKIE)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string());
        Some(Credential { token, token_type })
    }

    fn profile_flag_set(&self) -> bool {
        self.storage.get(IS_AUTHENTICATED_KEY).as_deref() == Some("true")
    }

    fn read_user(&self) -> Option<UserProfile> {
        if !self.profile_flag_set() {
            return None;
        }
        Some(UserProfile {
            id: self.storage.get(USER_ID_KEY).unwrap_or_default(),
            name: self.storage.get(USER_NAME_KEY).unwrap_or_default(),
            email: self.storage.get(USER_EMAIL_KEY).unwrap_or_default(),
            role: self.storage.get(USER_ROLE_KEY).unwrap_or_default(),
        })
    }

    fn remove_cookies(&self) {
        for name in AUTH_COOKIES {
            self.cookies.set(Cookie::removal(name, self.secure_cookies));
        }
    }

    fn remove_profile(&self) {
        for key in PROFILE_KEYS {
            self.storage.remove(key);
        }
    }
}
