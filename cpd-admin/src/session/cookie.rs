pub const AUTH_TOKEN_COOKIE: &str = "authToken";
pub const TOKEN_TYPE_COOKIE: &str = "tokenType";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
pub const REMEMBER_ME_COOKIE: &str = "rememberMe";
pub const REMEMBER_EMAIL_COOKIE: &str = "rememberEmail";

/// Every cookie the dashboard owns; cleared together on logout.
pub const AUTH_COOKIES: [&str; 5] = [
    AUTH_TOKEN_COOKIE,
    TOKEN_TYPE_COOKIE,
    REFRESH_TOKEN_COOKIE,
    REMEMBER_ME_COOKIE,
    REMEMBER_EMAIL_COOKIE,
];

pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// A cookie write: `Path=/; SameSite=Lax`, `Secure` on TLS deployments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub max_age: i64,
    pub secure: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>, days: i64, secure: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            max_age: days.saturating_mul(SECONDS_PER_DAY),
            secure,
        }
    }

    /// The write that deletes `name`.
    pub fn removal(name: impl Into<String>, secure: bool) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            max_age: 0,
            secure,
        }
    }

    pub fn is_removal(&self) -> bool {
        self.max_age <= 0
    }

    pub fn header_value(&self) -> String {
        format!(
            "{}={}; Max-Age={}; Path=/; SameSite=Lax{}",
            urlencoding::encode(&self.name),
            urlencoding::encode(&self.value),
            self.max_age.max(0),
            if self.secure { "; Secure" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_become_max_age_seconds() {
        let cookie = Cookie::new(AUTH_TOKEN_COOKIE, "abc", 30, false);
        assert_eq!(cookie.max_age, 2_592_000);
        assert_eq!(
            cookie.header_value(),
            "authToken=abc; Max-Age=2592000; Path=/; SameSite=Lax"
        );
    }

    #[test]
    fn secure_flag_and_encoding() {
        let cookie = Cookie::new(REMEMBER_EMAIL_COOKIE, "jane doe@example.com", 1, true);
        assert_eq!(
            cookie.header_value(),
            "rememberEmail=jane%20doe%40example.com; Max-Age=86400; Path=/; SameSite=Lax; Secure"
        );
    }

    #[test]
    fn removal_has_zero_max_age() {
        let cookie = Cookie::removal(TOKEN_TYPE_COOKIE, false);
        assert!(cookie.is_removal());
        assert_eq!(cookie.header_value(), "tokenType=; Max-Age=0; Path=/; SameSite=Lax");
        assert!(Cookie::new("x", "y", 0, false).is_removal());
    }
}
