//! Storage backends behind the session store.
//!
//! `CookieStore` holds the long-lived credential (with `Max-Age` expiry);
//! `SessionStorage` holds the profile for the lifetime of one session.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::cookie::Cookie;

pub trait CookieStore: Send + Sync {
    /// Current value, or `None` when absent or expired.
    fn get(&self, name: &str) -> Option<String>;

    /// Write a cookie. A removal cookie (`Max-Age=0`) deletes it.
    fn set(&self, cookie: Cookie);

    fn remove(&self, name: &str) {
        self.set(Cookie::removal(name, false));
    }
}

pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub value: String,
    pub expires_at: DateTime<Utc>,
    pub header: String,
}

impl StoredCookie {
    pub(crate) fn from_cookie(cookie: &Cookie, now: DateTime<Utc>) -> Self {
        Self {
            value: cookie.value.clone(),
            expires_at: Duration::try_seconds(cookie.max_age)
                .and_then(|ttl| now.checked_add_signed(ttl))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            header: cookie.header_value(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Default)]
pub struct MemoryCookieStore {
    cookies: DashMap<String, StoredCookie>,
}

impl MemoryCookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live cookies, sorted by name.
    pub fn snapshot(&self) -> BTreeMap<String, StoredCookie> {
        let now = Utc::now();
        self.cookies
            .iter()
            .filter(|entry| !entry.value().is_expired(now))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// The `Set-Cookie` line last written for `name`.
    pub fn header(&self, name: &str) -> Option<String> {
        self.cookies.get(name).map(|c| c.header.clone())
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        let now = Utc::now();
        let expired = match self.cookies.get(name) {
            Some(cookie) if !cookie.is_expired(now) => return Some(cookie.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.cookies.remove(name);
        }
        None
    }

    fn set(&self, cookie: Cookie) {
        if cookie.is_removal() {
            self.cookies.remove(&cookie.name);
            return;
        }
        let stored = StoredCookie::from_cookie(&cookie, Utc::now());
        self.cookies.insert(cookie.name, stored);
    }
}

#[derive(Default)]
pub struct MemorySessionStorage {
    entries: DashMap<String, String>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.clone())
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}
