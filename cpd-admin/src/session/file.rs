//! File-backed session backends for the command-line shell.
//!
//! Each store is a JSON document shared with every other process pointed at
//! the same directory. Reads go back to the file so an external logout is
//! seen; writes reload, apply the change and replace the file atomically
//! with 0600 permissions on Unix. After a failed write the cached copy stays
//! authoritative until a write succeeds again.

use chrono::Utc;
use dashboard_core::error::CoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::cookie::Cookie;
use super::storage::{CookieStore, SessionStorage, StoredCookie};

pub const COOKIE_FILE: &str = "cookies.json";
pub const SESSION_FILE: &str = "session.json";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, CoreError> {
    match std::fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(T::default()),
        Ok(contents) => Ok(serde_json::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

/// Write to a private sibling file, then rename it over `path`.
fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CoreError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let contents = serde_json::to_string_pretty(value)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = parent.join(format!(
        ".{}.{}.{}.tmp",
        file_name,
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    let result = write_private(&temp, contents.as_bytes()).and_then(|()| std::fs::rename(&temp, path));
    if result.is_err() {
        let _ = std::fs::remove_file(&temp);
    }
    Ok(result?)
}

struct Document<V> {
    entries: BTreeMap<String, V>,
    in_sync: bool,
}

/// One JSON object of `name -> V`, re-read on every access.
struct JsonFile<V> {
    path: PathBuf,
    label: &'static str,
    state: Mutex<Document<V>>,
}

impl<V: Serialize + DeserializeOwned> JsonFile<V> {
    fn open(path: PathBuf, label: &'static str) -> Result<Self, CoreError> {
        let entries = load_json(&path)?;
        Ok(Self {
            path,
            label,
            state: Mutex::new(Document {
                entries,
                in_sync: true,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Document<V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reload(&self, doc: &mut Document<V>) {
        if !doc.in_sync {
            return;
        }
        match load_json(&self.path) {
            Ok(entries) => doc.entries = entries,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to reload {}, using cached copy", self.label);
            }
        }
    }

    fn read<R>(&self, f: impl FnOnce(&BTreeMap<String, V>) -> R) -> R {
        let mut doc = self.lock();
        self.reload(&mut doc);
        f(&doc.entries)
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, V>)) {
        let mut doc = self.lock();
        self.reload(&mut doc);
        f(&mut doc.entries);
        match save_json(&self.path, &doc.entries) {
            Ok(()) => doc.in_sync = true,
            Err(e) => {
                doc.in_sync = false;
                tracing::error!(path = %self.path.display(), error = %e, "Failed to persist {}", self.label);
            }
        }
    }
}

pub struct FileCookieStore {
    file: JsonFile<StoredCookie>,
}

impl FileCookieStore {
    /// Open (or lazily create) the cookie jar at `path`. Fails when the
    /// existing file is unreadable or not JSON.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        Ok(Self {
            file: JsonFile::open(path.into(), "cookies")?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }
}

impl CookieStore for FileCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        let now = Utc::now();
        self.file.read(|cookies| {
            cookies
                .get(name)
                .filter(|cookie| !cookie.is_expired(now))
                .map(|cookie| cookie.value.clone())
        })
    }

    fn set(&self, cookie: Cookie) {
        let now = Utc::now();
        self.file.update(|cookies| {
            cookies.retain(|_, stored| !stored.is_expired(now));
            if cookie.is_removal() {
                cookies.remove(&cookie.name);
            } else {
                let stored = StoredCookie::from_cookie(&cookie, now);
                cookies.insert(cookie.name, stored);
            }
        });
    }
}

pub struct FileSessionStorage {
    file: JsonFile<String>,
}

impl FileSessionStorage {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        Ok(Self {
            file: JsonFile::open(path.into(), "session storage")?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.file.path
    }
}

impl SessionStorage for FileSessionStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.file.read(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        self.file.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        });
    }

    fn remove(&self, key: &str) {
        self.file.update(|entries| {
            entries.remove(key);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn cookies_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(COOKIE_FILE);

        let store = FileCookieStore::open(&path).unwrap();
        store.set(Cookie::new("authToken", "abc", 30, false));
        store.set(Cookie::new("tokenType", "Bearer", 30, false));
        store.remove("tokenType");

        let reopened = FileCookieStore::open(&path).unwrap();
        assert_eq!(reopened.get("authToken").as_deref(), Some("abc"));
        assert!(reopened.get("tokenType").is_none());
    }

    #[test]
    fn session_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SESSION_FILE);

        let storage = FileSessionStorage::open(&path).unwrap();
        storage.set("user_name", "Ada");

        let reopened = FileSessionStorage::open(&path).unwrap();
        assert_eq!(reopened.get("user_name").as_deref(), Some("Ada"));
    }

    #[test]
    fn missing_or_empty_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SESSION_FILE);
        assert!(FileSessionStorage::open(&path).unwrap().get("x").is_none());

        std::fs::write(&path, "  ").unwrap();
        assert!(FileSessionStorage::open(&path).unwrap().get("x").is_none());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(COOKIE_FILE);
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            FileCookieStore::open(&path),
            Err(CoreError::Serialization(_))
        ));
    }

    #[test]
    fn expired_cookie_on_disk_is_not_returned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(COOKIE_FILE);
        let mut entries = BTreeMap::new();
        entries.insert(
            "authToken".to_string(),
            StoredCookie {
                value: "stale".into(),
                expires_at: Utc::now() - Duration::try_seconds(5).unwrap(),
                header: String::new(),
            },
        );
        std::fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();

        let store = FileCookieStore::open(&path).unwrap();
        assert!(store.get("authToken").is_none());

        store.set(Cookie::new("tokenType", "Bearer", 1, false));
        let on_disk: BTreeMap<String, StoredCookie> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.keys().collect::<Vec<_>>(), vec!["tokenType"]);
    }

    #[test]
    fn sees_changes_made_by_another_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(COOKIE_FILE);

        let ours = FileCookieStore::open(&path).unwrap();
        ours.set(Cookie::new("authToken", "abc", 30, false));

        let theirs = FileCookieStore::open(&path).unwrap();
        theirs.remove("authToken");
        assert!(ours.get("authToken").is_none());

        theirs.set(Cookie::new("authToken", "def", 30, false));
        assert_eq!(ours.get("authToken").as_deref(), Some("def"));
    }

    #[test]
    fn write_keeps_entries_removed_elsewhere_removed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SESSION_FILE);

        let ours = FileSessionStorage::open(&path).unwrap();
        ours.set("user_id", "7");
        ours.set("user_name", "Ada");

        let theirs = FileSessionStorage::open(&path).unwrap();
        theirs.remove("user_id");
        theirs.remove("user_name");

        ours.set("user_role", "admin");

        let reopened = FileSessionStorage::open(&path).unwrap();
        assert!(reopened.get("user_id").is_none());
        assert!(reopened.get("user_name").is_none());
        assert_eq!(reopened.get("user_role").as_deref(), Some("admin"));
    }

    #[test]
    fn deleted_file_reads_as_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SESSION_FILE);

        let storage = FileSessionStorage::open(&path).unwrap();
        storage.set("user_email", "ada@example.com");
        std::fs::remove_file(&path).unwrap();

        assert!(storage.get("user_email").is_none());
    }

    #[test]
    fn rewrite_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SESSION_FILE);

        let storage = FileSessionStorage::open(&path).unwrap();
        storage.set("user_id", "7");
        storage.set("user_id", "8");
        storage.remove("user_id");

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(SESSION_FILE)]);
    }

    #[cfg(unix)]
    #[test]
    fn files_are_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(COOKIE_FILE);
        let store = FileCookieStore::open(&path).unwrap();
        store.set(Cookie::new("authToken", "abc", 1, false));

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn rewrite_replaces_world_readable_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(COOKIE_FILE);
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileCookieStore::open(&path).unwrap();
        store.set(Cookie::new("authToken", "abc", 1, false));

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.get("authToken").as_deref(), Some("abc"));
    }
}
