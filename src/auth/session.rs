//! Session token persistence
//!
//! One authoritative token with two sync targets: durable storage and the
//! `token` cookie. [`Session::set`] and [`Session::clear`] are the only
//! writers, so the copies move together.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::auth::cookie::{SessionCookie, TOKEN_COOKIE};
use crate::error::{Error, Result};

/// Durable token storage
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn store(&self, token: &str) -> Result<()>;
    fn remove(&self) -> Result<()>;
}

/// Cookie sync target
pub trait CookieJar: Send + Sync {
    /// Set or, for a removal cookie, delete
    fn set(&self, cookie: &SessionCookie) -> Result<()>;
    fn get(&self, name: &str) -> Result<Option<SessionCookie>>;
}

fn poisoned<T>(_: T) -> Error {
    Error::Storage("lock poisoned".to_string())
}

/// In-memory storage, used by tests and embedders
#[derive(Debug, Default)]
pub struct MemoryStorage {
    token: Mutex<Option<String>>,
}

impl TokenStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.token.lock().map_err(poisoned)?.clone())
    }

    fn store(&self, token: &str) -> Result<()> {
        *self.token.lock().map_err(poisoned)? = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        *self.token.lock().map_err(poisoned)? = None;
        Ok(())
    }
}

/// Token kept in a single file
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStorage for FileStorage {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let token = fs::read_to_string(&self.path)?.trim().to_string();
        Ok(Some(token).filter(|t| !t.is_empty()))
    }

    fn store(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    cookies: Mutex<BTreeMap<String, SessionCookie>>,
}

impl CookieJar for MemoryCookieJar {
    fn set(&self, cookie: &SessionCookie) -> Result<()> {
        let mut cookies = self.cookies.lock().map_err(poisoned)?;
        if cookie.is_removal() {
            cookies.remove(&cookie.name);
        } else {
            cookies.insert(cookie.name.clone(), cookie.clone());
        }
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<SessionCookie>> {
        Ok(self.cookies.lock().map_err(poisoned)?.get(name).cloned())
    }
}

/// Cookies persisted one rendered `Set-Cookie` line per cookie
#[derive(Debug, Clone)]
pub struct FileCookieJar {
    path: PathBuf,
}

impl FileCookieJar {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<Vec<SessionCookie>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        Ok(fs::read_to_string(&self.path)?
            .lines()
            .filter_map(SessionCookie::parse)
            .collect())
    }
}

impl CookieJar for FileCookieJar {
    fn set(&self, cookie: &SessionCookie) -> Result<()> {
        let mut cookies = self.read_all()?;
        cookies.retain(|c| c.name != cookie.name);
        if !cookie.is_removal() {
            cookies.push(cookie.clone());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = cookies
            .iter()
            .map(|c| c.render() + "\n")
            .collect::<String>();
        fs::write(&self.path, content)?;
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<SessionCookie>> {
        Ok(self.read_all()?.into_iter().find(|c| c.name == name))
    }
}

/// The session token and its two copies
#[derive(Clone)]
pub struct Session {
    storage: Arc<dyn TokenStorage>,
    cookies: Arc<dyn CookieJar>,
    cookie_name: String,
    max_age_secs: i64,
    secure: bool,
}

impl Session {
    pub fn new(storage: Arc<dyn TokenStorage>, cookies: Arc<dyn CookieJar>) -> Self {
        Self {
            storage,
            cookies,
            cookie_name: TOKEN_COOKIE.to_string(),
            max_age_secs: 86400,
            secure: false,
        }
    }

    /// In-memory session
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStorage::default()),
            Arc::new(MemoryCookieJar::default()),
        )
    }

    /// File-backed session under `dir` (`token` and `cookies`)
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self::new(
            Arc::new(FileStorage::new(dir.join("token"))),
            Arc::new(FileCookieJar::new(dir.join("cookies"))),
        )
    }

    pub fn with_cookie(mut self, name: &str, max_age_secs: i64, secure: bool) -> Self {
        self.cookie_name = name.to_string();
        self.max_age_secs = max_age_secs;
        self.secure = secure;
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Current token from durable storage
    pub fn token(&self) -> Result<Option<String>> {
        self.storage.load()
    }

    /// Cookie copy of the token, if any
    pub fn cookie(&self) -> Result<Option<SessionCookie>> {
        self.cookies.get(&self.cookie_name)
    }

    /// Write the token to both targets; if the cookie fails, storage goes back
    /// to the token it held before
    pub fn set(&self, token: &str) -> Result<()> {
        let previous = self.storage.load()?;
        self.storage.store(token)?;

        let cookie = SessionCookie::new(self.cookie_name.as_str(), token)
            .http_only(false)
            .secure(self.secure)
            .max_age(self.max_age_secs);
        if let Err(e) = self.cookies.set(&cookie) {
            tracing::warn!(error = %e, "Failed to set session cookie, rolling back");
            match previous {
                Some(previous) => self.storage.store(&previous)?,
                None => self.storage.remove()?,
            }
            return Err(e);
        }
        Ok(())
    }

    /// Remove the token from both targets, attempting both even if one fails
    pub fn clear(&self) -> Result<()> {
        let stored = self.storage.remove();
        let removal = SessionCookie::removal(self.cookie_name.as_str())
            .http_only(false)
            .secure(self.secure);
        let cookie = self.cookies.set(&removal);
        stored.and(cookie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenJar;

    impl CookieJar for BrokenJar {
        fn set(&self, _cookie: &SessionCookie) -> Result<()> {
            Err(Error::Storage("jar unavailable".to_string()))
        }

        fn get(&self, _name: &str) -> Result<Option<SessionCookie>> {
            Ok(None)
        }
    }

    #[test]
    fn test_set_writes_both_copies() {
        let session = Session::in_memory().with_cookie("token", 60, true);
        session.set("abc").unwrap();

        assert_eq!(session.token().unwrap().as_deref(), Some("abc"));
        let cookie = session.cookie().unwrap().unwrap();
        assert_eq!(cookie.value, "abc");
        assert_eq!(cookie.max_age, Some(60));
        assert!(cookie.secure);
    }

    #[test]
    fn test_clear_removes_both_copies() {
        let session = Session::in_memory();
        session.set("abc").unwrap();
        session.clear().unwrap();

        assert!(session.token().unwrap().is_none());
        assert!(session.cookie().unwrap().is_none());
    }

    #[test]
    fn test_cookie_failure_rolls_back_storage() {
        let session = Session::new(Arc::new(MemoryStorage::default()), Arc::new(BrokenJar));
        assert!(session.set("abc").is_err());
        assert!(session.token().unwrap().is_none());
    }

    #[test]
    fn test_cookie_failure_keeps_previous_token() {
        let storage = Arc::new(MemoryStorage::default());
        storage.store("still-valid").unwrap();
        let session = Session::new(storage, Arc::new(BrokenJar));

        assert!(session.set("replacement").is_err());
        assert_eq!(session.token().unwrap().as_deref(), Some("still-valid"));
    }

    #[test]
    fn test_file_session_persists() {
        let dir = tempfile::TempDir::new().unwrap();
        Session::in_dir(dir.path()).set("persisted").unwrap();

        let reopened = Session::in_dir(dir.path());
        assert_eq!(reopened.token().unwrap().as_deref(), Some("persisted"));
        assert_eq!(reopened.cookie().unwrap().unwrap().value, "persisted");

        reopened.clear().unwrap();
        assert!(Session::in_dir(dir.path()).token().unwrap().is_none());
    }

    #[test]
    fn test_file_jar_keeps_other_cookies() {
        let dir = tempfile::TempDir::new().unwrap();
        let jar = FileCookieJar::new(dir.path().join("cookies"));
        jar.set(&SessionCookie::new("theme", "dark")).unwrap();
        jar.set(&SessionCookie::new("token", "abc")).unwrap();
        jar.set(&SessionCookie::removal("token")).unwrap();

        assert!(jar.get("token").unwrap().is_none());
        assert_eq!(jar.get("theme").unwrap().unwrap().value, "dark");
    }
}
