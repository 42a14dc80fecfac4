use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::api::{ApiError, UcpClient};
use crate::config;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Nothing has been saved yet (first run, or after logout)
    #[error("No stored session at {0}")]
    NotFound(PathBuf),

    #[error("Stored session at {path} is corrupt: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Parsed, but holds no token to authenticate with
    #[error("Stored session at {0} has no token")]
    EmptyToken(PathBuf),

    #[error("Failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize session: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Could not find config directory")]
    NoConfigDir,

    #[error(transparent)]
    Client(#[from] ApiError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub url: String,
    pub token: String,
    pub ignore_cert: bool,
    #[serde(default)]
    pub username: String,
    /// When the session was saved. Display only, never used for expiry.
    pub saved_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(url: String, token: String, ignore_cert: bool, username: String) -> Self {
        Self {
            url,
            token,
            ignore_cert,
            username,
            saved_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.saved_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}

/// Durable home of the session between invocations.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the platform config directory (`~/.config/diver/ucp-session.json`)
    pub fn default_location() -> Result<Self, StoreError> {
        config::session_path()
            .map(Self::new)
            .ok_or(StoreError::NoConfigDir)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save session to disk, replacing any previous one.
    /// Written to a temp file and renamed, so a failed write leaves the old session intact.
    pub fn save(&self, data: &SessionData) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let contents = serde_json::to_string_pretty(data).map_err(StoreError::Serialize)?;
        let tmp = self.tmp_path();

        let written = write_private(&tmp, contents.as_bytes())
            .and_then(|_| fs::rename(&tmp, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(self.io_error(e));
        }

        info!(path = %self.path.display(), url = %data.url, "Session saved");
        Ok(())
    }

    /// Load session from disk
    pub fn load(&self) -> Result<SessionData, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let data: SessionData =
            serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;
        if data.token.is_empty() {
            return Err(StoreError::EmptyToken(self.path.clone()));
        }
        debug!(path = %self.path.display(), "Session loaded");
        Ok(data)
    }

    /// Load the stored session and rebuild a client ready for authenticated calls
    pub fn load_client(&self) -> Result<UcpClient, StoreError> {
        let data = self.load()?;
        Ok(UcpClient::from_session(&data)?)
    }

    /// Remove the stored session. Succeeds when there was none.
    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Write a file only the current user can read; the token is a credential.
/// The mode only applies on creation, so a leftover file is removed first.
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = fs::OpenOptions::new();
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> SessionData {
        SessionData::new(
            "https://10.0.0.1".to_string(),
            "tok-123".to_string(),
            true,
            "admin".to_string(),
        )
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("session.json"));

        let data = sample();
        store.save(&data).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, data);
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn test_save_overwrites_previous_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("session.json"));

        store.save(&sample()).unwrap();
        let mut second = sample();
        second.token = "tok-456".to_string();
        second.ignore_cert = false;
        store.save(&second).unwrap();

        assert_eq!(store.load().unwrap(), second);
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("session.json"));

        let err = store.load().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_corrupt_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ not json").unwrap();

        let err = TokenStore::new(path).load().unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_load_empty_token_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("session.json"));
        let mut data = sample();
        data.token = String::new();
        store.save(&data).unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, StoreError::EmptyToken(_)));
        assert!(!err.is_not_found());
        assert!(matches!(store.load_client(), Err(StoreError::EmptyToken(_))));
    }

    #[test]
    fn test_load_client_populates_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("session.json"));
        store.save(&sample()).unwrap();

        let client = store.load_client().unwrap();
        assert_eq!(client.token(), Some("tok-123"));
        assert_eq!(client.url(), "https://10.0.0.1");
        assert!(client.ignore_cert());
        assert_eq!(client.username(), "admin");
    }

    #[test]
    fn test_clear_removes_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("session.json"));
        store.save(&sample()).unwrap();

        store.clear().unwrap();
        assert!(store.load().unwrap_err().is_not_found());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("session.json"));
        store.save(&sample()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_leftover_tmp_file_does_not_widen_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("session.json"));

        let tmp = store.tmp_path();
        fs::write(&tmp, "stale").unwrap();
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o644)).unwrap();

        store.save(&sample()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().unwrap().token, "tok-123");
        assert!(!tmp.exists());
    }

    #[test]
    fn test_age_display() {
        let mut data = sample();
        assert_eq!(data.age_display(), "just now");

        data.saved_at = Utc::now() - Duration::minutes(5);
        assert_eq!(data.age_display(), "5m ago");

        data.saved_at = Utc::now() - Duration::minutes(125);
        assert_eq!(data.age_display(), "2h ago");

        data.saved_at = Utc::now() - Duration::days(3);
        assert_eq!(data.age_display(), "3d ago");
    }
}
