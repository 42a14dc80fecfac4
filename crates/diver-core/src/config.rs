//! Client configuration and application paths.
//!
//! `ClientConfig` carries everything needed to reach and log in to a
//! control plane. The stored session lives at
//! `~/.config/diver/ucp-session.json` unless a caller picks another path.

use std::fmt;
use std::path::PathBuf;

/// Application name used for config directory paths
const APP_NAME: &str = "diver";

/// Session file name in the config directory
const SESSION_FILE: &str = "ucp-session.json";

#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub username: String,
    pub password: String,
    pub url: String,
    pub ignore_cert: bool,
}

impl ClientConfig {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        url: impl Into<String>,
        ignore_cert: bool,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            url: normalize_url(&url.into()),
            ignore_cert,
        }
    }
}

// Keep the password out of logs and panic messages
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("url", &self.url)
            .field("ignore_cert", &self.ignore_cert)
            .finish()
    }
}

/// Strip trailing slashes so paths can be appended with `format!("{}{}", url, path)`
pub fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Default location of the persisted session, `None` if the platform has no config dir
pub fn session_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join(SESSION_FILE))
}
