use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, refused connection, TLS handshake).
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The control plane answered with anything other than 200. The body is
    /// the control plane's own error text and is shown as-is.
    #[error("{body}")]
    Api { status: StatusCode, body: String },

    /// Login went through but no usable token came back.
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not logged in - no session token available")]
    MissingToken,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        ApiError::Api {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }

    /// True when the control plane rejected our credentials or token
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ApiError::Api { status, .. }
                if *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
        )
    }

    /// Status code of the failed response, if there was one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }
}
