use thiserror::Error;

/// Every failure the course store can report.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Path in the remote repository, or named course, does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The version token no longer matches the remote file.
    #[error("conflict on {0}: the file was changed by someone else, reload and try again")]
    Conflict(String),

    /// Create collided with an existing file.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A required field is missing; raised before any remote call.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Transport, authentication or rate-limit failure.
    #[error("remote unavailable{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    RemoteUnavailable {
        status: Option<u16>,
        message: String,
    },

    /// The table file could not be decoded or encoded.
    #[error("codec error: {0}")]
    Codec(String),

    /// GitHub answered with a payload we do not understand.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    pub fn remote(message: impl Into<String>) -> Self {
        StoreError::RemoteUnavailable {
            status: None,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::RemoteUnavailable {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<reqwest_middleware::Error> for StoreError {
    fn from(err: reqwest_middleware::Error) -> Self {
        match err {
            reqwest_middleware::Error::Reqwest(err) => err.into(),
            reqwest_middleware::Error::Middleware(err) => StoreError::remote(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_message_includes_status_when_known() {
        let err = StoreError::RemoteUnavailable {
            status: Some(403),
            message: "API rate limit exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "remote unavailable (403): API rate limit exceeded");
        assert_eq!(
            StoreError::remote("connection reset").to_string(),
            "remote unavailable: connection reset"
        );
    }
}
