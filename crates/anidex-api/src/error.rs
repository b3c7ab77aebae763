//! Error taxonomy shared by the catalog and session clients.

/// Errors returned by catalog and session operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A non-success HTTP status from either backend.
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Message taken from the response body, or a generic fallback.
        message: String,
    },

    /// Missing or rejected bearer token on a protected call.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A success response whose body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Rejected locally before anything was submitted.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The dispatcher queue reached its configured depth.
    #[error("request queue is full ({depth} pending)")]
    QueueFull {
        /// Number of requests waiting when the submission was shed.
        depth: usize,
    },

    /// The dispatcher worker is no longer running.
    #[error("request dispatcher is closed")]
    DispatcherClosed,
}

impl ApiError {
    /// Returns `true` for failures the caller should answer by asking
    /// the user to log in again.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Returns the HTTP status code carried by the error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Result alias for catalog and session operations.
pub type Result<T, E = ApiError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_http_error() {
        // Arrange
        let err = ApiError::Http {
            status: 404,
            message: String::from("Resource does not exist"),
        };

        // Act
        let text = err.to_string();

        // Assert
        assert_eq!(text, "HTTP 404: Resource does not exist");
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_auth());
    }

    #[test]
    fn test_auth_error_is_auth() {
        // Arrange & Act
        let err = ApiError::Auth(String::from("Not authorized, token failed"));

        // Assert
        assert!(err.is_auth());
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("token failed"));
    }

    #[test]
    fn test_queue_full_display() {
        // Arrange & Act
        let err = ApiError::QueueFull { depth: 8 };

        // Assert
        assert_eq!(err.to_string(), "request queue is full (8 pending)");
    }
}
