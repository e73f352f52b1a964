//! # Client Error Types
//!
//! Error types for everything that talks to the remote API or the disk.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     API                 │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  Api {status, message}  │ │
//! │  │  InvalidUrl     │  │  Timeout        │  │  Rejected               │ │
//! │  │  ConfigLoad...  │  │                 │  │  UnexpectedResponse     │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │      Auth       │  │  Token Store    │                              │
//! │  │                 │  │                 │                              │
//! │  │  NotAuthenticated│ │  TokenStore     │                              │
//! │  │  LoginFailed    │  │                 │                              │
//! │  │  InvalidToken   │  │                 │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! API failures display as the server's own message, so they can be shown to
//! the operator unchanged.

use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Client error type covering all remote and local failures.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid client configuration.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Invalid API base URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Request could not be sent or the connection dropped.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    // =========================================================================
    // API Errors
    // =========================================================================
    /// Non-success HTTP status. `message` is the response body, or
    /// `HTTP <status>` when the body was empty.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The server answered 2xx but flagged the request as failed (`ok: false`).
    #[error("{0}")]
    Rejected(String),

    /// Input was refused before any request was sent.
    #[error(transparent)]
    Validation(#[from] till_core::ValidationError),

    /// Response body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    // =========================================================================
    // Auth Errors
    // =========================================================================
    /// No credential is available for a protected call.
    #[error("Not logged in. Run `till login <username> <password>` first.")]
    NotAuthenticated,

    /// Login was refused.
    #[error("{0}")]
    LoginFailed(String),

    /// Bearer token could not be decoded.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    // =========================================================================
    // Local Storage Errors
    // =========================================================================
    /// Reading or writing the stored token failed.
    #[error("Token store error: {0}")]
    TokenStore(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::UnexpectedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ClientError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::UnexpectedResponse(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for ClientError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        ClientError::InvalidToken(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Returns true if the operator can simply try again.
    ///
    /// ## Retryable Errors
    /// - Connection failures and timeouts
    /// - 5xx responses and 429 Too Many Requests
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::ConnectionFailed(_) | ClientError::Timeout => true,
            ClientError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns true if logging in again may fix the error.
    pub fn is_auth_error(&self) -> bool {
        match self {
            ClientError::NotAuthenticated
            | ClientError::LoginFailed(_)
            | ClientError::InvalidToken(_) => true,
            ClientError::Api { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(ClientError::ConnectionFailed("refused".into()).is_retryable());
        assert!(ClientError::Timeout.is_retryable());
        assert!(ClientError::Api {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());

        assert!(!ClientError::Api {
            status: 400,
            message: "bad".into()
        }
        .is_retryable());
        assert!(!ClientError::InvalidConfig("bad".into()).is_retryable());
    }

    #[test]
    fn test_auth_errors() {
        assert!(ClientError::NotAuthenticated.is_auth_error());
        assert!(ClientError::Api {
            status: 401,
            message: "Unauthorized".into()
        }
        .is_auth_error());
        assert!(!ClientError::Timeout.is_auth_error());
    }

    #[test]
    fn test_api_error_displays_server_message() {
        let err = ClientError::Api {
            status: 409,
            message: "Cash session is closed".into(),
        };
        assert_eq!(err.to_string(), "Cash session is closed");
        assert!(ClientError::InvalidUrl("x".into()).is_config_error());
    }
}
