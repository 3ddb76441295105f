//! # Client Error Types
//!
//! Error types for everything that touches the network.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Client Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   REST          │  │     WebSocket           │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Api {status}   │  │  ConnectionFailed       │ │
//! │  │  InvalidUrl     │  │  Network        │  │  Disconnected           │ │
//! │  │  ConfigLoad/Save│  │  Timeout        │  │  WebSocketError         │ │
//! │  └─────────────────┘  │  Decode         │  └─────────────────────────┘ │
//! │                       └─────────────────┘                              │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │    Domain       │  │    Session      │                              │
//! │  │  Core(CoreError)│  │  NotAuthenticated│                             │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! REST failures are never retried automatically. The websocket listener
//! reconnects on [`ClientError::is_retryable`] errors.

use pupuk_core::{CoreError, GENERIC_ERROR_MESSAGE};
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // REST Errors
    // =========================================================================
    /// Backend answered with a non-success status.
    ///
    /// `message` is the `{ "message": ... }` field of the body, when present.
    #[error("API error {status}: {}", message.as_deref().unwrap_or("no message"))]
    Api { status: u16, message: Option<String> },

    /// Request never got an answer (DNS, refused, reset).
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Body did not match the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// Operation needs a logged-in user and there is none.
    #[error("Not logged in")]
    NotAuthenticated,

    // =========================================================================
    // WebSocket Errors
    // =========================================================================
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Disconnected from order notifications")]
    Disconnected,

    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    #[error("Channel error: {0}")]
    ChannelError(String),

    // =========================================================================
    // Domain Errors
    // =========================================================================
    #[error(transparent)]
    Core(#[from] CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(0)
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::Api {
                status: status.as_u16(),
                message: None,
            }
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<pupuk_core::ValidationError> for ClientError {
    fn from(err: pupuk_core::ValidationError) -> Self {
        ClientError::Core(CoreError::Validation(err))
    }
}

impl From<pupuk_core::FormErrors> for ClientError {
    fn from(err: pupuk_core::FormErrors) -> Self {
        ClientError::Core(CoreError::Form(err))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => ClientError::Disconnected,
            WsError::Io(io) => ClientError::ConnectionFailed(io.to_string()),
            WsError::Http(response) => ClientError::Api {
                status: response.status().as_u16(),
                message: None,
            },
            other => ClientError::WebSocketError(other.to_string()),
        }
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
    /// One-line message for the user.
    ///
    /// ## Priority
    /// 1. the server's `message`
    /// 2. domain and validation errors, which are written for shoppers
    /// 3. the generic fallback
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ClientError::Api { status: 401, .. } | ClientError::NotAuthenticated => {
                "Please log in to continue.".to_string()
            }
            ClientError::Api { status: 403, .. } => {
                "You do not have access to this page.".to_string()
            }
            ClientError::Core(err) => err.to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// Session missing or expired.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            ClientError::NotAuthenticated | ClientError::Api { status: 401, .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api { status: 404, .. })
    }

    /// Whether the websocket listener should reconnect after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::ConnectionFailed(_)
                | ClientError::Disconnected
                | ClientError::Timeout(_)
                | ClientError::WebSocketError(_)
                | ClientError::Network(_)
        ) || matches!(self, ClientError::Api { status, .. } if *status >= 500)
    }

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
    use pupuk_core::ValidationError;

    #[test]
    fn test_user_message_prefers_server_text() {
        let err = ClientError::Api {
            status: 422,
            message: Some("Stok tidak mencukupi".into()),
        };
        assert_eq!(err.user_message(), "Stok tidak mencukupi");
    }

    #[test]
    fn test_user_message_fallbacks() {
        let blank = ClientError::Api {
            status: 500,
            message: Some("  ".into()),
        };
        assert_eq!(blank.user_message(), GENERIC_ERROR_MESSAGE);
        assert_eq!(
            ClientError::Network("refused".into()).user_message(),
            GENERIC_ERROR_MESSAGE
        );
        assert_eq!(
            ClientError::Api {
                status: 401,
                message: None
            }
            .user_message(),
            "Please log in to continue."
        );
    }

    #[test]
    fn test_domain_errors_are_shown_as_is() {
        let err: ClientError = CoreError::EmptyCart.into();
        assert_eq!(err.user_message(), "Cart is empty");

        let err: ClientError = ValidationError::Required {
            field: "email".into(),
        }
        .into();
        assert_eq!(err.user_message(), "Validation error: email is required");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(ClientError::Disconnected.is_retryable());
        assert!(ClientError::ConnectionFailed("refused".into()).is_retryable());
        assert!(ClientError::Api {
            status: 503,
            message: None
        }
        .is_retryable());

        assert!(!ClientError::InvalidConfig("bad".into()).is_retryable());
        assert!(!ClientError::Api {
            status: 400,
            message: None
        }
        .is_retryable());
    }

    #[test]
    fn test_unauthorized() {
        assert!(ClientError::NotAuthenticated.is_unauthorized());
        assert!(ClientError::Api {
            status: 401,
            message: Some("Token expired".into())
        }
        .is_unauthorized());
        assert!(!ClientError::Api {
            status: 404,
            message: None
        }
        .is_unauthorized());
    }
}
