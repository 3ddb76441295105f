//! # API Error Type
//!
//! The error every command returns: a machine-readable code plus the text
//! the shopper sees.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Storefront                         │
//! │                                                                         │
//! │  Command Function                                                       │
//! │  Result<String, ApiError>                                               │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Form check failed? ──── CoreError::Form ─────────────┐                 │
//! │         │                                             │                 │
//! │         ▼                                             ▼                 │
//! │  Backend said no? ────── ClientError::Api ─────────► ApiError ───► exit│
//! │         │                                             ▲   (stderr)      │
//! │         ▼                                             │                 │
//! │  Network down? ───────── ClientError::Network ────────┘                 │
//! │                          (logged, generic text shown)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! With `--json` the error is printed as
//! `{ "code": "INSUFFICIENT_STOCK", "message": "..." }`.

use pupuk_client::ClientError;
use pupuk_core::{CoreError, FormErrors, ValidationError, GENERIC_ERROR_MESSAGE};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Line printed after `error:`
    pub message: String,
}

/// Error codes.
///
/// Each maps to a process exit code through [`ErrorCode::exit_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed
    ValidationError,

    /// No session, or it expired (401)
    Unauthorized,

    /// Signed in but not allowed (403)
    Forbidden,

    /// Backend unreachable or timed out
    Network,

    /// Business rule refused the operation
    BusinessLogic,

    /// Not enough stock for the requested quantity
    InsufficientStock,

    /// Cart operation failed
    CartError,

    /// Payment handoff or return failed
    PaymentError,

    /// Bad configuration or unusable local files
    ConfigError,

    /// Anything else
    Internal,
}

impl ErrorCode {
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorCode::ValidationError => 2,
            ErrorCode::Unauthorized | ErrorCode::Forbidden => 3,
            ErrorCode::NotFound => 4,
            ErrorCode::Network => 5,
            ErrorCode::ConfigError => 78,
            _ => 1,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Logs the real cause; the shopper only sees the generic text.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        tracing::error!("Internal error: {}", cause);
        ApiError::new(ErrorCode::Internal, GENERIC_ERROR_MESSAGE)
    }

    pub fn cart(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::CartError, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ConfigError, message)
    }
}

/// Converts domain errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::VariantNotFound(id) => ApiError::not_found("Variant", &id),
            CoreError::CartItemNotFound(id) => ApiError::not_found("Cart item", &id),
            CoreError::InsufficientStock {
                product,
                available,
                ..
            } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!("Only {} {} in stock", available, product),
            ),
            CoreError::CartTooLarge { .. } | CoreError::EmptyCart => ApiError::cart(message),
            CoreError::QuantityTooLarge { .. }
            | CoreError::Validation(_)
            | CoreError::Form(_) => ApiError::validation(message),
            CoreError::InvalidNavigation { .. } | CoreError::InvalidStatusTransition { .. } => {
                ApiError::new(ErrorCode::BusinessLogic, message)
            }
        }
    }
}

/// Converts network errors.
impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        let message = err.user_message();
        match err {
            ClientError::Core(core) => ApiError::from(core),
            ClientError::NotAuthenticated | ClientError::Api { status: 401, .. } => {
                ApiError::new(ErrorCode::Unauthorized, message)
            }
            ClientError::Api { status: 403, .. } => ApiError::new(ErrorCode::Forbidden, message),
            ClientError::Api { status: 404, .. } => ApiError::new(ErrorCode::NotFound, message),
            ClientError::Api { status, .. } if (400..500).contains(&status) => {
                ApiError::new(ErrorCode::BusinessLogic, message)
            }
            ClientError::Api { status, .. } => {
                tracing::error!(status, "Backend error: {}", err);
                ApiError::new(ErrorCode::Internal, message)
            }
            ClientError::Network(_) | ClientError::Timeout(_) => {
                tracing::error!("Backend unreachable: {}", err);
                ApiError::new(ErrorCode::Network, message)
            }
            ClientError::InvalidConfig(detail)
            | ClientError::InvalidUrl(detail)
            | ClientError::ConfigLoadFailed(detail)
            | ClientError::ConfigSaveFailed(detail) => ApiError::config(detail),
            other => ApiError::internal(other),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::from(CoreError::Validation(err))
    }
}

impl From<FormErrors> for ApiError {
    fn from(err: FormErrors) -> Self {
        ApiError::from(CoreError::Form(err))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::internal(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::validation(format!("Invalid JSON: {}", err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for commands.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_error_reads_as_one_line() {
        let err = ApiError::from(CoreError::InsufficientStock {
            product: "NPK Mutiara".into(),
            available: 25,
            requested: 40,
        });
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.message, "Only 25 NPK Mutiara in stock");
    }

    #[test]
    fn test_client_errors_map_to_codes() {
        let err = ApiError::from(ClientError::Api {
            status: 422,
            message: Some("Stok tidak mencukupi".into()),
        });
        assert_eq!(err.code, ErrorCode::BusinessLogic);
        assert_eq!(err.message, "Stok tidak mencukupi");

        let err = ApiError::from(ClientError::NotAuthenticated);
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert_eq!(err.code.exit_code(), 3);

        let err = ApiError::from(ClientError::Network("connection refused".into()));
        assert_eq!(err.code, ErrorCode::Network);
        assert_eq!(err.message, GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_form_errors_surface_field_text() {
        let err = ApiError::from(ClientError::from(ValidationError::Required {
            field: "email".into(),
        }));
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("email is required"));
    }

    #[test]
    fn test_json_shape() {
        let err = ApiError::cart("Cart is empty");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "CART_ERROR");
        assert_eq!(json["message"], "Cart is empty");
    }
}
