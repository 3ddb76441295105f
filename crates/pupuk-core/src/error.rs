//! # Error Types
//!
//! Domain-specific error types for pupuk-core.
//!
//! `ValidationError` names one failing field, `FormErrors` collects every
//! failing field of a submitted form, and `CoreError` covers business rules
//! (stock, cart limits, status transitions). The client crate wraps these in
//! `ClientError`; the `pupuk` binary turns that into an error code and an
//! exit status.

use std::fmt;

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product is not in the list the caller holds.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Variant id does not belong to any known product.
    #[error("Variant not found: {0}")]
    VariantNotFound(String),

    /// Cart line id is not in the cart.
    #[error("Cart item not found: {0}")]
    CartItemNotFound(String),

    /// Cart has reached its line limit.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds the maximum.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Checkout attempted on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Requested variant has fewer units in stock than asked for.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (qty: 40 sacks)
    ///      │
    ///      ▼
    /// Check stock: available=25
    ///      │
    ///      ▼
    /// InsufficientStock { product: "NPK Mutiara", available: 25, requested: 40 }
    ///      │
    ///      ▼
    /// Toast: "Only 25 NPK Mutiara in stock"
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Navigation not allowed from the current page.
    #[error("Cannot go from {from} to {to}")]
    InvalidNavigation { from: String, to: String },

    /// Admin tried a status change the order lifecycle forbids.
    #[error("Transaction cannot move from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// Single-field validation failure.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Form validation failure (one or more fields).
    #[error("{0}")]
    Form(#[from] FormErrors),
}

// =============================================================================
// Validation Error
// =============================================================================

/// One field failed a rule.
///
/// Each variant names the field so a form can place the message next to
/// the right input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (email, phone, postal code, ...).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two fields that must agree do not.
    #[error("{field} does not match {other}")]
    Mismatch { field: String, other: String },

    /// Duplicate value inside one form (e.g. two variants with one packaging).
    #[error("{field} '{value}' is used more than once")]
    Duplicate { field: String, value: String },
}

impl ValidationError {
    /// Name of the field this error belongs to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooShort { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::Negative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::Mismatch { field, .. }
            | ValidationError::Duplicate { field, .. } => field,
        }
    }
}

// =============================================================================
// Form Errors
// =============================================================================

/// Every failing field of a submitted form, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
pub struct FormErrors {
    errors: Vec<ValidationError>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the error of a field check, if it failed.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(e) = result {
            self.errors.push(e);
        }
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// First message recorded for `field`.
    pub fn for_field(&self, field: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.field() == field)
    }

    /// `Ok(())` when nothing failed.
    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "NPK Mutiara 16-16-16".to_string(),
            available: 25,
            requested: 40,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for NPK Mutiara 16-16-16: available 25, requested 40"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "email".to_string(),
        };
        assert_eq!(err.to_string(), "email is required");
        assert_eq!(err.field(), "email");

        let err = ValidationError::Mismatch {
            field: "confirm_password".to_string(),
            other: "password".to_string(),
        };
        assert_eq!(err.to_string(), "confirm_password does not match password");
    }

    #[test]
    fn test_form_errors_collects_in_order() {
        let mut form = FormErrors::new();
        form.check(Ok(()));
        form.check(Err(ValidationError::Required {
            field: "name".to_string(),
        }));
        form.push(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });

        assert_eq!(form.len(), 2);
        assert!(form.for_field("password").is_some());
        assert!(form.for_field("email").is_none());
        assert_eq!(
            form.to_string(),
            "name is required; password must be at least 8 characters"
        );
        assert!(form.into_result().is_err());
    }

    #[test]
    fn test_empty_form_is_ok() {
        assert!(FormErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "address".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
