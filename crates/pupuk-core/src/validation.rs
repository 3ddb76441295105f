//! # Validation Module
//!
//! Field validators and the forms built from them.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form (THIS MODULE)                                           │
//! │  ├── Every field checked, every failure reported (FormErrors)          │
//! │  └── Nothing is sent while a form is invalid                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: REST backend                                                 │
//! │  ├── Authoritative rules (unique email, stock, cart invariants)        │
//! │  └── Failures come back as { "message": "..." } → error line           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pupuk_core::validation::{LoginForm, validate_phone};
//!
//! assert!(validate_phone("0812-3456-7890").is_ok());
//!
//! let form = LoginForm { email: "budi@".into(), password: "".into() };
//! let errors = form.validate().unwrap_err();
//! assert_eq!(errors.len(), 2);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{FormErrors, ValidationError};
use crate::money::Money;
use crate::types::CompanyInfo;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Minimum password length accepted by the backend.
pub const MIN_PASSWORD_LENGTH: usize = 8;

// =============================================================================
// String Validators
// =============================================================================

/// Rejects empty or whitespace-only input.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a length-bounded text field (character count, trimmed).
pub fn validate_length(field: &str, value: &str, min: usize, max: usize) -> ValidationResult<()> {
    validate_required(field, value)?;

    let len = value.trim().chars().count();
    if len < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }
    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Validates a person or company name: 2-100 characters.
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    validate_length(field, value, 2, 100)
}

/// Validates an email address.
///
/// ## Rules
/// - Exactly one `@` with a non-empty local part
/// - Domain contains a dot that is neither first nor last
/// - No whitespace
///
/// ## Example
/// ```rust
/// use pupuk_core::validation::validate_email;
///
/// assert!(validate_email("toko@tanisubur.co.id").is_ok());
/// assert!(validate_email("toko@localhost").is_err());
/// ```
pub fn validate_email(value: &str) -> ValidationResult<()> {
    validate_required("email", value)?;

    let value = value.trim();
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if value.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain spaces"));
    }

    let mut parts = value.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err(invalid("must contain a single @")),
    };

    if local.is_empty() {
        return Err(invalid("missing name before @"));
    }

    match domain.find('.') {
        Some(_) if !domain.starts_with('.') && !domain.ends_with('.') => Ok(()),
        _ => Err(invalid("missing domain")),
    }
}

/// Validates a new password.
///
/// ## Rules
/// - At least [`MIN_PASSWORD_LENGTH`] characters, at most 72
/// - Contains at least one letter and one digit
pub fn validate_password(value: &str) -> ValidationResult<()> {
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    let len = value.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LENGTH,
        });
    }
    if len > 72 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 72,
        });
    }

    let has_letter = value.chars().any(char::is_alphabetic);
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(ValidationError::InvalidFormat {
            field: "password".to_string(),
            reason: "must contain letters and numbers".to_string(),
        });
    }

    Ok(())
}

/// Confirmation field must repeat the password exactly.
pub fn validate_password_confirmation(password: &str, confirmation: &str) -> ValidationResult<()> {
    if confirmation.is_empty() {
        return Err(ValidationError::Required {
            field: "confirm_password".to_string(),
        });
    }
    if password != confirmation {
        return Err(ValidationError::Mismatch {
            field: "confirm_password".to_string(),
            other: "password".to_string(),
        });
    }
    Ok(())
}

/// Validates an Indonesian phone number.
///
/// ## Rules
/// - Spaces, dashes and dots are ignored
/// - Starts with `08`, `628` or `+628`
/// - 10-15 digits in total
///
/// ## Example
/// ```rust
/// use pupuk_core::validation::validate_phone;
///
/// assert!(validate_phone("081234567890").is_ok());
/// assert!(validate_phone("+62 812 3456 7890").is_ok());
/// assert!(validate_phone("021-555").is_err());
/// ```
pub fn validate_phone(value: &str) -> ValidationResult<()> {
    validate_required("phone", value)?;

    let compact: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.'))
        .collect();

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "phone".to_string(),
        reason: reason.to_string(),
    };

    let (digits, international) = match compact.strip_prefix('+') {
        Some(rest) => (rest, true),
        None => (compact.as_str(), false),
    };
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("must contain only digits"));
    }
    let prefix_ok = digits.starts_with("628") || (!international && digits.starts_with("08"));
    if !prefix_ok {
        return Err(invalid("must start with 08 or +62"));
    }
    if !(10..=15).contains(&digits.len()) {
        return Err(invalid("must be 10 to 15 digits"));
    }
    Ok(())
}

/// Indonesian postal codes are five digits.
pub fn validate_postal_code(value: &str) -> ValidationResult<()> {
    validate_required("postal_code", value)?;

    let value = value.trim();
    if value.len() != 5 || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "postal_code".to_string(),
            reason: "must be 5 digits".to_string(),
        });
    }
    Ok(())
}

/// Validates an NPK formula such as `16-16-16` or `15-10-12`.
pub fn validate_npk_formula(value: &str) -> ValidationResult<()> {
    let parts: Vec<&str> = value.trim().split('-').collect();
    let well_formed = parts.len() == 3
        && parts.iter().all(|p| {
            !p.is_empty() && p.len() <= 2 && p.chars().all(|c| c.is_ascii_digit())
        });

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "npk_formula".to_string(),
            reason: "must look like 16-16-16".to_string(),
        });
    }
    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (shows the whole catalog)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Prices may be zero (free samples) but never negative.
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::Negative {
            field: "stock".to_string(),
        });
    }
    Ok(())
}

/// PPN rate must be between 0% and 100%.
pub fn validate_ppn_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "ppn_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }
    Ok(())
}

pub fn validate_page_size(page_size: usize) -> ValidationResult<()> {
    if page_size == 0 {
        return Err(ValidationError::MustBePositive {
            field: "page_size".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that one more line fits in the cart.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Account Forms
// =============================================================================

/// Login screen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Only presence and email shape: password rules apply to new passwords.
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        errors.check(validate_email(&self.email));
        if self.password.is_empty() {
            errors.push(ValidationError::Required {
                field: "password".to_string(),
            });
        }
        errors.into_result()
    }
}

/// Registration screen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    #[serde(skip_serializing, default)]
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        errors.check(validate_name("name", &self.name));
        errors.check(validate_email(&self.email));
        errors.check(validate_phone(&self.phone));
        errors.check(validate_password(&self.password));
        errors.check(validate_password_confirmation(
            &self.password,
            &self.confirm_password,
        ));
        errors.into_result()
    }
}

/// "Forgot password" screen: asks the backend to email a reset link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

impl ForgotPasswordForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        errors.check(validate_email(&self.email));
        errors.into_result()
    }
}

/// Reset-password screen reached from the emailed link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordForm {
    pub token: String,
    pub password: String,
    #[serde(skip_serializing, default)]
    pub confirm_password: String,
}

impl ResetPasswordForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        errors.check(validate_required("token", &self.token));
        errors.check(validate_password(&self.password));
        errors.check(validate_password_confirmation(
            &self.password,
            &self.confirm_password,
        ));
        errors.into_result()
    }
}

/// Profile edit (customer) and customer edit dialog (admin).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        errors.check(validate_name("name", &self.name));
        errors.check(validate_email(&self.email));
        if let Some(phone) = self.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            errors.check(validate_phone(phone));
        }
        if let Some(address) = self.address.as_deref() {
            if address.chars().count() > 500 {
                errors.push(ValidationError::TooLong {
                    field: "address".to_string(),
                    max: 500,
                });
            }
        }
        errors.into_result()
    }
}

// =============================================================================
// Admin Forms
// =============================================================================

/// One packaging row of the product dialog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantForm {
    /// Set when editing an existing variant.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
    pub packaging_id: String,
    pub price: Money,
    pub stock: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sku: Option<String>,
}

/// Create / edit product dialog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductForm {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub npk_formula: Option<String>,
    pub product_type_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    pub variants: Vec<VariantForm>,
}

impl ProductForm {
    /// ## Rules
    /// - name 2-150 characters, description at most 2000
    /// - product type selected
    /// - NPK formula well-formed when given
    /// - at least one variant, each packaging used once,
    ///   price ≥ 0 and stock ≥ 0
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        errors.check(validate_length("name", &self.name, 2, 150));
        if self.description.chars().count() > 2000 {
            errors.push(ValidationError::TooLong {
                field: "description".to_string(),
                max: 2000,
            });
        }
        errors.check(validate_required("product_type_id", &self.product_type_id));
        if let Some(npk) = self.npk_formula.as_deref().filter(|s| !s.trim().is_empty()) {
            errors.check(validate_npk_formula(npk));
        }

        if self.variants.is_empty() {
            errors.push(ValidationError::Required {
                field: "variants".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for variant in &self.variants {
            errors.check(validate_required("packaging_id", &variant.packaging_id));
            errors.check(validate_price("price", variant.price));
            errors.check(validate_stock(variant.stock));
            if !variant.packaging_id.trim().is_empty() && !seen.insert(variant.packaging_id.as_str())
            {
                errors.push(ValidationError::Duplicate {
                    field: "packaging_id".to_string(),
                    value: variant.packaging_id.clone(),
                });
            }
        }

        errors.into_result()
    }
}

/// Company settings screen.
pub fn validate_company_info(info: &CompanyInfo) -> Result<(), FormErrors> {
    let mut errors = FormErrors::new();
    errors.check(validate_name("name", &info.name));
    if !info.email.trim().is_empty() {
        errors.check(validate_email(&info.email));
    }
    if !info.phone.trim().is_empty() {
        errors.check(validate_phone(&info.phone));
    }
    errors.into_result()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("budi@example.com").is_ok());
        assert!(validate_email("  sari.tani@kebun.co.id ").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("budi").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("budi@example").is_err());
        assert!(validate_email("budi@.com").is_err());
        assert!(validate_email("budi@example.").is_err());
        assert!(validate_email("bu di@example.com").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("subur2026").is_ok());

        assert!(matches!(
            validate_password("abc1"),
            Err(ValidationError::TooShort { .. })
        ));
        assert!(matches!(
            validate_password("onlyletters"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(matches!(
            validate_password("12345678"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(validate_password(&"a1".repeat(40)).is_err());
    }

    #[test]
    fn test_validate_password_confirmation() {
        assert!(validate_password_confirmation("subur2026", "subur2026").is_ok());
        assert!(validate_password_confirmation("subur2026", "").is_err());
        assert!(matches!(
            validate_password_confirmation("subur2026", "subur2025"),
            Err(ValidationError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("081234567890").is_ok());
        assert!(validate_phone("+6281234567890").is_ok());
        assert!(validate_phone("62 812-3456-7890").is_ok());

        assert!(validate_phone("").is_err());
        assert!(validate_phone("0812345").is_err());
        assert!(validate_phone("0212345678").is_err());
        assert!(validate_phone("0812abc45678").is_err());
        // `+` only introduces the country code
        assert!(validate_phone("+081234567890").is_err());
        assert!(validate_phone("+1 812 3456 7890").is_err());
    }

    #[test]
    fn test_validate_postal_code() {
        assert!(validate_postal_code("65145").is_ok());
        assert!(validate_postal_code("6514").is_err());
        assert!(validate_postal_code("6514a").is_err());
    }

    #[test]
    fn test_validate_npk_formula() {
        assert!(validate_npk_formula("16-16-16").is_ok());
        assert!(validate_npk_formula("15-10-12").is_ok());
        assert!(validate_npk_formula("16-16").is_err());
        assert!(validate_npk_formula("16-x-16").is_err());
        assert!(validate_npk_formula("160-16-16").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_register_form_reports_every_field() {
        let form = RegisterForm {
            name: "B".to_string(),
            email: "budi@".to_string(),
            phone: "123".to_string(),
            password: "short".to_string(),
            confirm_password: "other".to_string(),
        };

        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 5);
        for field in ["name", "email", "phone", "password", "confirm_password"] {
            assert!(errors.for_field(field).is_some(), "missing error for {}", field);
        }
    }

    #[test]
    fn test_register_form_valid() {
        let form = RegisterForm {
            name: "Budi Santoso".to_string(),
            email: "budi@example.com".to_string(),
            phone: "081234567890".to_string(),
            password: "subur2026".to_string(),
            confirm_password: "subur2026".to_string(),
        };
        assert!(form.validate().is_ok());

        let json = serde_json::to_value(&form).unwrap();
        assert!(json.get("confirmPassword").is_none());
        assert_eq!(json["email"], "budi@example.com");
    }

    #[test]
    fn test_reset_password_form() {
        let form = ResetPasswordForm {
            token: "abc".to_string(),
            password: "subur2026".to_string(),
            confirm_password: "subur2026".to_string(),
        };
        assert!(form.validate().is_ok());

        let missing_token = ResetPasswordForm {
            token: " ".to_string(),
            ..form
        };
        assert!(missing_token.validate().is_err());
    }

    #[test]
    fn test_product_form_rules() {
        let variant = |packaging: &str, price: i64, stock: i64| VariantForm {
            id: None,
            packaging_id: packaging.to_string(),
            price: Money::from_rupiah(price),
            stock,
            sku: None,
        };

        let valid = ProductForm {
            name: "NPK Mutiara".to_string(),
            description: String::new(),
            npk_formula: Some("16-16-16".to_string()),
            product_type_id: "npk".to_string(),
            image_url: None,
            is_active: true,
            variants: vec![variant("50kg", 310_000, 20), variant("5kg", 45_000, 0)],
        };
        assert!(valid.validate().is_ok());

        let no_variants = ProductForm {
            variants: vec![],
            ..valid.clone()
        };
        assert!(no_variants.validate().unwrap_err().for_field("variants").is_some());

        let duplicate = ProductForm {
            variants: vec![variant("50kg", 310_000, 1), variant("50kg", 300_000, 1)],
            ..valid.clone()
        };
        assert!(matches!(
            duplicate.validate().unwrap_err().for_field("packaging_id"),
            Some(ValidationError::Duplicate { .. })
        ));

        let negative = ProductForm {
            variants: vec![variant("50kg", -1, -5)],
            ..valid
        };
        let errors = negative.validate().unwrap_err();
        assert!(errors.for_field("price").is_some());
        assert!(errors.for_field("stock").is_some());
    }

    #[test]
    fn test_company_info_validation() {
        let info = CompanyInfo {
            name: "CV Tani Subur".to_string(),
            email: "info@tanisubur.co.id".to_string(),
            phone: "0341-555-0100".to_string(),
            ..CompanyInfo::default()
        };
        // 0341 is a landline prefix, not a mobile number
        assert!(validate_company_info(&info).is_err());

        let info = CompanyInfo {
            phone: "081234567890".to_string(),
            ..info
        };
        assert!(validate_company_info(&info).is_ok());
    }
}
