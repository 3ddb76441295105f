//! # Checkout Module
//!
//! Order totals and the payload sent to `POST /transactions`.
//!
//! ## Totals
//! ```text
//!   subtotal  = Σ price × quantity
//!   ppn       = round_half_up(subtotal × rate)      (0 when PPN is off)
//!   shipping  = flat cost of the chosen method
//!   total     = subtotal + ppn + shipping
//! ```
//!
//! PPN is charged on goods only, never on shipping.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult, FormErrors, ValidationError};
use crate::money::Money;
use crate::types::{PpnConfig, ShippingAddress, ShippingMethod};
use crate::validation::{validate_name, validate_phone, validate_postal_code, validate_required};

// =============================================================================
// Shipping Rates
// =============================================================================

/// Flat cost per shipping method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingRates {
    pub pickup: Money,
    pub regular: Money,
    pub express: Money,
    pub cargo: Money,
}

impl ShippingRates {
    pub fn cost(&self, method: ShippingMethod) -> Money {
        match method {
            ShippingMethod::Pickup => self.pickup,
            ShippingMethod::Regular => self.regular,
            ShippingMethod::Express => self.express,
            ShippingMethod::Cargo => self.cargo,
        }
    }
}

impl Default for ShippingRates {
    fn default() -> Self {
        Self {
            pickup: Money::zero(),
            regular: Money::from_rupiah(25_000),
            express: Money::from_rupiah(50_000),
            cargo: Money::from_rupiah(150_000),
        }
    }
}

// =============================================================================
// Checkout Form
// =============================================================================

/// What the shopper fills in on the checkout page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    pub shipping_method: ShippingMethod,
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CheckoutForm {
    /// ## Rules
    /// - recipient name and phone always (pickup needs someone to collect)
    /// - street address, city and postal code unless the method is pickup
    /// - notes at most 500 characters
    pub fn validate(&self) -> Result<(), FormErrors> {
        let address = &self.shipping_address;
        let mut errors = FormErrors::new();

        errors.check(validate_name("recipient_name", &address.recipient_name));
        errors.check(validate_phone(&address.phone));

        if self.shipping_method.requires_address() {
            errors.check(validate_required("address", &address.address));
            errors.check(validate_required("city", &address.city));
            errors.check(validate_postal_code(&address.postal_code));
        }

        if let Some(notes) = &self.notes {
            if notes.chars().count() > 500 {
                errors.push(ValidationError::TooLong {
                    field: "notes".to_string(),
                    max: 500,
                });
            }
        }

        errors.into_result()
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Totals shown in the order summary box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutSummary {
    pub subtotal: Money,
    pub ppn_amount: Money,
    pub shipping_cost: Money,
    pub total: Money,
}

/// Computes the order summary for a cart.
///
/// ## Example
/// ```rust
/// use pupuk_core::cart::Cart;
/// use pupuk_core::checkout::{summarize, ShippingRates};
/// use pupuk_core::{PpnConfig, ShippingMethod};
///
/// let summary = summarize(
///     &Cart::new(),
///     ShippingMethod::Regular,
///     &ShippingRates::default(),
///     &PpnConfig::default(),
/// );
/// assert_eq!(summary.total.rupiah(), 25_000);
/// ```
pub fn summarize(
    cart: &Cart,
    method: ShippingMethod,
    rates: &ShippingRates,
    ppn: &PpnConfig,
) -> CheckoutSummary {
    let subtotal = cart.total();
    let ppn_amount = subtotal.calculate_ppn(ppn.effective_rate());
    let shipping_cost = rates.cost(method);

    CheckoutSummary {
        subtotal,
        ppn_amount,
        shipping_cost,
        total: subtotal + ppn_amount + shipping_cost,
    }
}

// =============================================================================
// Order Payload
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderItemPayload {
    pub variant_id: String,
    pub quantity: i64,
}

/// Body of `POST /transactions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderPayload {
    pub items: Vec<OrderItemPayload>,
    pub shipping_method: ShippingMethod,
    pub shipping_cost: Money,
    pub shipping_address: ShippingAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub subtotal: Money,
    pub ppn_amount: Money,
    pub total: Money,
}

/// Validates the form and assembles the order.
///
/// ## Errors
/// - [`CoreError::EmptyCart`] when there is nothing to order
/// - [`CoreError::Form`] with every failing field otherwise
pub fn build_order_payload(
    cart: &Cart,
    form: &CheckoutForm,
    rates: &ShippingRates,
    ppn: &PpnConfig,
) -> CoreResult<OrderPayload> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    form.validate()?;

    let summary = summarize(cart, form.shipping_method, rates, ppn);
    let notes = form
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    Ok(OrderPayload {
        items: cart
            .items
            .iter()
            .map(|i| OrderItemPayload {
                variant_id: i.variant_id.clone(),
                quantity: i.quantity,
            })
            .collect(),
        shipping_method: form.shipping_method,
        shipping_cost: summary.shipping_cost,
        shipping_address: form.shipping_address.clone(),
        notes,
        subtotal: summary.subtotal,
        ppn_amount: summary.ppn_amount,
        total: summary.total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::cart_item;

    fn cart() -> Cart {
        Cart::from_items(vec![
            cart_item("c1", "v-npk", 310_000, 2),
            cart_item("c2", "v-urea", 9_000, 5),
        ])
    }

    fn delivery_form(method: ShippingMethod) -> CheckoutForm {
        CheckoutForm {
            shipping_method: method,
            shipping_address: ShippingAddress {
                recipient_name: "Pak Slamet".to_string(),
                phone: "081234567890".to_string(),
                address: "Jl. Raya Tani No. 4".to_string(),
                city: "Malang".to_string(),
                postal_code: "65145".to_string(),
            },
            notes: Some("  Kirim pagi  ".to_string()),
        }
    }

    #[test]
    fn test_summary_with_ppn() {
        let summary = summarize(
            &cart(),
            ShippingMethod::Express,
            &ShippingRates::default(),
            &PpnConfig::default(),
        );

        assert_eq!(summary.subtotal, Money::from_rupiah(665_000));
        // 665 000 × 11% = 73 150
        assert_eq!(summary.ppn_amount, Money::from_rupiah(73_150));
        assert_eq!(summary.shipping_cost, Money::from_rupiah(50_000));
        assert_eq!(summary.total, Money::from_rupiah(788_150));
    }

    #[test]
    fn test_summary_without_ppn() {
        let ppn = PpnConfig {
            rate_bps: 1100,
            is_active: false,
        };
        let summary = summarize(&cart(), ShippingMethod::Pickup, &ShippingRates::default(), &ppn);

        assert!(summary.ppn_amount.is_zero());
        assert!(summary.shipping_cost.is_zero());
        assert_eq!(summary.total, summary.subtotal);
    }

    #[test]
    fn test_custom_shipping_rates() {
        let rates = ShippingRates {
            cargo: Money::from_rupiah(400_000),
            ..ShippingRates::default()
        };
        assert_eq!(rates.cost(ShippingMethod::Cargo), Money::from_rupiah(400_000));
        assert_eq!(rates.cost(ShippingMethod::Regular), Money::from_rupiah(25_000));
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        let result = build_order_payload(
            &Cart::new(),
            &delivery_form(ShippingMethod::Regular),
            &ShippingRates::default(),
            &PpnConfig::default(),
        );
        assert!(matches!(result, Err(CoreError::EmptyCart)));
    }

    #[test]
    fn test_delivery_requires_address() {
        let mut form = delivery_form(ShippingMethod::Regular);
        form.shipping_address.address = String::new();
        form.shipping_address.postal_code = "651".to_string();

        let result = build_order_payload(&cart(), &form, &ShippingRates::default(), &PpnConfig::default());
        match result {
            Err(CoreError::Form(errors)) => {
                assert_eq!(errors.len(), 2);
                assert!(errors.for_field("address").is_some());
                assert!(errors.for_field("postal_code").is_some());
            }
            other => panic!("expected form errors, got {:?}", other),
        }
    }

    #[test]
    fn test_pickup_needs_only_contact() {
        let form = CheckoutForm {
            shipping_method: ShippingMethod::Pickup,
            shipping_address: ShippingAddress {
                recipient_name: "Bu Sari".to_string(),
                phone: "+6281234567890".to_string(),
                ..ShippingAddress::default()
            },
            notes: None,
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_payload_shape() {
        let payload = build_order_payload(
            &cart(),
            &delivery_form(ShippingMethod::Regular),
            &ShippingRates::default(),
            &PpnConfig::default(),
        )
        .unwrap();

        assert_eq!(payload.notes.as_deref(), Some("Kirim pagi"));
        assert_eq!(payload.total, payload.subtotal + payload.ppn_amount + payload.shipping_cost);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["items"][0]["variantId"], "v-npk");
        assert_eq!(json["items"][1]["quantity"], 5);
        assert_eq!(json["shippingMethod"], "regular");
        assert_eq!(json["shippingCost"], 25_000);
        assert_eq!(json["shippingAddress"]["postalCode"], "65145");
        assert_eq!(json["ppnAmount"], 73_150);
        assert_eq!(json["total"], 763_150);
    }

    #[test]
    fn test_blank_notes_are_dropped() {
        let mut form = delivery_form(ShippingMethod::Cargo);
        form.notes = Some("   ".to_string());

        let payload =
            build_order_payload(&cart(), &form, &ShippingRates::default(), &PpnConfig::default())
                .unwrap();
        assert!(payload.notes.is_none());
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("notes").is_none());
    }
}
