//! # Checkout Commands
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        pupuk checkout                                   │
//! │                                                                         │
//! │  1. require(/checkout)        signed in, else "Please log in"          │
//! │  2. GET /cart-items           the lines to order                       │
//! │  3. GET /ppn                  current PPN rate                          │
//! │  4. build form                flags, falling back to the profile      │
//! │  5. --dry-run? ──yes──► print summary, stop                            │
//! │  6. POST /transactions        validated payload with totals            │
//! │  7. payment handoff           hosted page URL or snap token            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use pupuk_client::{PaymentHandoff, PaymentReturn};
use pupuk_core::auth::Route;
use pupuk_core::checkout::{summarize, CheckoutForm, CheckoutSummary};
use pupuk_core::{PpnConfig, ShippingAddress, ShippingMethod, Transaction, User};
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::CheckoutArgs;
use crate::commands::{render, OutputFormat};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::output;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPreview {
    pub shipping_method: ShippingMethod,
    pub ppn: PpnConfig,
    pub summary: CheckoutSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub transaction: Transaction,
    pub payment: PaymentHandoff,
}

/// Checkout form from the flags, filling gaps from the signed-in profile.
///
/// Pickup orders carry no street address.
pub fn build_form(args: &CheckoutArgs, user: &User) -> CheckoutForm {
    let pick = |flag: &Option<String>, profile: &Option<String>| {
        flag.clone().or_else(|| profile.clone()).unwrap_or_default()
    };

    let shipping_address = if args.method.requires_address() {
        ShippingAddress {
            recipient_name: pick(&args.recipient, &Some(user.name.clone())),
            phone: pick(&args.phone, &user.phone),
            address: pick(&args.address, &user.address),
            city: args.city.clone(),
            postal_code: args.postal_code.clone(),
        }
    } else {
        ShippingAddress {
            recipient_name: pick(&args.recipient, &Some(user.name.clone())),
            phone: pick(&args.phone, &user.phone),
            ..ShippingAddress::default()
        }
    };

    CheckoutForm {
        shipping_method: args.method,
        shipping_address,
        notes: args.notes.clone(),
    }
}

pub async fn checkout(state: &AppState, args: &CheckoutArgs, format: OutputFormat) -> ApiResult<String> {
    let storefront = state.storefront();
    let user = storefront.session().require(&Route::Checkout).await?;

    let cart = storefront.cart().get().await?;
    let ppn = storefront.settings().ppn().await?;
    let rates = storefront.config().shipping;
    let form = build_form(args, &user);
    debug!(method = %form.shipping_method, lines = cart.item_count(), dry_run = args.dry_run, "checkout");

    if args.dry_run {
        let preview = CheckoutPreview {
            shipping_method: form.shipping_method,
            ppn,
            summary: summarize(&cart, form.shipping_method, &rates, &ppn),
        };
        return render(format, &preview, |p| {
            output::checkout_summary(&p.summary, p.shipping_method, &p.ppn)
        });
    }

    let transaction = storefront
        .transactions()
        .checkout(&cart, &form, &rates, &ppn)
        .await?;
    let placed = PlacedOrder {
        payment: PaymentHandoff::for_transaction(&transaction),
        transaction,
    };
    render(format, &placed, |p| output::order_placed(&p.transaction, &p.payment))
}

/// Reads the gateway's return URL and refreshes the order it names.
pub async fn payment_finish(state: &AppState, url: &str, format: OutputFormat) -> ApiResult<String> {
    let storefront = state.storefront();
    storefront.session().require(&Route::PaymentFinish).await?;

    let ret = PaymentReturn::parse(url)
        .map_err(|e| ApiError::new(ErrorCode::PaymentError, e.to_string()))?;
    info!(order_id = %ret.order_id, outcome = ?ret.outcome, "Payment return");

    storefront
        .cache()
        .invalidate(pupuk_client::resources::keys::TRANSACTIONS)
        .await;
    render(format, &ret, output::payment_return)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pupuk_core::Role;

    fn user() -> User {
        User {
            id: "u1".to_string(),
            name: "Budi Santoso".to_string(),
            email: "budi@example.com".to_string(),
            phone: Some("081234567890".to_string()),
            address: Some("Jl. Raya Cianjur 12".to_string()),
            role: Role::Customer,
            created_at: Utc::now(),
        }
    }

    fn args(method: ShippingMethod) -> CheckoutArgs {
        CheckoutArgs {
            method,
            recipient: None,
            phone: None,
            address: None,
            city: "Cianjur".to_string(),
            postal_code: "43211".to_string(),
            notes: None,
            dry_run: false,
        }
    }

    #[test]
    fn test_form_falls_back_to_profile() {
        let form = build_form(&args(ShippingMethod::Regular), &user());
        assert_eq!(form.shipping_address.recipient_name, "Budi Santoso");
        assert_eq!(form.shipping_address.phone, "081234567890");
        assert_eq!(form.shipping_address.address, "Jl. Raya Cianjur 12");
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_flags_override_profile() {
        let mut a = args(ShippingMethod::Express);
        a.recipient = Some("Sari".to_string());
        a.address = Some("Gudang Blok C".to_string());
        let form = build_form(&a, &user());
        assert_eq!(form.shipping_address.recipient_name, "Sari");
        assert_eq!(form.shipping_address.address, "Gudang Blok C");
    }

    #[test]
    fn test_pickup_drops_address() {
        let form = build_form(&args(ShippingMethod::Pickup), &user());
        assert!(form.shipping_address.address.is_empty());
        assert!(form.shipping_address.city.is_empty());
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_missing_profile_phone_fails_validation() {
        let mut u = user();
        u.phone = None;
        let form = build_form(&args(ShippingMethod::Regular), &u);
        let errors = form.validate().unwrap_err();
        assert!(errors.for_field("phone").is_some());
    }
}
