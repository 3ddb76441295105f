//! # Payment Handoff
//!
//! After checkout the backend hands back the gateway's data on
//! `Transaction::payment`. This module decides how to pass the shopper to
//! the gateway and reads the outcome from the URL the gateway sends them
//! back to (`/payment/finish?order_id=...&status_code=...&transaction_status=...`).

use pupuk_core::{PaymentInfo, Transaction};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, ClientResult};

/// How to hand the shopper to the payment gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PaymentHandoff {
    /// Open the hosted payment page.
    Redirect(String),
    /// Open the gateway's embedded checkout with this token.
    Embedded(String),
    /// Nothing to pay through the gateway (already paid, or no payment data).
    None,
}

impl PaymentHandoff {
    /// Prefers the hosted page when both are present.
    pub fn from_info(info: Option<&PaymentInfo>) -> Self {
        let Some(info) = info else {
            return PaymentHandoff::None;
        };

        let non_empty = |s: &Option<String>| s.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

        if let Some(url) = non_empty(&info.redirect_url) {
            return PaymentHandoff::Redirect(url);
        }
        match non_empty(&info.token) {
            Some(token) => PaymentHandoff::Embedded(token),
            None => PaymentHandoff::None,
        }
    }

    pub fn for_transaction(transaction: &Transaction) -> Self {
        if !transaction.awaiting_payment() {
            return PaymentHandoff::None;
        }
        Self::from_info(transaction.payment.as_ref())
    }
}

/// Result of a payment as reported on the return URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Success,
    /// Waiting for a bank transfer or similar.
    Pending,
    Failed,
}

impl PaymentOutcome {
    /// Gateway `transaction_status` values. `status_code` decides when the
    /// status is missing or unknown: 200 success, 201 pending, else failed.
    fn classify(transaction_status: Option<&str>, status_code: Option<&str>) -> Self {
        match transaction_status.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("settlement" | "capture" | "success") => PaymentOutcome::Success,
            Some("pending") => PaymentOutcome::Pending,
            Some("deny" | "cancel" | "expire" | "failure" | "failed") => PaymentOutcome::Failed,
            _ => match status_code.map(str::trim) {
                Some("200") => PaymentOutcome::Success,
                Some("201") => PaymentOutcome::Pending,
                _ => PaymentOutcome::Failed,
            },
        }
    }
}

/// Parsed gateway return URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReturn {
    /// Invoice number the order was submitted under.
    pub order_id: String,
    pub transaction_status: Option<String>,
    pub status_code: Option<String>,
    pub outcome: PaymentOutcome,
}

impl PaymentReturn {
    /// Parses an absolute return URL.
    ///
    /// ## Errors
    /// Malformed URL, or no `order_id` parameter.
    pub fn parse(return_url: &str) -> ClientResult<Self> {
        let url = Url::parse(return_url)?;

        let mut order_id = None;
        let mut transaction_status = None;
        let mut status_code = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "order_id" => order_id = Some(value.into_owned()),
                "transaction_status" => transaction_status = Some(value.into_owned()),
                "status_code" => status_code = Some(value.into_owned()),
                _ => {}
            }
        }

        let order_id = order_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ClientError::InvalidUrl(format!("{} has no order_id", return_url)))?;
        let outcome = PaymentOutcome::classify(transaction_status.as_deref(), status_code.as_deref());

        Ok(PaymentReturn {
            order_id,
            transaction_status,
            status_code,
            outcome,
        })
    }

    /// Message for the "payment finished" page.
    pub fn message(&self) -> String {
        match self.outcome {
            PaymentOutcome::Success => format!("Payment for {} received. Thank you!", self.order_id),
            PaymentOutcome::Pending => format!(
                "Payment for {} is waiting for confirmation. Complete it using the instructions from the payment page.",
                self.order_id
            ),
            PaymentOutcome::Failed => format!("Payment for {} did not go through. Please try again.", self.order_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handoff_prefers_redirect() {
        let both = PaymentInfo {
            token: Some("snap-1".to_string()),
            redirect_url: Some("https://pay.example/v2/vtweb/snap-1".to_string()),
        };
        assert_eq!(
            PaymentHandoff::from_info(Some(&both)),
            PaymentHandoff::Redirect("https://pay.example/v2/vtweb/snap-1".to_string())
        );

        let token_only = PaymentInfo {
            token: Some("snap-2".to_string()),
            redirect_url: Some("  ".to_string()),
        };
        assert_eq!(
            PaymentHandoff::from_info(Some(&token_only)),
            PaymentHandoff::Embedded("snap-2".to_string())
        );

        assert_eq!(PaymentHandoff::from_info(Some(&PaymentInfo::default())), PaymentHandoff::None);
        assert_eq!(PaymentHandoff::from_info(None), PaymentHandoff::None);
    }

    #[test]
    fn test_parse_return_url() {
        let ret = PaymentReturn::parse(
            "https://toko.example/payment/finish?order_id=INV-2026-0009&status_code=200&transaction_status=settlement",
        )
        .unwrap();
        assert_eq!(ret.order_id, "INV-2026-0009");
        assert_eq!(ret.outcome, PaymentOutcome::Success);

        let pending = PaymentReturn::parse(
            "https://toko.example/payment/finish?order_id=INV-1&status_code=201&transaction_status=pending",
        )
        .unwrap();
        assert_eq!(pending.outcome, PaymentOutcome::Pending);

        let expired = PaymentReturn::parse(
            "https://toko.example/payment/finish?order_id=INV-1&status_code=407&transaction_status=expire",
        )
        .unwrap();
        assert_eq!(expired.outcome, PaymentOutcome::Failed);
    }

    #[test]
    fn test_status_code_decides_without_status() {
        let ok = PaymentReturn::parse("https://toko.example/payment/finish?order_id=INV-1&status_code=200").unwrap();
        assert_eq!(ok.outcome, PaymentOutcome::Success);

        let bare = PaymentReturn::parse("https://toko.example/payment/finish?order_id=INV-1").unwrap();
        assert_eq!(bare.outcome, PaymentOutcome::Failed);
        assert!(bare.message().contains("did not go through"));
    }

    #[test]
    fn test_missing_order_id_is_error() {
        assert!(PaymentReturn::parse("https://toko.example/payment/finish?status_code=200").is_err());
        assert!(PaymentReturn::parse("not a url").is_err());
    }
}
