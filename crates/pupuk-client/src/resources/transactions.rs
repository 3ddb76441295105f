//! # Transactions
//!
//! Checkout, the customer's order history and admin order management.

use std::sync::Arc;

use pupuk_core::cart::Cart;
use pupuk_core::checkout::{build_order_payload, CheckoutForm, ShippingRates};
use pupuk_core::{CoreError, PpnConfig, Transaction, TransactionStatus};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::keys;
use crate::cache::QueryCache;
use crate::error::ClientResult;
use crate::http::ApiClient;

/// Client-side filter of the admin order table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFilter {
    pub status: Option<TransactionStatus>,
    /// Matched against invoice number and customer name, case-insensitive.
    pub search: String,
}

impl OrderFilter {
    pub fn matches(&self, transaction: &Transaction) -> bool {
        if let Some(status) = self.status {
            if transaction.status != status {
                return false;
            }
        }

        let term = self.search.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        transaction.invoice_number.to_lowercase().contains(&term)
            || transaction
                .customer_name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&term))
    }
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: TransactionStatus,
}

#[derive(Debug, Clone)]
pub struct TransactionsApi {
    api: ApiClient,
    cache: Arc<QueryCache>,
}

impl TransactionsApi {
    pub fn new(api: ApiClient, cache: Arc<QueryCache>) -> Self {
        TransactionsApi { api, cache }
    }

    /// The signed-in customer's orders, newest first as the backend sends them.
    pub async fn list_mine(&self) -> ClientResult<Vec<Transaction>> {
        self.cache
            .fetch(keys::TRANSACTIONS, || self.api.get("/transactions"))
            .await
    }

    pub async fn get(&self, id: &str) -> ClientResult<Transaction> {
        let path = format!("/transactions/{}", id);
        self.cache
            .fetch(&keys::detail(keys::TRANSACTIONS, id), || self.api.get(&path))
            .await
    }

    pub async fn refetch(&self, id: &str) -> ClientResult<Transaction> {
        let path = format!("/transactions/{}", id);
        self.cache
            .refetch(&keys::detail(keys::TRANSACTIONS, id), || self.api.get(&path))
            .await
    }

    /// Places the order for `cart`.
    ///
    /// The returned transaction carries the payment handoff data. The
    /// backend empties the cart and reserves stock, so cart, product and
    /// report caches are dropped along with the order lists.
    pub async fn checkout(
        &self,
        cart: &Cart,
        form: &CheckoutForm,
        rates: &ShippingRates,
        ppn: &PpnConfig,
    ) -> ClientResult<Transaction> {
        let payload = build_order_payload(cart, form, rates, ppn)?;
        let transaction: Transaction = self.api.post("/transactions", &payload).await?;

        for prefix in [keys::TRANSACTIONS, keys::CART, keys::PRODUCTS, keys::REPORTS] {
            self.cache.invalidate(prefix).await;
        }

        info!(
            transaction_id = %transaction.id,
            invoice = %transaction.invoice_number,
            total = %transaction.total,
            shipping = %transaction.shipping_method,
            "Order placed"
        );
        Ok(transaction)
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Every customer's orders (`GET /transactions/all`).
    pub async fn list_all(&self) -> ClientResult<Vec<Transaction>> {
        let key = keys::detail(keys::TRANSACTIONS, "all");
        self.cache
            .fetch(&key, || self.api.get("/transactions/all"))
            .await
    }

    pub async fn list_all_filtered(&self, filter: &OrderFilter) -> ClientResult<Vec<Transaction>> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|t| filter.matches(t))
            .collect())
    }

    /// Moves an order to `next`, rejecting moves the lifecycle forbids
    /// before anything is sent.
    pub async fn update_status(&self, id: &str, next: TransactionStatus) -> ClientResult<Transaction> {
        let current = self.refetch(id).await?;
        if !current.status.can_transition_to(next) {
            return Err(CoreError::InvalidStatusTransition {
                from: current.status.to_string(),
                to: next.to_string(),
            }
            .into());
        }

        let updated: Transaction = self
            .api
            .patch(&format!("/transactions/{}/status", id), &StatusBody { status: next })
            .await?;

        self.cache.invalidate(keys::TRANSACTIONS).await;
        self.cache.invalidate(keys::REPORTS).await;
        info!(
            transaction_id = %id,
            from = %current.status,
            to = %next,
            "Order status changed"
        );
        Ok(updated)
    }
}
