//! # Cart
//!
//! The server keeps the cart. Every change is planned locally with
//! [`Cart::plan_add`] / [`Cart::plan_quantity_change`] so limits are
//! enforced before a request goes out, then sent as one REST call.

use std::sync::Arc;

use pupuk_core::cart::{Cart, CartChange};
use pupuk_core::{CartItem, Product};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::keys;
use crate::cache::QueryCache;
use crate::error::ClientResult;
use crate::http::ApiClient;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddItemBody<'a> {
    variant_id: &'a str,
    quantity: i64,
}

#[derive(Debug, Serialize)]
struct QuantityBody {
    quantity: i64,
}

#[derive(Debug, Clone)]
pub struct CartApi {
    api: ApiClient,
    cache: Arc<QueryCache>,
}

impl CartApi {
    pub fn new(api: ApiClient, cache: Arc<QueryCache>) -> Self {
        CartApi { api, cache }
    }

    /// Current cart (`GET /cart-items`).
    pub async fn get(&self) -> ClientResult<Cart> {
        let items: Vec<CartItem> = self
            .cache
            .fetch(keys::CART, || self.api.get("/cart-items"))
            .await?;
        Ok(Cart::from_items(items))
    }

    /// Adds `quantity` of a variant, merging into an existing line.
    pub async fn add(&self, product: &Product, variant_id: &str, quantity: i64) -> ClientResult<Cart> {
        let cart = self.get().await?;
        let change = cart.plan_add(product, variant_id, quantity)?;
        self.send(&change).await?;
        info!(product_id = %product.id, variant_id, quantity, "Added to cart");
        self.reload().await
    }

    /// Sets a line to `quantity`; zero or less removes it.
    pub async fn set_quantity(&self, item_id: &str, quantity: i64) -> ClientResult<Cart> {
        let cart = self.get().await?;
        let change = cart.plan_quantity_change(item_id, quantity)?;
        self.send(&change).await?;
        self.reload().await
    }

    pub async fn remove(&self, item_id: &str) -> ClientResult<Cart> {
        self.send(&CartChange::Remove {
            item_id: item_id.to_string(),
        })
        .await?;
        self.reload().await
    }

    /// Removes every line, one request per line.
    pub async fn clear(&self) -> ClientResult<Cart> {
        let cart = self.get().await?;
        for item in &cart.items {
            self.send(&CartChange::Remove {
                item_id: item.id.clone(),
            })
            .await?;
        }
        info!(lines = cart.item_count(), "Cart cleared");
        self.reload().await
    }

    async fn send(&self, change: &CartChange) -> ClientResult<()> {
        match change {
            CartChange::Add { variant_id, quantity } => {
                let body = AddItemBody {
                    variant_id,
                    quantity: *quantity,
                };
                let _: Value = self.api.post("/cart-items", &body).await?;
            }
            CartChange::Update { item_id, quantity } => {
                let body = QuantityBody { quantity: *quantity };
                let _: Value = self.api.patch(&format!("/cart-items/{}", item_id), &body).await?;
            }
            CartChange::Remove { item_id } => {
                self.api.delete(&format!("/cart-items/{}", item_id)).await?;
            }
        }
        Ok(())
    }

    async fn reload(&self) -> ClientResult<Cart> {
        self.cache.invalidate(keys::CART).await;
        self.get().await
    }
}
