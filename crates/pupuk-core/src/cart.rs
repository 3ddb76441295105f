//! # Cart Module
//!
//! Client-side mirror of the server cart (`/cart-items`).
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Shopper Action          Planned Change           REST call             │
//! │  ──────────────          ──────────────           ─────────             │
//! │                                                                         │
//! │  Add to cart ───────────► Add / Update ─────────► POST or PATCH         │
//! │                                                                         │
//! │  Change quantity (> 0) ─► Update ───────────────► PATCH /cart-items/id  │
//! │                                                                         │
//! │  Change quantity (≤ 0) ─► Remove ───────────────► DELETE /cart-items/id │
//! │                                                                         │
//! │  NOTE: the server owns the cart. Changes are planned here, sent, and    │
//! │        the server's answer replaces the local copy.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CartItem, Product};
use crate::validation::{validate_cart_size, validate_quantity};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// A change to send to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartChange {
    /// New line for a variant not yet in the cart.
    Add { variant_id: String, quantity: i64 },
    /// Set an existing line to an absolute quantity.
    Update { item_id: String, quantity: i64 },
    Remove { item_id: String },
}

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `variant_id` (adding the same variant merges)
/// - Quantity is always > 0 (setting ≤ 0 removes the line)
/// - At most [`MAX_CART_ITEMS`] lines, [`MAX_ITEM_QUANTITY`] per line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart from server lines, merging duplicate variants and
    /// dropping non-positive quantities.
    pub fn from_items(items: Vec<CartItem>) -> Self {
        let mut cart = Cart::new();
        for item in items.into_iter().filter(|i| i.quantity > 0) {
            if let Some(existing) = cart.items.iter_mut().find(|i| i.variant_id == item.variant_id) {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            } else {
                cart.items.push(item);
            }
        }
        cart
    }

    pub fn item(&self, item_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn item_for_variant(&self, variant_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.variant_id == variant_id)
    }

    /// Plans adding `quantity` of a product variant.
    ///
    /// ## Behavior
    /// - Variant already in cart: `Update` to the merged quantity
    /// - Otherwise: `Add`, if the cart has room
    ///
    /// ## Errors
    /// - unknown variant, quantity ≤ 0
    /// - merged quantity above [`MAX_ITEM_QUANTITY`] or above stock
    /// - cart already holds [`MAX_CART_ITEMS`] lines
    pub fn plan_add(&self, product: &Product, variant_id: &str, quantity: i64) -> CoreResult<CartChange> {
        let variant = product
            .variant(variant_id)
            .ok_or_else(|| CoreError::VariantNotFound(variant_id.to_string()))?;

        let existing = self.item_for_variant(variant_id);
        let merged = merge_quantity(existing.map_or(0, |i| i.quantity), quantity)?;

        if merged > variant.stock {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: variant.stock.max(0),
                requested: merged,
            });
        }

        match existing {
            Some(item) => Ok(CartChange::Update {
                item_id: item.id.clone(),
                quantity: merged,
            }),
            None => {
                self.ensure_room()?;
                Ok(CartChange::Add {
                    variant_id: variant_id.to_string(),
                    quantity,
                })
            }
        }
    }

    /// Plans setting a line to `quantity`. Zero or negative removes it.
    pub fn plan_quantity_change(&self, item_id: &str, quantity: i64) -> CoreResult<CartChange> {
        if self.item(item_id).is_none() {
            return Err(CoreError::CartItemNotFound(item_id.to_string()));
        }

        if quantity <= 0 {
            return Ok(CartChange::Remove {
                item_id: item_id.to_string(),
            });
        }

        validate_quantity(quantity)?;

        Ok(CartChange::Update {
            item_id: item_id.to_string(),
            quantity,
        })
    }

    /// Adds a line, merging it into an existing line of the same variant.
    pub fn add_item(&mut self, item: CartItem) -> CoreResult<()> {
        if let Some(existing) = self.items.iter_mut().find(|i| i.variant_id == item.variant_id) {
            existing.quantity = merge_quantity(existing.quantity, item.quantity)?;
            return Ok(());
        }

        validate_quantity(item.quantity)?;
        self.ensure_room()?;
        self.items.push(item);
        Ok(())
    }

    /// Applies a planned `Update` or `Remove` locally.
    ///
    /// An `Add` only applies when the variant is already present; a new
    /// line needs the server-assigned id and goes through [`Cart::add_item`].
    pub fn apply(&mut self, change: &CartChange) -> CoreResult<()> {
        match change {
            CartChange::Add { variant_id, quantity } => {
                let line = self
                    .items
                    .iter_mut()
                    .find(|i| &i.variant_id == variant_id)
                    .ok_or_else(|| CoreError::VariantNotFound(variant_id.clone()))?;
                line.quantity = merge_quantity(line.quantity, *quantity)?;
                Ok(())
            }
            CartChange::Update { item_id, quantity } => {
                let change = self.plan_quantity_change(item_id, *quantity)?;
                if let CartChange::Remove { item_id } = change {
                    return self.remove_item(&item_id);
                }
                if let Some(line) = self.items.iter_mut().find(|i| &i.id == item_id) {
                    line.quantity = *quantity;
                }
                Ok(())
            }
            CartChange::Remove { item_id } => self.remove_item(item_id),
        }
    }

    fn ensure_room(&self) -> CoreResult<()> {
        validate_cart_size(self.items.len()).map_err(|_| CoreError::CartTooLarge { max: MAX_CART_ITEMS })
    }

    pub fn remove_item(&mut self, item_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.id != item_id);

        if self.items.len() == initial_len {
            Err(CoreError::CartItemNotFound(item_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Number of lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of all line quantities (the badge on the cart icon).
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Σ price × quantity.
    pub fn total(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cart summary for the cart page and header badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub total: Money,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            total: cart.total(),
        }
    }
}

/// Quantity of a line after adding `added` to `current`.
///
/// `added` must itself be a valid quantity; the sum may not pass
/// [`MAX_ITEM_QUANTITY`].
fn merge_quantity(current: i64, added: i64) -> CoreResult<i64> {
    validate_quantity(added)?;
    match current.checked_add(added) {
        Some(merged) if merged <= MAX_ITEM_QUANTITY => Ok(merged),
        _ => Err(CoreError::QuantityTooLarge {
            requested: current.saturating_add(added),
            max: MAX_ITEM_QUANTITY,
        }),
    }
}
