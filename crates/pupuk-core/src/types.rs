//! # Domain Types
//!
//! Records mirrored from the storefront backend.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  Transaction    │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name, npk      │   │  invoice_number │   │  email          │       │
//! │  │  product_type ──┼─┐ │  status         │   │  role           │       │
//! │  │  variants[] ────┼┐│ │  items[]        │   └─────────────────┘       │
//! │  └─────────────────┘││ │  total          │                              │
//! │                     ││ └─────────────────┘   ┌─────────────────┐       │
//! │  ┌─────────────────┐││                       │  CompanyInfo    │       │
//! │  │    Variant      │◄┘│ ┌─────────────────┐   │  PpnConfig      │       │
//! │  │  packaging ─────┼──┼►│   Packaging     │   └─────────────────┘       │
//! │  │  price, stock   │  │ └─────────────────┘                              │
//! │  └─────────────────┘  └►  ProductType                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All records serialize in camelCase to match the REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::{Money, PpnRate};

// =============================================================================
// User
// =============================================================================

/// Account role. Admins reach the back-office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    #[default]
    Customer,
}

/// A storefront account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// Catalog Records
// =============================================================================

/// Fertilizer category, e.g. "NPK", "Urea", "Organik".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductType {
    pub id: String,
    pub name: String,
}

/// How a variant is packed, e.g. "Karung 50 kg".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Packaging {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub weight_kg: Option<f64>,
}

/// A purchasable packaging of a product, with its own price and stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Variant {
    pub id: String,
    pub product_id: String,
    pub packaging: Packaging,
    pub price: Money,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub sku: Option<String>,
}

impl Variant {
    #[inline]
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// NPK formula code, e.g. "16-16-16".
    #[serde(default)]
    pub npk_formula: Option<String>,
    pub product_type: ProductType,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Product {
    pub fn variant(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }

    /// Cheapest variant price, `None` when the product has no variants.
    pub fn min_price(&self) -> Option<Money> {
        self.variants.iter().map(|v| v.price).min()
    }

    pub fn max_price(&self) -> Option<Money> {
        self.variants.iter().map(|v| v.price).max()
    }

    /// Total units across variants.
    pub fn total_stock(&self) -> i64 {
        self.variants.iter().map(|v| v.stock.max(0)).sum()
    }

    /// Price label for catalog cards: "Rp 85.000" or "Rp 85.000 - Rp 310.000".
    pub fn price_label(&self) -> String {
        match (self.min_price(), self.max_price()) {
            (Some(min), Some(max)) if min == max => min.to_string(),
            (Some(min), Some(max)) => format!("{} - {}", min, max),
            _ => "-".to_string(),
        }
    }
}

// =============================================================================
// Cart Records
// =============================================================================

/// A cart line as the backend returns it from `/cart-items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartItem {
    pub id: String,
    pub variant_id: String,
    pub product_id: String,
    pub product_name: String,
    pub packaging_name: String,
    pub price: Money,
    pub quantity: i64,
}

impl CartItem {
    /// Unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Shipping Method
// =============================================================================

/// Delivery option chosen at checkout. Each carries a flat cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ShippingMethod {
    /// Customer collects at the warehouse.
    Pickup,
    #[default]
    Regular,
    Express,
    /// Truck freight for bulk orders.
    Cargo,
}

impl ShippingMethod {
    pub const ALL: [ShippingMethod; 4] = [
        ShippingMethod::Pickup,
        ShippingMethod::Regular,
        ShippingMethod::Express,
        ShippingMethod::Cargo,
    ];

    /// Whether the order needs a delivery address.
    pub fn requires_address(&self) -> bool {
        !matches!(self, ShippingMethod::Pickup)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingMethod::Pickup => "pickup",
            ShippingMethod::Regular => "regular",
            ShippingMethod::Express => "express",
            ShippingMethod::Cargo => "cargo",
        }
    }
}

impl fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShippingMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pickup" | "ambil" => Ok(ShippingMethod::Pickup),
            "regular" | "reguler" => Ok(ShippingMethod::Regular),
            "express" => Ok(ShippingMethod::Express),
            "cargo" | "kargo" => Ok(ShippingMethod::Cargo),
            other => Err(CoreError::Validation(crate::ValidationError::InvalidFormat {
                field: "shipping_method".to_string(),
                reason: format!(
                    "unknown method '{}', expected pickup, regular, express or cargo",
                    other
                ),
            })),
        }
    }
}

// =============================================================================
// Transaction Status
// =============================================================================

/// Lifecycle of an order.
///
/// ```text
///   pending ──► paid ──► processing ──► shipped ──► completed
///      │          │
///      ├──► expired
///      └──► cancelled ◄──┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum TransactionStatus {
    #[default]
    Pending,
    Paid,
    Processing,
    Shipped,
    Completed,
    Cancelled,
    Expired,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 7] = [
        TransactionStatus::Pending,
        TransactionStatus::Paid,
        TransactionStatus::Processing,
        TransactionStatus::Shipped,
        TransactionStatus::Completed,
        TransactionStatus::Cancelled,
        TransactionStatus::Expired,
    ];

    /// Statuses an admin may move an order to from here.
    pub fn next_statuses(&self) -> &'static [TransactionStatus] {
        use TransactionStatus::*;
        match self {
            Pending => &[Paid, Cancelled, Expired],
            Paid => &[Processing, Cancelled],
            Processing => &[Shipped],
            Shipped => &[Completed],
            Completed | Cancelled | Expired => &[],
        }
    }

    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        self.next_statuses().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.next_statuses().is_empty()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Paid => "paid",
            TransactionStatus::Processing => "processing",
            TransactionStatus::Shipped => "shipped",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
            TransactionStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        TransactionStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == needle)
            .ok_or_else(|| {
                CoreError::Validation(crate::ValidationError::InvalidFormat {
                    field: "status".to_string(),
                    reason: format!("unknown status '{}'", s),
                })
            })
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// Payment-gateway handoff data attached to a new transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentInfo {
    /// Token for the gateway's embedded (iframe/popup) checkout.
    #[serde(default)]
    pub token: Option<String>,
    /// Hosted payment page URL.
    #[serde(default)]
    pub redirect_url: Option<String>,
}

/// Delivery address captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ShippingAddress {
    pub recipient_name: String,
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
}

/// A line of a placed order. Names and price are frozen at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TransactionItem {
    pub id: String,
    pub variant_id: String,
    pub product_name: String,
    pub packaging_name: String,
    pub price: Money,
    pub quantity: i64,
    pub line_total: Money,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    pub invoice_number: String,
    pub user_id: String,
    /// Filled in on admin listings.
    #[serde(default)]
    pub customer_name: Option<String>,
    pub status: TransactionStatus,
    #[serde(default)]
    pub items: Vec<TransactionItem>,
    pub subtotal: Money,
    #[serde(default)]
    pub ppn_amount: Money,
    pub shipping_method: ShippingMethod,
    #[serde(default)]
    pub shipping_cost: Money,
    pub total: Money,
    #[serde(default)]
    pub shipping_address: ShippingAddress,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub payment: Option<PaymentInfo>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Whether the customer still has to pay through the gateway.
    pub fn awaiting_payment(&self) -> bool {
        self.status == TransactionStatus::Pending
    }
}

// =============================================================================
// Settings Records
// =============================================================================

/// Company profile shown on invoices and the storefront footer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CompanyInfo {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    /// Tax registration number.
    #[serde(default)]
    pub npwp: Option<String>,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub bank_account: Option<String>,
}

/// PPN configuration managed in the admin settings screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PpnConfig {
    pub rate_bps: u32,
    pub is_active: bool,
}

impl PpnConfig {
    /// Rate to charge, zero when PPN is switched off.
    pub fn effective_rate(&self) -> PpnRate {
        if self.is_active {
            PpnRate::from_bps(self.rate_bps)
        } else {
            PpnRate::zero()
        }
    }
}

impl Default for PpnConfig {
    /// 11%, the general PPN rate.
    fn default() -> Self {
        PpnConfig {
            rate_bps: 1100,
            is_active: true,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
