//! # pupuk-core: Pure Business Logic for the Pupuk Storefront
//!
//! Everything the storefront and back-office decide without talking to the
//! network lives here: catalog filtering, cart math, checkout totals, form
//! validation and route guarding.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Pupuk Storefront Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/storefront (`pupuk` CLI)                   │   │
//! │  │    catalog ──► detail ──► cart ──► checkout ──► orders          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        pupuk-client (REST, query cache, session, websocket)     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pupuk-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   types · money · catalog · cart · checkout · validation        │   │
//! │  │   auth · view · report                                          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records mirrored from the backend (Product, Transaction, ...)
//! - [`money`] - Whole-rupiah money type and PPN rate
//! - [`catalog`] - Search, advanced filter and pagination
//! - [`cart`] - Cart lines, quantity changes, totals
//! - [`checkout`] - Shipping, PPN, order payload
//! - [`validation`] - Field and form validation
//! - [`auth`] - Routes and the access guard
//! - [`view`] - Page-view navigation and request state
//! - [`report`] - Report queries and chart series
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use pupuk_core::money::{Money, PpnRate};
//!
//! let subtotal = Money::from_rupiah(1_250_000);
//! let ppn = subtotal.calculate_ppn(PpnRate::from_bps(1100)); // 11%
//!
//! assert_eq!(ppn.rupiah(), 137_500);
//! assert_eq!(subtotal.to_string(), "Rp 1.250.000");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod money;
pub mod report;
pub mod types;
pub mod validation;
pub mod view;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, FormErrors, ValidationError};
pub use money::{Money, PpnRate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single cart line.
///
/// Fertilizer is ordered by the sack, so this is far above the retail
/// ceiling; it mostly catches typos like an extra zero.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Default catalog page size.
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// Text shown when an error carries no usable message.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

#[cfg(test)]
pub(crate) mod test_support;
