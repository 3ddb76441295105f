//! # Resource Module
//!
//! Per-resource fetch and mutate functions over the REST API.
//!
//! ## Resource Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Resource Pattern                                     │
//! │                                                                         │
//! │  App command                                                           │
//! │       │                                                                 │
//! │       │  storefront.products().catalog_page(&query)                    │
//! │       ▼                                                                 │
//! │  ProductsApi                                                           │
//! │  ├── reads   ──► QueryCache::fetch(key) ──► GET                        │
//! │  └── writes  ──► validate ──► POST/PUT/PATCH/DELETE ──► invalidate     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiClient (reqwest)                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Resources
//!
//! - [`ProductsApi`] - Catalog, product types, packagings, admin CRUD
//! - [`CartApi`] - Server cart lines
//! - [`TransactionsApi`] - Checkout, order history, admin status changes
//! - [`ReportsApi`] - Dashboard summary, sales series, best sellers
//! - [`UsersApi`] - Customer management
//! - [`SettingsApi`] - Company profile, PPN, logo

pub mod cart;
pub mod products;
pub mod reports;
pub mod settings;
pub mod transactions;
pub mod users;

pub use cart::CartApi;
pub use products::ProductsApi;
pub use reports::ReportsApi;
pub use settings::SettingsApi;
pub use transactions::TransactionsApi;
pub use users::UsersApi;

/// Cache keys, one constant per list resource. Detail keys are
/// `<list key>/<id>`.
pub mod keys {
    pub const PRODUCTS: &str = "products";
    pub const PRODUCT_TYPES: &str = "product-types";
    pub const PACKAGINGS: &str = "packagings";
    pub const CART: &str = "cart-items";
    pub const TRANSACTIONS: &str = "transactions";
    pub const REPORTS: &str = "reports";
    pub const USERS: &str = "users";
    pub const COMPANY_INFO: &str = "company-info";
    pub const PPN: &str = "ppn";
    pub const LOGO: &str = "config/logo";
    pub const SESSION: &str = "auth/me";

    pub fn detail(list: &str, id: &str) -> String {
        format!("{}/{}", list, id)
    }
}
