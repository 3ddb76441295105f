//! # State Module
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌──────────────────────┐  │
//! │  │    AppState      │  │   SessionStore   │  │     ShopState        │  │
//! │  │                  │  │                  │  │                      │  │
//! │  │  Storefront      │──│  session cookie  │  │  Navigator           │  │
//! │  │  (client, cache, │  │  file in the     │  │  CatalogQuery        │  │
//! │  │   session)       │  │  data dir        │  │  RequestState<...>   │  │
//! │  └──────────────────┘  └──────────────────┘  └──────────────────────┘  │
//! │                                                                         │
//! │  AppState lives for one command; ShopState only for `pupuk shop`.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod app;
mod session;
mod shop;

pub use app::AppState;
pub use session::SessionStore;
pub use shop::ShopState;
