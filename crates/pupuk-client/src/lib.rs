//! # pupuk-client: Network Layer for the Pupuk Storefront
//!
//! REST resources, the query cache, the session and order notifications,
//! behind one [`Storefront`] handle.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Storefront Client                               │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Storefront (facade)                          │  │
//! │  │   products() cart() transactions() reports() users() settings()  │  │
//! │  │   session()  notifier()                                          │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  QueryCache    │  │   ApiClient    │  │   OrderNotifier        │    │
//! │  │                │  │                │  │                        │    │
//! │  │ stale time,    │  │ reqwest +      │  │ websocket with         │    │
//! │  │ de-duplication,│  │ cookie jar,    │  │ auto-reconnect,        │    │
//! │  │ prefix         │  │ {data} envelope│  │ invalidates order      │    │
//! │  │ invalidation   │  │                │  │ queries                │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Client configuration (base URL, cache, notifications, shipping)
//! - [`error`] - Client error types
//! - [`http`] - REST client
//! - [`cache`] - Query cache
//! - [`resources`] - Per-resource fetch and mutate functions
//! - [`session`] - Login, registration, route guard
//! - [`notifications`] - Order event websocket
//! - [`payment`] - Payment gateway handoff
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pupuk_client::{ClientConfig, Storefront};
//! use pupuk_core::catalog::CatalogQuery;
//!
//! let storefront = Storefront::new(ClientConfig::load(None)?)?;
//!
//! let page = storefront.products().catalog_page(&CatalogQuery::default()).await?;
//! for product in &page.items {
//!     println!("{} {}", product.name, product.price_label());
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod notifications;
pub mod payment;
pub mod resources;
pub mod session;

#[cfg(test)]
pub(crate) mod test_server;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::QueryCache;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::ApiClient;
pub use notifications::{ConnectionState, NotifierConfig, NotifierHandle, OrderEvent, OrderNotifier};
pub use payment::{PaymentHandoff, PaymentOutcome, PaymentReturn};
pub use resources::{CartApi, ProductsApi, ReportsApi, SettingsApi, TransactionsApi, UsersApi};
pub use session::Session;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

// =============================================================================
// Storefront
// =============================================================================

/// Everything the storefront and back-office talk to, sharing one HTTP
/// client, cookie jar and cache.
///
/// Cloning is cheap; clones share state.
#[derive(Debug, Clone)]
pub struct Storefront {
    config: Arc<ClientConfig>,
    api: ApiClient,
    cache: Arc<QueryCache>,
    session: Arc<Session>,
}

impl Storefront {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let api = ApiClient::new(&config)?;
        let cache = Arc::new(QueryCache::new(config.stale_time()));
        let session = Arc::new(Session::new(api.clone(), cache.clone()));

        info!(
            base_url = %api.base_url(),
            stale_secs = config.cache.stale_secs,
            "Storefront client ready"
        );

        Ok(Storefront {
            config: Arc::new(config),
            api,
            cache,
            session,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn products(&self) -> ProductsApi {
        ProductsApi::new(self.api.clone(), self.cache.clone())
    }

    pub fn cart(&self) -> CartApi {
        CartApi::new(self.api.clone(), self.cache.clone())
    }

    pub fn transactions(&self) -> TransactionsApi {
        TransactionsApi::new(self.api.clone(), self.cache.clone())
    }

    pub fn reports(&self) -> ReportsApi {
        ReportsApi::new(self.api.clone(), self.cache.clone())
    }

    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.api.clone(), self.cache.clone())
    }

    pub fn settings(&self) -> SettingsApi {
        SettingsApi::new(self.api.clone(), self.cache.clone())
    }

    /// Starts listening for order events.
    ///
    /// ## Errors
    /// [`ClientError::InvalidConfig`] when notifications are disabled.
    pub fn notifier(&self) -> ClientResult<(NotifierHandle, mpsc::Receiver<OrderEvent>)> {
        if !self.config.notifications.enabled {
            return Err(ClientError::InvalidConfig(
                "order notifications are disabled".into(),
            ));
        }
        let config = NotifierConfig::from_client_config(&self.config)?;
        Ok(OrderNotifier::spawn(config, self.api.clone(), self.cache.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    #[tokio::test]
    async fn test_resources_share_one_cache() {
        let router = Router::new().route(
            "/api/company-info",
            get(|| async { Json(json!({ "name": "CV Pupuk Subur", "phone": "0267-123456" })) }),
        );
        let base = test_server::spawn(router).await;
        let storefront = Storefront::new(ClientConfig::with_base_url(base)).unwrap();

        let info = storefront.settings().company_info().await.unwrap();
        assert_eq!(info.name, "CV Pupuk Subur");

        // a second handle sees the entry the first one stored
        assert!(storefront.clone().cache().is_fresh("company-info").await);
    }

    #[test]
    fn test_notifier_respects_disabled_setting() {
        let mut config = ClientConfig::default();
        config.notifications.enabled = false;
        let storefront = Storefront::new(config).unwrap();
        assert!(matches!(storefront.notifier(), Err(ClientError::InvalidConfig(_))));
    }
}
