//! # Auth Module
//!
//! Application routes and the guard that decides who may enter them.
//!
//! ## Guard Decisions
//! ```text
//! ┌──────────────────┬────────────────┬──────────────────┬──────────────────┐
//! │ Route access     │ no session     │ customer         │ admin            │
//! ├──────────────────┼────────────────┼──────────────────┼──────────────────┤
//! │ Public           │ allow          │ allow            │ allow            │
//! │ GuestOnly        │ allow          │ → catalog        │ → catalog        │
//! │ Authenticated    │ → login?redir  │ allow            │ allow            │
//! │ Admin            │ → login?redir  │ → catalog        │ allow            │
//! └──────────────────┴────────────────┴──────────────────┴──────────────────┘
//! ```
//!
//! The session user handed to [`guard`] must come from a fresh
//! `GET /auth/me`; this module only decides.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::User;

/// Who may enter a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Public,
    /// Only without a session (login, register, ...).
    GuestOnly,
    Authenticated,
    Admin,
}

/// Every screen of the storefront and back-office.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "route", content = "id", rename_all = "snake_case")]
pub enum Route {
    Catalog,
    ProductDetail(String),
    Login,
    Register,
    ForgotPassword,
    ResetPassword,
    Cart,
    Checkout,
    Orders,
    OrderDetail(String),
    Profile,
    /// Landing page the payment gateway redirects back to.
    PaymentFinish,
    AdminDashboard,
    AdminProducts,
    AdminOrders,
    AdminCustomers,
    AdminReports,
    AdminSettings,
}

impl Route {
    pub fn access(&self) -> Access {
        match self {
            Route::Catalog | Route::ProductDetail(_) => Access::Public,
            Route::Login | Route::Register | Route::ForgotPassword | Route::ResetPassword => {
                Access::GuestOnly
            }
            Route::Cart
            | Route::Checkout
            | Route::Orders
            | Route::OrderDetail(_)
            | Route::Profile
            | Route::PaymentFinish => Access::Authenticated,
            Route::AdminDashboard
            | Route::AdminProducts
            | Route::AdminOrders
            | Route::AdminCustomers
            | Route::AdminReports
            | Route::AdminSettings => Access::Admin,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Catalog => "/products".to_string(),
            Route::ProductDetail(id) => format!("/products/{}", id),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::ForgotPassword => "/forgot-password".to_string(),
            Route::ResetPassword => "/reset-password".to_string(),
            Route::Cart => "/cart".to_string(),
            Route::Checkout => "/checkout".to_string(),
            Route::Orders => "/orders".to_string(),
            Route::OrderDetail(id) => format!("/orders/{}", id),
            Route::Profile => "/profile".to_string(),
            Route::PaymentFinish => "/payment/finish".to_string(),
            Route::AdminDashboard => "/admin".to_string(),
            Route::AdminProducts => "/admin/products".to_string(),
            Route::AdminOrders => "/admin/orders".to_string(),
            Route::AdminCustomers => "/admin/customers".to_string(),
            Route::AdminReports => "/admin/reports".to_string(),
            Route::AdminSettings => "/admin/settings".to_string(),
        }
    }

    /// Resolves a path (query string ignored). `/` is the catalog.
    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let route = match segments.as_slice() {
            [] | ["products"] => Route::Catalog,
            ["products", id] => Route::ProductDetail(id.to_string()),
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["forgot-password"] => Route::ForgotPassword,
            ["reset-password"] => Route::ResetPassword,
            ["cart"] => Route::Cart,
            ["checkout"] => Route::Checkout,
            ["orders"] => Route::Orders,
            ["orders", id] => Route::OrderDetail(id.to_string()),
            ["profile"] => Route::Profile,
            ["payment", "finish"] => Route::PaymentFinish,
            ["admin"] => Route::AdminDashboard,
            ["admin", "products"] => Route::AdminProducts,
            ["admin", "orders"] => Route::AdminOrders,
            ["admin", "customers"] => Route::AdminCustomers,
            ["admin", "reports"] => Route::AdminReports,
            ["admin", "settings"] => Route::AdminSettings,
            _ => return None,
        };
        Some(route)
    }

    /// Login path that brings the user back here afterwards.
    pub fn login_redirect(&self) -> String {
        format!("{}?redirect={}", Route::Login.path(), self.path())
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Outcome of entering a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    Allow,
    /// Send to login; come back to `return_to` afterwards.
    RedirectToLogin { return_to: String },
    Redirect { to: Route },
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

/// Decides whether `user` may enter `route`.
///
/// ## Example
/// ```rust
/// use pupuk_core::auth::{guard, GuardDecision, Route};
///
/// assert_eq!(
///     guard(&Route::Checkout, None),
///     GuardDecision::RedirectToLogin { return_to: "/checkout".into() }
/// );
/// ```
pub fn guard(route: &Route, user: Option<&User>) -> GuardDecision {
    match (route.access(), user) {
        (Access::Public, _) => GuardDecision::Allow,
        (Access::GuestOnly, None) => GuardDecision::Allow,
        (Access::GuestOnly, Some(_)) => GuardDecision::Redirect { to: Route::Catalog },
        (Access::Authenticated | Access::Admin, None) => GuardDecision::RedirectToLogin {
            return_to: route.path(),
        },
        (Access::Authenticated, Some(_)) => GuardDecision::Allow,
        (Access::Admin, Some(user)) if user.is_admin() => GuardDecision::Allow,
        (Access::Admin, Some(_)) => GuardDecision::Redirect { to: Route::Catalog },
    }
}

/// Where to go after a successful login.
///
/// Only known in-app paths are honoured; anything else (including
/// `//evil.example` style off-site redirects) falls back to the catalog,
/// or the dashboard for admins.
pub fn post_login_route(requested: Option<&str>, user: &User) -> Route {
    let fallback = if user.is_admin() {
        Route::AdminDashboard
    } else {
        Route::Catalog
    };

    let Some(path) = requested.filter(|p| p.starts_with('/') && !p.starts_with("//")) else {
        return fallback;
    };

    match Route::from_path(path) {
        Some(route) if guard(&route, Some(user)).is_allowed() => route,
        _ => fallback,
    }
}
