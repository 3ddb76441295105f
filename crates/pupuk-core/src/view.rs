//! # View Module
//!
//! Shopping page flow and per-request loading state.
//!
//! ## Page Flow
//! ```text
//!   ┌─────────┐  open   ┌─────────┐  add    ┌─────────┐  pay    ┌──────────┐
//!   │ Catalog │ ──────► │ Detail  │ ──────► │  Cart   │ ──────► │ Checkout │
//!   └─────────┘ ◄────── └─────────┘         └─────────┘ ◄────── └──────────┘
//!        ▲       back                           │  │     back
//!        └──────────────────────────────────────┘  │
//!        ▲            continue shopping            │
//!        └─────────────────────────────────────────┘ (order placed: reset)
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};

/// A page of the shopping flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum PageView {
    Catalog,
    Detail { product_id: String },
    Cart,
    Checkout,
}

impl fmt::Display for PageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageView::Catalog => f.write_str("catalog"),
            PageView::Detail { product_id } => write!(f, "detail({})", product_id),
            PageView::Cart => f.write_str("cart"),
            PageView::Checkout => f.write_str("checkout"),
        }
    }
}

impl PageView {
    /// Forward moves the flow allows. Back moves go through [`Navigator::back`].
    pub fn can_go_to(&self, next: &PageView) -> bool {
        use PageView::*;
        matches!(
            (self, next),
            (Catalog, Detail { .. })
                | (Catalog, Cart)
                | (Detail { .. }, Detail { .. })
                | (Detail { .. }, Cart)
                | (Detail { .. }, Catalog)
                | (Cart, Catalog)
                | (Cart, Detail { .. })
                | (Cart, Checkout)
        )
    }
}

/// Current page plus the way back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigator {
    current: PageView,
    history: Vec<PageView>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            current: PageView::Catalog,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> &PageView {
        &self.current
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }

    /// Moves forward to `next`.
    ///
    /// ## Errors
    /// [`CoreError::InvalidNavigation`] when the flow has no such edge, or
    /// when entering checkout with an empty cart.
    pub fn go_to(&mut self, next: PageView, cart: &Cart) -> CoreResult<()> {
        let blocked = !self.current.can_go_to(&next)
            || (next == PageView::Checkout && cart.is_empty());
        if blocked {
            return Err(CoreError::InvalidNavigation {
                from: self.current.to_string(),
                to: next.to_string(),
            });
        }

        let previous = std::mem::replace(&mut self.current, next);
        self.history.push(previous);
        Ok(())
    }

    /// Returns to the previous page; stays on the catalog when there is none.
    pub fn back(&mut self) -> &PageView {
        if let Some(previous) = self.history.pop() {
            self.current = previous;
        }
        &self.current
    }

    /// Back to an empty catalog view, e.g. after an order is placed.
    pub fn reset(&mut self) {
        self.current = PageView::Catalog;
        self.history.clear();
    }
}

// =============================================================================
// Request State
// =============================================================================

/// Loading state of one request, as a screen sees it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum RequestState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    /// Message ready for display.
    Failed(String),
}

impl<T> RequestState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            RequestState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RequestState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> RequestState<U> {
        match self {
            RequestState::Idle => RequestState::Idle,
            RequestState::Loading => RequestState::Loading,
            RequestState::Loaded(value) => RequestState::Loaded(f(value)),
            RequestState::Failed(message) => RequestState::Failed(message),
        }
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for RequestState<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => RequestState::Loaded(value),
            Err(e) => RequestState::Failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::cart_item;

    fn detail(id: &str) -> PageView {
        PageView::Detail {
            product_id: id.to_string(),
        }
    }

    #[test]
    fn test_full_shopping_flow() {
        let cart = Cart::from_items(vec![cart_item("c1", "v1", 1_000, 1)]);
        let mut nav = Navigator::new();

        nav.go_to(detail("p1"), &cart).unwrap();
        nav.go_to(PageView::Cart, &cart).unwrap();
        nav.go_to(PageView::Checkout, &cart).unwrap();
        assert_eq!(nav.current(), &PageView::Checkout);

        assert_eq!(nav.back(), &PageView::Cart);
        assert_eq!(nav.back(), &detail("p1"));
        assert_eq!(nav.back(), &PageView::Catalog);
        assert!(!nav.can_go_back());
        assert_eq!(nav.back(), &PageView::Catalog);
    }

    #[test]
    fn test_checkout_needs_items() {
        let mut nav = Navigator::new();
        nav.go_to(PageView::Cart, &Cart::new()).unwrap();

        let err = nav.go_to(PageView::Checkout, &Cart::new()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidNavigation { .. }));
        assert_eq!(nav.current(), &PageView::Cart);
    }

    #[test]
    fn test_cannot_skip_cart() {
        let cart = Cart::from_items(vec![cart_item("c1", "v1", 1_000, 1)]);
        let mut nav = Navigator::new();
        assert!(nav.go_to(PageView::Checkout, &cart).is_err());

        nav.go_to(detail("p1"), &cart).unwrap();
        assert!(nav.go_to(PageView::Checkout, &cart).is_err());
    }

    #[test]
    fn test_reset_after_order() {
        let cart = Cart::from_items(vec![cart_item("c1", "v1", 1_000, 1)]);
        let mut nav = Navigator::new();
        nav.go_to(PageView::Cart, &cart).unwrap();
        nav.go_to(PageView::Checkout, &cart).unwrap();

        nav.reset();
        assert_eq!(nav.current(), &PageView::Catalog);
        assert!(!nav.can_go_back());
    }

    #[test]
    fn test_request_state() {
        let idle: RequestState<u32> = RequestState::default();
        assert_eq!(idle, RequestState::Idle);
        assert!(RequestState::<u32>::Loading.is_loading());

        let loaded: RequestState<u32> = Ok::<u32, String>(7).into();
        assert_eq!(loaded.data(), Some(&7));
        assert_eq!(loaded.map(|n| n * 2).data(), Some(&14));

        let failed: RequestState<u32> = Err::<u32, _>(CoreError::EmptyCart).into();
        assert_eq!(failed.error(), Some("Cart is empty"));
        assert!(failed.data().is_none());
    }
}
