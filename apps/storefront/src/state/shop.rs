//! State of an interactive shopping session.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ShopState                                     │
//! │                                                                         │
//! │  navigator ── Catalog ⇄ Detail ⇄ Cart ⇄ Checkout                       │
//! │  query ────── search, advanced filter, page                             │
//! │  catalog ──── RequestState<Page<Product>>                               │
//! │  product ──── RequestState<Product>   (detail page)                     │
//! │  cart ─────── RequestState<Cart>                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use pupuk_client::ClientResult;
use pupuk_core::cart::Cart;
use pupuk_core::catalog::{AdvancedFilter, CatalogQuery, Page};
use pupuk_core::view::{Navigator, PageView, RequestState};
use pupuk_core::{CoreResult, Product};

use crate::error::ApiError;

#[derive(Debug, Clone)]
pub struct ShopState {
    navigator: Navigator,
    query: CatalogQuery,
    catalog: RequestState<Page<Product>>,
    product: RequestState<Product>,
    cart: RequestState<Cart>,
}

/// Result of a request as the screen shows it: data, or the error line.
fn settle<T>(result: ClientResult<T>) -> RequestState<T> {
    match result {
        Ok(value) => RequestState::Loaded(value),
        Err(e) => RequestState::Failed(ApiError::from(e).message),
    }
}

impl ShopState {
    pub fn new(page_size: usize) -> Self {
        ShopState {
            navigator: Navigator::new(),
            query: CatalogQuery {
                page_size,
                ..CatalogQuery::default()
            },
            catalog: RequestState::Idle,
            product: RequestState::Idle,
            cart: RequestState::Idle,
        }
    }

    pub fn page(&self) -> &PageView {
        self.navigator.current()
    }

    pub fn query(&self) -> &CatalogQuery {
        &self.query
    }

    pub fn catalog(&self) -> &RequestState<Page<Product>> {
        &self.catalog
    }

    pub fn product(&self) -> &RequestState<Product> {
        &self.product
    }

    pub fn cart_state(&self) -> &RequestState<Cart> {
        &self.cart
    }

    /// Last loaded cart; empty until one has loaded.
    pub fn cart(&self) -> Cart {
        self.cart.data().cloned().unwrap_or_default()
    }

    // =========================================================================
    // Catalog Query
    // =========================================================================

    /// New search term. Starts again from page 1.
    pub fn set_search(&mut self, term: &str) {
        self.query.search = term.trim().to_string();
        self.query.page = 1;
    }

    pub fn set_filter(&mut self, filter: AdvancedFilter) {
        self.query.filter = filter;
        self.query.page = 1;
    }

    pub fn filter_mut(&mut self) -> &mut AdvancedFilter {
        self.query.page = 1;
        &mut self.query.filter
    }

    /// Moves to the next page if the loaded one has a successor.
    pub fn next_page(&mut self) -> bool {
        let has_next = self.catalog.data().is_some_and(|p| p.has_next());
        if has_next {
            self.query.page += 1;
        }
        has_next
    }

    pub fn previous_page(&mut self) -> bool {
        let has_previous = self.catalog.data().is_some_and(|p| p.has_previous());
        if has_previous {
            self.query.page -= 1;
        }
        has_previous
    }

    /// Product by its 1-based position on the loaded page.
    pub fn product_at(&self, position: usize) -> Option<&Product> {
        let page = self.catalog.data()?;
        position.checked_sub(1).and_then(|i| page.items.get(i))
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn open_product(&mut self, product_id: &str) -> CoreResult<()> {
        let cart = self.cart();
        self.navigator.go_to(
            PageView::Detail {
                product_id: product_id.to_string(),
            },
            &cart,
        )?;
        self.product = RequestState::Loading;
        Ok(())
    }

    pub fn open_cart(&mut self) -> CoreResult<()> {
        let cart = self.cart();
        self.navigator.go_to(PageView::Cart, &cart)
    }

    pub fn open_checkout(&mut self) -> CoreResult<()> {
        let cart = self.cart();
        self.navigator.go_to(PageView::Checkout, &cart)
    }

    pub fn open_catalog(&mut self) -> CoreResult<()> {
        let cart = self.cart();
        self.navigator.go_to(PageView::Catalog, &cart)
    }

    pub fn back(&mut self) -> &PageView {
        self.navigator.back()
    }

    /// Order went through: the cart is gone and the flow starts over.
    pub fn order_placed(&mut self) {
        self.navigator.reset();
        self.cart = RequestState::Loaded(Cart::new());
        self.product = RequestState::Idle;
    }

    // =========================================================================
    // Request Results
    // =========================================================================

    pub fn loading_catalog(&mut self) {
        self.catalog = RequestState::Loading;
    }

    pub fn settle_catalog(&mut self, result: ClientResult<Page<Product>>) {
        self.catalog = settle(result);
    }

    pub fn settle_product(&mut self, result: ClientResult<Product>) {
        self.product = settle(result);
    }

    pub fn settle_cart(&mut self, result: ClientResult<Cart>) {
        self.cart = settle(result);
    }
}
