//! # Catalog Module
//!
//! Search, advanced filter and pagination over a fetched product list.
//!
//! ## Pipeline
//! ```text
//!   GET /products          search term          advanced filter         page
//!  ┌──────────────┐      ┌──────────────┐      ┌─────────────────┐   ┌──────────┐
//!  │ Vec<Product> │ ───► │ name / desc  │ ───► │ type, packaging │ ─►│ slice by │
//!  │  (all)       │      │ npk / type   │      │ price range     │   │ page size│
//!  └──────────────┘      └──────────────┘      └─────────────────┘   └──────────┘
//! ```
//!
//! Every stage is a predicate over one product, so the stages commute and
//! running the filter twice changes nothing.
//!
//! ## Usage
//! ```rust
//! use pupuk_core::catalog::{CatalogQuery, query_catalog};
//!
//! let products = vec![];
//! let page = query_catalog(&products, &CatalogQuery::default()).unwrap();
//! assert_eq!(page.total_items, 0);
//! assert_eq!(page.total_pages, 0);
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Packaging, Product, ProductType};
use crate::validation::validate_page_size;
use crate::DEFAULT_PAGE_SIZE;

// =============================================================================
// Filter
// =============================================================================

/// The "advanced filter" panel of the catalog.
///
/// Empty fields do not constrain. Packaging and price are checked
/// independently: one variant may match the packaging and another the
/// price.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedFilter {
    #[serde(default)]
    pub product_type_id: Option<String>,
    #[serde(default)]
    pub packaging_ids: BTreeSet<String>,
    #[serde(default)]
    pub min_price: Option<Money>,
    #[serde(default)]
    pub max_price: Option<Money>,
}

impl AdvancedFilter {
    pub fn is_empty(&self) -> bool {
        self.product_type_id.is_none()
            && self.packaging_ids.is_empty()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.matches_type(product) && self.matches_packaging(product) && self.matches_price(product)
    }

    fn matches_type(&self, product: &Product) -> bool {
        match &self.product_type_id {
            Some(type_id) => &product.product_type.id == type_id,
            None => true,
        }
    }

    fn matches_packaging(&self, product: &Product) -> bool {
        self.packaging_ids.is_empty()
            || product
                .variants
                .iter()
                .any(|v| self.packaging_ids.contains(&v.packaging.id))
    }

    fn matches_price(&self, product: &Product) -> bool {
        if self.min_price.is_none() && self.max_price.is_none() {
            return true;
        }
        product.variants.iter().any(|v| {
            self.min_price.map_or(true, |min| v.price >= min)
                && self.max_price.map_or(true, |max| v.price <= max)
        })
    }
}

/// Case-insensitive search over name, description, NPK formula and type
/// name. A blank term matches everything.
pub fn matches_search(product: &Product, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }

    let haystacks = [
        Some(product.name.as_str()),
        Some(product.description.as_str()),
        product.npk_formula.as_deref(),
        Some(product.product_type.name.as_str()),
    ];

    haystacks
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&term))
}

/// Products matching both the search term and the filter, in input order.
pub fn filter_products<'a>(
    products: &'a [Product],
    search: &str,
    filter: &AdvancedFilter,
) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| matches_search(p, search) && filter.matches(p))
        .collect()
}

// =============================================================================
// Pagination
// =============================================================================

/// One page of a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1 && self.total_pages > 0
    }
}

/// Number of pages needed for `total` items.
pub fn total_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Slices `items` into page `page` (1-based) of `page_size`.
///
/// A page past the end is empty but still reports the real totals.
///
/// ## Errors
/// `page_size == 0` or `page == 0`.
///
/// ## Example
/// ```rust
/// use pupuk_core::catalog::paginate;
///
/// let items: Vec<u32> = (1..=25).collect();
/// let last = paginate(&items, 3, 10).unwrap();
/// assert_eq!(last.items, vec![21, 22, 23, 24, 25]);
/// assert_eq!(last.total_pages, 3);
/// ```
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> CoreResult<Page<T>> {
    validate_page_size(page_size)?;
    if page == 0 {
        return Err(ValidationError::MustBePositive {
            field: "page".to_string(),
        }
        .into());
    }

    let start = (page - 1).saturating_mul(page_size);
    let slice: Vec<T> = items.iter().skip(start).take(page_size).cloned().collect();

    Ok(Page {
        items: slice,
        page,
        page_size,
        total_items: items.len(),
        total_pages: total_pages(items.len(), page_size),
    })
}

// =============================================================================
// Catalog Query
// =============================================================================

/// Everything the catalog screen sends to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub filter: AdvancedFilter,
    pub page: usize,
    pub page_size: usize,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            filter: AdvancedFilter::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Filter then paginate.
pub fn query_catalog(products: &[Product], query: &CatalogQuery) -> CoreResult<Page<Product>> {
    let filtered: Vec<Product> = filter_products(products, &query.search, &query.filter)
        .into_iter()
        .cloned()
        .collect();
    paginate(&filtered, query.page, query.page_size)
}

// =============================================================================
// Facets
// =============================================================================

/// Options the advanced filter panel offers for a product list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFacets {
    /// Distinct packagings, sorted by name.
    pub packagings: Vec<Packaging>,
    /// Distinct product types, sorted by name.
    pub product_types: Vec<ProductType>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
}

pub fn facets(products: &[Product]) -> CatalogFacets {
    let mut packagings: BTreeMap<String, Packaging> = BTreeMap::new();
    let mut types: BTreeMap<String, ProductType> = BTreeMap::new();

    for product in products {
        types
            .entry(product.product_type.id.clone())
            .or_insert_with(|| product.product_type.clone());
        for variant in &product.variants {
            packagings
                .entry(variant.packaging.id.clone())
                .or_insert_with(|| variant.packaging.clone());
        }
    }

    let mut packagings: Vec<Packaging> = packagings.into_values().collect();
    packagings.sort_by(|a, b| a.name.cmp(&b.name));
    let mut product_types: Vec<ProductType> = types.into_values().collect();
    product_types.sort_by(|a, b| a.name.cmp(&b.name));

    let prices = || products.iter().flat_map(|p| p.variants.iter().map(|v| v.price));

    CatalogFacets {
        packagings,
        product_types,
        min_price: prices().min(),
        max_price: prices().max(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
