//! # Catalog Commands
//!
//! ```text
//! pupuk catalog -s npk --packaging pk-50 --max-price 400000 -p 2
//!        │
//!        ▼
//! build_query ──► CatalogQuery { search, filter, page, page_size }
//!        │
//!        ▼
//! products().catalog_page ──► GET /products (cached) ──► filter ──► page
//! ```
//!
//! The catalog is public: no session needed.

use pupuk_core::catalog::{AdvancedFilter, CatalogQuery};
use pupuk_core::validation::{validate_page_size, validate_search_query};
use pupuk_core::{Money, ValidationError};
use tracing::debug;

use crate::cli::CatalogArgs;
use crate::commands::{render, OutputFormat};
use crate::error::ApiResult;
use crate::output;
use crate::state::AppState;

/// Turns the command line into a catalog query.
pub fn build_query(args: &CatalogArgs, default_page_size: usize) -> ApiResult<CatalogQuery> {
    let search = validate_search_query(&args.search)?;

    let min_price = args.min_price.map(Money::from_rupiah);
    let max_price = args.max_price.map(Money::from_rupiah);
    if let (Some(min), Some(max)) = (min_price, max_price) {
        if min > max {
            return Err(ValidationError::InvalidFormat {
                field: "min_price".to_string(),
                reason: "must not be above max_price".to_string(),
            }
            .into());
        }
    }

    let page_size = args.page_size.unwrap_or(default_page_size);
    validate_page_size(page_size)?;

    Ok(CatalogQuery {
        search,
        filter: AdvancedFilter {
            product_type_id: args
                .product_type
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            packaging_ids: args
                .packagings
                .iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            min_price,
            max_price,
        },
        page: args.page,
        page_size,
    })
}

pub async fn list(state: &AppState, args: &CatalogArgs, format: OutputFormat) -> ApiResult<String> {
    let storefront = state.storefront();
    let query = build_query(args, storefront.config().catalog.page_size)?;
    debug!(search = %query.search, page = query.page, "catalog");

    let page = storefront.products().catalog_page(&query).await?;
    render(format, &page, output::catalog_page)
}

pub async fn show(state: &AppState, id: &str, format: OutputFormat) -> ApiResult<String> {
    debug!(product_id = %id, "product");
    let product = state.storefront().products().get(id).await?;
    render(format, &product, output::product_detail)
}

pub async fn facets(state: &AppState, format: OutputFormat) -> ApiResult<String> {
    debug!("facets");
    let facets = state.storefront().products().facets().await?;
    render(format, &facets, output::facets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_build_query_trims_and_collects() {
        let args = CatalogArgs {
            search: "  npk  ".to_string(),
            product_type: Some(" ".to_string()),
            packagings: vec!["pk-50".to_string(), "pk-50".to_string(), "".to_string()],
            min_price: Some(100_000),
            max_price: None,
            page: 2,
            page_size: None,
        };
        let query = build_query(&args, 12).unwrap();
        assert_eq!(query.search, "npk");
        assert_eq!(query.filter.product_type_id, None);
        assert_eq!(query.filter.packaging_ids.len(), 1);
        assert_eq!(query.filter.min_price, Some(Money::from_rupiah(100_000)));
        assert_eq!(query.page, 2);
        assert_eq!(query.page_size, 12);
    }

    #[test]
    fn test_build_query_rejects_bad_input() {
        let inverted = CatalogArgs {
            min_price: Some(500_000),
            max_price: Some(100_000),
            page: 1,
            ..CatalogArgs::default()
        };
        assert_eq!(build_query(&inverted, 12).unwrap_err().code, ErrorCode::ValidationError);

        let zero_size = CatalogArgs {
            page: 1,
            page_size: Some(0),
            ..CatalogArgs::default()
        };
        assert!(build_query(&zero_size, 12).is_err());

        let long_search = CatalogArgs {
            search: "n".repeat(101),
            page: 1,
            ..CatalogArgs::default()
        };
        assert!(build_query(&long_search, 12).is_err());
    }
}
