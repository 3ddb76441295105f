//! # Products
//!
//! Catalog reads for the storefront and product management for admins.

use std::sync::Arc;

use pupuk_core::catalog::{facets, query_catalog, CatalogFacets, CatalogQuery, Page};
use pupuk_core::validation::ProductForm;
use pupuk_core::{Packaging, Product, ProductType};
use tracing::{debug, info};

use super::keys;
use crate::cache::QueryCache;
use crate::error::ClientResult;
use crate::http::ApiClient;

#[derive(Debug, Clone)]
pub struct ProductsApi {
    api: ApiClient,
    cache: Arc<QueryCache>,
}

impl ProductsApi {
    pub fn new(api: ApiClient, cache: Arc<QueryCache>) -> Self {
        ProductsApi { api, cache }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Every product, active or not (`GET /products`).
    pub async fn list(&self) -> ClientResult<Vec<Product>> {
        self.cache
            .fetch(keys::PRODUCTS, || self.api.get("/products"))
            .await
    }

    /// Like [`ProductsApi::list`] but always hits the backend.
    pub async fn refetch_list(&self) -> ClientResult<Vec<Product>> {
        self.cache
            .refetch(keys::PRODUCTS, || self.api.get("/products"))
            .await
    }

    pub async fn get(&self, id: &str) -> ClientResult<Product> {
        let path = format!("/products/{}", id);
        self.cache
            .fetch(&keys::detail(keys::PRODUCTS, id), || self.api.get(&path))
            .await
    }

    pub async fn product_types(&self) -> ClientResult<Vec<ProductType>> {
        self.cache
            .fetch(keys::PRODUCT_TYPES, || self.api.get("/product-types"))
            .await
    }

    pub async fn packagings(&self) -> ClientResult<Vec<Packaging>> {
        self.cache
            .fetch(keys::PACKAGINGS, || self.api.get("/packagings"))
            .await
    }

    /// One page of the storefront catalog: active products only, searched,
    /// filtered and paginated on the client.
    pub async fn catalog_page(&self, query: &CatalogQuery) -> ClientResult<Page<Product>> {
        let active: Vec<Product> = self
            .list()
            .await?
            .into_iter()
            .filter(|p| p.is_active)
            .collect();

        let page = query_catalog(&active, query)?;
        debug!(
            search = %query.search,
            page = page.page,
            total_items = page.total_items,
            total_pages = page.total_pages,
            "Catalog page"
        );
        Ok(page)
    }

    /// Filter panel options for the active catalog.
    pub async fn facets(&self) -> ClientResult<CatalogFacets> {
        let active: Vec<Product> = self
            .list()
            .await?
            .into_iter()
            .filter(|p| p.is_active)
            .collect();
        Ok(facets(&active))
    }

    // =========================================================================
    // Admin Writes
    // =========================================================================

    pub async fn create(&self, form: &ProductForm) -> ClientResult<Product> {
        form.validate()?;
        let product: Product = self.api.post("/products", form).await?;
        self.cache.invalidate(keys::PRODUCTS).await;
        info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    pub async fn update(&self, id: &str, form: &ProductForm) -> ClientResult<Product> {
        form.validate()?;
        let product: Product = self.api.put(&format!("/products/{}", id), form).await?;
        self.cache.invalidate(keys::PRODUCTS).await;
        info!(product_id = %id, "Product updated");
        Ok(product)
    }

    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        self.api.delete(&format!("/products/{}", id)).await?;
        self.cache.invalidate(keys::PRODUCTS).await;
        info!(product_id = %id, "Product deleted");
        Ok(())
    }
}
