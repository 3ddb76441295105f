//! # Reports
//!
//! Admin dashboard data. Each query is cached under `reports/...` with its
//! parameters in the key, so checkout and status changes drop all of them
//! at once.

use std::sync::Arc;

use pupuk_core::report::{fill_daily_gaps, validate_top_limit, DateRange, ReportSummary, SalesPoint, TopProduct};

use super::keys;
use crate::cache::QueryCache;
use crate::error::ClientResult;
use crate::http::ApiClient;

#[derive(Debug, Clone)]
pub struct ReportsApi {
    api: ApiClient,
    cache: Arc<QueryCache>,
}

impl ReportsApi {
    pub fn new(api: ApiClient, cache: Arc<QueryCache>) -> Self {
        ReportsApi { api, cache }
    }

    pub async fn summary(&self) -> ClientResult<ReportSummary> {
        let key = keys::detail(keys::REPORTS, "summary");
        self.cache
            .fetch(&key, || self.api.get("/reports/summary"))
            .await
    }

    /// Daily sales as the backend reports them; days without orders may be
    /// missing.
    pub async fn sales(&self, range: &DateRange) -> ClientResult<Vec<SalesPoint>> {
        let key = format!("{}/sales?start={}&end={}", keys::REPORTS, range.start(), range.end());
        let query = range.query_pairs();
        self.cache
            .fetch(&key, || self.api.get_query("/reports/sales", &query))
            .await
    }

    /// One point per day of `range`, zero-filled, ready to plot.
    pub async fn sales_chart(&self, range: &DateRange) -> ClientResult<Vec<SalesPoint>> {
        let points = self.sales(range).await?;
        Ok(fill_daily_gaps(&points, range))
    }

    pub async fn top_products(&self, range: &DateRange, limit: u32) -> ClientResult<Vec<TopProduct>> {
        validate_top_limit(limit)?;

        let key = format!(
            "{}/top-products?start={}&end={}&limit={}",
            keys::REPORTS,
            range.start(),
            range.end(),
            limit
        );
        let [start, end] = range.query_pairs();
        let query = [start, end, ("limit", limit.to_string())];
        self.cache
            .fetch(&key, || self.api.get_query("/reports/top-products", &query))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ClientError;
    use crate::test_server;
    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use chrono::NaiveDate;
    use pupuk_core::Money;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    async fn reports_api(router: Router) -> ReportsApi {
        let base = test_server::spawn(router).await;
        let api = ApiClient::new(&ClientConfig::with_base_url(base)).unwrap();
        ReportsApi::new(api, Arc::new(QueryCache::new(Duration::from_secs(60))))
    }

    #[tokio::test]
    async fn test_sales_chart_sends_range_and_fills_gaps() {
        let router = Router::new().route(
            "/api/reports/sales",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("start").map(String::as_str), Some("2026-03-01"));
                assert_eq!(params.get("end").map(String::as_str), Some("2026-03-03"));
                Json(json!([{ "date": "2026-03-02", "revenue": 750000, "orders": 3 }]))
            }),
        );
        let reports = reports_api(router).await;

        let range = DateRange::new(d(1), d(3)).unwrap();
        let chart = reports.sales_chart(&range).await.unwrap();

        assert_eq!(chart.len(), 3);
        assert_eq!(chart[0].revenue, Money::zero());
        assert_eq!(chart[1].revenue, Money::from_rupiah(750_000));
        assert_eq!(chart[1].orders, 3);
        assert_eq!(chart[2].date, d(3));
    }

    #[tokio::test]
    async fn test_top_products_limit() {
        let router = Router::new().route(
            "/api/reports/top-products",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                assert_eq!(params.get("limit").map(String::as_str), Some("5"));
                Json(json!({ "data": [{
                    "productId": "p1",
                    "productName": "NPK Mutiara",
                    "quantitySold": 40,
                    "revenue": 12400000
                }]}))
            }),
        );
        let reports = reports_api(router).await;
        let range = DateRange::new(d(1), d(31)).unwrap();

        let top = reports.top_products(&range, 5).await.unwrap();
        assert_eq!(top[0].quantity_sold, 40);

        let err = reports.top_products(&range, 0).await.unwrap_err();
        assert!(matches!(err, ClientError::Core(_)));
    }

    #[tokio::test]
    async fn test_summary_tolerates_missing_fields() {
        let router = Router::new().route(
            "/api/reports/summary",
            get(|| async { Json(json!({ "totalRevenue": 1250000, "totalOrders": 4 })) }),
        );
        let reports = reports_api(router).await;

        let summary = reports.summary().await.unwrap();
        assert_eq!(summary.total_revenue.to_string(), "Rp 1.250.000");
        assert_eq!(summary.pending_orders, 0);
    }
}
