//! # Report Module
//!
//! Report queries for the admin dashboard and the chart series built
//! from their answers.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Transaction, TransactionStatus};

/// Longest range a sales report may cover.
pub const MAX_REPORT_DAYS: i64 = 366;

/// Inclusive date range of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// ## Errors
    /// `start` after `end`, or more than [`MAX_REPORT_DAYS`] days.
    pub fn new(start: NaiveDate, end: NaiveDate) -> CoreResult<Self> {
        if start > end {
            return Err(ValidationError::InvalidFormat {
                field: "start".to_string(),
                reason: "must not be after end".to_string(),
            }
            .into());
        }

        let range = DateRange { start, end };
        if range.days() > MAX_REPORT_DAYS {
            return Err(ValidationError::OutOfRange {
                field: "date range".to_string(),
                min: 1,
                max: MAX_REPORT_DAYS,
            }
            .into());
        }
        Ok(range)
    }

    /// The `days` days ending on `today`, e.g. the dashboard's "last 30 days".
    ///
    /// Values below 1 mean "today only".
    pub fn last_days(today: NaiveDate, days: i64) -> CoreResult<Self> {
        let days = days.max(1);
        let too_long = || ValidationError::OutOfRange {
            field: "date range".to_string(),
            min: 1,
            max: MAX_REPORT_DAYS,
        };
        if days > MAX_REPORT_DAYS {
            return Err(too_long().into());
        }
        let start = today
            .checked_sub_signed(Duration::days(days - 1))
            .ok_or_else(too_long)?;
        DateRange::new(start, today)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// `start` / `end` query parameters as `YYYY-MM-DD`.
    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        [
            ("start", self.start.format("%Y-%m-%d").to_string()),
            ("end", self.end.format("%Y-%m-%d").to_string()),
        ]
    }
}

// =============================================================================
// Report Records
// =============================================================================

/// Dashboard headline numbers (`GET /reports/summary`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ReportSummary {
    pub total_revenue: Money,
    pub total_orders: i64,
    pub pending_orders: i64,
    pub total_customers: i64,
    pub total_products: i64,
}

/// One day of the sales chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesPoint {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub revenue: Money,
    #[serde(default)]
    pub orders: i64,
}

/// Row of the best-sellers table (`GET /reports/top-products`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopProduct {
    pub product_id: String,
    pub product_name: String,
    pub quantity_sold: i64,
    pub revenue: Money,
}

/// Validates the `limit` of a top-products query.
pub fn validate_top_limit(limit: u32) -> Result<(), ValidationError> {
    if !(1..=50).contains(&limit) {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: 50,
        });
    }
    Ok(())
}

// =============================================================================
// Chart Series
// =============================================================================

/// One point per day of `range`, in order.
///
/// Days the backend did not report get zero revenue and zero orders;
/// duplicate days are summed; points outside the range are dropped.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use pupuk_core::report::{fill_daily_gaps, DateRange};
///
/// let d = |day| NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
/// let range = DateRange::new(d(1), d(7)).unwrap();
/// let series = fill_daily_gaps(&[], &range);
/// assert_eq!(series.len(), 7);
/// assert!(series.iter().all(|p| p.revenue.is_zero()));
/// ```
pub fn fill_daily_gaps(points: &[SalesPoint], range: &DateRange) -> Vec<SalesPoint> {
    let mut by_day: BTreeMap<NaiveDate, (Money, i64)> = BTreeMap::new();
    for point in points.iter().filter(|p| range.contains(p.date)) {
        let entry = by_day.entry(point.date).or_insert((Money::zero(), 0));
        entry.0 += point.revenue;
        entry.1 += point.orders;
    }

    range
        .start
        .iter_days()
        .take_while(|day| *day <= range.end)
        .map(|date| {
            let (revenue, orders) = by_day.get(&date).copied().unwrap_or((Money::zero(), 0));
            SalesPoint {
                date,
                revenue,
                orders,
            }
        })
        .collect()
}

/// Orders per status, in lifecycle order, for the dashboard status chart.
pub fn status_breakdown(transactions: &[Transaction]) -> Vec<(TransactionStatus, usize)> {
    TransactionStatus::ALL
        .iter()
        .map(|status| {
            let count = transactions.iter().filter(|t| t.status == *status).count();
            (*status, count)
        })
        .collect()
}
