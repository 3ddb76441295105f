//! # Money Module
//!
//! Provides the `Money` type for rupiah amounts and `PpnRate` for VAT.
//!
//! Amounts are whole rupiah in an `i64`; rupiah has no minor unit in
//! circulation. Tax is a rate in basis points and is applied with integer
//! math, rounding half up:
//!
//! ```text
//! Rp 1.250.000 at 11% (1100 bps) = (1_250_000 * 1100 + 5_000) / 10_000 = 137_500
//! ```
//!
//! ## Usage
//! ```rust
//! use pupuk_core::money::Money;
//!
//! let sack = Money::from_rupiah(185_000);
//! let line = sack.multiply_quantity(4);
//! assert_eq!(line.rupiah(), 740_000);
//! assert_eq!(line.to_string(), "Rp 740.000");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in whole rupiah.
///
/// ## Design Decisions
/// - **i64 (signed)**: allows negative values for refunds and adjustments
/// - **Newtype serde**: serializes as a bare number, the way the
///   backend sends prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole rupiah.
    #[inline]
    pub const fn from_rupiah(rupiah: i64) -> Self {
        Money(rupiah)
    }

    /// Returns the amount in rupiah.
    #[inline]
    pub const fn rupiah(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Calculates PPN on this amount, rounding half up.
    ///
    /// ## Implementation
    /// `(amount × bps + 5000) / 10000` in i128 so large order totals
    /// cannot overflow.
    ///
    /// ## Example
    /// ```rust
    /// use pupuk_core::money::{Money, PpnRate};
    ///
    /// let subtotal = Money::from_rupiah(99_995);
    /// let ppn = subtotal.calculate_ppn(PpnRate::from_bps(1100));
    /// // 99 995 × 11% = 10 999.45 → 10 999
    /// assert_eq!(ppn.rupiah(), 10_999);
    /// ```
    pub fn calculate_ppn(&self, rate: PpnRate) -> Money {
        let ppn = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_rupiah(ppn as i64)
    }

    /// Formats with Indonesian thousands separators, without the currency
    /// prefix: `1.250.000`.
    pub fn format_grouped(&self) -> String {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        if self.0 < 0 {
            format!("-{}", grouped)
        } else {
            grouped
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount the way Indonesian shoppers read it:
/// `Rp 1.250.000`, `-Rp 5.000`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}Rp {}", sign, Money(self.0.abs()).format_grouped())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// PPN Rate
// =============================================================================

/// PPN (Indonesian VAT) rate in basis points.
///
/// 1 basis point = 0.01%, so 1100 bps = 11%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PpnRate(u32);

impl PpnRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        PpnRate(bps)
    }

    /// Creates a rate from a percentage (admin settings form input).
    pub fn from_percentage(pct: f64) -> Self {
        PpnRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Rate as a percentage, for display only.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        PpnRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for PpnRate {
    fn default() -> Self {
        PpnRate::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
