//! # Money Module
//!
//! Provides the `Money` type for rupee amounts.
//!
//! ## Why Fixed-Point Decimal?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │    (1.005).toFixed(2) = "1.00"      ❌ half-up expected "1.01"          │
//! │                                                                         │
//! │  Repeated line recalculation drifts when every edit re-derives tax     │
//! │  from float intermediates.                                              │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal                                             │
//! │    Exact base-10 arithmetic for prices, quantities (1.5 hours) and     │
//! │    percentages. Rounding happens ONCE, at the output boundary,         │
//! │    half-up to 2 places (paise).                                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use imagicity_core::money::Money;
//! use rust_decimal::Decimal;
//!
//! let price = Money::from_rupees(45000);
//! let line = price * Decimal::from(2);
//! assert_eq!(line, Money::from_rupees(90000));
//! assert_eq!(line.to_string(), "₹90,000.00");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

/// Number of decimal places carried by a settled rupee amount (paise).
pub const MONEY_SCALE: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A rupee amount.
///
/// ## Design Decisions
/// - **Decimal (signed)**: negative values are representable so that
///   invalid inputs can be *detected* (the GST split rejects them) and so
///   `rounding` adjustments can go either way
/// - **Unrounded by default**: arithmetic keeps full precision; call
///   [`Money::round_half_up`] at display/persistence boundaries
/// - **Serialized as a decimal string**: `"1180.00"`, never a float
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  LineItem.unit_price × qty ──► discount ──► taxable base ──► split_gst │
/// │                                                                 │       │
/// │                                       cgst / sgst / igst ◄──────┘       │
/// │                                                │                        │
/// │  InvoiceTotals { subtotal, discount, tax, shipping, rounding, grand }  │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Wraps a decimal rupee amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from whole rupees.
    ///
    /// ## Example
    /// ```rust
    /// use imagicity_core::money::Money;
    ///
    /// assert_eq!(Money::from_rupees(1000).to_string(), "₹1,000.00");
    /// ```
    #[inline]
    pub fn from_rupees(rupees: i64) -> Self {
        Money(Decimal::from(rupees))
    }

    /// Creates a Money value from paise (1/100 rupee).
    ///
    /// ## Example
    /// ```rust
    /// use imagicity_core::money::Money;
    ///
    /// let fee = Money::from_paise(1099); // ₹10.99
    /// assert_eq!(fee.to_string(), "₹10.99");
    /// ```
    #[inline]
    pub fn from_paise(paise: i64) -> Self {
        Money(Decimal::new(paise, MONEY_SCALE))
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Rounds to paise using half-up (midpoint away from zero).
    ///
    /// ## Rounding Rule
    /// ```text
    /// 4050.005 → 4050.01     (half rounds up)
    /// 4050.004 → 4050.00
    /// -0.005   → -0.01       (away from zero, symmetric)
    /// ```
    ///
    /// This is the ONLY rounding the engine performs, and only on values
    /// that leave the GST split. Aggregates are never re-rounded.
    ///
    /// ## Example
    /// ```rust
    /// use imagicity_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let raw = Money::new(Decimal::new(40500050, 4)); // 4050.0050
    /// assert_eq!(raw.round_half_up(), Money::from_paise(405001));
    /// ```
    pub fn round_half_up(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Returns `rate` percent of this amount, unrounded.
    ///
    /// ## Example
    /// ```rust
    /// use imagicity_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let base = Money::from_rupees(12000);
    /// assert_eq!(base.percent_of(Decimal::from(10)), Money::from_rupees(1200));
    /// ```
    #[inline]
    pub fn percent_of(&self, rate: Decimal) -> Money {
        Money(self.0 * rate / Decimal::ONE_HUNDRED)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount the way `Intl.NumberFormat('en-IN')` does:
/// rupee sign, lakh/crore digit grouping, two decimals.
///
/// ## Indian Grouping
/// ```text
/// 1180        → ₹1,180.00
/// 118000      → ₹1,18,000.00
/// 12345678.9  → ₹1,23,45,678.90
/// ```
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rounded = self.round_half_up().0;
        let sign = if rounded < Decimal::ZERO { "-" } else { "" };
        rounded = rounded.abs();
        rounded.rescale(MONEY_SCALE);

        let text = rounded.to_string();
        let (rupees, paise) = text.split_once('.').unwrap_or((text.as_str(), "00"));
        write!(f, "{}₹{}.{}", sign, group_indian(rupees), paise)
    }
}

/// Inserts separators as 3 digits, then groups of 2 (lakh/crore style).
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by a decimal quantity (fractional quantities allowed).
impl Mul<Decimal> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: Decimal) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
