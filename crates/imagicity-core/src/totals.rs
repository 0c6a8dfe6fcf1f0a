//! # Invoice Totals Engine
//!
//! Per-line tax recalculation and document-level aggregation.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  LineItem (user edits)          recalc_line(item, interstate)           │
//! │  ─────────────────────          ─────────────────────────────           │
//! │  qty, unit_price         ──►    gross    = unit_price × qty             │
//! │  discount_type/value            discount = per-type formula             │
//! │  tax_rate                       taxable  = gross − discount             │
//! │                                 split_gst(taxable, rate) ──► cgst/sgst/ │
//! │                                                              igst       │
//! │                                          │                              │
//! │                                          ▼                              │
//! │  calculate_invoice_totals(lines, shipping, rounding)                    │
//! │  ───────────────────────────────────────────────────                    │
//! │  subtotal       = Σ gross                                               │
//! │  discount_total = Σ discount                                            │
//! │  tax_total      = Σ (cgst + sgst + igst)   ← stored values, no split    │
//! │  grand_total    = subtotal − discount_total + tax_total                 │
//! │                   + shipping + rounding                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding
//! Only the GST split rounds. Aggregates are plain sums and may carry more
//! than two decimals (e.g. a 12.5% discount); round at display or
//! persistence boundaries with [`Money::round_half_up`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::gst::split_gst;
use crate::money::Money;
use crate::types::{DiscountType, LineItem};

// =============================================================================
// Per-line
// =============================================================================

/// Discount in rupees for one line, unrounded.
///
/// ```text
/// FixedAmountPerUnit  value × qty
/// PercentOfLine       unit_price × qty × value / 100
/// None                0
/// ```
pub fn line_discount(item: &LineItem) -> Money {
    match item.discount_type {
        Some(DiscountType::FixedAmountPerUnit) => Money::new(item.discount_value * item.quantity),
        Some(DiscountType::PercentOfLine) => item.gross().percent_of(item.discount_value),
        None => Money::zero(),
    }
}

/// Taxable amount of one line: gross minus discount.
#[inline]
pub fn taxable_amount(item: &LineItem) -> Money {
    item.gross() - line_discount(item)
}

/// Recomputes the GST fields of a line.
///
/// Returns a new line; the input is never touched. Every call recomputes
/// from scratch, so the result does not depend on stale `cgst`/`sgst`/`igst`
/// values and calling it twice yields the same line.
///
/// A zero rate short-circuits to all-zero tax without calling the split.
///
/// ## Errors
/// `CoreError::InvalidArgument` when the taxable amount is negative (a
/// fixed per-unit discount above the unit price) or the rate is negative.
///
/// ## Example
/// ```rust
/// use imagicity_core::totals::recalc_line;
/// use imagicity_core::{LineItem, Money};
/// use rust_decimal::Decimal;
///
/// let line = LineItem::new("Brand identity", Decimal::ONE, Money::from_rupees(45000));
/// let line = recalc_line(&line, false).unwrap();
/// assert_eq!(line.cgst, Money::from_rupees(4050));
/// assert_eq!(line.sgst, Money::from_rupees(4050));
/// ```
pub fn recalc_line(item: &LineItem, interstate: bool) -> CoreResult<LineItem> {
    let mut updated = item.clone();

    if item.tax_rate.is_zero() {
        updated.cgst = Money::zero();
        updated.sgst = Money::zero();
        updated.igst = Money::zero();
        return Ok(updated);
    }

    let split = split_gst(taxable_amount(item), item.tax_rate, interstate)?;
    updated.cgst = split.cgst;
    updated.sgst = split.sgst;
    updated.igst = split.igst;

    Ok(updated)
}

/// Recalculates every line of a document (used when the interstate flag flips).
///
/// Fails on the first line that cannot be computed.
pub fn recalc_lines(items: &[LineItem], interstate: bool) -> CoreResult<Vec<LineItem>> {
    items
        .iter()
        .map(|item| recalc_line(item, interstate))
        .collect()
}

// =============================================================================
// Document totals
// =============================================================================

/// Document-level adjustments applied after line sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TotalsAdjustments {
    #[serde(default)]
    pub shipping: Money,
    /// Round-off line; may be negative.
    #[serde(default)]
    pub rounding: Money,
}

/// Derived totals of an invoice.
///
/// `grand_total = subtotal − discount_total + tax_total + shipping + rounding`
/// holds exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceTotals {
    pub subtotal: Money,
    pub discount_total: Money,
    pub tax_total: Money,
    pub shipping: Money,
    pub rounding: Money,
    pub grand_total: Money,
}

/// Aggregates lines into document totals.
///
/// Tax comes from the lines' stored fields; run [`recalc_line`] first. The
/// result does not depend on line order.
///
/// ## Example
/// ```rust
/// use imagicity_core::totals::{calculate_invoice_totals, recalc_line, TotalsAdjustments};
/// use imagicity_core::{LineItem, Money};
/// use rust_decimal::Decimal;
///
/// let line = recalc_line(
///     &LineItem::new("Audit", Decimal::ONE, Money::from_rupees(1000)),
///     false,
/// ).unwrap();
/// let totals = calculate_invoice_totals(&[line], TotalsAdjustments::default());
/// assert_eq!(totals.grand_total, Money::from_rupees(1180));
/// ```
pub fn calculate_invoice_totals(items: &[LineItem], adjustments: TotalsAdjustments) -> InvoiceTotals {
    let subtotal: Money = items.iter().map(LineItem::gross).sum();
    let discount_total: Money = items.iter().map(line_discount).sum();
    let tax_total: Money = items.iter().map(LineItem::tax_amount).sum();

    let TotalsAdjustments { shipping, rounding } = adjustments;
    let grand_total = subtotal - discount_total + tax_total + shipping + rounding;

    InvoiceTotals {
        subtotal,
        discount_total,
        tax_total,
        shipping,
        rounding,
        grand_total,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
