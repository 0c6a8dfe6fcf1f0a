//! # GST Split
//!
//! Splits the tax on a taxable amount into Indian GST components.
//!
//! ## Intra-state vs Inter-state
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Supplier state == place of supply          Supplier state != POS      │
//! │  (intra-state)                              (inter-state)              │
//! │                                                                         │
//! │  ₹1000 @ 18%                                ₹2000 @ 18%                │
//! │    CGST (central)  ₹90   ← half             IGST (integrated) ₹360    │
//! │    SGST (state)    ₹90   ← half             CGST ₹0, SGST ₹0          │
//! │    IGST            ₹0                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rounding
//! The raw tax `amount × rate / 100` is kept at full precision. Output
//! components are rounded half-up to paise:
//!
//! - `total_tax = round(raw)`
//! - interstate: `igst = round(raw)`
//! - intra-state: `cgst = sgst = round(raw / 2)`, each half rounded on its own
//!
//! Because the halves are rounded independently, `cgst + sgst` can exceed
//! `total_tax` by one paisa on odd-paise totals (raw ₹0.01 → ₹0.01 + ₹0.01).
//! Stored invoices depend on this, so it is kept.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{LineItem, TaxRate};
use crate::validation::validate_gstin;

// =============================================================================
// Split
// =============================================================================

/// Result of [`split_gst`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GstSplit {
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    pub total_tax: Money,
}

/// Splits the GST on `amount` at `tax_rate`.
///
/// ## Errors
/// `CoreError::InvalidArgument` when `amount` or `tax_rate` is negative.
/// Nothing is clamped.
///
/// ## Example
/// ```rust
/// use imagicity_core::gst::split_gst;
/// use imagicity_core::{Money, TaxRate};
///
/// let split = split_gst(Money::from_rupees(1000), TaxRate::from_percent(18), false).unwrap();
/// assert_eq!(split.cgst, Money::from_rupees(90));
/// assert_eq!(split.sgst, Money::from_rupees(90));
/// assert!(split.igst.is_zero());
/// assert_eq!(split.total_tax, Money::from_rupees(180));
/// ```
pub fn split_gst(amount: Money, tax_rate: TaxRate, interstate: bool) -> CoreResult<GstSplit> {
    if amount.is_negative() {
        return Err(CoreError::invalid_argument("amount", "cannot be negative"));
    }
    if tax_rate.is_negative() {
        return Err(CoreError::invalid_argument("tax_rate", "cannot be negative"));
    }

    let raw = amount.percent_of(tax_rate.percent());
    let total_tax = raw.round_half_up();

    if interstate {
        return Ok(GstSplit {
            cgst: Money::zero(),
            sgst: Money::zero(),
            igst: total_tax,
            total_tax,
        });
    }

    let half = Money::new(raw.amount() / Decimal::TWO).round_half_up();
    Ok(GstSplit {
        cgst: half,
        sgst: half,
        igst: Money::zero(),
        total_tax,
    })
}

// =============================================================================
// Interstate Determination
// =============================================================================

/// Checks whether a supply is inter-state.
///
/// True only when BOTH the client's state code and the place of supply are
/// present (non-blank) and differ. Missing information falls back to
/// intra-state (CGST + SGST).
///
/// ```rust
/// use imagicity_core::gst::is_interstate;
///
/// assert!(is_interstate(Some("29"), Some("27")));
/// assert!(!is_interstate(Some("29"), Some("29")));
/// assert!(!is_interstate(Some("29"), None));
/// ```
pub fn is_interstate(client_state_code: Option<&str>, place_of_supply: Option<&str>) -> bool {
    let client = client_state_code.map(str::trim).filter(|s| !s.is_empty());
    let supply = place_of_supply.map(str::trim).filter(|s| !s.is_empty());

    match (client, supply) {
        (Some(client), Some(supply)) => client != supply,
        _ => false,
    }
}

/// Extracts the two-digit state code from a GSTIN.
///
/// Returns `None` when the GSTIN is malformed.
pub fn state_code_from_gstin(gstin: &str) -> Option<&str> {
    let gstin = gstin.trim();
    if validate_gstin(gstin).is_ok() {
        gstin.get(..2)
    } else {
        None
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Per-component GST totals over a set of lines (the breakdown panel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GstSummary {
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
}

impl GstSummary {
    /// Sums the stored components of `lines`. Does not recalculate.
    pub fn from_lines(lines: &[LineItem]) -> Self {
        lines.iter().fold(GstSummary::default(), |mut acc, line| {
            acc.cgst += line.cgst;
            acc.sgst += line.sgst;
            acc.igst += line.igst;
            acc
        })
    }

    #[inline]
    pub fn total(&self) -> Money {
        self.cgst + self.sgst + self.igst
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn rate(percent: u32) -> TaxRate {
        TaxRate::from_percent(percent)
    }

    #[test]
    fn test_intrastate_split() {
        let split = split_gst(Money::from_rupees(1000), rate(18), false).unwrap();

        assert_eq!(split.cgst, Money::from_rupees(90));
        assert_eq!(split.sgst, Money::from_rupees(90));
        assert_eq!(split.igst, Money::zero());
        assert_eq!(split.total_tax, Money::from_rupees(180));
    }

    #[test]
    fn test_interstate_split() {
        let split = split_gst(Money::from_rupees(2000), rate(18), true).unwrap();

        assert_eq!(split.igst, Money::from_rupees(360));
        assert_eq!(split.cgst, Money::zero());
        assert_eq!(split.sgst, Money::zero());
        assert_eq!(split.total_tax, Money::from_rupees(360));
    }

    #[test]
    fn test_rejects_negative_amount() {
        let result = split_gst(Money::from_rupees(-10), rate(18), false);
        assert!(matches!(
            result,
            Err(CoreError::InvalidArgument { ref field, .. }) if field == "amount"
        ));
    }

    #[test]
    fn test_rejects_negative_rate() {
        let result = split_gst(Money::from_rupees(10), TaxRate::new(dec!(-5)), true);
        assert!(matches!(
            result,
            Err(CoreError::InvalidArgument { ref field, .. }) if field == "tax_rate"
        ));
    }

    #[test]
    fn test_zero_rate_is_all_zero() {
        let split = split_gst(Money::from_rupees(5000), TaxRate::zero(), false).unwrap();
        assert_eq!(split, GstSplit::default());
    }

    #[test]
    fn test_odd_paisa_halves_exceed_total() {
        // Raw tax ₹0.01: each half (0.005) rounds up on its own.
        let split = split_gst(Money::from_rupees(1), rate(1), false).unwrap();

        assert_eq!(split.total_tax, Money::from_paise(1));
        assert_eq!(split.cgst, Money::from_paise(1));
        assert_eq!(split.sgst, Money::from_paise(1));
        assert_eq!(split.cgst + split.sgst, Money::from_paise(2));
    }

    #[test]
    fn test_halves_round_from_unrounded_tax() {
        // 333.33 @ 18% = 59.9994 → total 60.00, halves 29.9997 → 30.00
        let split = split_gst(Money::new(dec!(333.33)), rate(18), false).unwrap();

        assert_eq!(split.total_tax, Money::from_rupees(60));
        assert_eq!(split.cgst, Money::from_rupees(30));
    }

    #[test]
    fn test_is_interstate() {
        assert!(is_interstate(Some("29"), Some("27")));
        assert!(!is_interstate(Some("29"), Some("29")));
        assert!(!is_interstate(Some(" 29 "), Some("29")));
        assert!(!is_interstate(None, Some("27")));
        assert!(!is_interstate(Some("29"), None));
        assert!(!is_interstate(Some(""), Some("27")));
        assert!(!is_interstate(None, None));
    }

    #[test]
    fn test_state_code_from_gstin() {
        assert_eq!(state_code_from_gstin("29ABCDE1234F1Z5"), Some("29"));
        assert_eq!(state_code_from_gstin("not-a-gstin"), None);
    }

    #[test]
    fn test_summary_sums_stored_components() {
        let mut a = LineItem::new("A", dec!(1), Money::from_rupees(100));
        a.cgst = Money::from_rupees(9);
        a.sgst = Money::from_rupees(9);
        let mut b = LineItem::new("B", dec!(1), Money::from_rupees(100));
        b.igst = Money::from_rupees(18);

        let summary = GstSummary::from_lines(&[a, b]);
        assert_eq!(summary.cgst, Money::from_rupees(9));
        assert_eq!(summary.sgst, Money::from_rupees(9));
        assert_eq!(summary.igst, Money::from_rupees(18));
        assert_eq!(summary.total(), Money::from_rupees(36));
    }

    proptest! {
        #[test]
        fn prop_interstate_is_all_igst(paise in 0i64..10_000_000_000, bps in 0u32..=10_000) {
            let amount = Money::from_paise(paise);
            let tax_rate = TaxRate::new(Decimal::new(bps as i64, 2));
            let split = split_gst(amount, tax_rate, true).unwrap();

            prop_assert_eq!(split.igst, amount.percent_of(tax_rate.percent()).round_half_up());
            prop_assert!(split.cgst.is_zero());
            prop_assert!(split.sgst.is_zero());
        }

        #[test]
        fn prop_intrastate_halves_match(paise in 0i64..10_000_000_000, bps in 0u32..=10_000) {
            let amount = Money::from_paise(paise);
            let tax_rate = TaxRate::new(Decimal::new(bps as i64, 2));
            let split = split_gst(amount, tax_rate, false).unwrap();

            prop_assert_eq!(split.cgst, split.sgst);
            prop_assert!(split.igst.is_zero());
            let drift = (split.cgst + split.sgst - split.total_tax).abs();
            prop_assert!(drift <= Money::from_paise(1));
        }
    }
}
