//! # Invoice Draft
//!
//! In-progress invoice lines as edited in the invoice form.
//!
//! ## Edit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Form event                 Draft operation          Recalculation      │
//! │  ──────────                 ───────────────          ─────────────      │
//! │  Insert line ─────────────► add_line() ────────────► recalc_line(new)   │
//! │  Change qty/price/... ────► update_line(i, edit) ──► recalc_line(i)     │
//! │  Delete line ─────────────► remove_line(i)           (none)             │
//! │  Pick client ─────────────► set_client_state_code ─► recalc_lines(all)  │
//! │  Change place of supply ──► set_place_of_supply ───► recalc_lines(all)  │
//! │  Edit shipping/round-off ─► set_shipping/rounding    (none)             │
//! │  Render totals panel ─────► totals()                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation is all-or-nothing: when a recalculation fails the draft
//! keeps its previous state.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use crate::error::{CoreError, CoreResult};
use crate::gst::{is_interstate, GstSummary};
use crate::money::Money;
use crate::totals::{calculate_invoice_totals, recalc_line, recalc_lines, InvoiceTotals, TotalsAdjustments};
use crate::types::{DiscountType, LineItem, TaxRate};

/// A partial change to one line. `None` leaves the field as it is.
///
/// `discount_type` is doubly optional: `Some(None)` clears the discount.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineEdit {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "qty")]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit_price: Option<Money>,
    #[serde(default, deserialize_with = "present")]
    pub discount_type: Option<Option<DiscountType>>,
    #[serde(default)]
    pub discount_value: Option<Decimal>,
    #[serde(default)]
    pub tax_rate: Option<TaxRate>,
}

/// Distinguishes an explicit `null` from an absent key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl LineEdit {
    fn apply_to(self, line: &mut LineItem) {
        if let Some(description) = self.description {
            line.description = description;
        }
        if let Some(quantity) = self.quantity {
            line.quantity = quantity;
        }
        if let Some(unit_price) = self.unit_price {
            line.unit_price = unit_price;
        }
        if let Some(discount_type) = self.discount_type {
            line.discount_type = discount_type;
        }
        if let Some(discount_value) = self.discount_value {
            line.discount_value = discount_value;
        }
        if let Some(tax_rate) = self.tax_rate {
            line.tax_rate = tax_rate;
        }
    }
}

/// The invoice being edited.
///
/// ## Invariants
/// - Every held line has tax fields consistent with the current
///   interstate flag
/// - The interstate flag is derived, never set directly
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceDraft {
    lines: Vec<LineItem>,
    client_state_code: Option<String>,
    place_of_supply: Option<String>,
    adjustments: TotalsAdjustments,
}

impl InvoiceDraft {
    /// Creates an empty draft (intra-state until both state codes are known).
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a draft from existing lines, recalculating them.
    pub fn from_lines(
        lines: Vec<LineItem>,
        client_state_code: Option<String>,
        place_of_supply: Option<String>,
    ) -> CoreResult<Self> {
        let interstate = is_interstate(client_state_code.as_deref(), place_of_supply.as_deref());
        Ok(Self {
            lines: recalc_lines(&lines, interstate)?,
            client_state_code,
            place_of_supply,
            adjustments: TotalsAdjustments::default(),
        })
    }

    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<LineItem> {
        self.lines
    }

    pub fn client_state_code(&self) -> Option<&str> {
        self.client_state_code.as_deref()
    }

    pub fn place_of_supply(&self) -> Option<&str> {
        self.place_of_supply.as_deref()
    }

    pub fn adjustments(&self) -> TotalsAdjustments {
        self.adjustments
    }

    /// Whether the lines are currently taxed as IGST.
    pub fn is_interstate(&self) -> bool {
        is_interstate(self.client_state_code.as_deref(), self.place_of_supply.as_deref())
    }

    /// Appends a line after calculating its tax.
    pub fn add_line(&mut self, line: LineItem) -> CoreResult<&LineItem> {
        let line = recalc_line(&line, self.is_interstate())?;
        self.lines.push(line);
        Ok(&self.lines[self.lines.len() - 1])
    }

    /// Merges `edit` into the line at `index` and recalculates it.
    pub fn update_line(&mut self, index: usize, edit: LineEdit) -> CoreResult<&LineItem> {
        let interstate = self.is_interstate();
        let current = self.line_at(index)?;

        let mut candidate = current.clone();
        edit.apply_to(&mut candidate);
        let updated = recalc_line(&candidate, interstate)?;

        self.lines[index] = updated;
        Ok(&self.lines[index])
    }

    /// Removes and returns the line at `index`.
    pub fn remove_line(&mut self, index: usize) -> CoreResult<LineItem> {
        self.line_at(index)?;
        Ok(self.lines.remove(index))
    }

    /// Sets the client's state code and retaxes every line.
    pub fn set_client_state_code(&mut self, code: Option<String>) -> CoreResult<()> {
        let interstate = is_interstate(code.as_deref(), self.place_of_supply.as_deref());
        self.lines = recalc_lines(&self.lines, interstate)?;
        self.client_state_code = code;
        Ok(())
    }

    /// Sets the place of supply and retaxes every line.
    pub fn set_place_of_supply(&mut self, place: Option<String>) -> CoreResult<()> {
        let interstate = is_interstate(self.client_state_code.as_deref(), place.as_deref());
        self.lines = recalc_lines(&self.lines, interstate)?;
        self.place_of_supply = place;
        Ok(())
    }

    pub fn set_shipping(&mut self, shipping: Money) {
        self.adjustments.shipping = shipping;
    }

    pub fn set_rounding(&mut self, rounding: Money) {
        self.adjustments.rounding = rounding;
    }

    /// Current document totals.
    pub fn totals(&self) -> InvoiceTotals {
        calculate_invoice_totals(&self.lines, self.adjustments)
    }

    /// Current CGST/SGST/IGST breakdown.
    pub fn gst_summary(&self) -> GstSummary {
        GstSummary::from_lines(&self.lines)
    }

    fn line_at(&self, index: usize) -> CoreResult<&LineItem> {
        self.lines.get(index).ok_or_else(|| {
            CoreError::invalid_argument(
                "index",
                format!("line {} does not exist ({} lines)", index, self.lines.len()),
            )
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
