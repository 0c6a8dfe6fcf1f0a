//! # Domain Types
//!
//! Core domain types used throughout Imagicity.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Client      │   │     Invoice     │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  display_name   │◄──│  client_id      │◄──│  invoice_id     │       │
//! │  │  gstin          │   │  number         │   │  method         │       │
//! │  │  state_code     │   │  line_items[]   │   │  amount         │       │
//! │  └─────────────────┘   │  totals         │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    LineItem     │   │ NumberingConfig │   │  InvoiceStatus  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  qty × price    │   │  prefix IMAGI   │   │  Draft          │       │
//! │  │  discount       │   │  next_number    │   │  Sent           │       │
//! │  │  tax_rate (%)   │   │  reset_policy   │   │  Overdue        │       │
//! │  │  cgst/sgst/igst │   └─────────────────┘   │  Paid           │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every persisted document has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (invoice `number`, estimate `number`) - human-readable
//!
//! ## Wire Format
//! Field names are camelCase and decimals travel as strings, so the browser
//! frontend reads these payloads without any mapping layer.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;
use crate::totals::InvoiceTotals;
use crate::{DEFAULT_CURRENCY, DEFAULT_GST_RATE, DEFAULT_INVOICE_PREFIX, DEFAULT_PAYMENT_TERMS_DAYS};

// =============================================================================
// Tax Rate
// =============================================================================

/// GST rate as a percentage (18 = 18%).
///
/// Rates are unrestricted: the common slabs are listed in [`GST_SLABS`] but
/// any non-negative percentage is accepted. A negative rate can be *held*
/// so that the GST split is able to reject it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(#[ts(type = "string")] Decimal);

/// Standard GST slabs offered in rate pickers.
pub const GST_SLABS: [u32; 5] = [0, 5, 12, 18, 28];

impl TaxRate {
    /// Creates a tax rate from a percentage.
    #[inline]
    pub const fn new(percent: Decimal) -> Self {
        TaxRate(percent)
    }

    /// Creates a tax rate from a whole percentage.
    #[inline]
    pub fn from_percent(percent: u32) -> Self {
        TaxRate(Decimal::from(percent))
    }

    /// Returns the rate as a percentage.
    #[inline]
    pub const fn percent(&self) -> Decimal {
        self.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(Decimal::ZERO)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

/// New lines default to 18%, the slab most services fall into.
impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::from_percent(DEFAULT_GST_RATE)
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// How a line's discount value is interpreted.
///
/// ```text
/// PercentOfLine      discount = unit_price × qty × value / 100
/// FixedAmountPerUnit discount = value × qty
/// ```
///
/// Absence (`None` on the line) means no discount at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum DiscountType {
    /// `discount_value` is a percentage (0-100) of the line's gross amount.
    #[serde(rename = "percent")]
    PercentOfLine,
    /// `discount_value` is rupees off each unit.
    #[serde(rename = "amount")]
    FixedAmountPerUnit,
}

/// One row of an invoice or estimate.
///
/// `cgst`, `sgst` and `igst` are derived: they are overwritten by every
/// recalculation and never trusted from input. For a taxed line exactly one
/// of {cgst + sgst} or {igst} is non-zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LineItem {
    /// Catalogue item this line was inserted from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,

    pub description: String,

    /// Quantity; fractional values (hours, kilograms) are allowed.
    #[serde(rename = "qty")]
    #[ts(type = "string")]
    pub quantity: Decimal,

    /// Price of one unit, before discount and tax.
    pub unit_price: Money,

    #[serde(default)]
    pub discount_type: Option<DiscountType>,

    #[serde(default)]
    #[ts(type = "string")]
    pub discount_value: Decimal,

    #[serde(default)]
    pub tax_rate: TaxRate,

    #[serde(default)]
    pub cgst: Money,

    #[serde(default)]
    pub sgst: Money,

    #[serde(default)]
    pub igst: Money,
}

impl LineItem {
    /// Creates a line with the form defaults: 18% GST, percent discount of 0.
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Money) -> Self {
        Self {
            item_id: None,
            description: description.into(),
            quantity,
            unit_price,
            discount_type: Some(DiscountType::PercentOfLine),
            discount_value: Decimal::ZERO,
            tax_rate: TaxRate::default(),
            cgst: Money::zero(),
            sgst: Money::zero(),
            igst: Money::zero(),
        }
    }

    /// Sets the discount.
    pub fn with_discount(mut self, discount_type: DiscountType, value: Decimal) -> Self {
        self.discount_type = Some(discount_type);
        self.discount_value = value;
        self
    }

    /// Removes any discount.
    pub fn without_discount(mut self) -> Self {
        self.discount_type = None;
        self.discount_value = Decimal::ZERO;
        self
    }

    pub fn with_tax_rate(mut self, tax_rate: TaxRate) -> Self {
        self.tax_rate = tax_rate;
        self
    }

    pub fn with_item_id(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    /// Gross amount: `unit_price × quantity`, before discount.
    #[inline]
    pub fn gross(&self) -> Money {
        self.unit_price * self.quantity
    }

    /// Sum of the stored tax components.
    #[inline]
    pub fn tax_amount(&self) -> Money {
        self.cgst + self.sgst + self.igst
    }
}

// =============================================================================
// Numbering
// =============================================================================

/// When the invoice counter restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ResetPolicy {
    /// Counter returns to 1 on the first invoice of a new calendar year.
    #[default]
    Yearly,
    /// Counter only ever grows.
    Never,
}

/// Organization-wide invoice numbering state.
///
/// ## Format
/// ```text
/// prefix + YY + zero-padded counter
/// IMAGI    26   0012          → "IMAGI260012"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NumberingConfig {
    pub prefix: String,

    /// Counter the next issued invoice receives. Always ≥ 1.
    pub next_number: u32,

    pub reset_policy: ResetPolicy,
}

impl Default for NumberingConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_INVOICE_PREFIX.to_string(),
            next_number: 1,
            reset_policy: ResetPolicy::Yearly,
        }
    }
}

// =============================================================================
// Document Status
// =============================================================================

/// The status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Being edited, not yet sent to the client.
    #[default]
    Draft,
    /// Delivered to the client.
    Sent,
    /// Past due date without full payment.
    Overdue,
    /// Payments cover the grand total.
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The status of an estimate (quotation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum EstimateStatus {
    #[default]
    Draft,
    Sent,
    Accepted,
    Rejected,
}

/// Status an invoice moves to after a payment is recorded.
///
/// ## Settlement Rule
/// ```text
/// total_paid ≥ grand_total  →  Paid
/// otherwise                 →  current (unchanged)
/// ```
///
/// Partial payments never downgrade or otherwise touch the status.
///
/// ## Example
/// ```rust
/// use imagicity_core::types::{status_after_payment, InvoiceStatus};
/// use imagicity_core::Money;
///
/// let status = status_after_payment(
///     InvoiceStatus::Sent,
///     Money::from_rupees(1180),
///     Money::from_rupees(1180),
/// );
/// assert_eq!(status, InvoiceStatus::Paid);
/// ```
pub fn status_after_payment(
    current: InvoiceStatus,
    grand_total: Money,
    total_paid: Money,
) -> InvoiceStatus {
    if total_paid >= grand_total {
        InvoiceStatus::Paid
    } else {
        current
    }
}

// =============================================================================
// Client
// =============================================================================

/// A customer invoices are raised against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Client {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Name shown in lists and on the invoice header.
    pub display_name: String,

    /// Registered business name.
    pub legal_name: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub billing_address: Option<String>,

    #[serde(default)]
    pub shipping_address: Option<String>,

    /// 15-character GST identification number.
    #[serde(default)]
    pub gstin: Option<String>,

    /// Two-digit GST state code ("29" = Karnataka). Drives the interstate
    /// decision together with the invoice's place of supply.
    #[serde(default)]
    pub state_code: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    /// Archived clients are hidden from pickers (soft delete).
    #[serde(default)]
    pub archived: bool,
}

impl Client {
    /// Creates a client with a fresh id and no optional details.
    pub fn new(display_name: impl Into<String>, legal_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.into(),
            legal_name: legal_name.into(),
            email: None,
            phone: None,
            billing_address: None,
            shipping_address: None,
            gstin: None,
            state_code: None,
            notes: None,
            tags: Vec::new(),
            archived: false,
        }
    }
}

// =============================================================================
// Catalogue Item
// =============================================================================

/// How a catalogue price relates to GST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TaxPreference {
    Inclusive,
    #[default]
    Exclusive,
    /// Not subject to GST; lines get a 0% rate.
    Exempt,
}

/// A reusable product or service from the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CatalogueItem {
    pub id: String,

    pub name: String,

    /// HSN (goods) or SAC (services) classification code.
    #[serde(default)]
    pub hsn_or_sac: Option<String>,

    #[serde(default)]
    pub sku: Option<String>,

    /// Unit of measure ("hour", "piece").
    #[serde(default)]
    pub unit: Option<String>,

    pub price: Money,

    #[serde(default)]
    pub tax_preference: TaxPreference,

    #[serde(default)]
    pub description: Option<String>,
}

impl CatalogueItem {
    /// Builds a fresh line (qty 1) from this item.
    ///
    /// Exempt items get a 0% rate; everything else starts at the default 18%.
    pub fn to_line_item(&self) -> LineItem {
        let tax_rate = match self.tax_preference {
            TaxPreference::Exempt => TaxRate::zero(),
            TaxPreference::Inclusive | TaxPreference::Exclusive => TaxRate::default(),
        };

        LineItem::new(self.name.clone(), Decimal::ONE, self.price)
            .with_tax_rate(tax_rate)
            .with_item_id(self.id.clone())
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// A persisted invoice.
///
/// The six totals fields are a snapshot of
/// [`calculate_invoice_totals`](crate::totals::calculate_invoice_totals)
/// taken whenever the lines were last saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Invoice {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Human-readable number (e.g., "IMAGI260001").
    pub number: String,

    #[ts(as = "String")]
    pub date: NaiveDate,

    #[ts(as = "String")]
    pub due_date: NaiveDate,

    pub status: InvoiceStatus,

    pub client_id: String,

    pub line_items: Vec<LineItem>,

    /// State code of the place of supply; compared with the client's.
    #[serde(default)]
    pub place_of_supply: Option<String>,

    #[serde(default)]
    pub reverse_charge: bool,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub terms: Option<String>,

    pub subtotal: Money,
    pub discount_total: Money,
    pub tax_total: Money,
    pub shipping: Money,
    pub rounding: Money,
    pub grand_total: Money,

    /// ISO 4217 code; always "INR" today.
    pub currency: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Returns the stored totals snapshot.
    pub fn totals(&self) -> InvoiceTotals {
        InvoiceTotals {
            subtotal: self.subtotal,
            discount_total: self.discount_total,
            tax_total: self.tax_total,
            shipping: self.shipping,
            rounding: self.rounding,
            grand_total: self.grand_total,
        }
    }

    /// Overwrites the stored totals snapshot.
    pub fn apply_totals(&mut self, totals: &InvoiceTotals) {
        self.subtotal = totals.subtotal;
        self.discount_total = totals.discount_total;
        self.tax_total = totals.tax_total;
        self.shipping = totals.shipping;
        self.rounding = totals.rounding;
        self.grand_total = totals.grand_total;
    }

    /// Amount still owed, floored at zero (overpayment owes nothing).
    pub fn outstanding(&self, total_paid: Money) -> Money {
        let remaining = self.grand_total - total_paid;
        if remaining.is_negative() {
            Money::zero()
        } else {
            remaining
        }
    }

    /// Checks if the due date has passed and the invoice is not paid.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_date < today && self.status != InvoiceStatus::Paid
    }
}

/// Input for creating an invoice.
///
/// Line taxes and totals are NOT accepted from the caller: the storage
/// adapter recalculates them from `line_items`, `shipping` and `rounding`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewInvoice {
    /// Explicit number; when absent one is issued from the numbering config.
    #[serde(default)]
    pub number: Option<String>,

    #[ts(as = "String")]
    pub date: NaiveDate,

    #[ts(as = "String")]
    pub due_date: NaiveDate,

    #[serde(default)]
    pub status: InvoiceStatus,

    pub client_id: String,

    pub line_items: Vec<LineItem>,

    #[serde(default)]
    pub place_of_supply: Option<String>,

    #[serde(default)]
    pub reverse_charge: bool,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub terms: Option<String>,

    #[serde(default)]
    pub shipping: Money,

    #[serde(default)]
    pub rounding: Money,

    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

impl NewInvoice {
    /// A draft for `client_id` dated `date`, due after the default terms.
    pub fn new(client_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            number: None,
            date,
            due_date: date + Duration::days(DEFAULT_PAYMENT_TERMS_DAYS),
            status: InvoiceStatus::Draft,
            client_id: client_id.into(),
            line_items: Vec::new(),
            place_of_supply: None,
            reverse_charge: false,
            notes: None,
            terms: None,
            shipping: Money::zero(),
            rounding: Money::zero(),
            currency: default_currency(),
        }
    }

    pub fn with_lines(mut self, line_items: Vec<LineItem>) -> Self {
        self.line_items = line_items;
        self
    }

    pub fn with_place_of_supply(mut self, place_of_supply: impl Into<String>) -> Self {
        self.place_of_supply = Some(place_of_supply.into());
        self
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    /// Draft invoice converted from an accepted estimate.
    ///
    /// Client, lines and currency carry over; the invoice is dated `today`
    /// and due after the default payment terms.
    pub fn from_estimate(estimate: &Estimate, today: NaiveDate) -> Self {
        let mut invoice = NewInvoice::new(estimate.client_id.clone(), today)
            .with_lines(estimate.line_items.clone());
        invoice.currency = estimate.currency.clone();
        invoice.notes = estimate.notes.clone();
        invoice
    }
}

// =============================================================================
// Estimate
// =============================================================================

/// A quotation that may later become an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Estimate {
    pub id: String,

    pub number: String,

    #[ts(as = "String")]
    pub date: NaiveDate,

    pub status: EstimateStatus,

    pub client_id: String,

    pub line_items: Vec<LineItem>,

    pub subtotal: Money,
    pub tax_total: Money,
    pub grand_total: Money,

    pub currency: String,

    #[serde(default)]
    pub notes: Option<String>,
}

/// Input for creating an estimate. Totals are derived on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewEstimate {
    pub number: String,

    #[ts(as = "String")]
    pub date: NaiveDate,

    pub client_id: String,

    pub line_items: Vec<LineItem>,

    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default)]
    pub notes: Option<String>,
}

// =============================================================================
// Payment
// =============================================================================

/// Money received against an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Payment {
    pub id: String,

    pub invoice_id: String,

    /// Free-form method label ("UPI", "Bank transfer", "Cash").
    pub method: String,

    /// Always > 0.
    pub amount: Money,

    #[ts(as = "String")]
    pub date: NaiveDate,

    #[serde(default)]
    pub reference: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

/// Input for recording a payment; the invoice id comes from the call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewPayment {
    pub method: String,

    pub amount: Money,

    #[ts(as = "String")]
    pub date: NaiveDate,

    #[serde(default)]
    pub reference: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

// =============================================================================
// Settings
// =============================================================================

/// The issuing organization, printed on every invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrganizationSettings {
    pub id: String,

    pub legal_name: String,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub gstin: Option<String>,

    #[serde(default)]
    pub pan: Option<String>,

    /// State code used when an invoice does not name a place of supply.
    #[serde(default)]
    pub default_place_of_supply: Option<String>,
}

/// Default GST components offered by the invoice form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TaxConfig {
    #[ts(type = "string")]
    pub default_cgst: Decimal,

    #[ts(type = "string")]
    pub default_sgst: Decimal,

    #[ts(type = "string")]
    pub default_igst: Decimal,

    pub inclusive_pricing: bool,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            default_cgst: Decimal::from(9),
            default_sgst: Decimal::from(9),
            default_igst: Decimal::from(18),
            inclusive_pricing: false,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
