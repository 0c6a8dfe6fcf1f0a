//! # imagicity-core: Pure Invoicing Logic for Imagicity
//!
//! This crate is the **heart** of Imagicity. It contains the GST engine,
//! invoice totals and the numbering policy as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Imagicity Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Browser UI                                   │   │
//! │  │    Client form ──► Invoice form ──► Totals panel ──► PDF       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON (camelCase, decimal strings)      │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ imagicity-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │    gst    │  │  totals   │  │ numbering │  │   draft   │  │   │
//! │  │   │ split_gst │  │ recalc_   │  │ maybe_    │  │ Invoice-  │  │   │
//! │  │   │ summary   │  │ line      │  │ reset     │  │ Draft     │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO LOGGING • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                imagicity-db (Storage Adapter)                   │   │
//! │  │        SQLite repositories, atomic invoice issuance             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (LineItem, Invoice, Client, NumberingConfig, ...)
//! - [`money`] - Decimal rupee amounts with half-up paise rounding
//! - [`gst`] - CGST/SGST/IGST split and interstate determination
//! - [`totals`] - Per-line recalculation and document totals
//! - [`numbering`] - Invoice number format, yearly reset, counter advance
//! - [`draft`] - Form-state adapter that recalculates on every edit
//! - [`summary`] - Outstanding receivables, overdue count, revenue per client
//! - [`error`] - Domain error types
//! - [`validation`] - Form-level input rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output; the clock is injectable
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Decimal Money**: no floats; rounding happens only in the GST split
//! 4. **Explicit Errors**: negative amounts are rejected, never clamped
//!
//! ## Example Usage
//!
//! ```rust
//! use imagicity_core::totals::{calculate_invoice_totals, recalc_line, TotalsAdjustments};
//! use imagicity_core::{DiscountType, LineItem, Money};
//! use rust_decimal::Decimal;
//!
//! let logo = LineItem::new("Logo design", Decimal::ONE, Money::from_rupees(12000))
//!     .with_discount(DiscountType::PercentOfLine, Decimal::TEN);
//! let logo = recalc_line(&logo, false).unwrap();
//! assert_eq!(logo.cgst, Money::from_rupees(972));
//!
//! let totals = calculate_invoice_totals(&[logo], TotalsAdjustments::default());
//! assert_eq!(totals.grand_total, Money::from_rupees(12744));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod draft;
pub mod error;
pub mod gst;
pub mod money;
pub mod numbering;
pub mod summary;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use imagicity_core::Money` instead of
// `use imagicity_core::money::Money`

pub use draft::{InvoiceDraft, LineEdit};
pub use error::{CoreError, CoreResult, ValidationError};
pub use gst::{is_interstate, split_gst, GstSplit, GstSummary};
pub use money::Money;
pub use summary::{summarize_invoices, ClientRevenue, InvoiceSummary};
pub use totals::{calculate_invoice_totals, recalc_line, recalc_lines, InvoiceTotals, TotalsAdjustments};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// GST percentage applied to new lines.
pub const DEFAULT_GST_RATE: u32 = 18;

/// Prefix of the default numbering config.
pub const DEFAULT_INVOICE_PREFIX: &str = "IMAGI";

/// Minimum digits of the counter part of an invoice number.
pub const NUMBER_PAD_WIDTH: usize = 4;

/// Days between invoice date and due date for new and converted invoices.
pub const DEFAULT_PAYMENT_TERMS_DAYS: i64 = 7;

/// Currency of every document.
///
/// ## Why a constant?
/// The tool only issues rupee invoices; the `currency` column exists so
/// exports stay self-describing.
pub const DEFAULT_CURRENCY: &str = "INR";
