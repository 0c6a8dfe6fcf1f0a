//! # Repository Module
//!
//! Database repository implementations for Imagicity.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  Caller (REST handler, seed binary)                                    │
//! │       │                                                                 │
//! │       │  db.invoices().create(new_invoice)                             │
//! │       ▼                                                                 │
//! │  InvoiceRepository                                                     │
//! │  ├── recalculates lines and totals (imagicity-core)                    │
//! │  ├── issues the number (imagicity-core numbering)                      │
//! │  └── writes rows inside one BEGIN IMMEDIATE transaction                │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Repositories are cheap handles over a cloned SqlitePool; callers      │
//! │  receive them explicitly, there is no global store.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Column Encoding
//! - Amounts: TEXT holding the exact decimal (`"1180.00"`)
//! - Line items, tags, settings values: TEXT holding JSON
//! - Dates: TEXT `YYYY-MM-DD`; timestamps: TEXT RFC 3339
//!
//! ## Available Repositories
//!
//! - [`SettingsRepository`] - Numbering, organization and tax settings
//! - [`ClientRepository`] - Client CRUD and search
//! - [`CatalogueItemRepository`] - Products and services for new lines
//! - [`InvoiceRepository`] - Invoice issuance, updates and payments
//! - [`EstimateRepository`] - Estimates and conversion to invoices

pub mod catalogue;
pub mod client;
pub mod estimate;
pub mod invoice;
pub mod settings;

pub use catalogue::CatalogueItemRepository;
pub use client::ClientRepository;
pub use estimate::EstimateRepository;
pub use invoice::InvoiceRepository;
pub use settings::SettingsRepository;

use std::str::FromStr;

use imagicity_core::Money;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::error::{DbError, DbResult};

/// Encodes an amount for a TEXT column.
pub(crate) fn money_text(amount: Money) -> String {
    amount.amount().to_string()
}

/// Decodes an amount from a TEXT column.
pub(crate) fn money_column(row: &SqliteRow, column: &str) -> DbResult<Money> {
    let raw: String = row.try_get(column)?;
    parse_money(column, &raw)
}

pub(crate) fn parse_money(column: &str, raw: &str) -> DbResult<Money> {
    Decimal::from_str(raw)
        .map(Money::new)
        .map_err(|e| DbError::invalid_data(column, e))
}

/// Decodes a JSON TEXT column.
pub(crate) fn json_column<T: DeserializeOwned>(row: &SqliteRow, column: &str) -> DbResult<T> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw).map_err(|e| DbError::invalid_data(column, e))
}
