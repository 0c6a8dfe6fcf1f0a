//! # imagicity-db: Storage Adapter for Imagicity
//!
//! This crate persists invoices, estimates, payments, clients, catalogue
//! items and settings in SQLite using sqlx, and owns the atomic issuance of invoice numbers.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Imagicity Data Flow                              │
//! │                                                                         │
//! │  Caller (REST handler, seed binary)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  imagicity-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ SettingsRepo  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ClientRepo    │    │ 001_initial_ │  │   │
//! │  │   │ AppConfig     │    │ InvoiceRepo   │    │ schema.sql   │  │   │
//! │  │   │               │    │ EstimateRepo  │    │ 002_catalog_ │  │   │
//! │  │   │               │    │ CatalogueRepo │    │ items.sql    │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │ totals, GST, numbering        │   │
//! │  │                                ▼                                │   │
//! │  │                          imagicity-core                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/imagicity/imagicity.db (Linux default)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Layered application configuration (defaults, TOML, env)
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use imagicity_db::{AppConfig, Database};
//!
//! let config = AppConfig::load(None)?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let invoice = db.invoices().create(new_invoice).await?;
//! println!("Issued {}", invoice.number);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::AppConfig;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    CatalogueItemRepository, ClientRepository, EstimateRepository, InvoiceRepository,
    SettingsRepository,
};
