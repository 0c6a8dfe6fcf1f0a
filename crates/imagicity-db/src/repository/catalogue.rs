//! # Catalogue Item Repository
//!
//! Products and services that can be dropped onto an invoice or estimate.
//!
//! ## Usage
//! ```rust,ignore
//! let repo = db.catalogue();
//!
//! // Search by name, SKU or HSN/SAC
//! let items = repo.list(Some("photo")).await?;
//!
//! // Turn a catalogue entry into an invoice line
//! let line = items[0].to_line_item();
//! ```
//!
//! Items are not referenced by foreign key: a line keeps its own copy of
//! description and price, so removing an item never changes an issued
//! invoice.

use chrono::Utc;
use imagicity_core::validation::validate_unit_price;
use imagicity_core::{CatalogueItem, CoreError, ValidationError};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::{money_column, money_text};
use crate::error::{DbError, DbResult};

const ITEM_COLUMNS: &str = r#"
    id, name, hsn_or_sac, sku, unit, price, tax_preference, description
"#;

/// Repository for catalogue item operations.
#[derive(Debug, Clone)]
pub struct CatalogueItemRepository {
    pool: SqlitePool,
}

impl CatalogueItemRepository {
    /// Creates a new CatalogueItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogueItemRepository { pool }
    }

    /// Inserts a catalogue item.
    ///
    /// ## Errors
    /// * `DbError::Core` - Blank name or negative price
    /// * `DbError::UniqueViolation` - SKU already used by another item
    pub async fn insert(&self, item: &CatalogueItem) -> DbResult<CatalogueItem> {
        validate_item(item)?;
        debug!(id = %item.id, name = %item.name, "Inserting catalogue item");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO items (
                id, name, hsn_or_sac, sku, unit, price, tax_preference,
                description, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?9
            )
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.hsn_or_sac)
        .bind(&item.sku)
        .bind(&item.unit)
        .bind(money_text(item.price))
        .bind(item.tax_preference)
        .bind(&item.description)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| sku_conflict(e, item))?;

        Ok(item.clone())
    }

    /// Gets a catalogue item by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<CatalogueItem>> {
        let sql = format!("SELECT {} FROM items WHERE id = ?1", ITEM_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(item_from_row).transpose()
    }

    /// Lists items ordered by name.
    ///
    /// `search` is a case-insensitive substring of the name, SKU or HSN/SAC
    /// code; blank means everything.
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<CatalogueItem>> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()));

        debug!(search = ?pattern, "Listing catalogue items");

        let sql = format!(
            r#"
            SELECT {}
            FROM items
            WHERE ?1 IS NULL
               OR lower(name) LIKE ?1
               OR lower(sku) LIKE ?1
               OR lower(hsn_or_sac) LIKE ?1
            ORDER BY name COLLATE NOCASE
            "#,
            ITEM_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(item_from_row).collect()
    }

    /// Replaces every editable field of an existing item.
    pub async fn update(&self, item: &CatalogueItem) -> DbResult<CatalogueItem> {
        validate_item(item)?;
        debug!(id = %item.id, "Updating catalogue item");

        let result = sqlx::query(
            r#"
            UPDATE items SET
                name = ?2,
                hsn_or_sac = ?3,
                sku = ?4,
                unit = ?5,
                price = ?6,
                tax_preference = ?7,
                description = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.hsn_or_sac)
        .bind(&item.sku)
        .bind(&item.unit)
        .bind(money_text(item.price))
        .bind(item.tax_preference)
        .bind(&item.description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| sku_conflict(e, item))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CatalogueItem", &item.id));
        }

        Ok(item.clone())
    }

    /// Removes an item from the catalogue.
    pub async fn remove(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Removing catalogue item");

        let result = sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CatalogueItem", id));
        }

        Ok(())
    }
}

fn validate_item(item: &CatalogueItem) -> DbResult<()> {
    if item.name.trim().is_empty() {
        return Err(CoreError::from(ValidationError::Required {
            field: "name".to_string(),
        })
        .into());
    }
    validate_unit_price(item.price).map_err(CoreError::from)?;
    Ok(())
}

fn sku_conflict(err: sqlx::Error, item: &CatalogueItem) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { field, .. } => {
            DbError::duplicate(field, item.sku.clone().unwrap_or_default())
        }
        other => other,
    }
}

fn item_from_row(row: &SqliteRow) -> DbResult<CatalogueItem> {
    Ok(CatalogueItem {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        hsn_or_sac: row.try_get("hsn_or_sac")?,
        sku: row.try_get("sku")?,
        unit: row.try_get("unit")?,
        price: money_column(row, "price")?,
        tax_preference: row.try_get("tax_preference")?,
        description: row.try_get("description")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
