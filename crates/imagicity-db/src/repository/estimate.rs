//! # Estimate Repository
//!
//! Database operations for estimates (quotations).
//!
//! Estimates carry no place of supply of their own. Their lines are priced
//! against the organization's default place of supply, the same one a
//! converted invoice falls back to, and intra-state when none is set.
//! Converting one goes through [`InvoiceRepository::create`], which issues
//! the invoice number.

use chrono::{Local, Utc};
use imagicity_core::validation::validate_line_item;
use imagicity_core::{
    calculate_invoice_totals, is_interstate, recalc_lines, CoreError, Estimate, EstimateStatus, Invoice,
    NewEstimate, NewInvoice, TotalsAdjustments,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use super::invoice::{client_state_code, default_place_of_supply};
use super::{json_column, money_column, money_text};
use crate::error::{DbError, DbResult};
use crate::repository::InvoiceRepository;

const ESTIMATE_COLUMNS: &str = r#"
    id, number, date, status, client_id, line_items,
    subtotal, tax_total, grand_total, currency, notes
"#;

/// Repository for estimate database operations.
#[derive(Debug, Clone)]
pub struct EstimateRepository {
    pool: SqlitePool,
}

impl EstimateRepository {
    /// Creates a new EstimateRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EstimateRepository { pool }
    }

    /// Inserts a draft estimate with recalculated lines and totals.
    pub async fn insert(&self, new: NewEstimate) -> DbResult<Estimate> {
        for line in &new.line_items {
            validate_line_item(line).map_err(CoreError::from)?;
        }

        let mut conn = self.pool.acquire().await?;
        let client_state = client_state_code(&mut conn, &new.client_id).await?;
        let place_of_supply = default_place_of_supply(&mut conn).await?;

        let interstate = is_interstate(client_state.as_deref(), place_of_supply.as_deref());
        let line_items = recalc_lines(&new.line_items, interstate)?;
        let totals = calculate_invoice_totals(&line_items, TotalsAdjustments::default());

        let estimate = Estimate {
            id: Uuid::new_v4().to_string(),
            number: new.number,
            date: new.date,
            status: EstimateStatus::Draft,
            client_id: new.client_id,
            line_items,
            subtotal: totals.subtotal,
            tax_total: totals.tax_total,
            grand_total: totals.grand_total,
            currency: new.currency,
            notes: new.notes,
        };

        debug!(id = %estimate.id, number = %estimate.number, "Inserting estimate");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO estimates (
                id, number, date, status, client_id, line_items,
                subtotal, tax_total, grand_total, currency, notes,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11,
                ?12, ?12
            )
            "#,
        )
        .bind(&estimate.id)
        .bind(&estimate.number)
        .bind(estimate.date)
        .bind(estimate.status)
        .bind(&estimate.client_id)
        .bind(serde_json::to_string(&estimate.line_items)?)
        .bind(money_text(estimate.subtotal))
        .bind(money_text(estimate.tax_total))
        .bind(money_text(estimate.grand_total))
        .bind(&estimate.currency)
        .bind(&estimate.notes)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &estimate.number),
            other => other,
        })?;

        Ok(estimate)
    }

    /// Gets an estimate by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Estimate>> {
        let sql = format!("SELECT {} FROM estimates WHERE id = ?1", ESTIMATE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(estimate_from_row).transpose()
    }

    /// Lists estimates, newest first, optionally filtered by status.
    pub async fn list(&self, status: Option<EstimateStatus>) -> DbResult<Vec<Estimate>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM estimates
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY created_at DESC, rowid DESC
            "#,
            ESTIMATE_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(estimate_from_row).collect()
    }

    /// Sets the status of an estimate (sent, accepted, rejected).
    pub async fn set_status(&self, id: &str, status: EstimateStatus) -> DbResult<()> {
        debug!(id = %id, status = ?status, "Updating estimate status");

        let result = sqlx::query("UPDATE estimates SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Estimate", id));
        }

        Ok(())
    }

    /// Turns an estimate into a draft invoice dated today.
    ///
    /// Client, lines, currency and notes carry over; the invoice is due
    /// after the default payment terms and numbered by the numbering policy.
    /// The estimate itself is left untouched.
    pub async fn convert_to_invoice(&self, id: &str) -> DbResult<Invoice> {
        let estimate = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Estimate", id))?;

        let today = Local::now().date_naive();
        let invoice = InvoiceRepository::new(self.pool.clone())
            .create(NewInvoice::from_estimate(&estimate, today))
            .await?;

        info!(
            estimate = %estimate.number,
            invoice = %invoice.number,
            "Estimate converted to invoice"
        );
        Ok(invoice)
    }
}

fn estimate_from_row(row: &SqliteRow) -> DbResult<Estimate> {
    Ok(Estimate {
        id: row.try_get("id")?,
        number: row.try_get("number")?,
        date: row.try_get("date")?,
        status: row.try_get("status")?,
        client_id: row.try_get("client_id")?,
        line_items: json_column(row, "line_items")?,
        subtotal: money_column(row, "subtotal")?,
        tax_total: money_column(row, "tax_total")?,
        grand_total: money_column(row, "grand_total")?,
        currency: row.try_get("currency")?,
        notes: row.try_get("notes")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
