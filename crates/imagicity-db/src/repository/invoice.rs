//! # Invoice Repository
//!
//! Database operations for invoices and their payments.
//!
//! ## Invoice Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Invoice Lifecycle                                 │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── create() → Invoice { status: Draft, number: IMAGI260001 }      │
//! │         (lines recalculated, totals derived, number issued)            │
//! │                                                                         │
//! │  2. EDIT                                                               │
//! │     └── update_lines() → lines recalculated, totals re-derived         │
//! │                                                                         │
//! │  3. SEND                                                               │
//! │     └── mark_sent() → Draft ──► Sent                                   │
//! │     └── mark_overdue(today) → Sent past due ──► Overdue                │
//! │                                                                         │
//! │  4. SETTLE                                                             │
//! │     └── record_payment() → Payment row, status re-derived              │
//! │         Σ payments ≥ grand_total ──► Paid                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Number Issuance
//! ```text
//! BEGIN IMMEDIATE                      ← takes the write lock up front
//!   read numbering settings row
//!   read issue time of the latest row  ← drives the yearly reset
//!   reset → format → advance           (imagicity-core)
//!   INSERT invoice
//!   write advanced numbering row
//! COMMIT                               (rolled back on error or drop)
//! ```
//! Two concurrent creates can never read the same counter: the second one
//! waits on SQLite's busy timeout until the first commits. The UNIQUE index
//! on `invoices.number` is the backstop.
//!
//! The yearly reset looks at when the latest invoice was *issued*
//! (`created_at`), never at its document date, so a backdated invoice does
//! not rewind the counter.

use chrono::{DateTime, Local, NaiveDate, Utc};
use imagicity_core::numbering::{format_number, issue_number, maybe_reset};
use imagicity_core::validation::{validate_line_item, validate_payment_amount};
use imagicity_core::{
    calculate_invoice_totals, is_interstate, recalc_lines, status_after_payment,
    summarize_invoices, CoreError, Invoice, InvoiceStatus, InvoiceSummary, LineItem, Money,
    NewInvoice, NewPayment, Payment, TotalsAdjustments,
};
use std::collections::HashMap;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::settings::{read_numbering, read_organization, write_numbering};
use super::{json_column, money_column, money_text, parse_money};
use crate::error::{DbError, DbResult};

/// Takes SQLite's write lock at BEGIN so a read-then-write transaction
/// waits on the busy timeout instead of failing on lock upgrade.
const BEGIN_IMMEDIATE: &str = "BEGIN IMMEDIATE";

const INVOICE_COLUMNS: &str = r#"
    id, number, date, due_date, status, client_id, line_items,
    place_of_supply, reverse_charge, notes, terms,
    subtotal, discount_total, tax_total, shipping, rounding, grand_total,
    currency, created_at, updated_at
"#;

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Creates an invoice and issues its number atomically.
    ///
    /// ## What This Does
    /// 1. Resolves the place of supply (falling back to the organization's
    ///    default), derives interstate against the client's state code, then
    ///    recalculates every line and the totals
    /// 2. Applies the yearly reset against the day the latest invoice was
    ///    issued
    /// 3. Uses `new.number` when given (non-blank), otherwise the formatted
    ///    number; the counter advances either way
    /// 4. Inserts the invoice and persists the advanced counter
    ///
    /// ## Errors
    /// * `DbError::NotFound` - Client does not exist
    /// * `DbError::UniqueViolation` - Explicit number already taken
    /// * `DbError::Core` - A line failed validation or recalculation
    ///
    /// Nothing is written when an error is returned.
    pub async fn create(&self, new: NewInvoice) -> DbResult<Invoice> {
        let mut tx = self
            .pool
            .begin_with(BEGIN_IMMEDIATE)
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        match create_in(&mut tx, &new).await {
            Ok(invoice) => {
                tx.commit()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

                info!(
                    id = %invoice.id,
                    number = %invoice.number,
                    grand_total = %invoice.grand_total,
                    "Invoice created"
                );
                Ok(invoice)
            }
            Err(err) => {
                warn!(client_id = %new.client_id, error = %err, "Invoice creation failed, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    /// The number the next `create` would issue. Does not advance.
    pub async fn peek_next_number(&self) -> DbResult<String> {
        let mut conn = self.pool.acquire().await?;
        let config = read_numbering(&mut conn).await?;
        let last_issued = last_issued_on(&mut conn).await?;

        Ok(format_number(&maybe_reset(&config, last_issued)))
    }

    /// Gets an invoice by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let mut conn = self.pool.acquire().await?;
        fetch_invoice(&mut conn, id).await
    }

    /// Lists invoices, newest first, optionally filtered by status.
    pub async fn list(&self, status: Option<InvoiceStatus>) -> DbResult<Vec<Invoice>> {
        debug!(status = ?status, "Listing invoices");

        let sql = format!(
            r#"
            SELECT {}
            FROM invoices
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY created_at DESC, rowid DESC
            "#,
            INVOICE_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(invoice_from_row).collect()
    }

    /// Replaces the lines of an invoice, recalculating them and the totals.
    ///
    /// Shipping and rounding keep their stored values.
    pub async fn update_lines(&self, id: &str, line_items: Vec<LineItem>) -> DbResult<Invoice> {
        for line in &line_items {
            validate_line_item(line).map_err(CoreError::from)?;
        }

        let mut tx = self.pool.begin_with(BEGIN_IMMEDIATE).await?;

        let mut invoice = fetch_invoice(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))?;
        let client_state = client_state_code(&mut tx, &invoice.client_id).await?;

        let interstate = is_interstate(client_state.as_deref(), invoice.place_of_supply.as_deref());
        invoice.line_items = recalc_lines(&line_items, interstate)?;
        let totals = calculate_invoice_totals(
            &invoice.line_items,
            TotalsAdjustments {
                shipping: invoice.shipping,
                rounding: invoice.rounding,
            },
        );
        invoice.apply_totals(&totals);
        invoice.updated_at = Utc::now();

        debug!(id = %id, lines = invoice.line_items.len(), "Updating invoice lines");

        sqlx::query(
            r#"
            UPDATE invoices SET
                line_items = ?2,
                subtotal = ?3,
                discount_total = ?4,
                tax_total = ?5,
                grand_total = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(serde_json::to_string(&invoice.line_items)?)
        .bind(money_text(invoice.subtotal))
        .bind(money_text(invoice.discount_total))
        .bind(money_text(invoice.tax_total))
        .bind(money_text(invoice.grand_total))
        .bind(invoice.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(invoice)
    }

    /// Moves a draft to `Sent`. Any other status is left as is.
    pub async fn mark_sent(&self, id: &str) -> DbResult<Invoice> {
        let result = sqlx::query(
            "UPDATE invoices SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = ?4",
        )
        .bind(id)
        .bind(InvoiceStatus::Sent)
        .bind(Utc::now())
        .bind(InvoiceStatus::Draft)
        .execute(&self.pool)
        .await?;

        debug!(id = %id, changed = result.rows_affected(), "Marking invoice sent");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))
    }

    /// Flags every sent invoice that [`Invoice::is_overdue`] on `today`.
    ///
    /// Drafts stay drafts until they are sent.
    ///
    /// ## Returns
    /// Number of invoices moved to `Overdue`.
    pub async fn mark_overdue(&self, today: NaiveDate) -> DbResult<u64> {
        let mut tx = self.pool.begin_with(BEGIN_IMMEDIATE).await?;

        let sql = format!("SELECT {} FROM invoices WHERE status = ?1", INVOICE_COLUMNS);
        let rows = sqlx::query(&sql)
            .bind(InvoiceStatus::Sent)
            .fetch_all(&mut *tx)
            .await?;

        let now = Utc::now();
        let mut count = 0;
        for row in &rows {
            let invoice = invoice_from_row(row)?;
            if !invoice.is_overdue(today) {
                continue;
            }

            sqlx::query("UPDATE invoices SET status = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(&invoice.id)
                .bind(InvoiceStatus::Overdue)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            count += 1;
        }

        tx.commit().await?;

        if count > 0 {
            info!(count, "Invoices marked overdue");
        }

        Ok(count)
    }

    /// Records a payment and re-derives the invoice status.
    ///
    /// ## Returns
    /// The invoice after settlement: `Paid` once payments cover the grand
    /// total, otherwise its status is unchanged.
    pub async fn record_payment(&self, invoice_id: &str, payment: NewPayment) -> DbResult<Invoice> {
        validate_payment_amount(payment.amount).map_err(CoreError::from)?;

        let mut tx = self.pool.begin_with(BEGIN_IMMEDIATE).await?;

        let mut invoice = fetch_invoice(&mut tx, invoice_id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", invoice_id))?;

        let payment_id = Uuid::new_v4().to_string();
        debug!(
            invoice_id = %invoice_id,
            payment_id = %payment_id,
            amount = %payment.amount,
            "Recording payment"
        );

        sqlx::query(
            r#"
            INSERT INTO payments (id, invoice_id, method, amount, date, reference, notes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&payment_id)
        .bind(invoice_id)
        .bind(&payment.method)
        .bind(money_text(payment.amount))
        .bind(payment.date)
        .bind(&payment.reference)
        .bind(&payment.notes)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let total_paid = sum_payments(&mut tx, invoice_id).await?;
        let status = status_after_payment(invoice.status, invoice.grand_total, total_paid);

        if status != invoice.status {
            invoice.status = status;
            invoice.updated_at = Utc::now();

            sqlx::query("UPDATE invoices SET status = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(invoice_id)
                .bind(status)
                .bind(invoice.updated_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(
            invoice_id = %invoice_id,
            total_paid = %total_paid,
            status = %invoice.status,
            "Payment recorded"
        );
        Ok(invoice)
    }

    /// Payments against an invoice, oldest first.
    pub async fn payments(&self, invoice_id: &str) -> DbResult<Vec<Payment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, invoice_id, method, amount, date, reference, notes
            FROM payments
            WHERE invoice_id = ?1
            ORDER BY date, created_at
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(payment_from_row).collect()
    }

    /// Sum of all payments against an invoice.
    pub async fn total_paid(&self, invoice_id: &str) -> DbResult<Money> {
        let mut conn = self.pool.acquire().await?;
        sum_payments(&mut conn, invoice_id).await
    }

    /// Receivables summary over every invoice as of `today`.
    pub async fn summary(&self, today: NaiveDate) -> DbResult<InvoiceSummary> {
        let invoices = self.list(None).await?;

        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT invoice_id, amount FROM payments")
                .fetch_all(&self.pool)
                .await?;

        let mut paid: HashMap<String, Money> = HashMap::new();
        for (invoice_id, raw) in rows {
            let amount = parse_money("payments.amount", &raw)?;
            *paid.entry(invoice_id).or_default() += amount;
        }

        Ok(summarize_invoices(&invoices, &paid, today))
    }

    /// Deletes an invoice and its payments.
    ///
    /// The numbering counter is not rewound.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting invoice");

        let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        Ok(())
    }
}

// =============================================================================
// Connection-level helpers
// =============================================================================
// These take a bare connection so they run inside whatever transaction the
// caller holds. They must never touch the pool: the in-memory test pool has
// a single connection and would deadlock.

async fn create_in(conn: &mut SqliteConnection, new: &NewInvoice) -> DbResult<Invoice> {
    for line in &new.line_items {
        validate_line_item(line).map_err(CoreError::from)?;
    }

    let client_state = client_state_code(conn, &new.client_id).await?;
    let place_of_supply = match non_blank(new.place_of_supply.as_deref()) {
        Some(place) => Some(place.to_string()),
        None => default_place_of_supply(conn).await?,
    };
    let interstate = is_interstate(client_state.as_deref(), place_of_supply.as_deref());
    let line_items = recalc_lines(&new.line_items, interstate)?;
    let totals = calculate_invoice_totals(
        &line_items,
        TotalsAdjustments {
            shipping: new.shipping,
            rounding: new.rounding,
        },
    );

    let config = read_numbering(conn).await?;
    let last_issued = last_issued_on(conn).await?;
    let issued = issue_number(&config, last_issued);

    let number = match non_blank(new.number.as_deref()) {
        Some(explicit) => explicit.to_string(),
        None => issued.number,
    };

    debug!(
        number = %number,
        interstate,
        next_number = issued.next.next_number,
        "Issuing invoice number"
    );

    let now = Utc::now();
    let mut invoice = Invoice {
        id: Uuid::new_v4().to_string(),
        number,
        date: new.date,
        due_date: new.due_date,
        status: new.status,
        client_id: new.client_id.clone(),
        line_items,
        place_of_supply,
        reverse_charge: new.reverse_charge,
        notes: new.notes.clone(),
        terms: new.terms.clone(),
        subtotal: Money::zero(),
        discount_total: Money::zero(),
        tax_total: Money::zero(),
        shipping: Money::zero(),
        rounding: Money::zero(),
        grand_total: Money::zero(),
        currency: new.currency.clone(),
        created_at: now,
        updated_at: now,
    };
    invoice.apply_totals(&totals);

    insert_invoice(conn, &invoice).await?;
    write_numbering(conn, &issued.next).await?;

    Ok(invoice)
}

async fn insert_invoice(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, number, date, due_date, status, client_id, line_items,
            place_of_supply, reverse_charge, notes, terms,
            subtotal, discount_total, tax_total, shipping, rounding, grand_total,
            currency, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7,
            ?8, ?9, ?10, ?11,
            ?12, ?13, ?14, ?15, ?16, ?17,
            ?18, ?19, ?20
        )
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.number)
    .bind(invoice.date)
    .bind(invoice.due_date)
    .bind(invoice.status)
    .bind(&invoice.client_id)
    .bind(serde_json::to_string(&invoice.line_items)?)
    .bind(&invoice.place_of_supply)
    .bind(invoice.reverse_charge)
    .bind(&invoice.notes)
    .bind(&invoice.terms)
    .bind(money_text(invoice.subtotal))
    .bind(money_text(invoice.discount_total))
    .bind(money_text(invoice.tax_total))
    .bind(money_text(invoice.shipping))
    .bind(money_text(invoice.rounding))
    .bind(money_text(invoice.grand_total))
    .bind(&invoice.currency)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &invoice.number),
        other => other,
    })?;

    Ok(())
}

/// State code of a client; `NotFound` when the client does not exist.
pub(crate) async fn client_state_code(
    conn: &mut SqliteConnection,
    client_id: &str,
) -> DbResult<Option<String>> {
    let row: Option<Option<String>> =
        sqlx::query_scalar("SELECT state_code FROM clients WHERE id = ?1")
            .bind(client_id)
            .fetch_optional(&mut *conn)
            .await?;

    row.ok_or_else(|| DbError::not_found("Client", client_id))
}

/// Local calendar day on which the most recent invoice was issued.
async fn last_issued_on(conn: &mut SqliteConnection) -> DbResult<Option<NaiveDate>> {
    let created_at: Option<DateTime<Utc>> = sqlx::query_scalar(
        "SELECT created_at FROM invoices ORDER BY created_at DESC, rowid DESC LIMIT 1",
    )
    .fetch_optional(&mut *conn)
    .await?;

    Ok(created_at.map(|at| at.with_timezone(&Local).date_naive()))
}

/// The organization's default place of supply, if one is configured.
pub(crate) async fn default_place_of_supply(
    conn: &mut SqliteConnection,
) -> DbResult<Option<String>> {
    let organization = read_organization(conn).await?;
    Ok(organization
        .and_then(|org| org.default_place_of_supply)
        .filter(|code| !code.trim().is_empty()))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

async fn fetch_invoice(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Invoice>> {
    let sql = format!("SELECT {} FROM invoices WHERE id = ?1", INVOICE_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(invoice_from_row).transpose()
}

/// Amounts are summed as decimals in Rust; SQLite's SUM would go through
/// floating point.
async fn sum_payments(conn: &mut SqliteConnection, invoice_id: &str) -> DbResult<Money> {
    let amounts: Vec<String> = sqlx::query_scalar("SELECT amount FROM payments WHERE invoice_id = ?1")
        .bind(invoice_id)
        .fetch_all(&mut *conn)
        .await?;

    amounts
        .iter()
        .map(|raw| parse_money("payments.amount", raw))
        .sum()
}

fn invoice_from_row(row: &SqliteRow) -> DbResult<Invoice> {
    Ok(Invoice {
        id: row.try_get("id")?,
        number: row.try_get("number")?,
        date: row.try_get("date")?,
        due_date: row.try_get("due_date")?,
        status: row.try_get("status")?,
        client_id: row.try_get("client_id")?,
        line_items: json_column(row, "line_items")?,
        place_of_supply: row.try_get("place_of_supply")?,
        reverse_charge: row.try_get("reverse_charge")?,
        notes: row.try_get("notes")?,
        terms: row.try_get("terms")?,
        subtotal: money_column(row, "subtotal")?,
        discount_total: money_column(row, "discount_total")?,
        tax_total: money_column(row, "tax_total")?,
        shipping: money_column(row, "shipping")?,
        rounding: money_column(row, "rounding")?,
        grand_total: money_column(row, "grand_total")?,
        currency: row.try_get("currency")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn payment_from_row(row: &SqliteRow) -> DbResult<Payment> {
    Ok(Payment {
        id: row.try_get("id")?,
        invoice_id: row.try_get("invoice_id")?,
        method: row.try_get("method")?,
        amount: money_column(row, "amount")?,
        date: row.try_get("date")?,
        reference: row.try_get("reference")?,
        notes: row.try_get("notes")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Datelike, Duration, Local, TimeZone};
    use imagicity_core::{Client, DiscountType, NumberingConfig, OrganizationSettings, ResetPolicy};
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }

    fn yy() -> String {
        today().format("%y").to_string()
    }

    async fn setup() -> (Database, Client) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut client = Client::new("Demo Client", "Demo Client Pvt Ltd");
        client.state_code = Some("29".to_string());
        db.clients().insert(&client).await.unwrap();
        (db, client)
    }

    fn demo_lines() -> Vec<LineItem> {
        vec![
            LineItem::new("Brand Identity Package", dec!(1), Money::from_rupees(45000))
                .without_discount(),
            LineItem::new("Product Photography Session", dec!(1), Money::from_rupees(12000))
                .with_discount(DiscountType::PercentOfLine, dec!(10)),
        ]
    }

    fn new_invoice(client: &Client) -> NewInvoice {
        NewInvoice::new(&client.id, today())
            .with_lines(demo_lines())
            .with_place_of_supply("29")
    }

    fn organization(default_place_of_supply: &str) -> OrganizationSettings {
        OrganizationSettings {
            id: "org".to_string(),
            legal_name: "Imagicity Creative Studio".to_string(),
            address: None,
            gstin: None,
            pan: None,
            default_place_of_supply: Some(default_place_of_supply.to_string()),
        }
    }

    /// Rewrites an invoice's issue time to mid-year of the previous year.
    async fn issued_last_year(db: &Database, invoice_id: &str) {
        let issued = Local
            .with_ymd_and_hms(today().year() - 1, 6, 1, 12, 0, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc);

        sqlx::query("UPDATE invoices SET created_at = ?2 WHERE id = ?1")
            .bind(invoice_id)
            .bind(issued)
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_issues_sequential_numbers() {
        let (db, client) = setup().await;
        let repo = db.invoices();

        let first = repo.create(new_invoice(&client)).await.unwrap();
        let second = repo.create(new_invoice(&client)).await.unwrap();

        assert_eq!(first.number, format!("IMAGI{}0001", yy()));
        assert_eq!(second.number, format!("IMAGI{}0002", yy()));
        assert_eq!(db.settings().get_numbering().await.unwrap().next_number, 3);
    }

    #[tokio::test]
    async fn test_create_recalculates_intra_state() {
        let (db, client) = setup().await;
        let mut new = new_invoice(&client);
        // Caller-supplied tax is ignored
        new.line_items[0].igst = Money::from_rupees(999);

        let invoice = db.invoices().create(new).await.unwrap();

        assert_eq!(invoice.line_items[0].cgst, Money::from_rupees(4050));
        assert_eq!(invoice.line_items[0].sgst, Money::from_rupees(4050));
        assert!(invoice.line_items[0].igst.is_zero());
        assert_eq!(invoice.line_items[1].cgst, Money::from_rupees(972));
        assert_eq!(invoice.subtotal, Money::from_rupees(57000));
        assert_eq!(invoice.discount_total, Money::from_rupees(1200));
        assert_eq!(invoice.tax_total, Money::from_rupees(10044));
        assert_eq!(invoice.grand_total, Money::from_rupees(65844));
    }

    #[tokio::test]
    async fn test_create_recalculates_interstate() {
        let (db, client) = setup().await;
        let new = new_invoice(&client).with_place_of_supply("27");

        let invoice = db.invoices().create(new).await.unwrap();

        assert_eq!(invoice.line_items[0].igst, Money::from_rupees(8100));
        assert!(invoice.line_items[0].cgst.is_zero());
        assert_eq!(invoice.tax_total, Money::from_rupees(10044));
    }

    #[tokio::test]
    async fn test_stored_invoice_round_trips() {
        let (db, client) = setup().await;
        let mut new = new_invoice(&client);
        new.shipping = Money::new(dec!(150.50));
        new.rounding = Money::new(dec!(-0.50));
        new.notes = Some("Thank you".to_string());

        let created = db.invoices().create(new).await.unwrap();
        let loaded = db.invoices().get_by_id(&created.id).await.unwrap().unwrap();

        assert_eq!(loaded.number, created.number);
        assert_eq!(loaded.line_items, created.line_items);
        assert_eq!(loaded.totals(), created.totals());
        assert_eq!(loaded.grand_total, Money::new(dec!(65994)));
        assert_eq!(loaded.notes.as_deref(), Some("Thank you"));
    }

    #[tokio::test]
    async fn test_explicit_number_still_advances_counter() {
        let (db, client) = setup().await;
        let repo = db.invoices();

        let manual = repo
            .create(new_invoice(&client).with_number("MANUAL-7"))
            .await
            .unwrap();
        let next = repo.create(new_invoice(&client)).await.unwrap();

        assert_eq!(manual.number, "MANUAL-7");
        assert_eq!(next.number, format!("IMAGI{}0002", yy()));
    }

    #[tokio::test]
    async fn test_blank_explicit_number_is_ignored() {
        let (db, client) = setup().await;

        let invoice = db
            .invoices()
            .create(new_invoice(&client).with_number("   "))
            .await
            .unwrap();

        assert_eq!(invoice.number, format!("IMAGI{}0001", yy()));
    }

    #[tokio::test]
    async fn test_duplicate_number_rolls_back() {
        let (db, client) = setup().await;
        let repo = db.invoices();

        repo.create(new_invoice(&client).with_number("DUP-1"))
            .await
            .unwrap();
        let result = repo.create(new_invoice(&client).with_number("DUP-1")).await;

        match result {
            Err(DbError::UniqueViolation { value, .. }) => assert_eq!(value, "DUP-1"),
            other => panic!("expected UniqueViolation, got {:?}", other),
        }
        assert_eq!(db.settings().get_numbering().await.unwrap().next_number, 2);
        assert_eq!(repo.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_unknown_client() {
        let (db, client) = setup().await;
        let mut new = new_invoice(&client);
        new.client_id = "missing".to_string();

        let result = db.invoices().create(new).await;

        assert!(matches!(result, Err(DbError::NotFound { .. })));
        assert_eq!(db.settings().get_numbering().await.unwrap().next_number, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_line() {
        let (db, client) = setup().await;
        let new = new_invoice(&client).with_lines(vec![LineItem::new(
            "Refund",
            dec!(1),
            Money::from_rupees(-100),
        )]);

        let result = db.invoices().create(new).await;
        assert!(matches!(result, Err(DbError::Core(_))));
    }

    #[tokio::test]
    async fn test_yearly_reset_through_repository() {
        let (db, client) = setup().await;
        let repo = db.invoices();
        db.settings()
            .update_numbering(&NumberingConfig {
                next_number: 44,
                ..Default::default()
            })
            .await
            .unwrap();

        let old = repo
            .create(new_invoice(&client).with_number("IMAGI-OLD-44"))
            .await
            .unwrap();
        issued_last_year(&db, &old.id).await;

        assert_eq!(repo.peek_next_number().await.unwrap(), format!("IMAGI{}0001", yy()));

        let fresh = repo.create(new_invoice(&client)).await.unwrap();
        assert_eq!(fresh.number, format!("IMAGI{}0001", yy()));
        assert_eq!(db.settings().get_numbering().await.unwrap().next_number, 2);
    }

    #[tokio::test]
    async fn test_backdated_invoice_does_not_reset_counter() {
        let (db, client) = setup().await;
        let repo = db.invoices();
        let last_year = NaiveDate::from_ymd_opt(today().year() - 1, 12, 30).unwrap();

        let a = repo.create(new_invoice(&client)).await.unwrap();
        let b = repo
            .create(NewInvoice::new(&client.id, last_year).with_lines(demo_lines()))
            .await
            .unwrap();
        let c = repo.create(new_invoice(&client)).await.unwrap();
        let d = repo.create(new_invoice(&client)).await.unwrap();

        assert_eq!(b.date, last_year);
        assert_eq!(b.number, format!("IMAGI{}0002", yy()));
        assert_eq!(c.number, format!("IMAGI{}0003", yy()));

        let mut numbers = vec![a.number, b.number, c.number, d.number];
        numbers.sort();
        numbers.dedup();
        assert_eq!(numbers.len(), 4);
        assert_eq!(db.settings().get_numbering().await.unwrap().next_number, 5);
    }

    #[tokio::test]
    async fn test_place_of_supply_falls_back_to_organization_default() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut client = Client::new("Pune Client", "Pune Client LLP");
        client.state_code = Some("27".to_string());
        db.clients().insert(&client).await.unwrap();
        db.settings().update_organization(&organization("29")).await.unwrap();

        let new = NewInvoice::new(&client.id, today()).with_lines(demo_lines());
        assert!(new.place_of_supply.is_none());
        let invoice = db.invoices().create(new).await.unwrap();

        assert_eq!(invoice.place_of_supply.as_deref(), Some("29"));
        assert_eq!(invoice.line_items[0].igst, Money::from_rupees(8100));
        assert!(invoice.line_items[0].cgst.is_zero());

        let loaded = db.invoices().get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(loaded.place_of_supply.as_deref(), Some("29"));

        // Later edits keep pricing against the resolved place of supply
        let lines = vec![LineItem::new("Consulting", dec!(1), Money::from_rupees(1000))];
        let updated = db.invoices().update_lines(&invoice.id, lines).await.unwrap();
        assert_eq!(updated.line_items[0].igst, Money::from_rupees(180));
    }

    #[tokio::test]
    async fn test_explicit_place_of_supply_beats_organization_default() {
        let (db, client) = setup().await;
        db.settings().update_organization(&organization("27")).await.unwrap();

        let invoice = db.invoices().create(new_invoice(&client)).await.unwrap();

        assert_eq!(invoice.place_of_supply.as_deref(), Some("29"));
        assert!(invoice.line_items[0].igst.is_zero());
        assert_eq!(invoice.line_items[0].cgst, Money::from_rupees(4050));
    }

    #[tokio::test]
    async fn test_no_place_of_supply_anywhere_is_intra_state() {
        let (db, client) = setup().await;

        let invoice = db
            .invoices()
            .create(NewInvoice::new(&client.id, today()).with_lines(demo_lines()))
            .await
            .unwrap();

        assert!(invoice.place_of_supply.is_none());
        assert_eq!(invoice.line_items[0].cgst, Money::from_rupees(4050));
    }

    #[tokio::test]
    async fn test_cancelled_create_leaves_pool_usable() {
        let (db, client) = setup().await;
        let repo = db.invoices();

        for micros in [0u64, 10, 50, 200, 1000] {
            let attempt = tokio::time::timeout(
                std::time::Duration::from_micros(micros),
                repo.create(new_invoice(&client)),
            )
            .await;
            if let Ok(result) = attempt {
                result.unwrap();
            }
        }

        let issued = repo.create(new_invoice(&client)).await.unwrap();
        repo.mark_sent(&issued.id).await.unwrap();

        let invoices = repo.list(None).await.unwrap();
        let mut numbers: Vec<_> = invoices.iter().map(|i| i.number.clone()).collect();
        numbers.sort();
        numbers.dedup();
        assert_eq!(numbers.len(), invoices.len());

        let next_number = db.settings().get_numbering().await.unwrap().next_number;
        assert_eq!(next_number as usize, invoices.len() + 1);
    }

    #[tokio::test]
    async fn test_never_policy_keeps_counting() {
        let (db, client) = setup().await;
        let repo = db.invoices();
        db.settings()
            .update_numbering(&NumberingConfig {
                prefix: "INV".to_string(),
                next_number: 44,
                reset_policy: ResetPolicy::Never,
            })
            .await
            .unwrap();

        let last_year = NaiveDate::from_ymd_opt(today().year() - 1, 6, 1).unwrap();
        repo.create(NewInvoice::new(&client.id, last_year)).await.unwrap();
        let fresh = repo.create(new_invoice(&client)).await.unwrap();

        assert_eq!(fresh.number, format!("INV{}0045", yy()));
    }

    #[tokio::test]
    async fn test_peek_does_not_advance() {
        let (db, _client) = setup().await;
        let repo = db.invoices();

        let first = repo.peek_next_number().await.unwrap();
        let second = repo.peek_next_number().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(db.settings().get_numbering().await.unwrap().next_number, 1);
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let (db, client) = setup().await;
        let repo = db.invoices();

        let a = repo.create(new_invoice(&client)).await.unwrap();
        repo.create(new_invoice(&client)).await.unwrap();
        repo.mark_sent(&a.id).await.unwrap();

        assert_eq!(repo.list(None).await.unwrap().len(), 2);
        let sent = repo.list(Some(InvoiceStatus::Sent)).await.unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id, a.id);
        assert_eq!(repo.list(Some(InvoiceStatus::Draft)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_lines_recalculates() {
        let (db, client) = setup().await;
        let repo = db.invoices();
        let invoice = repo.create(new_invoice(&client)).await.unwrap();

        let lines = vec![LineItem::new("Consulting", dec!(2), Money::from_rupees(500))];
        let updated = repo.update_lines(&invoice.id, lines).await.unwrap();

        assert_eq!(updated.line_items[0].cgst, Money::from_rupees(90));
        assert_eq!(updated.grand_total, Money::from_rupees(1180));

        let loaded = repo.get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(loaded.grand_total, Money::from_rupees(1180));
        assert_eq!(loaded.number, invoice.number);
    }

    #[tokio::test]
    async fn test_mark_sent_only_moves_drafts() {
        let (db, client) = setup().await;
        let repo = db.invoices();
        let invoice = repo.create(new_invoice(&client)).await.unwrap();

        assert_eq!(repo.mark_sent(&invoice.id).await.unwrap().status, InvoiceStatus::Sent);

        let payment = NewPayment {
            method: "UPI".to_string(),
            amount: invoice.grand_total,
            date: today(),
            reference: None,
            notes: None,
        };
        repo.record_payment(&invoice.id, payment).await.unwrap();
        assert_eq!(repo.mark_sent(&invoice.id).await.unwrap().status, InvoiceStatus::Paid);

        assert!(matches!(repo.mark_sent("missing").await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_mark_overdue() {
        let (db, client) = setup().await;
        let repo = db.invoices();
        let invoice = repo.create(new_invoice(&client)).await.unwrap();
        repo.create(new_invoice(&client)).await.unwrap();
        repo.mark_sent(&invoice.id).await.unwrap();

        assert_eq!(repo.mark_overdue(invoice.due_date).await.unwrap(), 0);
        assert_eq!(
            repo.mark_overdue(invoice.due_date + Duration::days(1)).await.unwrap(),
            1
        );

        let loaded = repo.get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, InvoiceStatus::Overdue);
    }

    #[tokio::test]
    async fn test_record_payment_settlement() {
        let (db, client) = setup().await;
        let repo = db.invoices();
        let invoice = repo
            .create(new_invoice(&client).with_lines(vec![LineItem::new(
                "Audit",
                dec!(1),
                Money::from_rupees(1000),
            )]))
            .await
            .unwrap();
        repo.mark_sent(&invoice.id).await.unwrap();

        let part = NewPayment {
            method: "Bank transfer".to_string(),
            amount: Money::from_rupees(500),
            date: today(),
            reference: Some("UTR123".to_string()),
            notes: None,
        };
        let after_part = repo.record_payment(&invoice.id, part.clone()).await.unwrap();
        assert_eq!(after_part.status, InvoiceStatus::Sent);
        assert_eq!(after_part.outstanding(Money::from_rupees(500)), Money::from_rupees(680));

        let rest = NewPayment {
            amount: Money::new(dec!(680.00)),
            ..part
        };
        let settled = repo.record_payment(&invoice.id, rest).await.unwrap();
        assert_eq!(settled.status, InvoiceStatus::Paid);

        assert_eq!(repo.total_paid(&invoice.id).await.unwrap(), Money::from_rupees(1180));
        let payments = repo.payments(&invoice.id).await.unwrap();
        assert_eq!(payments.len(), 2);
        assert_eq!(payments[0].reference.as_deref(), Some("UTR123"));
    }

    #[tokio::test]
    async fn test_record_payment_rejects_zero_and_unknown_invoice() {
        let (db, client) = setup().await;
        let repo = db.invoices();
        let invoice = repo.create(new_invoice(&client)).await.unwrap();
        let zero = NewPayment {
            method: "Cash".to_string(),
            amount: Money::zero(),
            date: today(),
            reference: None,
            notes: None,
        };

        assert!(matches!(
            repo.record_payment(&invoice.id, zero.clone()).await,
            Err(DbError::Core(CoreError::Validation(_)))
        ));

        let valid = NewPayment {
            amount: Money::from_rupees(10),
            ..zero
        };
        assert!(matches!(
            repo.record_payment("missing", valid).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(repo.total_paid(&invoice.id).await.unwrap().is_zero());
    }

    #[tokio::test]
    async fn test_summary() {
        let (db, client) = setup().await;
        let repo = db.invoices();
        let mut other = Client::new("Lotus Bakers", "Lotus Bakers LLP");
        other.state_code = Some("29".to_string());
        db.clients().insert(&other).await.unwrap();

        let audit = vec![LineItem::new("Audit", dec!(1), Money::from_rupees(1000))];
        let a = repo.create(new_invoice(&client)).await.unwrap();
        let b = repo
            .create(new_invoice(&other).with_lines(audit.clone()))
            .await
            .unwrap();
        let c = repo
            .create(new_invoice(&other).with_lines(audit))
            .await
            .unwrap();

        repo.mark_sent(&a.id).await.unwrap();
        repo.mark_sent(&b.id).await.unwrap();
        let payment = NewPayment {
            method: "UPI".to_string(),
            amount: Money::from_rupees(1180),
            date: today(),
            reference: None,
            notes: None,
        };
        repo.record_payment(&b.id, payment.clone()).await.unwrap();
        repo.record_payment(
            &a.id,
            NewPayment {
                amount: Money::from_rupees(844),
                ..payment
            },
        )
        .await
        .unwrap();

        let summary = repo.summary(a.due_date + Duration::days(1)).await.unwrap();

        assert_eq!(summary.invoice_count, 3);
        assert_eq!(summary.total_billed, Money::from_rupees(65844 + 1180 + 1180));
        assert_eq!(summary.outstanding, Money::from_rupees(65000 + 1180));
        // a is sent and past due; c is an unpaid draft past due; b is paid
        assert_eq!(summary.overdue_count, 2);
        assert_eq!(summary.revenue_by_client[0].client_id, client.id);
        assert_eq!(summary.revenue_by_client[1].total, Money::from_rupees(2360));
        assert_eq!(summary.revenue_by_client[1].invoice_count, 2);
        assert!(c.status == InvoiceStatus::Draft);
    }

    #[tokio::test]
    async fn test_delete_cascades_payments() {
        let (db, client) = setup().await;
        let repo = db.invoices();
        let invoice = repo.create(new_invoice(&client)).await.unwrap();
        let payment = NewPayment {
            method: "UPI".to_string(),
            amount: Money::from_rupees(100),
            date: today(),
            reference: None,
            notes: None,
        };
        repo.record_payment(&invoice.id, payment).await.unwrap();

        repo.delete(&invoice.id).await.unwrap();

        assert!(repo.get_by_id(&invoice.id).await.unwrap().is_none());
        assert!(repo.payments(&invoice.id).await.unwrap().is_empty());
        assert!(matches!(repo.delete(&invoice.id).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_issue_unique_numbers() {
        let path = std::env::temp_dir().join(format!("imagicity-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        let mut client = Client::new("Demo Client", "Demo Client Pvt Ltd");
        client.state_code = Some("29".to_string());
        db.clients().insert(&client).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let repo = db.invoices();
            let new = new_invoice(&client);
            handles.push(tokio::spawn(async move { repo.create(new).await }));
        }

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap().unwrap().number);
        }
        numbers.sort();
        numbers.dedup();

        assert_eq!(numbers.len(), 10);
        assert_eq!(db.settings().get_numbering().await.unwrap().next_number, 11);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
