//! # Receivables Summary
//!
//! Dashboard and report figures derived from a set of invoices.
//!
//! ```text
//! invoices + payments per invoice + today
//!        │
//!        ▼
//! summarize_invoices()
//!   total_billed       = Σ grand_total
//!   outstanding        = Σ (grand_total − paid) over unpaid invoices
//!   overdue_count      = # invoices where Invoice::is_overdue(today)
//!   revenue_by_client  = Σ grand_total per client, largest first
//! ```

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Invoice, InvoiceStatus};

/// Billed value for one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ClientRevenue {
    pub client_id: String,
    pub total: Money,
    pub invoice_count: usize,
}

/// Receivables at a glance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceSummary {
    pub invoice_count: usize,

    /// Grand totals of every invoice, paid or not.
    pub total_billed: Money,

    /// What clients still owe. Partial payments are netted off; paid
    /// invoices contribute nothing.
    pub outstanding: Money,

    pub overdue_count: usize,

    /// Largest first; ties ordered by client id.
    pub revenue_by_client: Vec<ClientRevenue>,
}

/// Summarizes invoices as of `today`.
///
/// `paid` maps invoice id to the sum of its payments; invoices missing from
/// the map have received nothing.
pub fn summarize_invoices(
    invoices: &[Invoice],
    paid: &HashMap<String, Money>,
    today: NaiveDate,
) -> InvoiceSummary {
    let mut summary = InvoiceSummary {
        invoice_count: invoices.len(),
        ..Default::default()
    };
    let mut by_client: HashMap<&str, ClientRevenue> = HashMap::new();

    for invoice in invoices {
        summary.total_billed += invoice.grand_total;

        if invoice.status != InvoiceStatus::Paid {
            let received = paid.get(&invoice.id).copied().unwrap_or_default();
            summary.outstanding += invoice.outstanding(received);
        }

        if invoice.is_overdue(today) {
            summary.overdue_count += 1;
        }

        let entry = by_client
            .entry(invoice.client_id.as_str())
            .or_insert_with(|| ClientRevenue {
                client_id: invoice.client_id.clone(),
                total: Money::zero(),
                invoice_count: 0,
            });
        entry.total += invoice.grand_total;
        entry.invoice_count += 1;
    }

    let mut revenue: Vec<ClientRevenue> = by_client.into_values().collect();
    revenue.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.client_id.cmp(&b.client_id))
    });
    summary.revenue_by_client = revenue;

    summary
}

// =============================================================================
// Unit Tests
// =============================================================================
