//! # Settings Repository
//!
//! Organization-wide settings stored as key/value JSON rows.
//!
//! ## Keys
//! ```text
//! ┌──────────────┬────────────────────────────┬──────────────────────────┐
//! │ key          │ value                      │ when absent              │
//! ├──────────────┼────────────────────────────┼──────────────────────────┤
//! │ numbering    │ NumberingConfig            │ {IMAGI, 1, yearly}       │
//! │ organization │ OrganizationSettings       │ None                     │
//! │ tax          │ TaxConfig                  │ {9, 9, 18, false}        │
//! └──────────────┴────────────────────────────┴──────────────────────────┘
//! ```
//!
//! The numbering row is also read and written by
//! [`InvoiceRepository::create`](crate::InvoiceRepository::create) on the
//! connection that holds the issuance transaction, which also reads the
//! organization's default place of supply.

use chrono::Utc;
use imagicity_core::validation::validate_numbering;
use imagicity_core::{CoreError, NumberingConfig, OrganizationSettings, TaxConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};

pub(crate) const NUMBERING_KEY: &str = "numbering";
const ORGANIZATION_KEY: &str = "organization";
const TAX_KEY: &str = "tax";

/// Repository for settings rows.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Current numbering config, or the default when never saved.
    pub async fn get_numbering(&self) -> DbResult<NumberingConfig> {
        let mut conn = self.pool.acquire().await?;
        read_numbering(&mut conn).await
    }

    /// Replaces the numbering config after validating it.
    pub async fn update_numbering(&self, config: &NumberingConfig) -> DbResult<NumberingConfig> {
        validate_numbering(config).map_err(CoreError::from)?;

        let mut conn = self.pool.acquire().await?;
        write_numbering(&mut conn, config).await?;
        Ok(config.clone())
    }

    /// Organization profile, if one was saved.
    pub async fn get_organization(&self) -> DbResult<Option<OrganizationSettings>> {
        let mut conn = self.pool.acquire().await?;
        read_organization(&mut conn).await
    }

    pub async fn update_organization(
        &self,
        organization: &OrganizationSettings,
    ) -> DbResult<OrganizationSettings> {
        let mut conn = self.pool.acquire().await?;
        put_value(&mut conn, ORGANIZATION_KEY, organization).await?;
        Ok(organization.clone())
    }

    /// Tax defaults, or 9/9/18 exclusive when never saved.
    pub async fn get_tax(&self) -> DbResult<TaxConfig> {
        let mut conn = self.pool.acquire().await?;
        Ok(get_value(&mut conn, TAX_KEY).await?.unwrap_or_default())
    }

    pub async fn update_tax(&self, tax: &TaxConfig) -> DbResult<TaxConfig> {
        let mut conn = self.pool.acquire().await?;
        put_value(&mut conn, TAX_KEY, tax).await?;
        Ok(tax.clone())
    }
}

// =============================================================================
// Connection-level helpers
// =============================================================================

pub(crate) async fn read_numbering(conn: &mut SqliteConnection) -> DbResult<NumberingConfig> {
    Ok(get_value(conn, NUMBERING_KEY).await?.unwrap_or_default())
}

pub(crate) async fn write_numbering(
    conn: &mut SqliteConnection,
    config: &NumberingConfig,
) -> DbResult<()> {
    put_value(conn, NUMBERING_KEY, config).await
}

pub(crate) async fn read_organization(
    conn: &mut SqliteConnection,
) -> DbResult<Option<OrganizationSettings>> {
    get_value(conn, ORGANIZATION_KEY).await
}

async fn get_value<T: DeserializeOwned>(
    conn: &mut SqliteConnection,
    key: &str,
) -> DbResult<Option<T>> {
    let raw: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
        .bind(key)
        .fetch_optional(&mut *conn)
        .await?;

    raw.map(|value| serde_json::from_str(&value))
        .transpose()
        .map_err(|e| DbError::invalid_data(format!("settings.{}", key), e))
}

async fn put_value<T: Serialize>(conn: &mut SqliteConnection, key: &str, value: &T) -> DbResult<()> {
    debug!(key = %key, "Writing setting");

    let json = serde_json::to_string(value)?;
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(json)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
