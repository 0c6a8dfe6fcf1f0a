//! # Client Repository
//!
//! Database operations for clients.
//!
//! Archiving is a soft delete: invoices keep pointing at archived clients,
//! only pickers and default listings hide them.
//!
//! A client saved with a GSTIN but no state code gets the state code from
//! the GSTIN's first two digits.

use chrono::Utc;
use imagicity_core::validation::{validate_gstin, validate_state_code};
use imagicity_core::gst::state_code_from_gstin;
use imagicity_core::{Client, CoreError, ValidationError};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::json_column;
use crate::error::{DbError, DbResult};

const CLIENT_COLUMNS: &str = r#"
    id, display_name, legal_name, email, phone,
    billing_address, shipping_address, gstin, state_code,
    notes, tags, archived
"#;

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Inserts a client after checking its name, GSTIN and state code.
    pub async fn insert(&self, client: &Client) -> DbResult<Client> {
        validate_client(client)?;
        let client = &with_derived_state_code(client);
        debug!(id = %client.id, name = %client.display_name, "Inserting client");

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO clients (
                id, display_name, legal_name, email, phone,
                billing_address, shipping_address, gstin, state_code,
                notes, tags, archived, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13, ?13
            )
            "#,
        )
        .bind(&client.id)
        .bind(&client.display_name)
        .bind(&client.legal_name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.billing_address)
        .bind(&client.shipping_address)
        .bind(&client.gstin)
        .bind(&client.state_code)
        .bind(&client.notes)
        .bind(serde_json::to_string(&client.tags)?)
        .bind(client.archived)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(client.clone())
    }

    /// Gets a client by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Client>> {
        let sql = format!("SELECT {} FROM clients WHERE id = ?1", CLIENT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(client_from_row).transpose()
    }

    /// Lists clients ordered by display name.
    ///
    /// ## Arguments
    /// * `search` - Case-insensitive substring of display or legal name
    /// * `include_archived` - Whether archived clients are returned
    pub async fn list(&self, search: Option<&str>, include_archived: bool) -> DbResult<Vec<Client>> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()));

        debug!(search = ?pattern, include_archived, "Listing clients");

        let sql = format!(
            r#"
            SELECT {}
            FROM clients
            WHERE (?1 IS NULL
                   OR lower(display_name) LIKE ?1
                   OR lower(legal_name) LIKE ?1)
              AND (?2 OR archived = 0)
            ORDER BY display_name COLLATE NOCASE
            "#,
            CLIENT_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(pattern)
            .bind(include_archived)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(client_from_row).collect()
    }

    /// Replaces every editable field of an existing client.
    pub async fn update(&self, client: &Client) -> DbResult<Client> {
        validate_client(client)?;
        let client = &with_derived_state_code(client);
        debug!(id = %client.id, "Updating client");

        let result = sqlx::query(
            r#"
            UPDATE clients SET
                display_name = ?2,
                legal_name = ?3,
                email = ?4,
                phone = ?5,
                billing_address = ?6,
                shipping_address = ?7,
                gstin = ?8,
                state_code = ?9,
                notes = ?10,
                tags = ?11,
                archived = ?12,
                updated_at = ?13
            WHERE id = ?1
            "#,
        )
        .bind(&client.id)
        .bind(&client.display_name)
        .bind(&client.legal_name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.billing_address)
        .bind(&client.shipping_address)
        .bind(&client.gstin)
        .bind(&client.state_code)
        .bind(&client.notes)
        .bind(serde_json::to_string(&client.tags)?)
        .bind(client.archived)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", &client.id));
        }

        Ok(client.clone())
    }

    /// Archives a client (soft delete).
    pub async fn archive(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Archiving client");

        let result = sqlx::query("UPDATE clients SET archived = 1, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }

        Ok(())
    }
}

fn validate_client(client: &Client) -> DbResult<()> {
    if client.display_name.trim().is_empty() {
        return Err(CoreError::from(ValidationError::Required {
            field: "displayName".to_string(),
        })
        .into());
    }
    if let Some(gstin) = client.gstin.as_deref().filter(|g| !g.trim().is_empty()) {
        validate_gstin(gstin).map_err(CoreError::from)?;
    }
    if let Some(code) = client.state_code.as_deref().filter(|c| !c.trim().is_empty()) {
        validate_state_code(code).map_err(CoreError::from)?;
    }
    Ok(())
}

fn with_derived_state_code(client: &Client) -> Client {
    let mut client = client.clone();
    let missing = client
        .state_code
        .as_deref()
        .map_or(true, |code| code.trim().is_empty());

    if missing {
        if let Some(code) = client.gstin.as_deref().and_then(state_code_from_gstin) {
            client.state_code = Some(code.to_string());
        }
    }
    client
}

fn client_from_row(row: &SqliteRow) -> DbResult<Client> {
    Ok(Client {
        id: row.try_get("id")?,
        display_name: row.try_get("display_name")?,
        legal_name: row.try_get("legal_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        billing_address: row.try_get("billing_address")?,
        shipping_address: row.try_get("shipping_address")?,
        gstin: row.try_get("gstin")?,
        state_code: row.try_get("state_code")?,
        notes: row.try_get("notes")?,
        tags: json_column(row, "tags")?,
        archived: row.try_get("archived")?,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn demo_client() -> Client {
        let mut client = Client::new("Demo Client", "Demo Client Pvt Ltd");
        client.gstin = Some("29ABCDE1234F1Z5".to_string());
        client.state_code = Some("29".to_string());
        client.tags = vec!["priority".to_string()];
        client
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = setup().await;
        let client = demo_client();

        db.clients().insert(&client).await.unwrap();
        let loaded = db.clients().get(&client.id).await.unwrap();

        assert_eq!(loaded, Some(client));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let db = setup().await;
        assert!(db.clients().get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_bad_gstin() {
        let db = setup().await;
        let mut client = demo_client();
        client.gstin = Some("29ABCDE1234F1X5".to_string());

        let result = db.clients().insert(&client).await;
        assert!(matches!(result, Err(DbError::Core(CoreError::Validation(_)))));
    }

    #[tokio::test]
    async fn test_list_search_and_archive() {
        let db = setup().await;
        let repo = db.clients();
        let demo = demo_client();
        let other = Client::new("Lotus Bakers", "Lotus Bakers LLP");

        repo.insert(&demo).await.unwrap();
        repo.insert(&other).await.unwrap();

        let found = repo.list(Some("lotus"), false).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, other.id);

        let by_legal = repo.list(Some("pvt"), false).await.unwrap();
        assert_eq!(by_legal.len(), 1);
        assert_eq!(by_legal[0].id, demo.id);

        repo.archive(&other.id).await.unwrap();
        assert_eq!(repo.list(None, false).await.unwrap().len(), 1);
        assert_eq!(repo.list(None, true).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update() {
        let db = setup().await;
        let repo = db.clients();
        let mut client = demo_client();
        repo.insert(&client).await.unwrap();

        client.state_code = Some("27".to_string());
        client.email = Some("accounts@democlient.in".to_string());
        repo.update(&client).await.unwrap();

        let loaded = repo.get(&client.id).await.unwrap().unwrap();
        assert_eq!(loaded.state_code.as_deref(), Some("27"));
        assert_eq!(loaded.email.as_deref(), Some("accounts@democlient.in"));
    }

    #[tokio::test]
    async fn test_state_code_derived_from_gstin() {
        let db = setup().await;
        let repo = db.clients();
        let mut client = demo_client();
        client.gstin = Some("27ABCDE1234F1Z5".to_string());
        client.state_code = None;

        let saved = repo.insert(&client).await.unwrap();
        assert_eq!(saved.state_code.as_deref(), Some("27"));
        let loaded = repo.get(&client.id).await.unwrap().unwrap();
        assert_eq!(loaded.state_code.as_deref(), Some("27"));

        client.state_code = Some("  ".to_string());
        client.gstin = Some("29ABCDE1234F1Z5".to_string());
        let updated = repo.update(&client).await.unwrap();
        assert_eq!(updated.state_code.as_deref(), Some("29"));
    }

    #[tokio::test]
    async fn test_explicit_state_code_is_kept() {
        let db = setup().await;
        let mut client = demo_client();
        client.state_code = Some("07".to_string());

        let saved = db.clients().insert(&client).await.unwrap();
        assert_eq!(saved.state_code.as_deref(), Some("07"));

        let mut bare = Client::new("Walk-in", "Walk-in Customer");
        bare.gstin = None;
        let saved = db.clients().insert(&bare).await.unwrap();
        assert!(saved.state_code.is_none());
    }

    #[tokio::test]
    async fn test_update_and_archive_missing_client() {
        let db = setup().await;
        let client = demo_client();

        assert!(matches!(
            db.clients().update(&client).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            db.clients().archive("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
