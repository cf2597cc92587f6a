//! # Client Repository
//!
//! Credit (fiado) accounts.
//!
//! ## Balance Writes
//! ```text
//! fiado checkout  → SaleRepository::post_sale   (guarded by the limit)
//! abono           → record_payment              (floored at 0)
//! pago-total      → record_payment              (forced to 0)
//! ```
//! Every balance change appends a `client_movements` row in the same
//! transaction, and the stored `balance_after` is the value SQLite
//! returned, not the one computed from the cache.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::movement::insert_movement;
use super::{format_timestamp, parse_optional_timestamp};
use crate::error::{DbError, DbResult};
use caja_core::credit::CreditPayment;
use caja_core::{Client, Money, MovementType};

#[derive(Debug, Clone, sqlx::FromRow)]
struct ClientRow {
    id: String,
    name: Option<String>,
    authorized: Option<bool>,
    balance: Option<i64>,
    credit_limit: Option<i64>,
    updated_at: Option<String>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            name: row.name.unwrap_or_default(),
            authorized: row.authorized.unwrap_or(false),
            balance: Money::from_minor(row.balance.unwrap_or(0).max(0)),
            credit_limit: Money::from_minor(row.credit_limit.unwrap_or(0)),
            updated_at: parse_optional_timestamp(row.updated_at.as_deref()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// All clients, ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<Client>> {
        let rows = sqlx::query_as::<_, ClientRow>(
            r#"
            SELECT id, name, authorized, balance, credit_limit, updated_at
            FROM clients
            ORDER BY name COLLATE NOCASE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded clients");
        Ok(rows.into_iter().map(Client::from).collect())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>(
            r#"
            SELECT id, name, authorized, balance, credit_limit, updated_at
            FROM clients
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Client::from))
    }

    pub async fn insert(&self, client: &Client) -> DbResult<()> {
        debug!(id = %client.id, name = %client.name, "Inserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (id, name, authorized, balance, credit_limit, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&client.id)
        .bind(&client.name)
        .bind(client.authorized)
        .bind(client.balance.minor())
        .bind(client.credit_limit.minor())
        .bind(format_timestamp(&client.updated_at.unwrap_or_else(Utc::now)))
        .execute(&self.pool)
        .await?;

        info!(id = %client.id, "Client created");
        Ok(())
    }

    /// Toggles the fiado authorization. Balance is untouched.
    pub async fn set_authorized(
        &self,
        id: &str,
        authorized: bool,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query("UPDATE clients SET authorized = ?, updated_at = ? WHERE id = ?")
            .bind(authorized)
            .bind(format_timestamp(&now))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }

        info!(id = %id, authorized = authorized, "Client authorization changed");
        Ok(())
    }

    /// Applies an abono or full settlement and appends its movement.
    ///
    /// Returns the movement as stored, with the balance SQLite computed.
    pub async fn record_payment(
        &self,
        payment: &CreditPayment,
    ) -> DbResult<caja_core::ClientMovement> {
        let movement = &payment.movement;
        debug!(
            client_id = %payment.client_id,
            kind = movement.movement_type.as_str(),
            amount = movement.amount.minor(),
            "Recording client payment"
        );

        let mut tx = self.pool.begin().await?;
        let updated_at = format_timestamp(&movement.created_at);

        let balance: Option<i64> = match movement.movement_type {
            MovementType::PagoTotal => {
                sqlx::query_scalar(
                    "UPDATE clients SET balance = 0, updated_at = ? WHERE id = ? RETURNING balance",
                )
                .bind(&updated_at)
                .bind(&payment.client_id)
                .fetch_optional(&mut *tx)
                .await?
            }
            _ => {
                sqlx::query_scalar(
                    r#"
                    UPDATE clients
                    SET balance = MAX(COALESCE(balance, 0) - ?, 0), updated_at = ?
                    WHERE id = ?
                    RETURNING balance
                    "#,
                )
                .bind(movement.amount.minor())
                .bind(&updated_at)
                .bind(&payment.client_id)
                .fetch_optional(&mut *tx)
                .await?
            }
        };

        let balance = balance.ok_or_else(|| DbError::not_found("Client", &payment.client_id))?;

        let mut stored = movement.clone();
        stored.balance_after = Money::from_minor(balance);
        insert_movement(&mut tx, &stored).await?;

        tx.commit().await?;

        info!(
            client_id = %payment.client_id,
            balance_after = balance,
            "Client payment recorded"
        );
        Ok(stored)
    }
}
