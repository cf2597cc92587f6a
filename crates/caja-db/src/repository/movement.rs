//! # Client Movement Repository
//!
//! Append-only audit trail of client balance changes.
//!
//! Movements are written only inside the transactions that change a
//! balance (fiado checkout, payments). This repository exposes reads.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::{format_timestamp, parse_timestamp};
use crate::error::DbResult;
use caja_core::{ClientMovement, Money, MovementType};

#[derive(Debug, Clone, sqlx::FromRow)]
struct MovementRow {
    id: String,
    client_id: String,
    amount: Option<i64>,
    movement_type: Option<String>,
    description: Option<String>,
    balance_after: Option<i64>,
    created_at: String,
}

impl MovementRow {
    /// Rows with an unreadable timestamp are skipped.
    fn into_movement(self) -> Option<ClientMovement> {
        let created_at = parse_timestamp(&self.created_at)?;
        Some(ClientMovement {
            id: self.id,
            client_id: self.client_id,
            amount: Money::from_minor(self.amount.unwrap_or(0)),
            movement_type: MovementType::parse_lenient(self.movement_type.as_deref()),
            description: self.description.unwrap_or_default(),
            balance_after: Money::from_minor(self.balance_after.unwrap_or(0)),
            created_at,
        })
    }
}

/// Appends one movement on the caller's connection (normally a transaction).
pub(crate) async fn insert_movement(
    conn: &mut SqliteConnection,
    movement: &ClientMovement,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO client_movements (
            id, client_id, amount, movement_type, description, balance_after, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.client_id)
    .bind(movement.amount.minor())
    .bind(movement.movement_type.as_str())
    .bind(&movement.description)
    .bind(movement.balance_after.minor())
    .bind(format_timestamp(&movement.created_at))
    .execute(conn)
    .await?;

    Ok(())
}

#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Movements newest first, optionally for one client.
    pub async fn list(&self, client_id: Option<&str>) -> DbResult<Vec<ClientMovement>> {
        debug!(client_id = ?client_id, "Listing client movements");

        let rows = match client_id {
            Some(id) => {
                sqlx::query_as::<_, MovementRow>(
                    r#"
                    SELECT id, client_id, amount, movement_type, description, balance_after, created_at
                    FROM client_movements
                    WHERE client_id = ?
                    ORDER BY created_at DESC
                    "#,
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, MovementRow>(
                    r#"
                    SELECT id, client_id, amount, movement_type, description, balance_after, created_at
                    FROM client_movements
                    ORDER BY created_at DESC
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().filter_map(MovementRow::into_movement).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use caja_core::Client;
    use chrono::{Duration, Utc};

    fn movement(id: &str, client: &str, minutes_ago: i64, kind: MovementType) -> ClientMovement {
        ClientMovement {
            id: id.to_string(),
            client_id: client.to_string(),
            amount: Money::from_minor(1000),
            movement_type: kind,
            description: "test".to_string(),
            balance_after: Money::from_minor(1000),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn test_list_newest_first_and_filtered() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        for id in ["c-1", "c-2"] {
            db.clients()
                .insert(&Client {
                    id: id.to_string(),
                    name: id.to_string(),
                    authorized: true,
                    balance: Money::zero(),
                    credit_limit: Money::from_minor(10000),
                    updated_at: None,
                })
                .await
                .unwrap();
        }

        let mut conn = db.pool().acquire().await.unwrap();
        insert_movement(&mut conn, &movement("m-1", "c-1", 30, MovementType::Fiado))
            .await
            .unwrap();
        insert_movement(&mut conn, &movement("m-2", "c-1", 10, MovementType::Abono))
            .await
            .unwrap();
        insert_movement(&mut conn, &movement("m-3", "c-2", 20, MovementType::PagoTotal))
            .await
            .unwrap();
        drop(conn);

        let all = db.movements().list(None).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m-2", "m-3", "m-1"]);

        let one = db.movements().list(Some("c-1")).await.unwrap();
        assert_eq!(one.len(), 2);
        assert_eq!(one[0].movement_type, MovementType::Abono);
    }
}
