//! # Sale Repository
//!
//! Sale and return records, and the atomic posting of both.
//!
//! ## Checkout Posting
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    post_sale (one transaction)                          │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    1. Re-read sale tickets, allocate next  (reassign if cache was stale)│
//! │    2. INSERT INTO sales                                                 │
//! │    3. UPDATE products SET stock = stock - q WHERE stock >= q   (each)   │
//! │         └── 0 rows → Conflict(Stock), ROLLBACK                          │
//! │    4. UPDATE clients SET balance = balance + t                          │
//! │         WHERE authorized AND balance + t <= credit_limit   (fiado)      │
//! │         └── no row → Conflict(CreditLimit), ROLLBACK                    │
//! │    5. INSERT INTO client_movements                         (fiado)      │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dropping the transaction on any `?` rolls everything back, so a
//! failed posting never leaves a sale without its stock or balance effect.
//!
//! ## Return Posting
//!
//! `post_return` inserts the return first, which takes the write lock, and
//! then re-counts every return against the original ticket. If the total
//! now exceeds what was sold, another terminal got there first and the
//! posting rolls back with `Conflict(Returned)`.
//!
//! ## Ticket Allocation
//!
//! The unique index on sale tickets turns a lost allocation race into
//! `DbError::UniqueViolation`. The posting is not retried.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use super::movement::insert_movement;
use super::{format_timestamp, parse_timestamp};
use crate::error::{ConflictKind, DbError, DbResult};
use caja_core::checkout::{next_ticket_number, SalePosting};
use caja_core::returns::{already_returned, ReturnPosting};
use caja_core::{Money, PaymentMethod, Sale, SaleItem, SaleKind, SaleNotes};

#[derive(Debug, Clone, sqlx::FromRow)]
struct SaleRow {
    id: String,
    ticket: Option<String>,
    kind: Option<String>,
    total: Option<i64>,
    payment_method: Option<String>,
    cash_received: Option<i64>,
    change_amount: Option<i64>,
    shift_id: Option<String>,
    seller: Option<String>,
    created_at: String,
    items: Option<String>,
    notes: Option<String>,
}

impl SaleRow {
    /// Malformed JSON decodes as no items / no notes. Rows without a
    /// readable timestamp are skipped.
    fn into_sale(self) -> Option<Sale> {
        let created_at = parse_timestamp(&self.created_at)?;
        let items: Vec<SaleItem> = self
            .items
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default();
        let notes: Option<SaleNotes> = self
            .notes
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok());

        Some(Sale {
            id: self.id,
            ticket: self.ticket.unwrap_or_default(),
            kind: SaleKind::parse_lenient(self.kind.as_deref()),
            total: Money::from_minor(self.total.unwrap_or(0)),
            payment_method: PaymentMethod::parse_lenient(self.payment_method.as_deref()),
            cash_received: self.cash_received.map(Money::from_minor),
            change: self.change_amount.map(Money::from_minor),
            shift_id: self.shift_id,
            seller: self.seller,
            created_at,
            items,
            notes,
        })
    }
}

const SELECT_SALE: &str = r#"
    SELECT id, ticket, kind, total, payment_method, cash_received, change_amount,
           shift_id, seller, created_at, items, notes
    FROM sales
"#;

async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    let items = serde_json::to_string(&sale.items)?;
    let notes = sale.notes.as_ref().map(serde_json::to_string).transpose()?;

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, ticket, kind, total, payment_method, cash_received, change_amount,
            shift_id, seller, created_at, items, notes
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.ticket)
    .bind(sale.kind.as_str())
    .bind(sale.total.minor())
    .bind(sale.payment_method.as_str())
    .bind(sale.cash_received.map(|m| m.minor()))
    .bind(sale.change.map(|m| m.minor()))
    .bind(&sale.shift_id)
    .bind(&sale.seller)
    .bind(format_timestamp(&sale.created_at))
    .bind(items)
    .bind(notes)
    .execute(conn)
    .await?;

    Ok(())
}

/// Re-counts returns against `original_id`, including the one just inserted.
async fn check_returnable(
    conn: &mut SqliteConnection,
    original_id: &str,
    posting: &ReturnPosting,
) -> DbResult<()> {
    let sql = format!("{} WHERE id = ?", SELECT_SALE);
    let original = sqlx::query_as::<_, SaleRow>(&sql)
        .bind(original_id)
        .fetch_optional(&mut *conn)
        .await?
        .and_then(SaleRow::into_sale)
        .ok_or_else(|| DbError::not_found("Sale", original_id))?;

    let sql = format!("{} WHERE notes IS NOT NULL", SELECT_SALE);
    let returns: Vec<Sale> = sqlx::query_as::<_, SaleRow>(&sql)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .filter_map(SaleRow::into_sale)
        .collect();

    let returned = already_returned(&original, &returns);
    for delta in &posting.restock {
        let sold = original.quantity_of(&delta.product_id);
        let back = returned.get(&delta.product_id).copied().unwrap_or(0);
        if back > sold {
            warn!(
                original = %original.ticket,
                product_id = %delta.product_id,
                sold,
                returned = back,
                "Return conflict, rolling back"
            );
            return Err(DbError::conflict(
                ConflictKind::Returned,
                "Sale",
                original_id,
                format!(
                    "only {} of {} left to return on ticket {}",
                    (sold - (back - delta.quantity)).max(0),
                    delta.name,
                    original.ticket
                ),
            ));
        }
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Every sale and return, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Sale>> {
        let sql = format!("{} ORDER BY created_at DESC", SELECT_SALE);
        let rows = sqlx::query_as::<_, SaleRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let total = rows.len();
        let sales: Vec<Sale> = rows.into_iter().filter_map(SaleRow::into_sale).collect();
        if sales.len() < total {
            warn!(skipped = total - sales.len(), "Skipped sale rows with unreadable timestamp");
        }
        debug!(count = sales.len(), "Loaded sales");
        Ok(sales)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("{} WHERE id = ?", SELECT_SALE);
        let row = sqlx::query_as::<_, SaleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.and_then(SaleRow::into_sale))
    }

    /// Posts a checkout atomically and returns the stored sale.
    ///
    /// ## Errors
    /// - `Conflict { kind: Stock }` when a product no longer has enough units
    /// - `Conflict { kind: CreditLimit }` when the fiado client can no
    ///   longer take the charge
    /// - `UniqueViolation` when another terminal took the same ticket
    pub async fn post_sale(&self, mut posting: SalePosting) -> DbResult<Sale> {
        debug!(
            sale_id = %posting.sale.id,
            ticket = %posting.sale.ticket,
            total = posting.sale.total.minor(),
            method = posting.sale.payment_method.as_str(),
            "Posting sale"
        );

        let mut tx = self.pool.begin().await?;

        // 1. Ticket
        let tickets: Vec<String> =
            sqlx::query_scalar("SELECT ticket FROM sales WHERE kind = 'sale' OR kind IS NULL")
                .fetch_all(&mut *tx)
                .await?;
        let next = next_ticket_number(tickets.iter().map(String::as_str));
        if next != posting.sale.ticket {
            debug!(cached = %posting.sale.ticket, allocated = %next, "Ticket reassigned");
            posting.assign_ticket(next);
        }

        // 2. Record
        insert_sale(&mut tx, &posting.sale).await?;

        // 3. Stock
        let stamp = format_timestamp(&posting.sale.created_at);
        for delta in &posting.stock {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - ?, updated_at = ?
                WHERE id = ? AND stock >= ?
                "#,
            )
            .bind(delta.quantity)
            .bind(&stamp)
            .bind(&delta.product_id)
            .bind(delta.quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                warn!(product_id = %delta.product_id, requested = delta.quantity, "Stock conflict, rolling back sale");
                return Err(DbError::conflict(
                    ConflictKind::Stock,
                    "Product",
                    &delta.product_id,
                    format!("not enough stock of {} for {} units", delta.name, delta.quantity),
                ));
            }
        }

        // 4-5. Fiado
        if let Some(charge) = posting.fiado.as_mut() {
            let balance: Option<i64> = sqlx::query_scalar(
                r#"
                UPDATE clients
                SET balance = COALESCE(balance, 0) + ?, updated_at = ?
                WHERE id = ?
                  AND authorized = 1
                  AND COALESCE(balance, 0) + ? <= COALESCE(credit_limit, 0)
                RETURNING balance
                "#,
            )
            .bind(charge.amount.minor())
            .bind(&stamp)
            .bind(&charge.client_id)
            .bind(charge.amount.minor())
            .fetch_optional(&mut *tx)
            .await?;

            let balance = match balance {
                Some(balance) => Money::from_minor(balance),
                None => {
                    warn!(client_id = %charge.client_id, "Credit conflict, rolling back sale");
                    return Err(DbError::conflict(
                        ConflictKind::CreditLimit,
                        "Client",
                        &charge.client_id,
                        format!("charge of {} no longer fits the credit limit", charge.amount),
                    ));
                }
            };

            charge.balance_after = balance;
            charge.movement.balance_after = balance;
            insert_movement(&mut tx, &charge.movement).await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %posting.sale.id,
            ticket = %posting.sale.ticket,
            "Sale posted"
        );
        Ok(posting.sale)
    }

    /// Posts a return atomically: the return record plus restocking.
    pub async fn post_return(&self, posting: ReturnPosting) -> DbResult<Sale> {
        debug!(
            sale_id = %posting.sale.id,
            ticket = %posting.sale.ticket,
            total = posting.sale.total.minor(),
            "Posting return"
        );

        let mut tx = self.pool.begin().await?;

        insert_sale(&mut tx, &posting.sale).await?;

        if let Some(original_id) = posting
            .sale
            .return_note()
            .and_then(|note| note.original_sale_id.as_deref())
        {
            check_returnable(&mut tx, original_id, &posting).await?;
        }

        let stamp = format_timestamp(&posting.sale.created_at);
        for delta in &posting.restock {
            let result = sqlx::query(
                "UPDATE products SET stock = COALESCE(stock, 0) + ?, updated_at = ? WHERE id = ?",
            )
            .bind(delta.quantity)
            .bind(&stamp)
            .bind(&delta.product_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                warn!(product_id = %delta.product_id, "Returned product no longer in catalog, not restocked");
            }
        }

        tx.commit().await?;

        info!(sale_id = %posting.sale.id, ticket = %posting.sale.ticket, "Return posted");
        Ok(posting.sale)
    }

    /// Corrects the payment method on a posted record.
    ///
    /// Balances and stock are not touched.
    pub async fn update_payment_method(&self, id: &str, method: PaymentMethod) -> DbResult<()> {
        let result = sqlx::query("UPDATE sales SET payment_method = ? WHERE id = ?")
            .bind(method.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", id));
        }

        warn!(sale_id = %id, method = method.as_str(), "Payment method reassigned");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
