//! # Credit (Fiado) Ledger
//!
//! Authorized-client balances against their credit limit.
//!
//! ```text
//! fiado sale      balance += total          movement "fiado"
//! abono           balance -= amount (≥ 0)   movement "abono"
//! pago total      balance  = 0              movement "pago-total"
//! ```
//!
//! Every function returns the new state plus the movement to append. The
//! caller persists both or neither.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Client, ClientMovement, MovementType};
use crate::validation::{validate_client_name, validate_non_negative_money, validate_payment_amount};

// =============================================================================
// Client Creation
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    pub name: String,
    pub credit_limit: Money,
    #[serde(default)]
    pub authorized: bool,
}

/// Builds a new client. Balance always starts at zero.
pub fn new_client(input: &NewClient, now: DateTime<Utc>) -> CoreResult<Client> {
    let name = validate_client_name(&input.name)?;
    validate_non_negative_money("credit limit", input.credit_limit)?;

    Ok(Client {
        id: Uuid::new_v4().to_string(),
        name,
        authorized: input.authorized,
        balance: Money::zero(),
        credit_limit: input.credit_limit,
        updated_at: Some(now),
    })
}

// =============================================================================
// Fiado Charge
// =============================================================================

/// A fiado purchase against a client.
#[derive(Debug, Clone, PartialEq)]
pub struct FiadoCharge {
    pub client_id: String,
    pub amount: Money,
    pub balance_after: Money,
    pub movement: ClientMovement,
}

/// Description written on the movement of a fiado purchase.
pub fn purchase_description(ticket: &str) -> String {
    format!("Compra ticket #{}", ticket)
}

/// Checks that `client` may take `amount` more on credit and builds the charge.
///
/// ## Rejections
/// - `ClientNotAuthorized` when the flag is off
/// - `CreditLimitExceeded` when balance + amount > limit
pub fn charge_fiado(
    client: &Client,
    amount: Money,
    ticket: &str,
    now: DateTime<Utc>,
) -> CoreResult<FiadoCharge> {
    if !client.authorized {
        return Err(CoreError::ClientNotAuthorized {
            client: client.name.clone(),
        });
    }

    if !client.fits_limit(amount) {
        return Err(CoreError::CreditLimitExceeded {
            client: client.name.clone(),
            balance: client.balance,
            amount,
            limit: client.credit_limit,
        });
    }

    let balance_after = client.balance + amount;

    Ok(FiadoCharge {
        client_id: client.id.clone(),
        amount,
        balance_after,
        movement: ClientMovement {
            id: Uuid::new_v4().to_string(),
            client_id: client.id.clone(),
            amount,
            movement_type: MovementType::Fiado,
            description: purchase_description(ticket),
            balance_after,
            created_at: now,
        },
    })
}

// =============================================================================
// Payments
// =============================================================================

/// Payment mode chosen in the fiado drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    /// Reduce the balance by the amount.
    Abono,
    /// Settle the whole balance.
    Total,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreditPayment {
    pub client_id: String,
    pub balance_after: Money,
    pub movement: ClientMovement,
}

/// Applies a payment to `client`'s balance.
///
/// A full settlement ignores `amount` for the balance but logs it exactly
/// as given, zero included. Negative amounts are rejected in both modes.
pub fn apply_payment(
    client: &Client,
    mode: PaymentMode,
    amount: Money,
    description: Option<&str>,
    now: DateTime<Utc>,
) -> CoreResult<CreditPayment> {
    let (balance_after, logged, movement_type, description) = match mode {
        PaymentMode::Abono => {
            validate_payment_amount(amount)?;
            if amount > client.balance {
                return Err(CoreError::PaymentExceedsBalance {
                    balance: client.balance,
                    amount,
                });
            }
            let text = description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or("Abono registrado")
                .to_string();
            (
                client.balance.saturating_sub_floor(amount),
                amount,
                MovementType::Abono,
                text,
            )
        }
        PaymentMode::Total => {
            validate_non_negative_money("payment amount", amount)?;
            (
                Money::zero(),
                amount,
                MovementType::PagoTotal,
                "Pago total de la deuda".to_string(),
            )
        }
    };

    Ok(CreditPayment {
        client_id: client.id.clone(),
        balance_after,
        movement: ClientMovement {
            id: Uuid::new_v4().to_string(),
            client_id: client.id.clone(),
            amount: logged,
            movement_type,
            description,
            balance_after,
            created_at: now,
        },
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
