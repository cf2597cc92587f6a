//! # Credit Commands
//!
//! Fiado clients: creation, authorization, payments and the movement log.
//! Charges happen at checkout; see `checkout.rs`.

use chrono::Utc;
use tracing::{debug, info};

use caja_core::credit::{self, NewClient, PaymentMode};
use caja_core::{Client, ClientMovement, CoreError, Money};

use crate::error::ApiResult;
use crate::Ledger;

impl Ledger {
    pub fn clients(&self) -> &[Client] {
        self.cache.clients.items()
    }

    /// Creates a client with a zero balance. Admin only.
    pub async fn create_client(&mut self, input: NewClient) -> ApiResult<Client> {
        debug!(name = %input.name, "create_client command");
        self.require_admin()?;

        let client = credit::new_client(&input, Utc::now())?;
        self.db.clients().insert(&client).await?;
        self.refresh_clients().await;

        info!(id = %client.id, name = %client.name, "Client created");
        Ok(client)
    }

    /// Grants or revokes fiado. The balance is untouched. Admin only.
    pub async fn set_client_authorized(&mut self, client_id: &str, authorized: bool) -> ApiResult<()> {
        debug!(client_id = %client_id, authorized = authorized, "set_client_authorized command");
        self.require_admin()?;

        self.db
            .clients()
            .set_authorized(client_id, authorized, Utc::now())
            .await?;
        self.refresh_clients().await;
        Ok(())
    }

    /// Records an abono or a full settlement.
    ///
    /// Returns the movement with the balance the database ended at.
    pub async fn record_payment(
        &mut self,
        client_id: &str,
        mode: PaymentMode,
        amount: Money,
        description: Option<&str>,
    ) -> ApiResult<ClientMovement> {
        debug!(
            client_id = %client_id,
            mode = ?mode,
            amount = amount.minor(),
            "record_payment command"
        );

        let client = self
            .db
            .clients()
            .get_by_id(client_id)
            .await?
            .ok_or_else(|| CoreError::ClientNotFound(client_id.to_string()))?;

        let payment = credit::apply_payment(&client, mode, amount, description, Utc::now())?;
        let movement = self.db.clients().record_payment(&payment).await?;

        self.refresh_clients().await;
        self.refresh_movements().await;

        info!(
            client_id = %client_id,
            balance_after = %movement.balance_after,
            "Payment recorded"
        );
        Ok(movement)
    }

    /// Movements newest first, optionally for one client.
    pub fn client_movements(&self, client_id: Option<&str>) -> Vec<ClientMovement> {
        self.cache
            .movements
            .items()
            .iter()
            .filter(|m| client_id.map_or(true, |id| m.client_id == id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::ledger;
    use crate::{ErrorCode, Ledger};
    use caja_core::credit::{NewClient, PaymentMode};
    use caja_core::{Client, Money, MovementType};

    async fn with_client(ledger: &mut Ledger, authorized: bool) -> Client {
        ledger.unlock_admin("admin").unwrap();
        ledger
            .create_client(NewClient {
                name: "Carmen Soto".to_string(),
                credit_limit: Money::from_minor(20000),
                authorized,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_client_management_requires_admin() {
        let mut ledger = ledger().await;
        let err = ledger
            .create_client(NewClient {
                name: "Carmen".to_string(),
                credit_limit: Money::zero(),
                authorized: false,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_authorize_toggle() {
        let mut ledger = ledger().await;
        let client = with_client(&mut ledger, false).await;
        assert!(!ledger.clients()[0].authorized);

        ledger.set_client_authorized(&client.id, true).await.unwrap();
        assert!(ledger.clients()[0].authorized);
        assert!(ledger.clients()[0].balance.is_zero());
    }

    #[tokio::test]
    async fn test_payment_on_zero_balance_is_rejected() {
        let mut ledger = ledger().await;
        let client = with_client(&mut ledger, true).await;

        let err = ledger
            .record_payment(&client.id, PaymentMode::Abono, Money::from_minor(500), None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CreditError);
        assert!(ledger.client_movements(None).is_empty());
    }

    #[tokio::test]
    async fn test_settlement_is_logged() {
        let mut ledger = ledger().await;
        let client = with_client(&mut ledger, true).await;

        let movement = ledger
            .record_payment(&client.id, PaymentMode::Total, Money::zero(), Some("Cierre de mes"))
            .await
            .unwrap();
        assert_eq!(movement.movement_type, MovementType::PagoTotal);
        assert!(movement.balance_after.is_zero());
        assert!(movement.amount.is_zero());

        assert_eq!(ledger.client_movements(Some(&client.id)).len(), 1);
        assert!(ledger.client_movements(Some("other")).is_empty());
    }
}
