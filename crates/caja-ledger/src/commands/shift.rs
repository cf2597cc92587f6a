//! # Shift Commands
//!
//! Opening, closing and watching the one open shift.
//!
//! ## Shift Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   open_shift(seller, type, float)                                      │
//! │        │  rejected while another shift is open                          │
//! │        ▼                                                                │
//! │   ┌──────────┐   sales / returns   ┌──────────────────────────┐        │
//! │   │   OPEN   │ ──────────────────► │ shift_summary, dashboard │        │
//! │   └────┬─────┘                     └──────────────────────────┘        │
//! │        │  close_shift(counted)                                          │
//! │        ▼                                                                │
//! │   ┌──────────┐   expected = float + cash sales - cash refunds          │
//! │   │  CLOSED  │   difference = counted - expected                       │
//! │   └──────────┘   never reopened                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The open shift is always looked up, never held as a separate global.

use chrono::Utc;
use tracing::{debug, info};

use caja_core::dashboard::{self, ShiftDashboard, ShiftHistory};
use caja_core::shift::{self, OpenShiftRequest, ShiftSummary};
use caja_core::{CoreError, Money, Shift};

use crate::error::ApiResult;
use crate::Ledger;

impl Ledger {
    /// The open shift in the cache, if any.
    pub fn active_shift(&self) -> Option<&Shift> {
        shift::find_open_shift(self.cache.shifts.items())
    }

    /// Opens a shift. Rejected while another one is open.
    pub async fn open_shift(&mut self, request: OpenShiftRequest) -> ApiResult<Shift> {
        debug!(
            seller = %request.seller,
            shift_type = request.shift_type.as_str(),
            "open_shift command"
        );

        // Another terminal may have opened one since the last refresh.
        self.refresh_shifts().await;

        let opened = shift::open_shift(self.cache.shifts.items(), &request, Utc::now())?;
        self.db.shifts().insert_open(&opened).await?;
        self.refresh_shifts().await;

        info!(id = %opened.id, seller = %opened.seller, "Shift opened");
        Ok(opened)
    }

    /// Closes the open shift against the counted drawer cash.
    ///
    /// The summary is folded from the shift's records as stored and frozen
    /// onto the shift.
    pub async fn close_shift(&mut self, cash_counted: Money) -> ApiResult<Shift> {
        debug!(counted = cash_counted.minor(), "close_shift command");

        let open = self
            .db
            .shifts()
            .find_open()
            .await?
            .ok_or(CoreError::NoOpenShift)?;
        let sales = self.db.sales().list_all().await?;

        let closed = shift::close_shift(&open, &sales, cash_counted, Utc::now())?;
        self.db.shifts().close(&closed).await?;
        self.refresh_shifts().await;

        info!(
            id = %closed.id,
            expected = ?closed.cash_expected.map(|m| m.minor()),
            counted = cash_counted.minor(),
            difference = ?closed.difference.map(|m| m.minor()),
            "Shift closed"
        );
        Ok(closed)
    }

    /// Running totals of the open shift.
    pub fn shift_summary(&self) -> ApiResult<ShiftSummary> {
        let open = self.active_shift().ok_or(CoreError::NoOpenShift)?;
        Ok(shift::summarize(self.cache.sales.items(), &open.id))
    }

    pub fn shift_dashboard(&self) -> ApiResult<ShiftDashboard> {
        debug!("shift_dashboard command");
        let open = self.active_shift().ok_or(CoreError::NoOpenShift)?;
        Ok(dashboard::build_dashboard(
            open,
            self.cache.sales.items(),
            self.cache.products.items(),
            self.cache.clients.items(),
        ))
    }

    /// Closed shifts with aggregates. Admin only.
    pub fn shift_history(&self) -> ApiResult<ShiftHistory> {
        debug!("shift_history command");
        self.require_admin()?;
        Ok(dashboard::shift_history(self.cache.shifts.items()))
    }
}
