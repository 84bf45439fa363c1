//! # Shift Store
//!
//! Keeps the local [`ShiftLedger`] in step with the server.
//!
//! ## Sync Points
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  check_for_open_shift()   GET /shifts/open                              │
//! │        ├── []      → NoShift, "open a shift" prompt raised              │
//! │        └── [s, ..] → Open(s), then GET /orders/shift/:id                │
//! │                                                                         │
//! │  start_new_shift(cash)    POST /shifts/start → check_for_open_shift()   │
//! │  close_shift(cash, note)  POST /shifts/close → reset_shift_data()       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ledger never counts sales itself; totals always come from the report.

use std::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, instrument, warn};

use ths_core::{Money, ShiftLedger, ShiftSales, ShiftStatus};

use super::{Loading, Services};
use crate::error::{ClientError, ClientResult};

pub struct ShiftStore {
    services: Services,
    ledger: Mutex<ShiftLedger>,
    cashier_id: Mutex<Option<i64>>,
    loading: Loading,
}

impl ShiftStore {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            ledger: Mutex::new(ShiftLedger::new()),
            cashier_id: Mutex::new(None),
            loading: Loading::default(),
        }
    }

    /// True while a shift request is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    fn ledger(&self) -> MutexGuard<'_, ShiftLedger> {
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sets the cashier that new shifts are opened for.
    pub fn set_cashier(&self, cashier_id: Option<i64>) {
        *self.cashier_id.lock().unwrap_or_else(|e| e.into_inner()) = cashier_id;
    }

    pub fn cashier_id(&self) -> Option<i64> {
        *self.cashier_id.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Asks the server which shift is open and adopts its answer.
    ///
    /// On a transport failure the local state is left alone.
    #[instrument(skip(self))]
    pub async fn check_for_open_shift(&self) -> Option<i64> {
        let _loading = self.loading.start();
        let open = match self.services.api.fetch_open_shifts().await {
            Ok(open) => open,
            Err(e) => {
                error!(error = %e, "Failed to fetch open shifts");
                return self.shift_id();
            }
        };

        let shift_id = self.ledger().reconcile(&open);
        match shift_id {
            Some(id) => {
                debug!(shift_id = id, "Open shift found");
                self.sales_by_id(id).await;
            }
            None => info!("No open shift"),
        }
        shift_id
    }

    /// Opens a shift for the current cashier with `initial_cash` in the drawer.
    pub async fn start_new_shift(&self, initial_cash: Money) -> ClientResult<()> {
        let Some(cashier_id) = self.cashier_id() else {
            self.services.notifier.error("Log in before opening a shift");
            return Err(ClientError::NotAuthenticated);
        };

        let request = match self.ledger().start_request(cashier_id, initial_cash) {
            Ok(request) => request,
            Err(e) => {
                self.services.notifier.error(&e.to_string());
                return Err(e.into());
            }
        };

        let _loading = self.loading.start();
        if let Err(e) = self.services.api.start_shift(&request).await {
            error!(cashier_id, error = %e, "Failed to start shift");
            self.services
                .notifier
                .error(&format!("Failed to start shift: {}", e));
            return Err(e);
        }

        info!(cashier_id, initial_cash = %initial_cash, "Shift started");
        self.services.notifier.success("Shift started");
        self.check_for_open_shift().await;
        Ok(())
    }

    /// Closes the open shift with the counted cash and a free-text note.
    pub async fn close_shift(&self, final_cash: Money, note: &str) -> ClientResult<()> {
        let request = match self.ledger().close_request(final_cash, note) {
            Ok(request) => request,
            Err(e) => {
                self.services.notifier.error(&e.to_string());
                return Err(e.into());
            }
        };

        let _loading = self.loading.start();
        if let Err(e) = self.services.api.close_shift(&request).await {
            error!(shift_id = request.shift_id, error = %e, "Failed to close shift");
            self.services
                .notifier
                .error(&format!("Failed to close shift: {}", e));
            return Err(e);
        }

        info!(
            shift_id = request.shift_id,
            final_cash = %request.final_cash,
            total_sales = %request.total_sales,
            "Shift closed"
        );
        self.reset_shift_data();
        self.services.notifier.success("Shift closed");
        Ok(())
    }

    /// Drops the local shift and its aggregates.
    pub fn reset_shift_data(&self) {
        self.ledger().reset();
    }

    /// Fetches the sales report of `shift_id`.
    ///
    /// The report updates the aggregates only when it belongs to the open shift.
    pub async fn sales_by_id(&self, shift_id: i64) -> Option<ShiftSales> {
        let _loading = self.loading.start();
        match self.services.api.fetch_shift_sales(shift_id).await {
            Ok(sales) => {
                let mut ledger = self.ledger();
                if ledger.shift_id() == Some(shift_id) {
                    ledger.apply_sales(&sales);
                }
                Some(sales)
            }
            Err(e) => {
                warn!(shift_id, error = %e, "Failed to fetch shift sales");
                self.services
                    .notifier
                    .error(&format!("Failed to load shift sales: {}", e));
                None
            }
        }
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn status(&self) -> ShiftStatus {
        self.ledger().status()
    }

    pub fn shift_id(&self) -> Option<i64> {
        self.ledger().shift_id()
    }

    /// Copy of the ledger for rendering the shift screen.
    pub fn ledger_snapshot(&self) -> ShiftLedger {
        self.ledger().clone()
    }

    pub fn initial_cash(&self) -> Money {
        self.ledger().initial_cash()
    }

    pub fn total_sales(&self) -> Money {
        self.ledger().total_sales()
    }

    pub fn total_electronic_sales(&self) -> Money {
        self.ledger().total_electronic_sales()
    }

    pub fn cant_sales(&self) -> i64 {
        self.ledger().cant_sales()
    }

    pub fn expected_accumulated_cash(&self) -> Money {
        self.ledger().expected_accumulated_cash()
    }

    pub fn needs_opening(&self) -> bool {
        self.ledger().needs_opening()
    }
}
