//! # Shift Ledger
//!
//! Local view of the cashier's working session.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Shift Lifecycle                                     │
//! │                                                                         │
//! │        start request            server lists it                         │
//! │   ┌─────────┐ ─────────────► (remote) ─────────────► ┌─────────┐        │
//! │   │ NoShift │                                        │  Open   │        │
//! │   └─────────┘ ◄───────────────────────────────────── └─────────┘        │
//! │        ▲        close succeeded / server lists none       │             │
//! │        │                                                  │             │
//! │        └──────────── reset() ◄────────────────────────────┘             │
//! │                                                                         │
//! │  The server is authoritative: reconcile() overwrites local state.       │
//! │  Aggregates come from the server report, never accumulated locally.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Shift, ShiftSales};
use crate::validation::validate_cash_amount;

/// Whether a shift is open locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    NoShift,
    Open,
}

/// Payload for `POST /shifts/start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartShiftRequest {
    pub cashier_id: i64,
    pub initial_cash: Money,
}

/// Payload for `POST /shifts/close`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseShiftRequest {
    pub shift_id: i64,
    pub final_cash: Money,
    pub total_sales: Money,
    pub note: String,
}

/// Shift identity plus the last aggregates reported by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ShiftLedger {
    shift: Option<Shift>,
    initial_cash: Money,
    total_sales: Money,
    total_electronic_sales: Money,
    cant_sales: i64,
    report: Option<ShiftSales>,
    needs_opening: bool,
}

impl Default for ShiftLedger {
    fn default() -> Self {
        ShiftLedger {
            shift: None,
            initial_cash: Money::zero(),
            total_sales: Money::zero(),
            total_electronic_sales: Money::zero(),
            cant_sales: 0,
            report: None,
            needs_opening: true,
        }
    }
}

impl ShiftLedger {
    pub fn new() -> Self {
        ShiftLedger::default()
    }

    pub fn status(&self) -> ShiftStatus {
        if self.shift.is_some() {
            ShiftStatus::Open
        } else {
            ShiftStatus::NoShift
        }
    }

    /// Aligns local state with the server's list of open shifts.
    ///
    /// Returns the id of the open shift, if any, so the caller can refresh
    /// its sales. Zero shifts forces `NoShift`; otherwise the first entry wins.
    pub fn reconcile(&mut self, open_shifts: &[Shift]) -> Option<i64> {
        let Some(current) = open_shifts.first() else {
            self.reset();
            return None;
        };

        if self.shift_id() != Some(current.id) {
            self.clear_aggregates();
        }
        self.initial_cash = current.initial_cash;
        self.shift = Some(current.clone());
        self.needs_opening = false;
        Some(current.id)
    }

    /// Replaces the aggregates with a server report. Non-positive totals read as zero.
    pub fn apply_sales(&mut self, sales: &ShiftSales) {
        self.total_sales = sales.total_physical_amount.non_negative();
        self.total_electronic_sales = sales.total_electronic_amount.non_negative();
        self.cant_sales = sales.number_of_sales_in_shift.max(0);
        self.report = Some(sales.clone());
    }

    /// Returns to `NoShift` and raises the "open a shift" prompt.
    pub fn reset(&mut self) {
        *self = ShiftLedger::default();
    }

    fn clear_aggregates(&mut self) {
        self.total_sales = Money::zero();
        self.total_electronic_sales = Money::zero();
        self.cant_sales = 0;
        self.report = None;
    }

    /// Builds the start payload. Fails while a shift is already open.
    pub fn start_request(
        &self,
        cashier_id: i64,
        initial_cash: Money,
    ) -> CoreResult<StartShiftRequest> {
        if let Some(id) = self.shift_id() {
            return Err(CoreError::ShiftAlreadyOpen(id));
        }
        validate_cash_amount("initial cash", initial_cash)?;
        Ok(StartShiftRequest {
            cashier_id,
            initial_cash,
        })
    }

    /// Builds the close payload with the current physical sales total.
    pub fn close_request(&self, final_cash: Money, note: &str) -> CoreResult<CloseShiftRequest> {
        let shift_id = self.shift_id().ok_or(CoreError::NoOpenShift)?;
        validate_cash_amount("final cash", final_cash)?;
        Ok(CloseShiftRequest {
            shift_id,
            final_cash,
            total_sales: self.total_sales,
            note: note.trim().to_string(),
        })
    }

    pub fn shift_id(&self) -> Option<i64> {
        self.shift.as_ref().map(|s| s.id)
    }

    pub fn open_shift(&self) -> Option<&Shift> {
        self.shift.as_ref()
    }

    /// Last sales report received for the open shift.
    pub fn report(&self) -> Option<&ShiftSales> {
        self.report.as_ref()
    }

    pub fn initial_cash(&self) -> Money {
        self.initial_cash
    }

    /// Physical (cash) sales in the open shift.
    pub fn total_sales(&self) -> Money {
        self.total_sales
    }

    pub fn total_electronic_sales(&self) -> Money {
        self.total_electronic_sales
    }

    /// Number of sales in the open shift.
    pub fn cant_sales(&self) -> i64 {
        self.cant_sales
    }

    /// Cash that should be in the drawer: initial cash plus physical sales.
    pub fn expected_accumulated_cash(&self) -> Money {
        self.initial_cash + self.total_sales
    }

    /// True when the UI should prompt the cashier to open a shift.
    pub fn needs_opening(&self) -> bool {
        self.needs_opening
    }
}
