//! # Order Building
//!
//! Converts a cart snapshot plus the tender details into the payload
//! submitted at checkout.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Checkout                                          │
//! │                                                                         │
//! │  Cart ──────────┐                                                       │
//! │                 │                                                       │
//! │  CheckoutRequest├──► build_order() ──► NewOrder ──► POST /orders       │
//! │                 │        │                              │               │
//! │  Open shift id ─┘        │                              ▼               │
//! │                          ├── empty cart? → EmptyCart    Receipt (PDF)   │
//! │                          └── no shift?   → NoOpenShift                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines carry id, name, quantity and discount only. The backend recomputes
//! prices from the product id.

use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, Percentage};
use crate::types::{NewOrder, OrderLine, PaymentMethod};
use crate::validation::{validate_cash_amount, validate_discount};
use crate::ORDER_STATUS_PENDING;

// =============================================================================
// Payment Breakdown
// =============================================================================

/// How a total is split between the cash drawer and electronic payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBreakdown {
    /// Cash handed over by the customer (before change).
    pub cash_received: Money,
    /// Portion of the total that stays in the drawer.
    pub physical_amount: Money,
    /// Portion of the total paid by card or bank transfer.
    pub electronic_amount: Money,
}

impl PaymentBreakdown {
    /// Splits `total` according to the payment method.
    ///
    /// ## Rules
    /// ```text
    /// Cash            physical = total, cash received must cover it
    /// Card / Transfer electronic = total, no cash
    /// Mixed           physical = min(cash received, total), electronic = rest
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use ths_core::order::PaymentBreakdown;
    /// use ths_core::{Money, PaymentMethod};
    ///
    /// let split = PaymentBreakdown::split(
    ///     PaymentMethod::CashCard,
    ///     Money::from_cents(23000),
    ///     Money::from_cents(10000),
    /// ).unwrap();
    /// assert_eq!(split.physical_amount.cents(), 10000);
    /// assert_eq!(split.electronic_amount.cents(), 13000);
    /// ```
    pub fn split(
        method: PaymentMethod,
        total: Money,
        cash_received: Money,
    ) -> Result<Self, ValidationError> {
        validate_cash_amount("cash received", cash_received)?;

        let breakdown = match method {
            PaymentMethod::Cash => {
                if cash_received < total {
                    return Err(ValidationError::OutOfRange {
                        field: "cash received".to_string(),
                        min: total.cents(),
                        max: i64::MAX,
                    });
                }
                PaymentBreakdown {
                    cash_received,
                    physical_amount: total,
                    electronic_amount: Money::zero(),
                }
            }
            PaymentMethod::Card | PaymentMethod::Transfer => PaymentBreakdown {
                cash_received: Money::zero(),
                physical_amount: Money::zero(),
                electronic_amount: total,
            },
            PaymentMethod::CashCard | PaymentMethod::CashTransfer => {
                let physical = cash_received.min(total);
                PaymentBreakdown {
                    cash_received,
                    physical_amount: physical,
                    electronic_amount: total - physical,
                }
            }
        };
        Ok(breakdown)
    }

    /// Change owed to the customer.
    pub fn change_due(&self) -> Money {
        (self.cash_received - self.physical_amount).non_negative()
    }
}

// =============================================================================
// Checkout Request
// =============================================================================

/// Tender details collected on the checkout screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub user_id: i64,
    pub user_pin: String,
    pub payment_method: PaymentMethod,
    /// Order-level discount, reported alongside the line discounts.
    pub discount: Percentage,
    pub status: String,
    pub payment: PaymentBreakdown,
    pub commission: Money,
}

impl CheckoutRequest {
    /// A pending order with no discount and no commission.
    pub fn new(
        user_id: i64,
        user_pin: impl Into<String>,
        payment_method: PaymentMethod,
        payment: PaymentBreakdown,
    ) -> Self {
        CheckoutRequest {
            user_id,
            user_pin: user_pin.into(),
            payment_method,
            discount: Percentage::zero(),
            status: ORDER_STATUS_PENDING.to_string(),
            payment,
            commission: Money::zero(),
        }
    }

    pub fn with_discount(mut self, discount: Percentage) -> Self {
        self.discount = discount;
        self
    }

    pub fn with_commission(mut self, commission: Money) -> Self {
        self.commission = commission;
        self
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builds the order payload for `cart`.
///
/// `total` is the cart's payable amount (line discounts applied). The
/// order-level `discount` travels as its own field and the backend applies it.
///
/// ## Errors
/// - [`CoreError::EmptyCart`] when there is nothing to sell
/// - [`CoreError::NoOpenShift`] when `shift_id` is `None`
/// - [`CoreError::Validation`] for an out-of-range discount or negative amounts
pub fn build_order(
    cart: &Cart,
    shift_id: Option<i64>,
    request: &CheckoutRequest,
) -> CoreResult<NewOrder> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    let shift_id = shift_id.ok_or(CoreError::NoOpenShift)?;

    validate_discount(request.discount)?;
    validate_cash_amount("commission", request.commission)?;
    validate_cash_amount("physical amount", request.payment.physical_amount)?;
    validate_cash_amount("electronic amount", request.payment.electronic_amount)?;

    let status = if request.status.trim().is_empty() {
        ORDER_STATUS_PENDING.to_string()
    } else {
        request.status.clone()
    };

    let products = cart
        .items()
        .iter()
        .map(|item| OrderLine {
            id: item.product.id,
            name: item.product.name.clone(),
            quantity: item.quantity,
            discount: item.discount,
        })
        .collect();

    Ok(NewOrder {
        user_id: request.user_id,
        user_pin: request.user_pin.clone(),
        total: cart.total_payable(),
        status,
        payment_method: request.payment_method,
        discount: request.discount,
        cash_received: request.payment.cash_received,
        physical_amount: request.payment.physical_amount,
        electronic_amount: request.payment.electronic_amount,
        commission: request.commission,
        products,
        shift_id: Some(shift_id),
    })
}
