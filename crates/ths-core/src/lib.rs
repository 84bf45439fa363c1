//! # ths-core: Pure Business Logic for THS POS
//!
//! This crate is the **heart** of the THS POS client. It contains the cart,
//! shift and transfer rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        THS POS Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI (cashier screens)                         │   │
//! │  │    Search ──► Cart ──► Checkout ──► Receipt ──► Shift close    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ method calls                           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    ths-client (stores)                          │   │
//! │  │    CartStore, ShiftStore, TransferStore, CatalogStore, ...      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ths-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐  │   │
//! │  │   │  types  │ │  money  │ │  cart   │ │  shift   │ │transfer│  │   │
//! │  │   │ Product │ │  Money  │ │  Cart   │ │  Ledger  │ │ Draft  │  │   │
//! │  │   │  Order  │ │ Percent │ │CartItem │ │  Status  │ │        │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO CACHE • PURE FUNCTIONS               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, Shift, Warehouse, ...)
//! - [`money`] - Money and Percentage types with integer arithmetic
//! - [`cart`] - Cart line items and derived totals
//! - [`order`] - Order payload building from a cart snapshot
//! - [`shift`] - Cashier shift ledger
//! - [`transfer`] - Pending inventory transfer draft
//! - [`catalog`] - Product list filtering
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use ths_core::money::{Money, Percentage};
//!
//! let price = Money::from_cents(10000); // $100.00
//! let discounted = price.apply_percentage_discount(Percentage::from_percent(10));
//! assert_eq!(discounted.cents(), 9000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod error;
pub mod money;
pub mod order;
pub mod shift;
pub mod transfer;
pub mod types;
pub mod validation;

mod wire;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Percentage};
pub use shift::{ShiftLedger, ShiftStatus};
pub use transfer::TransferDraft;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Status sent with every newly registered transfer.
///
/// Progress past this state happens server-side and is not modelled here.
pub const TRANSFER_STATUS_PENDING: &str = "Pendiente";

/// Default status for orders submitted from the register.
pub const ORDER_STATUS_PENDING: &str = "pendiente";

/// Maximum quantity accepted in a single "add with quantity" request.
///
/// Stock is the real bound; this only guards against typos like 10000 for 10.
pub const MAX_ITEM_QUANTITY: i64 = 9999;
