//! # Transfer Draft
//!
//! A pending inventory transfer being assembled at the register: origin,
//! destination and the products to move.
//!
//! ## Assembly Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Pick origin        available_origins()      (hides destination)    │
//! │  2. Pick destination   available_destinations() (hides origin)         │
//! │  3. Scan products      validate_candidate() → add_product()            │
//! │                          ├── not found         → ProductNotFound       │
//! │                          ├── stock == 0        → OutOfStock            │
//! │                          └── other warehouse   → ProductNotInOrigin    │
//! │  4. Register           to_request() → POST /transfers (Pendiente)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Origin and destination never point at the same warehouse
//! - At most one product per barcode

use crate::error::{CoreError, CoreResult};
use crate::types::{NewTransfer, Product, TransferLine, Warehouse};
use crate::TRANSFER_STATUS_PENDING;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferDraft {
    origin: Option<Warehouse>,
    destination: Option<Warehouse>,
    products: Vec<Product>,
}

impl TransferDraft {
    pub fn new() -> Self {
        TransferDraft::default()
    }

    /// Rebuilds a draft from cached parts.
    ///
    /// A cached pair that violates the distinct-endpoints rule keeps only the
    /// origin; duplicate barcodes keep their first occurrence.
    pub fn from_parts(
        origin: Option<Warehouse>,
        destination: Option<Warehouse>,
        products: Vec<Product>,
    ) -> Self {
        let destination = match (&origin, destination) {
            (Some(o), Some(d)) if o.id == d.id => None,
            (_, d) => d,
        };
        let mut draft = TransferDraft {
            origin,
            destination,
            products: Vec::with_capacity(products.len()),
        };
        for product in products {
            draft.add_product(product);
        }
        draft
    }

    pub fn origin(&self) -> Option<&Warehouse> {
        self.origin.as_ref()
    }

    pub fn destination(&self) -> Option<&Warehouse> {
        self.destination.as_ref()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// True when no products are queued.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Warehouses selectable as origin (everything except the destination).
    pub fn available_origins<'a>(&self, warehouses: &'a [Warehouse]) -> Vec<&'a Warehouse> {
        let excluded = self.destination.as_ref().map(|w| w.id);
        warehouses.iter().filter(|w| Some(w.id) != excluded).collect()
    }

    /// Warehouses selectable as destination (everything except the origin).
    pub fn available_destinations<'a>(&self, warehouses: &'a [Warehouse]) -> Vec<&'a Warehouse> {
        let excluded = self.origin.as_ref().map(|w| w.id);
        warehouses.iter().filter(|w| Some(w.id) != excluded).collect()
    }

    pub fn select_origin(&mut self, warehouse: Warehouse) -> CoreResult<()> {
        if self.destination.as_ref().map(|w| w.id) == Some(warehouse.id) {
            return Err(CoreError::SameTransferEndpoints(warehouse.id));
        }
        self.origin = Some(warehouse);
        Ok(())
    }

    pub fn select_destination(&mut self, warehouse: Warehouse) -> CoreResult<()> {
        if self.origin.as_ref().map(|w| w.id) == Some(warehouse.id) {
            return Err(CoreError::SameTransferEndpoints(warehouse.id));
        }
        self.destination = Some(warehouse);
        Ok(())
    }

    pub fn clear_origin(&mut self) {
        self.origin = None;
    }

    pub fn clear_destination(&mut self) {
        self.destination = None;
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Checks a barcode lookup result before it may join the draft.
    ///
    /// The checks run in order: found, in stock, stocked in the selected origin.
    pub fn validate_candidate(
        &self,
        barcode: &str,
        found: Option<Product>,
    ) -> CoreResult<Product> {
        let product = found.ok_or_else(|| CoreError::ProductNotFound(barcode.to_string()))?;

        if !product.in_stock() {
            return Err(CoreError::OutOfStock(product.barcode));
        }

        match &self.origin {
            Some(origin) if origin.id == product.storehouse_id => Ok(product),
            _ => Err(CoreError::ProductNotInOrigin {
                barcode: product.barcode,
            }),
        }
    }

    /// Queues a product. Returns `false` if its barcode is already queued.
    pub fn add_product(&mut self, product: Product) -> bool {
        if self.products.iter().any(|p| p.barcode == product.barcode) {
            return false;
        }
        self.products.push(product);
        true
    }

    /// Drops every queued product with this id. Returns `false` if none matched.
    pub fn remove_product(&mut self, id: i64) -> bool {
        let before = self.products.len();
        self.products.retain(|p| p.id != id);
        self.products.len() != before
    }

    /// Builds the registration payload. Only the two endpoints are required;
    /// an empty product list is left for the server to judge.
    pub fn to_request(&self) -> CoreResult<NewTransfer> {
        let (origin, destination) = match (&self.origin, &self.destination) {
            (Some(o), Some(d)) => (o, d),
            _ => return Err(CoreError::MissingTransferEndpoints),
        };
        if origin.id == destination.id {
            return Err(CoreError::SameTransferEndpoints(origin.id));
        }

        Ok(NewTransfer {
            from_storehouse_id: origin.id,
            to_storehouse_id: destination.id,
            status: TRANSFER_STATUS_PENDING.to_string(),
            products: self.products.iter().map(|p| TransferLine { id: p.id }).collect(),
        })
    }

    /// Drops products and both selections.
    pub fn clear(&mut self) {
        *self = TransferDraft::default();
    }
}
