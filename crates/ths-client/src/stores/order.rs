//! # Order Service
//!
//! Registers sales and reads the order history.
//!
//! ```text
//! register_order(cart, request)
//!     │
//!     ├── shift id ◄── ShiftStore
//!     ├── build_order()      empty cart / no shift / bad amounts → toast + Err
//!     ├── POST /orders       failure → toast + Err
//!     └── Receipt            success → toast + Ok
//! ```

use std::sync::Arc;
use tracing::{error, info, warn};

use ths_core::order::{build_order, CheckoutRequest};
use ths_core::{Cart, Order, OrderDetail, Receipt};

use super::{Loading, Services, ShiftStore};
use crate::error::{ClientError, ClientResult};

pub struct OrderService {
    services: Services,
    shifts: Arc<ShiftStore>,
    loading: Loading,
}

impl OrderService {
    pub fn new(services: Services, shifts: Arc<ShiftStore>) -> Self {
        Self {
            services,
            shifts,
            loading: Loading::default(),
        }
    }

    /// True while an order request is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    /// Sends `cart` as an order against the open shift.
    ///
    /// Local checks run first; nothing is sent unless they pass.
    pub async fn register_order(
        &self,
        cart: &Cart,
        request: &CheckoutRequest,
    ) -> ClientResult<Receipt> {
        let _loading = self.loading.start();

        let order = match build_order(cart, self.shifts.shift_id(), request) {
            Ok(order) => order,
            Err(e) => {
                warn!(error = %e, "Order rejected locally");
                self.services.notifier.error(&e.to_string());
                return Err(ClientError::Core(e));
            }
        };

        match self.services.api.register_order(&order).await {
            Ok(receipt) => {
                info!(
                    shift_id = ?order.shift_id,
                    total = %order.total,
                    lines = order.products.len(),
                    "Order registered"
                );
                self.services.notifier.success("Order registered");
                Ok(receipt)
            }
            Err(e) => {
                error!(error = %e, "Failed to register order");
                self.services
                    .notifier
                    .error(&format!("Failed to register order: {}", e));
                Err(e)
            }
        }
    }

    /// Every order on the server. Failures read as an empty list.
    pub async fn all_orders(&self) -> Vec<Order> {
        let _loading = self.loading.start();
        self.services.api.fetch_orders().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to fetch orders");
            Vec::new()
        })
    }

    /// Lines of one order. `None` or a failure reads as an empty list.
    pub async fn order_detail(&self, order_id: Option<i64>) -> Vec<OrderDetail> {
        let Some(order_id) = order_id else {
            return Vec::new();
        };
        let _loading = self.loading.start();
        self.services
            .api
            .fetch_order_detail(order_id)
            .await
            .unwrap_or_else(|e| {
                warn!(order_id, error = %e, "Failed to fetch order detail");
                Vec::new()
            })
    }
}
