//! Sales in process parked on the server (`/carts`), so the register can
//! serve the next customer and resume later.

use tracing::{info, warn};

use ths_core::{Cart, CartItem, HeldSale};

use super::Services;
use crate::api::HoldSaleRequest;
use crate::error::{ClientError, ClientResult};

pub struct HeldSalesService {
    services: Services,
}

impl HeldSalesService {
    pub fn new(services: Services) -> Self {
        Self { services }
    }

    /// Parked sales. Failures read as an empty list.
    pub async fn list(&self) -> Vec<HeldSale> {
        self.services
            .api
            .fetch_held_sales()
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to fetch held sales");
                Vec::new()
            })
    }

    /// Parks `items` as a serialized cart.
    pub async fn hold(&self, items: &[CartItem]) -> ClientResult<()> {
        if items.is_empty() {
            let err = ClientError::from(ths_core::CoreError::EmptyCart);
            self.services.notifier.error(&err.to_string());
            return Err(err);
        }

        let request = HoldSaleRequest {
            string: serde_json::to_string(items)?,
        };
        match self.services.api.hold_sale(&request).await {
            Ok(()) => {
                info!(lines = items.len(), "Sale held");
                self.services.notifier.success("Sale held");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to hold sale");
                self.services
                    .notifier
                    .error(&format!("Failed to hold sale: {}", e));
                Err(e)
            }
        }
    }

    /// Deletes a parked sale. Returns `false` (and logs) on failure.
    pub async fn delete(&self, id: i64) -> bool {
        match self.services.api.delete_held_sale(id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(id, error = %e, "Failed to delete held sale");
                false
            }
        }
    }

    /// Decodes the cart stored in a parked sale.
    pub fn decode(sale: &HeldSale) -> ClientResult<Cart> {
        let items: Vec<CartItem> = serde_json::from_str(&sale.cart_info.string)?;
        Ok(Cart::from_items(items))
    }
}
