//! # Remote API Gateway
//!
//! [`PosApi`] is the seam between the stores and the backend. Stores only
//! see the trait, so tests swap in an in-memory implementation.
//!
//! ## Endpoint Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Core service (api.core_url)          Catalog service (api.catalog_url)│
//! │  ───────────────────────────          ─────────────────────────────────│
//! │  POST /login                          POST /productsTNT                │
//! │  GET  /users                          GET  /promo-codes                │
//! │  GET  /products                       POST /promo-codes                │
//! │  GET  /products/search?name|barcode                                    │
//! │  GET|POST /carts, DELETE /carts/:id                                    │
//! │  POST /orders  (→ PDF receipt)                                         │
//! │  GET  /orders, GET /orderdetails/:id                                   │
//! │  GET  /storehouses                                                     │
//! │  GET|POST /transfers                                                   │
//! │  GET  /shifts/open, POST /shifts/start, POST /shifts/close             │
//! │  GET  /orders/shift/:id                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use ths_core::shift::{CloseShiftRequest, StartShiftRequest};
use ths_core::{
    HeldSale, NewOrder, NewProduct, NewTransfer, Order, OrderDetail, Percentage, Product,
    PromoCode, Receipt, Shift, ShiftSales, TransferRecord, User, Warehouse,
};

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::http::{RestClient, TokenSlot};

// =============================================================================
// Request / Response DTOs
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful login. Only the token is used; the user comes from `/users`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user_pin: Option<String>,
}

/// Body of `POST /carts`: the serialized cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoldSaleRequest {
    pub string: String,
}

/// Body of `POST /promo-codes`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPromoCode {
    pub code: String,
    pub discount: Percentage,
    /// Stored as 0/1 by the catalog service.
    pub is_active: u8,
}

// =============================================================================
// Gateway Trait
// =============================================================================

/// Every remote call the client makes.
#[async_trait]
pub trait PosApi: Send + Sync {
    /// Sets or clears the bearer token sent with every request.
    fn set_token(&self, token: Option<String>);

    async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse>;
    async fn fetch_users(&self) -> ClientResult<Vec<User>>;

    async fn fetch_products(&self) -> ClientResult<Vec<Product>>;
    async fn search_products_by_name(&self, name: &str) -> ClientResult<Vec<Product>>;
    async fn search_products_by_barcode(&self, barcode: &str) -> ClientResult<Vec<Product>>;
    async fn create_product(&self, product: &NewProduct) -> ClientResult<serde_json::Value>;

    async fn fetch_held_sales(&self) -> ClientResult<Vec<HeldSale>>;
    async fn hold_sale(&self, request: &HoldSaleRequest) -> ClientResult<()>;
    async fn delete_held_sale(&self, id: i64) -> ClientResult<()>;

    async fn register_order(&self, order: &NewOrder) -> ClientResult<Receipt>;
    async fn fetch_orders(&self) -> ClientResult<Vec<Order>>;
    async fn fetch_order_detail(&self, order_id: i64) -> ClientResult<Vec<OrderDetail>>;

    async fn fetch_warehouses(&self) -> ClientResult<Vec<Warehouse>>;
    async fn fetch_transfers(&self) -> ClientResult<Vec<TransferRecord>>;
    async fn register_transfer(&self, transfer: &NewTransfer) -> ClientResult<serde_json::Value>;

    async fn fetch_open_shifts(&self) -> ClientResult<Vec<Shift>>;
    async fn start_shift(&self, request: &StartShiftRequest) -> ClientResult<()>;
    async fn close_shift(&self, request: &CloseShiftRequest) -> ClientResult<()>;
    async fn fetch_shift_sales(&self, shift_id: i64) -> ClientResult<ShiftSales>;

    async fn fetch_promo_codes(&self) -> ClientResult<Vec<PromoCode>>;
    async fn create_promo_code(&self, code: &NewPromoCode) -> ClientResult<()>;
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// [`PosApi`] over the two REST services.
#[derive(Debug, Clone)]
pub struct HttpPosApi {
    core: RestClient,
    catalog: RestClient,
}

impl HttpPosApi {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let token = TokenSlot::default();
        let timeout = config.timeout();
        Ok(Self {
            core: RestClient::with_token_slot(&config.api.core_url, timeout, token.clone())?,
            catalog: RestClient::with_token_slot(&config.api.catalog_url, timeout, token)?,
        })
    }
}

#[async_trait]
impl PosApi for HttpPosApi {
    fn set_token(&self, token: Option<String>) {
        self.core.set_token(token);
    }

    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        self.core.post("login", &LoginRequest { email, password }).await
    }

    async fn fetch_users(&self) -> ClientResult<Vec<User>> {
        self.core.get("users").await
    }

    async fn fetch_products(&self) -> ClientResult<Vec<Product>> {
        self.core.get("products").await
    }

    async fn search_products_by_name(&self, name: &str) -> ClientResult<Vec<Product>> {
        self.core
            .get_with_query("products/search", &[("name", name)])
            .await
    }

    async fn search_products_by_barcode(&self, barcode: &str) -> ClientResult<Vec<Product>> {
        self.core
            .get_with_query("products/search", &[("barcode", barcode)])
            .await
    }

    async fn create_product(&self, product: &NewProduct) -> ClientResult<serde_json::Value> {
        self.catalog.post("productsTNT", product).await
    }

    async fn fetch_held_sales(&self) -> ClientResult<Vec<HeldSale>> {
        self.core.get("carts").await
    }

    async fn hold_sale(&self, request: &HoldSaleRequest) -> ClientResult<()> {
        self.core.post_unit("carts", request).await
    }

    async fn delete_held_sale(&self, id: i64) -> ClientResult<()> {
        self.core.delete(&format!("carts/{}", id)).await
    }

    #[instrument(
        skip(self, order),
        fields(shift_id = ?order.shift_id, lines = order.products.len())
    )]
    async fn register_order(&self, order: &NewOrder) -> ClientResult<Receipt> {
        let (content_type, bytes) = self.core.post_bytes("orders", order).await?;
        Ok(Receipt {
            content_type,
            bytes,
        })
    }

    async fn fetch_orders(&self) -> ClientResult<Vec<Order>> {
        self.core.get("orders").await
    }

    async fn fetch_order_detail(&self, order_id: i64) -> ClientResult<Vec<OrderDetail>> {
        self.core.get(&format!("orderdetails/{}", order_id)).await
    }

    async fn fetch_warehouses(&self) -> ClientResult<Vec<Warehouse>> {
        self.core.get("storehouses").await
    }

    async fn fetch_transfers(&self) -> ClientResult<Vec<TransferRecord>> {
        self.core.get("transfers").await
    }

    async fn register_transfer(&self, transfer: &NewTransfer) -> ClientResult<serde_json::Value> {
        self.core.post("transfers", transfer).await
    }

    async fn fetch_open_shifts(&self) -> ClientResult<Vec<Shift>> {
        self.core.get("shifts/open").await
    }

    async fn start_shift(&self, request: &StartShiftRequest) -> ClientResult<()> {
        self.core.post_unit("shifts/start", request).await
    }

    async fn close_shift(&self, request: &CloseShiftRequest) -> ClientResult<()> {
        self.core.post_unit("shifts/close", request).await
    }

    async fn fetch_shift_sales(&self, shift_id: i64) -> ClientResult<ShiftSales> {
        self.core.get(&format!("orders/shift/{}", shift_id)).await
    }

    async fn fetch_promo_codes(&self) -> ClientResult<Vec<PromoCode>> {
        self.catalog.get("promo-codes").await
    }

    async fn create_promo_code(&self, code: &NewPromoCode) -> ClientResult<()> {
        self.catalog.post_unit("promo-codes", code).await
    }
}
