//! In-memory gateway and fixtures for store tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, Notify};

use ths_core::shift::{CloseShiftRequest, StartShiftRequest};
use ths_core::{
    HeldCartInfo, HeldSale, Money, NewOrder, NewProduct, NewTransfer, Order, OrderDetail, Product,
    PromoCode, Receipt, Shift, ShiftSales, TransferRecord, User, Warehouse,
};

use crate::api::{HoldSaleRequest, LoginResponse, NewPromoCode, PosApi};
use crate::cache::MemoryCache;
use crate::error::{ClientError, ClientResult};
use crate::notify::{ChannelNotifier, Notification};
use crate::stores::Services;

/// Canned backend data plus a log of what the stores sent.
#[derive(Default)]
pub struct FakeState {
    pub token: Option<String>,
    pub users: Vec<User>,
    pub products: Vec<Product>,
    pub warehouses: Vec<Warehouse>,
    pub transfers: Vec<TransferRecord>,
    pub open_shifts: Vec<Shift>,
    pub shift_sales: HashMap<i64, ShiftSales>,
    pub orders: Vec<Order>,
    pub order_details: HashMap<i64, Vec<OrderDetail>>,
    pub promo_codes: Vec<PromoCode>,
    pub held_sales: Vec<HeldSale>,

    /// Endpoints (by method name) that answer with a 500.
    pub failing: HashSet<&'static str>,
    pub calls: Vec<&'static str>,

    pub registered_orders: Vec<NewOrder>,
    pub registered_transfers: Vec<NewTransfer>,
    pub started_shifts: Vec<StartShiftRequest>,
    pub closed_shifts: Vec<CloseShiftRequest>,
    pub created_products: Vec<NewProduct>,
    pub created_promo_codes: Vec<NewPromoCode>,
    pub held: Vec<HoldSaleRequest>,
    pub deleted_held: Vec<i64>,
}

#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
    /// Gated endpoints wait on their handle before answering.
    gates: Mutex<HashMap<&'static str, Arc<Notify>>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn fail(&self, endpoint: &'static str) {
        self.state().failing.insert(endpoint);
    }

    pub fn heal(&self, endpoint: &'static str) {
        self.state().failing.remove(endpoint);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    pub fn called(&self, endpoint: &str) -> bool {
        self.state().calls.iter().any(|c| *c == endpoint)
    }

    /// Holds `endpoint` in flight until the returned handle is notified.
    pub fn gate(&self, endpoint: &'static str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(endpoint, gate.clone());
        gate
    }

    pub fn gate_orders(&self) -> Arc<Notify> {
        self.gate("register_order")
    }

    async fn pass_gate(&self, endpoint: &'static str) {
        let gate = self.gates.lock().unwrap().get(endpoint).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn record(&self, endpoint: &'static str) -> ClientResult<MutexGuard<'_, FakeState>> {
        let mut state = self.state();
        state.calls.push(endpoint);
        if state.failing.contains(endpoint) {
            return Err(ClientError::Api {
                status: 500,
                message: format!("{} failed", endpoint),
            });
        }
        Ok(state)
    }
}

#[async_trait]
impl PosApi for FakeApi {
    fn set_token(&self, token: Option<String>) {
        self.state().token = token;
    }

    async fn login(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        let _state = self.record("login")?;
        if password != "secret" {
            return Err(ClientError::Unauthorized);
        }
        Ok(LoginResponse {
            token: format!("token-{}", email),
            user_pin: None,
        })
    }

    async fn fetch_users(&self) -> ClientResult<Vec<User>> {
        let users = self.record("fetch_users")?.users.clone();
        self.pass_gate("fetch_users").await;
        Ok(users)
    }

    async fn fetch_products(&self) -> ClientResult<Vec<Product>> {
        let products = self.record("fetch_products")?.products.clone();
        self.pass_gate("fetch_products").await;
        Ok(products)
    }

    async fn search_products_by_name(&self, name: &str) -> ClientResult<Vec<Product>> {
        let state = self.record("search_products_by_name")?;
        let needle = name.to_lowercase();
        Ok(state
            .products
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn search_products_by_barcode(&self, barcode: &str) -> ClientResult<Vec<Product>> {
        let state = self.record("search_products_by_barcode")?;
        Ok(state
            .products
            .iter()
            .filter(|p| p.barcode == barcode)
            .cloned()
            .collect())
    }

    async fn create_product(&self, product: &NewProduct) -> ClientResult<serde_json::Value> {
        let mut state = self.record("create_product")?;
        state.created_products.push(product.clone());
        Ok(serde_json::json!({ "ok": true }))
    }

    async fn fetch_held_sales(&self) -> ClientResult<Vec<HeldSale>> {
        Ok(self.record("fetch_held_sales")?.held_sales.clone())
    }

    async fn hold_sale(&self, request: &HoldSaleRequest) -> ClientResult<()> {
        let mut state = self.record("hold_sale")?;
        state.held.push(request.clone());
        let id = state.held_sales.len() as i64 + 1;
        state.held_sales.push(HeldSale {
            id,
            created_at: String::new(),
            cart_info: HeldCartInfo {
                string: request.string.clone(),
                json: String::new(),
                pass: 0,
            },
        });
        Ok(())
    }

    async fn delete_held_sale(&self, id: i64) -> ClientResult<()> {
        let mut state = self.record("delete_held_sale")?;
        state.deleted_held.push(id);
        state.held_sales.retain(|s| s.id != id);
        Ok(())
    }

    async fn register_order(&self, order: &NewOrder) -> ClientResult<Receipt> {
        self.record("register_order")?
            .registered_orders
            .push(order.clone());
        self.pass_gate("register_order").await;
        Ok(Receipt {
            content_type: "application/pdf".to_string(),
            bytes: b"%PDF-1.4 receipt".to_vec(),
        })
    }

    async fn fetch_orders(&self) -> ClientResult<Vec<Order>> {
        Ok(self.record("fetch_orders")?.orders.clone())
    }

    async fn fetch_order_detail(&self, order_id: i64) -> ClientResult<Vec<OrderDetail>> {
        let state = self.record("fetch_order_detail")?;
        Ok(state.order_details.get(&order_id).cloned().unwrap_or_default())
    }

    async fn fetch_warehouses(&self) -> ClientResult<Vec<Warehouse>> {
        let warehouses = self.record("fetch_warehouses")?.warehouses.clone();
        self.pass_gate("fetch_warehouses").await;
        Ok(warehouses)
    }

    async fn fetch_transfers(&self) -> ClientResult<Vec<TransferRecord>> {
        Ok(self.record("fetch_transfers")?.transfers.clone())
    }

    async fn register_transfer(&self, transfer: &NewTransfer) -> ClientResult<serde_json::Value> {
        let mut state = self.record("register_transfer")?;
        state.registered_transfers.push(transfer.clone());
        Ok(serde_json::json!({ "id": state.registered_transfers.len() }))
    }

    async fn fetch_open_shifts(&self) -> ClientResult<Vec<Shift>> {
        let open = self.record("fetch_open_shifts")?.open_shifts.clone();
        self.pass_gate("fetch_open_shifts").await;
        Ok(open)
    }

    async fn start_shift(&self, request: &StartShiftRequest) -> ClientResult<()> {
        let mut state = self.record("start_shift")?;
        state.started_shifts.push(request.clone());
        let id = 100 + state.started_shifts.len() as i64;
        let mut opened = shift(id, request.initial_cash.cents());
        opened.cashier_id = request.cashier_id;
        state.open_shifts = vec![opened];
        Ok(())
    }

    async fn close_shift(&self, request: &CloseShiftRequest) -> ClientResult<()> {
        let mut state = self.record("close_shift")?;
        state.closed_shifts.push(request.clone());
        state.open_shifts.retain(|s| s.id != request.shift_id);
        Ok(())
    }

    async fn fetch_shift_sales(&self, shift_id: i64) -> ClientResult<ShiftSales> {
        let state = self.record("fetch_shift_sales")?;
        state
            .shift_sales
            .get(&shift_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("shift {}", shift_id)))
    }

    async fn fetch_promo_codes(&self) -> ClientResult<Vec<PromoCode>> {
        Ok(self.record("fetch_promo_codes")?.promo_codes.clone())
    }

    async fn create_promo_code(&self, code: &NewPromoCode) -> ClientResult<()> {
        let mut state = self.record("create_promo_code")?;
        state.created_promo_codes.push(code.clone());
        let id = state.promo_codes.len() as i64 + 1;
        state.promo_codes.push(PromoCode {
            id,
            code: code.code.clone(),
            discount: code.discount,
            is_active: code.is_active == 1,
        });
        Ok(())
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub api: Arc<FakeApi>,
    pub cache: Arc<MemoryCache>,
    pub services: Services,
    pub toasts: mpsc::UnboundedReceiver<Notification>,
}

impl Harness {
    pub fn new() -> Self {
        let api = FakeApi::new();
        let cache = Arc::new(MemoryCache::new());
        let (notifier, toasts) = ChannelNotifier::new();
        let services = Services::new(api.clone(), cache.clone(), Arc::new(notifier));
        Self {
            api,
            cache,
            services,
            toasts,
        }
    }

    /// Notifications emitted since the last drain.
    pub fn drain(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = self.toasts.try_recv() {
            out.push(n);
        }
        out
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn product(id: i64, barcode: &str, name: &str, price_cents: i64, stock: i64) -> Product {
    Product {
        id,
        barcode: barcode.to_string(),
        name: name.to_string(),
        brand: String::new(),
        image: String::new(),
        internal_reference: None,
        cost: Money::zero(),
        sale_price: Money::from_cents(price_cents),
        stock_quantity: stock,
        storehouse_id: 1,
    }
}

pub fn warehouse(id: i64, name: &str) -> Warehouse {
    Warehouse {
        id,
        name: name.to_string(),
        location: String::new(),
    }
}

pub fn user(id: i64, email: &str) -> User {
    User {
        id,
        name: format!("Cajero {}", id),
        email: email.to_string(),
        pin: "1234".to_string(),
    }
}

pub fn shift(id: i64, initial_cents: i64) -> Shift {
    Shift {
        id,
        cashier_id: 1,
        start: "2024-03-01 08:00:00.000".to_string(),
        end: None,
        initial_cash: Money::from_cents(initial_cents),
        final_cash: None,
        total_sales: None,
        status: "open".to_string(),
        closed_at: None,
        note: None,
    }
}

pub fn shift_sales(
    shift_id: i64,
    physical_cents: i64,
    electronic_cents: i64,
    count: i64,
) -> ShiftSales {
    ShiftSales {
        number_of_sales_in_shift: count,
        shift_id,
        total_sales_in_shift: Money::from_cents(physical_cents + electronic_cents),
        total_physical_amount: Money::from_cents(physical_cents),
        total_electronic_amount: Money::from_cents(electronic_cents),
        sales: Vec::new(),
    }
}
