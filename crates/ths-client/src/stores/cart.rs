//! # Cart Store
//!
//! The in-progress sale of the logged-in cashier.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Store Operations                                │
//! │                                                                         │
//! │  UI Action               Store Method               Effect              │
//! │  ─────────               ────────────               ──────              │
//! │  Scan / click product ──► add_to_cart() ──────────► qty + 1 or new line │
//! │  Type quantity ─────────► add_to_cart_with_quantity()                   │
//! │  + / - buttons ─────────► increase / decrease_quantity()                │
//! │  Edit price ────────────► set_discount_price()                          │
//! │  Edit discount % ───────► update_discount()                             │
//! │  Trash icon ────────────► delete_item()                                 │
//! │  Pay ───────────────────► checkout() ───► OrderService ───► Receipt     │
//! │                                                                         │
//! │  Applied mutation → cart_<userId> rewritten in the cache.              │
//! │  Rejected mutation → error toast, `false`, nothing written.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, instrument};

use ths_core::cart::CartTotals;
use ths_core::order::CheckoutRequest;
use ths_core::{Cart, CartItem, CoreResult, Money, Percentage, Product, Receipt};

use super::{begin_submission, OrderService, Services};
use crate::cache::{keys, user_key};
use crate::error::ClientResult;

struct CartState {
    user_id: Option<i64>,
    cart: Cart,
}

impl CartState {
    fn cache_key(&self) -> String {
        user_key(keys::CART, self.user_id)
    }
}

pub struct CartStore {
    services: Services,
    orders: Arc<OrderService>,
    state: Mutex<CartState>,
    submitting: AsyncMutex<()>,
}

impl CartStore {
    /// Creates the store with the cached cart of `user_id`.
    pub fn new(services: Services, orders: Arc<OrderService>, user_id: Option<i64>) -> Self {
        let store = Self {
            services,
            orders,
            state: Mutex::new(CartState {
                user_id,
                cart: Cart::new(),
            }),
            submitting: AsyncMutex::new(()),
        };
        store.switch_user(user_id);
        store
    }

    fn lock(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn restore_cart(&self, user_id: Option<i64>) -> Cart {
        let items: Vec<CartItem> = self
            .services
            .restore(&user_key(keys::CART, user_id))
            .unwrap_or_default();
        Cart::from_items(items)
    }

    /// Swaps to the cart cached for `user_id`, or an empty one.
    pub fn switch_user(&self, user_id: Option<i64>) {
        let mut state = self.lock();
        let cart = self.restore_cart(user_id);
        debug!(?user_id, lines = cart.item_count(), "Cart loaded");
        state.user_id = user_id;
        state.cart = cart;
    }

    /// Removes a sold cart from the cart of `user_id`, which may no longer be
    /// the active one.
    fn settle(&self, user_id: Option<i64>, sold: &Cart) {
        let mut state = self.lock();
        if state.user_id == user_id {
            state.cart.settle(sold.items());
            self.services.persist(&state.cache_key(), state.cart.items());
            return;
        }

        let mut cart = self.restore_cart(user_id);
        cart.settle(sold.items());
        self.services
            .persist(&user_key(keys::CART, user_id), cart.items());
        debug!(?user_id, active = ?state.user_id, "Settled checkout for inactive cart");
    }

    /// Runs `op` against the cart. Persists on success, toasts on rejection.
    fn mutate<F>(&self, action: &str, op: F) -> bool
    where
        F: FnOnce(&mut Cart) -> CoreResult<()>,
    {
        let mut state = self.lock();
        match op(&mut state.cart) {
            Ok(()) => {
                self.services.persist(&state.cache_key(), state.cart.items());
                true
            }
            Err(e) => {
                debug!(action, error = %e, "Cart change rejected");
                drop(state);
                self.services.notifier.error(&e.to_string());
                false
            }
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds one unit, bounded by the product's stock.
    pub fn add_to_cart(&self, product: &Product) -> bool {
        self.mutate("add", |cart| cart.add(product))
    }

    pub fn add_to_cart_with_quantity(&self, product: &Product, quantity: i64) -> bool {
        self.mutate("add_with_quantity", |cart| {
            cart.add_with_quantity(product, quantity)
        })
    }

    pub fn increase_quantity(&self, barcode: &str) -> bool {
        self.mutate("increase", |cart| cart.increase(barcode))
    }

    /// Removes the line when its quantity drops to zero.
    pub fn decrease_quantity(&self, barcode: &str) -> bool {
        self.mutate("decrease", |cart| cart.decrease(barcode))
    }

    pub fn set_discount_price(&self, barcode: &str, new_price: Money) -> bool {
        self.mutate("set_discount_price", |cart| {
            cart.set_discount_price(barcode, new_price)
        })
    }

    pub fn update_discount(&self, barcode: &str, discount: Percentage) -> bool {
        self.mutate("update_discount", |cart| {
            cart.update_discount(barcode, discount)
        })
    }

    pub fn delete_item(&self, barcode: &str) -> bool {
        self.mutate("delete", |cart| cart.remove(barcode).map(|_| ()))
    }

    pub fn clear_cart(&self) {
        self.mutate("clear", |cart| {
            cart.clear();
            Ok(())
        });
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn snapshot(&self) -> Cart {
        self.lock().cart.clone()
    }

    pub fn items(&self) -> Vec<CartItem> {
        self.lock().cart.items().to_vec()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::from(&self.lock().cart)
    }

    pub fn total_payable(&self) -> Money {
        self.lock().cart.total_payable()
    }

    pub fn total_quantity(&self) -> i64 {
        self.lock().cart.total_quantity()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().cart.is_empty()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.lock().user_id
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Submits the cart as an order.
    ///
    /// ## Outcome
    /// - success: the submitted lines leave the cart of the cashier who
    ///   checked out, receipt returned
    /// - failure: cart untouched, error toast, error returned
    /// - already submitting: `Busy`, nothing sent
    #[instrument(skip(self, request), fields(method = %request.payment_method))]
    pub async fn checkout(&self, request: CheckoutRequest) -> ClientResult<Receipt> {
        let _submitting =
            begin_submission(&self.submitting, "checkout", self.services.notifier.as_ref())?;

        let (user_id, cart) = {
            let state = self.lock();
            (state.user_id, state.cart.clone())
        };
        let receipt = self.orders.register_order(&cart, &request).await?;

        self.settle(user_id, &cart);
        info!(bytes = receipt.bytes.len(), "Checkout complete, cart settled");
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::notify::NotificationKind;
    use crate::stores::ShiftStore;
    use crate::testing::{product, shift, Harness};
    use ths_core::order::PaymentBreakdown;
    use ths_core::{CoreError, PaymentMethod};

    fn stores(h: &Harness, user_id: Option<i64>) -> (Arc<ShiftStore>, CartStore) {
        let shifts = Arc::new(ShiftStore::new(h.services.clone()));
        let orders = Arc::new(OrderService::new(h.services.clone(), shifts.clone()));
        let cart = CartStore::new(h.services.clone(), orders, user_id);
        (shifts, cart)
    }

    fn cash_request(total: Money) -> CheckoutRequest {
        let payment = PaymentBreakdown::split(PaymentMethod::Cash, total, total).unwrap();
        CheckoutRequest::new(1, "1234", PaymentMethod::Cash, payment)
    }

    async fn open_shift(h: &Harness, shifts: &ShiftStore) {
        h.api.state().open_shifts = vec![shift(9, 50000)];
        shifts.check_for_open_shift().await;
    }

    #[test]
    fn test_mutations_persist_per_user() {
        let mut h = Harness::new();
        let (_, store) = stores(&h, Some(7));
        let bujia = product(1, "750100", "Bujía", 10000, 5);

        assert!(store.add_to_cart(&bujia));
        assert!(store.add_to_cart_with_quantity(&bujia, 2));
        assert_eq!(store.total_quantity(), 3);
        assert!(h.drain().is_empty());

        let cached = h.cache.keys();
        assert_eq!(cached, vec!["cart_7"]);

        let reloaded = CartStore::new(
            h.services.clone(),
            Arc::new(OrderService::new(
                h.services.clone(),
                Arc::new(ShiftStore::new(h.services.clone())),
            )),
            Some(7),
        );
        assert_eq!(reloaded.total_quantity(), 3);
    }

    #[test]
    fn test_rejection_notifies_and_keeps_state() {
        let mut h = Harness::new();
        let (_, store) = stores(&h, Some(1));
        let filtro = product(2, "750200", "Filtro", 5000, 1);

        assert!(store.add_to_cart(&filtro));
        assert!(!store.increase_quantity("750200"));
        assert!(!store.decrease_quantity("nope"));
        assert!(!store.update_discount("750200", Percentage::from_percent(120)));

        let toasts = h.drain();
        assert_eq!(toasts.len(), 3);
        assert!(toasts.iter().all(|t| t.kind == NotificationKind::Error));
        assert_eq!(store.total_quantity(), 1);
        assert!(store.items()[0].discount.is_zero());
    }

    #[test]
    fn test_totals_with_discount() {
        let h = Harness::new();
        let (_, store) = stores(&h, None);
        let a = product(1, "A", "Aceite", 10000, 10);
        let b = product(2, "B", "Balata", 5000, 10);

        assert!(store.add_to_cart_with_quantity(&a, 2));
        assert!(store.add_to_cart(&b));
        assert!(store.update_discount("A", Percentage::from_percent(10)));

        assert_eq!(store.total_payable(), Money::from_cents(23000));
        let totals = store.totals();
        assert_eq!(totals.item_count, 2);
        assert_eq!(totals.total_quantity, 3);
    }

    #[test]
    fn test_switch_user_swaps_carts() {
        let h = Harness::new();
        let (_, store) = stores(&h, Some(1));
        assert!(store.add_to_cart(&product(1, "A", "Aceite", 100, 3)));

        store.switch_user(Some(2));
        assert!(store.is_empty());
        assert!(store.add_to_cart(&product(2, "B", "Balata", 100, 3)));

        store.switch_user(Some(1));
        assert_eq!(store.items()[0].barcode(), "A");
        assert_eq!(store.user_id(), Some(1));
    }

    #[tokio::test]
    async fn test_checkout_empty_cart_makes_no_call() {
        let mut h = Harness::new();
        let (shifts, store) = stores(&h, Some(1));
        open_shift(&h, &shifts).await;
        h.drain();

        let err = store.checkout(cash_request(Money::zero())).await.unwrap_err();
        assert!(matches!(err, ClientError::Core(CoreError::EmptyCart)));
        assert!(!h.api.called("register_order"));
        assert_eq!(h.drain()[0].kind, NotificationKind::Error);
    }

    #[tokio::test]
    async fn test_checkout_without_shift_keeps_cart() {
        let h = Harness::new();
        let (_, store) = stores(&h, Some(1));
        assert!(store.add_to_cart(&product(1, "A", "Aceite", 10000, 3)));

        let err = store.checkout(cash_request(Money::from_cents(10000))).await;
        assert!(matches!(err, Err(ClientError::Core(CoreError::NoOpenShift))));
        assert!(!h.api.called("register_order"));
        assert_eq!(store.total_quantity(), 1);
    }

    #[tokio::test]
    async fn test_checkout_success_clears_cart() {
        let mut h = Harness::new();
        let (shifts, store) = stores(&h, Some(1));
        open_shift(&h, &shifts).await;
        assert!(store.add_to_cart_with_quantity(&product(1, "A", "Aceite", 10000, 5), 2));
        h.drain();

        let receipt = store.checkout(cash_request(Money::from_cents(20000))).await.unwrap();
        assert!(receipt.is_pdf());
        assert!(store.is_empty());

        let sent = h.api.state().registered_orders[0].clone();
        assert_eq!(sent.shift_id, Some(9));
        assert_eq!(sent.total, Money::from_cents(20000));
        assert_eq!(sent.products[0].quantity, 2);

        let cached: Vec<CartItem> = h.services.restore("cart_1").unwrap();
        assert!(cached.is_empty());
        assert_eq!(h.drain()[0].kind, NotificationKind::Success);
    }

    #[tokio::test]
    async fn test_checkout_failure_keeps_cart() {
        let mut h = Harness::new();
        let (shifts, store) = stores(&h, Some(1));
        open_shift(&h, &shifts).await;
        assert!(store.add_to_cart(&product(1, "A", "Aceite", 10000, 5)));
        h.drain();
        h.api.fail("register_order");

        let err = store.checkout(cash_request(Money::from_cents(10000))).await;
        assert!(matches!(err, Err(ClientError::Api { status: 500, .. })));
        assert_eq!(store.total_quantity(), 1);
        assert_eq!(h.drain()[0].kind, NotificationKind::Error);
    }

    #[tokio::test]
    async fn test_concurrent_checkout_is_rejected() {
        let h = Harness::new();
        let (shifts, store) = stores(&h, Some(1));
        open_shift(&h, &shifts).await;
        assert!(store.add_to_cart(&product(1, "A", "Aceite", 10000, 5)));

        let gate = h.api.gate_orders();
        let store = Arc::new(store);
        let first = tokio::spawn({
            let store = store.clone();
            async move { store.checkout(cash_request(Money::from_cents(10000))).await }
        });

        while !h.api.called("register_order") {
            tokio::task::yield_now().await;
        }

        let second = store.checkout(cash_request(Money::from_cents(10000))).await;
        assert!(matches!(second, Err(ClientError::Busy("checkout"))));

        gate.notify_one();
        assert!(first.await.unwrap().is_ok());
        assert_eq!(h.api.state().registered_orders.len(), 1);
    }

    async fn gated_checkout(
        h: &Harness,
        store: &Arc<CartStore>,
    ) -> (
        Arc<tokio::sync::Notify>,
        tokio::task::JoinHandle<ClientResult<Receipt>>,
    ) {
        let gate = h.api.gate_orders();
        let pending = tokio::spawn({
            let store = store.clone();
            async move { store.checkout(cash_request(Money::from_cents(10000))).await }
        });
        while !h.api.called("register_order") {
            tokio::task::yield_now().await;
        }
        (gate, pending)
    }

    #[tokio::test]
    async fn test_checkout_settles_the_cashier_who_paid() {
        let h = Harness::new();
        let (shifts, store) = stores(&h, Some(1));
        open_shift(&h, &shifts).await;
        assert!(store.add_to_cart(&product(1, "A", "Aceite", 10000, 5)));
        let store = Arc::new(store);

        let (gate, pending) = gated_checkout(&h, &store).await;
        store.switch_user(Some(2));
        assert!(store.add_to_cart(&product(2, "B", "Balata", 5000, 5)));

        gate.notify_one();
        assert!(pending.await.unwrap().is_ok());

        assert_eq!(store.items()[0].barcode(), "B");
        assert_eq!(store.total_quantity(), 1);
        let sold: Vec<CartItem> = h.services.restore("cart_1").unwrap();
        assert!(sold.is_empty());

        store.switch_user(Some(1));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_lines_added_during_checkout_survive() {
        let h = Harness::new();
        let (shifts, store) = stores(&h, Some(1));
        open_shift(&h, &shifts).await;
        assert!(store.add_to_cart(&product(1, "A", "Aceite", 10000, 5)));
        let store = Arc::new(store);

        let (gate, pending) = gated_checkout(&h, &store).await;
        assert!(store.add_to_cart(&product(2, "B", "Balata", 5000, 5)));

        gate.notify_one();
        assert!(pending.await.unwrap().is_ok());

        assert_eq!(h.api.state().registered_orders[0].products.len(), 1);
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.items()[0].barcode(), "B");
        let cached: Vec<CartItem> = h.services.restore("cart_1").unwrap();
        assert_eq!(cached.len(), 1);
    }
}
