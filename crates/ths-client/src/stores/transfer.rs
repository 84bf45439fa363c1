//! # Transfer Store
//!
//! Assembles and registers inventory transfers between warehouses.
//!
//! ## Cached State (per user)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  transfer_<id>             queued products                              │
//! │  selectedOrigin_<id>       origin warehouse (absent when unselected)    │
//! │  selectedDestination_<id>  destination warehouse                        │
//! │                                                                         │
//! │  Every applied change rewrites all three. A successful registration    │
//! │  removes them.                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Mutex, MutexGuard};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, instrument, warn};

use ths_core::validation::validate_barcode;
use ths_core::{Product, TransferDraft, TransferRecord, Warehouse};

use super::{begin_submission, Loading, Services};
use crate::cache::{keys, user_key};
use crate::error::{ClientError, ClientResult};

#[derive(Default)]
struct TransferState {
    user_id: Option<i64>,
    draft: TransferDraft,
    warehouses: Vec<Warehouse>,
    history: Vec<TransferRecord>,
}

pub struct TransferStore {
    services: Services,
    state: Mutex<TransferState>,
    submitting: AsyncMutex<()>,
    loading: Loading,
}

impl TransferStore {
    pub fn new(services: Services, user_id: Option<i64>) -> Self {
        let store = Self {
            services,
            state: Mutex::new(TransferState::default()),
            submitting: AsyncMutex::new(()),
            loading: Loading::default(),
        };
        store.switch_user(user_id);
        store
    }

    /// True while a transfer request is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    fn lock(&self) -> MutexGuard<'_, TransferState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn switch_user(&self, user_id: Option<i64>) {
        self.lock().user_id = user_id;
        self.load_from_cache();
    }

    /// Rebuilds the draft from the current user's cache entries.
    pub fn load_from_cache(&self) {
        let user_id = self.lock().user_id;
        let products: Vec<Product> = self
            .services
            .restore(&user_key(keys::TRANSFER, user_id))
            .unwrap_or_default();
        let origin = self
            .services
            .restore(&user_key(keys::SELECTED_ORIGIN, user_id));
        let destination = self
            .services
            .restore(&user_key(keys::SELECTED_DESTINATION, user_id));

        let draft = TransferDraft::from_parts(origin, destination, products);
        debug!(?user_id, products = draft.products().len(), "Transfer draft loaded");
        self.lock().draft = draft;
    }

    fn persist(&self, state: &TransferState) {
        let user_id = state.user_id;
        self.services.persist(
            &user_key(keys::TRANSFER, user_id),
            state.draft.products(),
        );
        for (base, selection) in [
            (keys::SELECTED_ORIGIN, state.draft.origin()),
            (keys::SELECTED_DESTINATION, state.draft.destination()),
        ] {
            let key = user_key(base, user_id);
            match selection {
                Some(warehouse) => self.services.persist(&key, warehouse),
                None => self.services.forget(&key),
            }
        }
    }

    fn forget_all(&self, user_id: Option<i64>) {
        for base in [
            keys::TRANSFER,
            keys::SELECTED_ORIGIN,
            keys::SELECTED_DESTINATION,
        ] {
            self.services.forget(&user_key(base, user_id));
        }
    }

    // =========================================================================
    // Warehouses
    // =========================================================================

    /// Refreshes the warehouse list. On failure the last known list is kept.
    pub async fn all_warehouses(&self) -> Vec<Warehouse> {
        let _loading = self.loading.start();
        match self.services.api.fetch_warehouses().await {
            Ok(warehouses) => {
                self.lock().warehouses = warehouses.clone();
                warehouses
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch warehouses");
                self.warehouses()
            }
        }
    }

    pub fn warehouses(&self) -> Vec<Warehouse> {
        self.lock().warehouses.clone()
    }

    pub fn available_origins(&self) -> Vec<Warehouse> {
        let state = self.lock();
        state
            .draft
            .available_origins(&state.warehouses)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn available_destinations(&self) -> Vec<Warehouse> {
        let state = self.lock();
        state
            .draft
            .available_destinations(&state.warehouses)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn select_origin(&self, warehouse: Warehouse) -> bool {
        self.select(warehouse, true)
    }

    pub fn select_destination(&self, warehouse: Warehouse) -> bool {
        self.select(warehouse, false)
    }

    fn select(&self, warehouse: Warehouse, origin: bool) -> bool {
        let mut state = self.lock();
        let applied = if origin {
            state.draft.select_origin(warehouse)
        } else {
            state.draft.select_destination(warehouse)
        };
        match applied {
            Ok(()) => {
                self.persist(&state);
                true
            }
            Err(e) => {
                drop(state);
                self.services.notifier.error(&e.to_string());
                false
            }
        }
    }

    pub fn clear_selected_origin(&self) {
        let mut state = self.lock();
        state.draft.clear_origin();
        self.persist(&state);
    }

    pub fn clear_selected_destination(&self) {
        let mut state = self.lock();
        state.draft.clear_destination();
        self.persist(&state);
    }

    pub fn selected_origin(&self) -> Option<Warehouse> {
        self.lock().draft.origin().cloned()
    }

    pub fn selected_destination(&self) -> Option<Warehouse> {
        self.lock().draft.destination().cloned()
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub fn products(&self) -> Vec<Product> {
        self.lock().draft.products().to_vec()
    }

    /// Queues `product`. A barcode already queued is ignored.
    pub fn add_product_to_transfer(&self, product: Product) -> bool {
        let mut state = self.lock();
        let barcode = product.barcode.clone();
        if !state.draft.add_product(product) {
            debug!(barcode = %barcode, "Product already queued for transfer");
            return false;
        }
        self.persist(&state);
        true
    }

    pub fn remove_product_from_transfer(&self, product_id: i64) -> bool {
        let mut state = self.lock();
        if !state.draft.remove_product(product_id) {
            return false;
        }
        self.persist(&state);
        true
    }

    /// Looks up a barcode for the transfer.
    ///
    /// Returns the product only if it exists, has stock, and sits in the
    /// selected origin. Every other outcome toasts why and returns `None`.
    pub async fn product_by_barcode(&self, barcode: &str) -> Option<Product> {
        let barcode = match validate_barcode(barcode) {
            Ok(barcode) => barcode,
            Err(e) => {
                self.services.notifier.error(&e.to_string());
                return None;
            }
        };

        let _loading = self.loading.start();
        let matches = match self.services.api.search_products_by_barcode(&barcode).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!(barcode = %barcode, error = %e, "Barcode lookup failed");
                self.services
                    .notifier
                    .error(&format!("Failed to look up {}: {}", barcode, e));
                return None;
            }
        };

        let state = self.lock();
        let origin_id = state.draft.origin().map(|w| w.id);
        let found = match matches.iter().position(|p| Some(p.storehouse_id) == origin_id) {
            Some(idx) => matches.into_iter().nth(idx),
            None => matches.into_iter().next(),
        };
        let checked = state.draft.validate_candidate(&barcode, found);
        drop(state);

        checked
            .map_err(|e| {
                debug!(barcode = %barcode, error = %e, "Transfer candidate rejected");
                self.services.notifier.error(&e.to_string());
            })
            .ok()
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Submits the draft as a pending transfer.
    ///
    /// Success clears the draft and its cache entries. Failure leaves both.
    #[instrument(skip(self))]
    pub async fn register_transfer(&self) -> ClientResult<()> {
        let _submitting = begin_submission(
            &self.submitting,
            "transfer registration",
            self.services.notifier.as_ref(),
        )?;

        let request = match self.lock().draft.to_request() {
            Ok(request) => request,
            Err(e) => {
                self.services.notifier.error(&e.to_string());
                return Err(e.into());
            }
        };

        let _loading = self.loading.start();
        if let Err(e) = self.services.api.register_transfer(&request).await {
            error!(
                from = request.from_storehouse_id,
                to = request.to_storehouse_id,
                error = %e,
                "Failed to register transfer"
            );
            self.services
                .notifier
                .error(&format!("Failed to register transfer: {}", e));
            return Err(e);
        }

        info!(
            from = request.from_storehouse_id,
            to = request.to_storehouse_id,
            products = request.products.len(),
            "Transfer registered"
        );
        self.clear_transfers();
        self.services.notifier.success("Transfer registered");
        Ok(())
    }

    /// Drops the draft and its cache entries.
    pub fn clear_transfers(&self) {
        let mut state = self.lock();
        state.draft.clear();
        self.forget_all(state.user_id);
    }

    /// Refreshes the transfer history. Failures read as an empty list.
    pub async fn transfer_history(&self) -> Vec<TransferRecord> {
        let _loading = self.loading.start();
        match self.services.api.fetch_transfers().await {
            Ok(history) => {
                self.lock().history = history.clone();
                history
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch transfer history");
                Vec::new()
            }
        }
    }

    /// Last history fetched.
    pub fn history(&self) -> Vec<TransferRecord> {
        self.lock().history.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationKind;
    use crate::testing::{product, warehouse, Harness};
    use std::sync::Arc;
    use ths_core::CoreError;

    fn stocked_in(mut p: Product, storehouse_id: i64) -> Product {
        p.storehouse_id = storehouse_id;
        p
    }

    async fn ready_store(h: &Harness) -> TransferStore {
        h.api.state().warehouses = vec![
            warehouse(1, "Matriz"),
            warehouse(2, "Sucursal Norte"),
            warehouse(3, "Sucursal Sur"),
        ];
        let store = TransferStore::new(h.services.clone(), Some(4));
        store.all_warehouses().await;
        store
    }

    #[tokio::test]
    async fn test_selection_excludes_counterpart() {
        let mut h = Harness::new();
        let store = ready_store(&h).await;

        assert!(store.select_origin(warehouse(1, "Matriz")));
        let destinations: Vec<i64> = store.available_destinations().iter().map(|w| w.id).collect();
        assert_eq!(destinations, vec![2, 3]);

        assert!(!store.select_destination(warehouse(1, "Matriz")));
        assert_eq!(h.drain()[0].kind, NotificationKind::Error);
        assert!(store.selected_destination().is_none());

        assert!(store.select_destination(warehouse(3, "Sucursal Sur")));
        let origins: Vec<i64> = store.available_origins().iter().map(|w| w.id).collect();
        assert_eq!(origins, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_product_lookup_checks() {
        let mut h = Harness::new();
        h.api.state().products = vec![
            stocked_in(product(1, "A", "Aceite", 100, 4), 1),
            stocked_in(product(2, "B", "Balata", 100, 0), 1),
            stocked_in(product(3, "C", "Cadena", 100, 2), 2),
        ];
        let store = ready_store(&h).await;
        store.select_origin(warehouse(1, "Matriz"));

        assert_eq!(store.product_by_barcode("A").await.map(|p| p.id), Some(1));
        assert!(store.product_by_barcode("B").await.is_none());
        assert!(store.product_by_barcode("C").await.is_none());
        assert!(store.product_by_barcode("Z").await.is_none());

        let toasts = h.drain();
        assert_eq!(toasts.len(), 3);
        assert!(toasts[0].message.contains("out of stock"));
        assert!(toasts[1].message.contains("not stocked in the selected origin"));
        assert!(toasts[2].message.contains("No product with barcode Z"));
    }

    #[tokio::test]
    async fn test_register_requires_endpoints() {
        let mut h = Harness::new();
        let store = ready_store(&h).await;
        store.add_product_to_transfer(product(1, "A", "Aceite", 100, 4));
        store.select_origin(warehouse(1, "Matriz"));

        let err = store.register_transfer().await;
        assert!(matches!(
            err,
            Err(ClientError::Core(CoreError::MissingTransferEndpoints))
        ));
        assert!(!h.api.called("register_transfer"));
        assert_eq!(h.drain()[0].kind, NotificationKind::Error);
        assert_eq!(store.products().len(), 1);
    }

    #[tokio::test]
    async fn test_register_without_products() {
        let h = Harness::new();
        let store = ready_store(&h).await;
        store.select_origin(warehouse(1, "Matriz"));
        store.select_destination(warehouse(3, "Sucursal Sur"));

        store.register_transfer().await.unwrap();

        let sent = h.api.state().registered_transfers[0].clone();
        assert_eq!((sent.from_storehouse_id, sent.to_storehouse_id), (1, 3));
        assert!(sent.products.is_empty());
        assert!(store.selected_origin().is_none());
    }

    #[tokio::test]
    async fn test_loading_flag_tracks_requests() {
        let h = Harness::new();
        h.api.state().warehouses = vec![warehouse(1, "Matriz")];
        let store = Arc::new(TransferStore::new(h.services.clone(), Some(4)));
        let gate = h.api.gate("fetch_warehouses");

        let pending = tokio::spawn({
            let store = store.clone();
            async move { store.all_warehouses().await }
        });
        while !h.api.called("fetch_warehouses") {
            tokio::task::yield_now().await;
        }
        assert!(store.is_loading());

        gate.notify_one();
        assert_eq!(pending.await.unwrap().len(), 1);
        assert!(!store.is_loading());

        store.select_origin(warehouse(1, "Matriz"));
        store.select_destination(warehouse(2, "Sucursal Norte"));
        h.api.fail("register_transfer");
        assert!(store.register_transfer().await.is_err());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_register_success_clears_draft() {
        let mut h = Harness::new();
        let store = ready_store(&h).await;
        store.select_origin(warehouse(1, "Matriz"));
        store.select_destination(warehouse(2, "Sucursal Norte"));
        assert!(store.add_product_to_transfer(product(1, "A", "Aceite", 100, 4)));
        assert!(!store.add_product_to_transfer(product(1, "A", "Aceite", 100, 4)));
        assert!(store.add_product_to_transfer(product(5, "E", "Espejo", 100, 1)));
        assert_eq!(
            h.cache.keys(),
            vec!["selectedDestination_4", "selectedOrigin_4", "transfer_4"]
        );

        store.register_transfer().await.unwrap();

        let sent = h.api.state().registered_transfers[0].clone();
        assert_eq!(sent.from_storehouse_id, 1);
        assert_eq!(sent.to_storehouse_id, 2);
        assert_eq!(sent.status, "Pendiente");
        assert_eq!(sent.products.len(), 2);

        assert!(store.products().is_empty());
        assert!(store.selected_origin().is_none());
        assert!(h.cache.keys().is_empty());
        assert_eq!(h.drain().last().map(|n| n.kind), Some(NotificationKind::Success));
    }

    #[tokio::test]
    async fn test_register_failure_keeps_draft() {
        let h = Harness::new();
        let store = ready_store(&h).await;
        store.select_origin(warehouse(1, "Matriz"));
        store.select_destination(warehouse(2, "Sucursal Norte"));
        store.add_product_to_transfer(product(1, "A", "Aceite", 100, 4));
        h.api.fail("register_transfer");

        assert!(store.register_transfer().await.is_err());
        assert_eq!(store.products().len(), 1);
        assert!(store.selected_destination().is_some());
    }

    #[tokio::test]
    async fn test_draft_survives_restart() {
        let h = Harness::new();
        let store = ready_store(&h).await;
        store.select_origin(warehouse(2, "Sucursal Norte"));
        store.add_product_to_transfer(product(9, "I", "Intercooler", 100, 1));
        store.add_product_to_transfer(product(10, "J", "Junta", 100, 1));
        assert!(store.remove_product_from_transfer(10));
        store.clear_selected_origin();
        store.select_origin(warehouse(3, "Sucursal Sur"));

        let restarted = TransferStore::new(h.services.clone(), Some(4));
        assert_eq!(restarted.selected_origin().map(|w| w.id), Some(3));
        assert!(restarted.selected_destination().is_none());
        assert_eq!(restarted.products().len(), 1);

        restarted.switch_user(Some(5));
        assert!(restarted.products().is_empty());
    }

    #[tokio::test]
    async fn test_reads_swallow_failures() {
        let h = Harness::new();
        let store = ready_store(&h).await;
        h.api.fail("fetch_warehouses");
        h.api.fail("fetch_transfers");

        assert_eq!(store.all_warehouses().await.len(), 3);
        assert!(store.transfer_history().await.is_empty());
    }
}
