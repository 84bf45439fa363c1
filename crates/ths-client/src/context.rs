//! # POS Context
//!
//! Builds every store once and keeps them pointed at the same cashier.
//!
//! ## Wiring
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ClientConfig ──► HttpPosApi ─┐                                         │
//! │  cache_dir    ──► FileCache  ─┼──► Services ──► Session                 │
//! │  Notifier     ────────────────┘        │                                │
//! │                                        ├──► ShiftStore ◄── OrderService │
//! │                                        ├──► CartStore  ◄── CatalogStore │
//! │                                        ├──► TransferStore               │
//! │                                        ├──► PromoCodeStore              │
//! │                                        └──► HeldSalesService            │
//! │                                                                         │
//! │  login / logout ──► switch_user() on every per-user store, in order.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use tracing::info;

use ths_core::User;

use crate::api::HttpPosApi;
use crate::cache::FileCache;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::notify::Notifier;
use crate::session::Session;
use crate::stores::{
    CartStore, CatalogStore, HeldSalesService, OrderService, PromoCodeStore, Services, ShiftStore,
    TransferStore,
};

pub struct PosContext {
    pub session: Session,
    pub shifts: Arc<ShiftStore>,
    pub orders: Arc<OrderService>,
    pub cart: Arc<CartStore>,
    pub catalog: CatalogStore,
    pub transfers: TransferStore,
    pub promos: PromoCodeStore,
    pub held_sales: HeldSalesService,
}

impl PosContext {
    /// Wires the stores around `services`, resuming the cached session.
    pub fn new(services: Services) -> Self {
        let session = Session::resume(services.clone());
        let user_id = session.user_id();

        let shifts = Arc::new(ShiftStore::new(services.clone()));
        shifts.set_cashier(user_id);
        let orders = Arc::new(OrderService::new(services.clone(), shifts.clone()));
        let cart = Arc::new(CartStore::new(services.clone(), orders.clone(), user_id));

        Self {
            session,
            catalog: CatalogStore::new(services.clone(), cart.clone()),
            transfers: TransferStore::new(services.clone(), user_id),
            promos: PromoCodeStore::new(services.clone(), user_id),
            held_sales: HeldSalesService::new(services),
            shifts,
            orders,
            cart,
        }
    }

    /// Production wiring: HTTP gateway and on-disk cache from `config`.
    pub fn from_config(config: &ClientConfig, notifier: Arc<dyn Notifier>) -> ClientResult<Self> {
        let api = HttpPosApi::new(config)?;
        let cache_dir = config
            .cache_dir()
            .ok_or_else(|| ClientError::InvalidConfig("no cache directory available".into()))?;
        let cache = FileCache::open(&cache_dir)?;
        info!(core = %config.api.core_url, cache = ?cache_dir, "POS context ready");

        Ok(Self::new(Services::new(
            Arc::new(api),
            Arc::new(cache),
            notifier,
        )))
    }

    /// Logs in and moves every per-user store to the new cashier.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<User> {
        let user = self.session.login(email, password).await?;
        self.switch_user(Some(user.id));
        Ok(user)
    }

    /// Logs out. Per-user stores fall back to the anonymous keys and the
    /// local shift view is dropped.
    pub fn logout(&self) {
        self.session.logout();
        self.switch_user(None);
        self.shifts.reset_shift_data();
    }

    fn switch_user(&self, user_id: Option<i64>) {
        self.shifts.set_cashier(user_id);
        self.cart.switch_user(user_id);
        self.transfers.switch_user(user_id);
        self.promos.switch_user(user_id);
    }
}
