//! # Stores
//!
//! Stateful services the UI talks to. Each store owns one slice of client
//! state, the cache keys that mirror it, and the remote calls that change it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Store Architecture                                   │
//! │                                                                         │
//! │            ┌──────────────┐      ┌──────────────┐                      │
//! │            │ CatalogStore │─────►│  CartStore   │                      │
//! │            └──────────────┘      └──────┬───────┘                      │
//! │                                         │ checkout                      │
//! │                                  ┌──────▼───────┐     ┌────────────┐   │
//! │                                  │ OrderService │────►│ ShiftStore │   │
//! │                                  └──────────────┘     └────────────┘   │
//! │                                                                         │
//! │   TransferStore   PromoCodeStore   HeldSalesService   (independent)    │
//! │                                                                         │
//! │  Every store holds a clone of [`Services`]: gateway, cache, notifier.  │
//! │  State sits behind std locks that are never held across `.await`.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod catalog;
mod held_sales;
mod order;
mod promo;
mod shift;
mod transfer;

pub use cart::CartStore;
pub use catalog::CatalogStore;
pub use held_sales::HeldSalesService;
pub use order::OrderService;
pub use promo::PromoCodeStore;
pub use shift::ShiftStore;
pub use transfer::TransferStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
use tracing::{debug, warn};

use crate::api::PosApi;
use crate::cache::{read_json, write_json, LocalCache};
use crate::error::{ClientError, ClientResult};
use crate::notify::Notifier;

/// Collaborators shared by every store.
#[derive(Clone)]
pub struct Services {
    pub api: Arc<dyn PosApi>,
    pub cache: Arc<dyn LocalCache>,
    pub notifier: Arc<dyn Notifier>,
}

impl Services {
    pub fn new(
        api: Arc<dyn PosApi>,
        cache: Arc<dyn LocalCache>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            cache,
            notifier,
        }
    }

    /// Mirrors `value` to the cache. A failed write is logged, never fatal.
    pub(crate) fn persist<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = write_json(self.cache.as_ref(), key, value) {
            warn!(key, error = %e, "Failed to write cache entry");
        }
    }

    /// Reads a cached snapshot. Unreadable entries come back as `None`.
    pub(crate) fn restore<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        read_json(self.cache.as_ref(), key).unwrap_or_else(|e| {
            warn!(key, error = %e, "Failed to read cache entry");
            None
        })
    }

    pub(crate) fn forget(&self, key: &str) {
        if let Err(e) = self.cache.remove(key) {
            warn!(key, error = %e, "Failed to remove cache entry");
        }
    }
}

// =============================================================================
// Guards
// =============================================================================

/// Claims a single-flight submission slot.
///
/// A second caller while the first is pending gets `Busy` and an error toast.
pub(crate) fn begin_submission<'a>(
    slot: &'a AsyncMutex<()>,
    operation: &'static str,
    notifier: &dyn Notifier,
) -> ClientResult<AsyncMutexGuard<'a, ()>> {
    slot.try_lock().map_err(|_| {
        debug!(operation, "Rejected concurrent submission");
        let err = ClientError::Busy(operation);
        notifier.error(&err.to_string());
        err
    })
}

/// A store's `is_loading` flag: raised while any request it started is in
/// flight. Requests may nest (opening a shift re-reads it).
#[derive(Debug, Default)]
pub(crate) struct Loading {
    in_flight: AtomicUsize,
}

impl Loading {
    pub(crate) fn start(&self) -> LoadingGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        LoadingGuard {
            in_flight: &self.in_flight,
        }
    }

    pub(crate) fn get(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }
}

/// Lowers its [`Loading`] flag on drop, on every exit path.
pub(crate) struct LoadingGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
