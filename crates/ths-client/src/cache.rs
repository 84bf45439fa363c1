//! # Local Cache
//!
//! Keyed JSON snapshots that survive restarts. The cache is never the source
//! of truth: every entry can be rebuilt from the backend or dropped.
//!
//! ## Key Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Per user (suffix _<userId>, bare name when nobody is logged in)       │
//! │    cart_<id>                 Vec<CartItem>                             │
//! │    transfer_<id>             Vec<Product>                              │
//! │    selectedOrigin_<id>       Warehouse                                 │
//! │    selectedDestination_<id>  Warehouse                                 │
//! │    promo_<id>                Vec<PromoCode>                            │
//! │                                                                         │
//! │  Global                                                                 │
//! │    user                      User                                      │
//! │    users                     Vec<User>                                 │
//! │    token                     bearer token                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each store owns its keys; no two stores write the same key.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

/// Cache key names.
pub mod keys {
    pub const CART: &str = "cart";
    pub const TRANSFER: &str = "transfer";
    pub const SELECTED_ORIGIN: &str = "selectedOrigin";
    pub const SELECTED_DESTINATION: &str = "selectedDestination";
    pub const PROMO: &str = "promo";
    pub const USER: &str = "user";
    pub const USERS: &str = "users";
    pub const TOKEN: &str = "token";
}

/// Builds a per-user key: `cart_7`, or `cart` with no user.
pub fn user_key(base: &str, user_id: Option<i64>) -> String {
    match user_id {
        Some(id) => format!("{}_{}", base, id),
        None => base.to_string(),
    }
}

// =============================================================================
// Cache Trait
// =============================================================================

/// String key/value storage.
pub trait LocalCache: Send + Sync {
    fn get(&self, key: &str) -> ClientResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> ClientResult<()>;
    fn remove(&self, key: &str) -> ClientResult<()>;
}

/// Reads and decodes a JSON snapshot.
///
/// A corrupt entry is logged and treated as missing.
pub fn read_json<T>(cache: &dyn LocalCache, key: &str) -> ClientResult<Option<T>>
where
    T: DeserializeOwned,
{
    let Some(raw) = cache.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key, error = %e, "Discarding unreadable cache entry");
            Ok(None)
        }
    }
}

/// Encodes and stores a JSON snapshot.
pub fn write_json<T: Serialize + ?Sized>(
    cache: &dyn LocalCache,
    key: &str,
    value: &T,
) -> ClientResult<()> {
    let raw = serde_json::to_string(value)?;
    cache.set(key, &raw)
}

// =============================================================================
// File Cache
// =============================================================================

/// One `<key>.json` file per entry under a directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Opens (and creates if needed) the cache directory.
    pub fn open(dir: impl Into<PathBuf>) -> ClientResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| ClientError::Cache(e.to_string()))?;
        debug!(?dir, "File cache opened");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl LocalCache for FileCache {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ClientError::Cache(format!("read {}: {}", key, e))),
        }
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .and_then(|_| std::fs::rename(&tmp, &path))
            .map_err(|e| ClientError::Cache(format!("write {}: {}", key, e)))
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Cache(format!("remove {}: {}", key, e))),
        }
    }
}

// =============================================================================
// Memory Cache
// =============================================================================

/// In-process cache, for tests and kiosks that should not touch disk.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorted list of stored keys.
    pub fn keys(&self) -> Vec<String> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ClientResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}
