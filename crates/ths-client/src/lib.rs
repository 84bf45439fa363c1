//! # ths-client: State and API Layer for THS POS
//!
//! Everything between the cashier screens and the backend: the REST
//! gateway, the local cache, notifications, and the stores that hold the
//! register's state.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   UI ──► PosContext.<store>.<operation>()                              │
//! │              │                                                          │
//! │              ├── ths-core rule check     rejected → toast, no request  │
//! │              ├── PosApi call             (HttpPosApi → reqwest)        │
//! │              ├── state update            std lock, never across await  │
//! │              ├── LocalCache snapshot     cart_<id>, transfer_<id>, ... │
//! │              └── Notifier toast          success / error               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`] - `ths.toml` + `THS_*` environment configuration
//! - [`api`] - [`PosApi`] gateway trait and its HTTP implementation
//! - [`http`] - JSON REST client with shared bearer token
//! - [`cache`] - Keyed JSON snapshots on disk or in memory
//! - [`notify`] - User-facing notifications
//! - [`session`] - Login, logout and the current cashier
//! - [`stores`] - Cart, orders, shifts, transfers, catalog, promo codes, held sales
//! - [`context`] - Wires all of the above together
//! - [`telemetry`] - `tracing` subscriber setup
//! - [`error`] - Client error types

pub mod api;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod notify;
pub mod session;
pub mod stores;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use api::{HttpPosApi, PosApi};
pub use cache::{FileCache, LocalCache, MemoryCache};
pub use config::ClientConfig;
pub use context::PosContext;
pub use error::{ClientError, ClientResult};
pub use notify::{ChannelNotifier, Notification, NotificationKind, Notifier, TracingNotifier};
pub use session::Session;
pub use stores::Services;
