//! # THS Terminal
//!
//! Boots a register: loads configuration, resumes or opens a session,
//! reconciles the shift with the server, and warms the product catalog.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  init_tracing()                                                         │
//! │  ClientConfig::load_or_default()        ths.toml + THS_* env            │
//! │  PosContext::from_config()              HTTP gateway + file cache       │
//! │  login (THS_EMAIL / THS_PASSWORD)       skipped if a session resumed    │
//! │  check_for_open_shift()                 prompt flag when none is open   │
//! │  load_all_products(), promos.fetch()                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use tracing::{error, info, warn};

use ths_client::telemetry::init_tracing;
use ths_client::{ClientConfig, PosContext, TracingNotifier};
use ths_core::ShiftStatus;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    info!("Starting THS terminal...");

    let config = ClientConfig::load_or_default(None);
    info!(
        core = %config.api.core_url,
        catalog = %config.api.catalog_url,
        timeout_secs = config.api.timeout_secs,
        "Configuration loaded"
    );

    let pos = PosContext::from_config(&config, Arc::new(TracingNotifier))?;

    if pos.session.is_authenticated() {
        info!(user_id = ?pos.session.user_id(), "Session resumed from cache");
    } else {
        match (std::env::var("THS_EMAIL"), std::env::var("THS_PASSWORD")) {
            (Ok(email), Ok(password)) => {
                let user = pos.login(&email, &password).await?;
                info!(user_id = user.id, name = %user.name, "Logged in");
            }
            _ => {
                warn!("No session; set THS_EMAIL and THS_PASSWORD to log in");
                return Ok(());
            }
        }
    }

    pos.shifts.check_for_open_shift().await;
    match pos.shifts.status() {
        ShiftStatus::Open => info!(
            shift_id = ?pos.shifts.shift_id(),
            sales = pos.shifts.cant_sales(),
            expected_cash = %pos.shifts.expected_accumulated_cash(),
            "Shift open"
        ),
        ShiftStatus::NoShift => warn!("No open shift; open one before selling"),
    }

    match pos.catalog.load_all_products().await {
        Ok(products) => info!(count = products.len(), "Catalog ready"),
        Err(e) => error!(error = %e, "Catalog unavailable"),
    }
    let promos = pos.promos.fetch().await;

    let totals = pos.cart.totals();
    info!(
        lines = totals.item_count,
        quantity = totals.total_quantity,
        total = %totals.total_payable,
        promo_codes = promos.len(),
        "Register ready"
    );

    Ok(())
}
