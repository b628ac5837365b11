// SPDX-License-Identifier: PMPL-1.0-or-later
//! Coupon API server binary
//!
//! Builds the MongoDB-backed store once and serves it over HTTP.
//!
//! Environment: `PORT`, `COUPON_API_HOST`, `MONGODB_CONNECTION_STRING`,
//! `COUPON_STORE_DATABASE`, `COUPON_STORE_COLLECTION`,
//! `COUPON_STORE_TIMEOUT_SECS`, `RUST_LOG`, `LOG_FORMAT` (`json` or text).

use std::sync::Arc;

use coupon_api::{ApiConfig, AppState};
use coupon_store::{MetricsStore, MongoCouponStore, StoreConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!("starting server...");

    let config = ApiConfig::from_env()?;
    let store_config = StoreConfig::from_env()?;
    if store_config.connection_string.is_none() {
        tracing::warn!(
            "MONGODB_CONNECTION_STRING is not set; store operations will fail until it is"
        );
    }
    tracing::debug!(?store_config, "store configuration");

    let store = MetricsStore::new(MongoCouponStore::new(store_config));
    let stats = store.stats_handle();
    let state = AppState::new(Arc::new(store)).with_stats(stats);

    coupon_api::serve(config, state).await?;

    Ok(())
}
