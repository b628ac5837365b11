// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coupon Store
//
// Data-access layer for coupon records. Request handling depends only on the
// `CouponStore` trait; the live MongoDB backend and the in-memory substitute
// are interchangeable behind it and are chosen by whoever builds the HTTP
// layer.
//
// # Modules
//
// - [`model`] -- The `Coupon` record and the `CouponFilter` list filter.
// - [`store`] -- The `CouponStore` trait.
// - [`error`] -- The `StoreError` enum covering every store failure.
// - [`config`] -- `StoreConfig`, read from the environment at startup.
// - [`mongo`] -- The MongoDB backend with a shared, lazily created client.
// - [`memory`] -- An in-memory store for tests and local runs.
// - [`metrics`] -- A transparent wrapper that collects operation statistics.
//
// # Example
//
// ```rust
// use chrono::Utc;
// use coupon_store::{Coupon, CouponFilter, CouponStore, InMemoryCouponStore};
//
// # tokio_test::block_on(async {
// let store = InMemoryCouponStore::new();
// let mut coupon = Coupon::new("Spring", "Acme", 10, Utc::now());
// coupon.assign_new_id();
// store.insert(coupon).await.unwrap();
//
// let acme = store.list(Some(&CouponFilter::by_brand("Acme"))).await.unwrap();
// assert_eq!(acme.len(), 1);
// # });
// ```

pub mod config;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod model;
pub mod mongo;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use error::StoreError;
pub use memory::InMemoryCouponStore;
pub use metrics::{MetricsStore, StatsHandle, StoreStats};
pub use model::{Coupon, CouponFilter};
pub use mongo::MongoCouponStore;
pub use store::CouponStore;
