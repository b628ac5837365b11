// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Metrics-collecting wrapper for coupon stores.
//
// Wraps any `CouponStore` and collects operation counts, failure counts and
// latency sums. The counters live behind a cloneable `StatsHandle` so the
// HTTP layer can report them while holding the store as a trait object.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::model::{Coupon, CouponFilter};
use crate::store::CouponStore;

/// Accumulated statistics for a coupon store.
///
/// All counters are monotonically increasing for the lifetime of the
/// [`MetricsStore`] that owns them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    /// Number of `insert` calls.
    pub insert_count: u64,
    /// Number of `get_by_id` calls.
    pub get_count: u64,
    /// Number of `list` calls.
    pub list_count: u64,
    /// Calls that returned an error other than `NotFound`.
    pub failure_count: u64,
    /// `get_by_id` calls that found nothing.
    pub not_found_count: u64,
    /// Total coupons returned by `list`.
    pub listed_coupons: u64,
    /// Cumulative wall-clock latency of `insert` calls, in milliseconds.
    pub insert_latency_sum_ms: f64,
    /// Cumulative wall-clock latency of `get_by_id` calls, in milliseconds.
    pub get_latency_sum_ms: f64,
    /// Cumulative wall-clock latency of `list` calls, in milliseconds.
    pub list_latency_sum_ms: f64,
}

/// Shared read access to a [`MetricsStore`]'s counters.
#[derive(Debug, Clone, Default)]
pub struct StatsHandle(Arc<RwLock<StoreStats>>);

impl StatsHandle {
    /// Return a snapshot of the current statistics.
    pub async fn snapshot(&self) -> StoreStats {
        self.0.read().await.clone()
    }

    /// Reset all statistics to zero.
    pub async fn reset(&self) {
        *self.0.write().await = StoreStats::default();
    }

    async fn record<T>(
        &self,
        result: &Result<T, StoreError>,
        start: Instant,
        update: impl FnOnce(&mut StoreStats, f64),
    ) {
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        let mut s = self.0.write().await;
        update(&mut *s, elapsed_ms);
        match result {
            Err(StoreError::NotFound { .. }) => s.not_found_count += 1,
            Err(_) => s.failure_count += 1,
            Ok(_) => {}
        }
    }
}

/// A [`CouponStore`] wrapper that collects operation metrics.
///
/// # Example
///
/// ```rust
/// use chrono::Utc;
/// use coupon_store::{Coupon, CouponStore, InMemoryCouponStore, MetricsStore};
///
/// # tokio_test::block_on(async {
/// let metered = MetricsStore::new(InMemoryCouponStore::new());
/// let coupon = Coupon::new("Spring", "Acme", 10, Utc::now()).with_id("c1");
/// metered.insert(coupon).await.unwrap();
/// metered.list(None).await.unwrap();
///
/// let stats = metered.stats().await;
/// assert_eq!(stats.insert_count, 1);
/// assert_eq!(stats.list_count, 1);
/// # });
/// ```
pub struct MetricsStore<S: CouponStore> {
    inner: S,
    stats: StatsHandle,
}

impl<S: CouponStore> MetricsStore<S> {
    /// Wrap `inner` with metrics collection.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            stats: StatsHandle::default(),
        }
    }

    /// Return a snapshot of the current statistics.
    pub async fn stats(&self) -> StoreStats {
        self.stats.snapshot().await
    }

    /// A handle that reads the same counters.
    pub fn stats_handle(&self) -> StatsHandle {
        self.stats.clone()
    }

    /// Return a reference to the inner store.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: CouponStore> CouponStore for MetricsStore<S> {
    async fn insert(&self, coupon: Coupon) -> Result<Coupon, StoreError> {
        let start = Instant::now();
        let result = self.inner.insert(coupon).await;
        self.stats
            .record(&result, start, |s, ms| {
                s.insert_count += 1;
                s.insert_latency_sum_ms += ms;
            })
            .await;
        result
    }

    async fn get_by_id(&self, id: &str) -> Result<Coupon, StoreError> {
        let start = Instant::now();
        let result = self.inner.get_by_id(id).await;
        self.stats
            .record(&result, start, |s, ms| {
                s.get_count += 1;
                s.get_latency_sum_ms += ms;
            })
            .await;
        result
    }

    async fn list(&self, filter: Option<&CouponFilter>) -> Result<Vec<Coupon>, StoreError> {
        let start = Instant::now();
        let result = self.inner.list(filter).await;
        let listed = result.as_ref().map_or(0, |c| c.len() as u64);
        self.stats
            .record(&result, start, |s, ms| {
                s.list_count += 1;
                s.list_latency_sum_ms += ms;
                s.listed_coupons += listed;
            })
            .await;
        result
    }

    async fn update(&self, id: &str, coupon: Coupon) -> Result<Coupon, StoreError> {
        self.inner.update(id, coupon).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
