// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core store trait for coupon records.
//
// Defines the `CouponStore` trait that request handling depends on. The live
// MongoDB backend and the in-memory substitute both implement it, and the
// HTTP layer receives one as `Arc<dyn CouponStore>` at construction time.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{Coupon, CouponFilter};

/// Data access for coupon records in a single fixed collection.
///
/// Implementations must be safe to share across threads and tokio tasks.
#[async_trait]
pub trait CouponStore: Send + Sync {
    /// Persist a new coupon.
    ///
    /// `coupon.id` must already be assigned; an empty id is rejected with
    /// [`StoreError::Validation`]. `created_at` is overwritten with the
    /// insertion time. Returns the record exactly as persisted.
    async fn insert(&self, coupon: Coupon) -> Result<Coupon, StoreError>;

    /// Fetch a coupon by id.
    ///
    /// Returns [`StoreError::NotFound`] when no record has that id.
    async fn get_by_id(&self, id: &str) -> Result<Coupon, StoreError>;

    /// List coupons matching `filter`, or every coupon when it is `None` or
    /// empty. Order is unspecified; no match yields an empty vector.
    async fn list(&self, filter: Option<&CouponFilter>) -> Result<Vec<Coupon>, StoreError>;

    /// Updating coupons is not supported by any store.
    async fn update(&self, _id: &str, _coupon: Coupon) -> Result<Coupon, StoreError> {
        Err(StoreError::Unsupported("update"))
    }

    /// A human-readable name for this store, used in logging and health output.
    fn name(&self) -> &str;
}
