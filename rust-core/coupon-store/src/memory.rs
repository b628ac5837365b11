// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory coupon store.
//
// Uses a `BTreeMap` keyed by coupon id behind a tokio `RwLock`. Follows the
// same rules as the MongoDB backend (created_at stamping, duplicate ids
// rejected, exact-match filtering) so handlers can be tested without a
// database.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::model::{Coupon, CouponFilter};
use crate::store::CouponStore;

/// An in-memory [`CouponStore`].
///
/// All data lives in process memory and is lost on drop. Clones share the
/// same map.
///
/// # Example
///
/// ```rust
/// use chrono::Utc;
/// use coupon_store::{Coupon, CouponStore, InMemoryCouponStore};
///
/// # tokio_test::block_on(async {
/// let store = InMemoryCouponStore::new();
/// let coupon = Coupon::new("Spring", "Acme", 10, Utc::now()).with_id("c1");
/// store.insert(coupon).await.unwrap();
/// assert_eq!(store.get_by_id("c1").await.unwrap().brand, "Acme");
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryCouponStore {
    coupons: Arc<RwLock<BTreeMap<String, Coupon>>>,
}

impl InMemoryCouponStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored coupons.
    pub async fn len(&self) -> usize {
        self.coupons.read().await.len()
    }

    /// True if the store holds no coupons.
    pub async fn is_empty(&self) -> bool {
        self.coupons.read().await.is_empty()
    }

    /// Remove every coupon. Test fixture helper.
    pub async fn clear(&self) -> u64 {
        let mut map = self.coupons.write().await;
        let removed = map.len() as u64;
        map.clear();
        removed
    }
}

#[async_trait]
impl CouponStore for InMemoryCouponStore {
    async fn insert(&self, mut coupon: Coupon) -> Result<Coupon, StoreError> {
        if coupon.id.is_empty() {
            return Err(StoreError::Validation(
                "coupon id must be assigned before insert".to_string(),
            ));
        }
        coupon.stamp_for_insert();

        let mut map = self.coupons.write().await;
        if map.contains_key(&coupon.id) {
            return Err(StoreError::persistence_for(
                "insert",
                &coupon.id,
                "duplicate id",
            ));
        }
        map.insert(coupon.id.clone(), coupon.clone());
        Ok(coupon)
    }

    async fn get_by_id(&self, id: &str) -> Result<Coupon, StoreError> {
        let map = self.coupons.read().await;
        map.get(id).cloned().ok_or_else(|| StoreError::not_found(id))
    }

    async fn list(&self, filter: Option<&CouponFilter>) -> Result<Vec<Coupon>, StoreError> {
        let map = self.coupons.read().await;
        let coupons = map
            .values()
            .filter(|c| filter.map_or(true, |f| f.matches(c)))
            .cloned()
            .collect();
        Ok(coupons)
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn coupon(id: &str, name: &str, brand: &str, value: i64, year: i32) -> Coupon {
        Coupon::new(
            name,
            brand,
            value,
            Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap(),
        )
        .with_id(id)
    }

    async fn seeded() -> InMemoryCouponStore {
        let store = InMemoryCouponStore::new();
        for c in [
            coupon("testCoupon1", "TestCoupon1", "TestBrand1", 20, 2020),
            coupon("testCoupon2", "TestCoupon2", "TestBrand2", 50, 2021),
            coupon("testCoupon3", "TestCoupon3", "TestBrand3", 100, 2022),
            coupon("testCoupon4", "TestCoupon4", "TestBrand3", 200, 2023),
        ] {
            store.insert(c).await.unwrap();
        }
        store
    }

    fn names(coupons: &[Coupon]) -> Vec<String> {
        let mut names: Vec<String> = coupons.iter().map(|c| c.name.clone()).collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryCouponStore::new();
        let original = coupon("testCoupon1", "TestCoupon", "TestBrand", 20, 2020);

        let stored = store.insert(original.clone()).await.unwrap();
        let elapsed = Utc::now() - stored.created_at;
        assert!(elapsed.num_milliseconds() < 500);

        let mut retrieved = store.get_by_id("testCoupon1").await.unwrap();
        assert_eq!(retrieved, stored);

        retrieved.created_at = original.created_at;
        assert_eq!(retrieved, original);
    }

    #[tokio::test]
    async fn test_insert_overrides_created_at() {
        let store = InMemoryCouponStore::new();
        let mut c = coupon("c1", "n", "b", 1, 2020);
        c.created_at = Utc.with_ymd_and_hms(1999, 1, 1, 0, 0, 0).unwrap();

        let stored = store.insert(c).await.unwrap();
        assert!(stored.created_at.timestamp() > 946_684_800);
    }

    #[tokio::test]
    async fn test_insert_result_equals_read_for_sub_millisecond_expiry() {
        let store = InMemoryCouponStore::new();
        let mut c = coupon("c1", "n", "b", 1, 2021);
        c.expiry = "2021-01-01T00:00:00.123456Z".parse().unwrap();

        let stored = store.insert(c).await.unwrap();
        assert_eq!(stored.expiry.timestamp_subsec_nanos(), 123_000_000);
        assert_eq!(store.get_by_id("c1").await.unwrap(), stored);
    }

    #[tokio::test]
    async fn test_insert_rejects_empty_id() {
        let store = InMemoryCouponStore::new();
        let err = store.insert(coupon("", "n", "b", 1, 2020)).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let store = InMemoryCouponStore::new();
        store.insert(coupon("dup", "a", "b", 1, 2020)).await.unwrap();
        let err = store.insert(coupon("dup", "c", "d", 2, 2021)).await.unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(store.get_by_id("dup").await.unwrap().name, "a");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = seeded().await;
        let err = store.get_by_id("never-inserted").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_without_filter_returns_all() {
        let store = seeded().await;
        let all = store.list(None).await.unwrap();
        assert_eq!(
            names(&all),
            vec!["TestCoupon1", "TestCoupon2", "TestCoupon3", "TestCoupon4"]
        );

        let empty_filter = CouponFilter::default();
        assert_eq!(store.list(Some(&empty_filter)).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_list_filtering() {
        let store = seeded().await;

        let by_brand = store
            .list(Some(&CouponFilter::by_brand("TestBrand2")))
            .await
            .unwrap();
        assert_eq!(names(&by_brand), vec!["TestCoupon2"]);

        let by_name = store
            .list(Some(&CouponFilter::by_name("TestCoupon3")))
            .await
            .unwrap();
        assert_eq!(names(&by_name), vec!["TestCoupon3"]);

        let both = store
            .list(Some(
                &CouponFilter::by_brand("TestBrand3").with_name("TestCoupon4"),
            ))
            .await
            .unwrap();
        assert_eq!(names(&both), vec!["TestCoupon4"]);

        let brand_only = store
            .list(Some(&CouponFilter::by_brand("TestBrand3")))
            .await
            .unwrap();
        assert_eq!(names(&brand_only), vec!["TestCoupon3", "TestCoupon4"]);
    }

    #[tokio::test]
    async fn test_list_no_match_is_empty() {
        let store = seeded().await;
        let none = store
            .list(Some(&CouponFilter::by_brand("NoSuchBrand")))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_update_is_unsupported() {
        let store = seeded().await;
        let before = store.get_by_id("testCoupon1").await.unwrap();

        let err = store
            .update("testCoupon1", coupon("testCoupon1", "x", "y", 0, 2030))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unsupported("update")));
        assert_eq!(store.get_by_id("testCoupon1").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_clear_and_clone_share_state() {
        let store = seeded().await;
        let clone = store.clone();
        assert_eq!(clone.len().await, 4);
        assert_eq!(store.clear().await, 4);
        assert!(clone.is_empty().await);
    }

    #[tokio::test]
    async fn test_name() {
        assert_eq!(InMemoryCouponStore::new().name(), "in-memory");
    }
}
