// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coupon record and list filter.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// A promotional coupon.
///
/// `id` and `created_at` are owned by the service: the HTTP layer assigns the
/// id and the store stamps `created_at` on insert. Both default when absent
/// from a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// Unique identifier, the store's primary key.
    #[serde(default)]
    pub id: String,
    /// Free-form coupon name.
    pub name: String,
    /// Free-form brand label.
    pub brand: String,
    /// Monetary or point value. No range is enforced.
    pub value: i64,
    /// Server-side insertion time.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    /// Caller-supplied expiry. May lie in the past.
    pub expiry: DateTime<Utc>,
}

impl Coupon {
    /// Create a coupon with no id and an epoch `created_at`.
    pub fn new(
        name: impl Into<String>,
        brand: impl Into<String>,
        value: i64,
        expiry: DateTime<Utc>,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            brand: brand.into(),
            value,
            created_at: DateTime::<Utc>::default(),
            expiry,
        }
    }

    /// Set an explicit id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Replace the id with a freshly generated UUID v4, whatever it was.
    ///
    /// This is the only place new identities are minted.
    pub fn assign_new_id(&mut self) -> &str {
        self.id = uuid::Uuid::new_v4().to_string();
        &self.id
    }

    /// Stamp `created_at` and bring both timestamps down to the store's
    /// resolution, so the record handed back from `insert` equals what a
    /// later read returns.
    pub(crate) fn stamp_for_insert(&mut self) {
        self.created_at = insertion_time();
        self.expiry = self.expiry.trunc_subsecs(STORED_SUBSEC_DIGITS);
    }
}

/// BSON datetimes carry milliseconds.
const STORED_SUBSEC_DIGITS: u16 = 3;

/// Current time at the store's datetime resolution (milliseconds).
fn insertion_time() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(STORED_SUBSEC_DIGITS)
}

/// Optional conjunctive filter for listing coupons.
///
/// Empty strings count as absent, so a filter decoded from `?brand=` still
/// matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponFilter {
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl CouponFilter {
    /// Filter on brand only.
    pub fn by_brand(brand: impl Into<String>) -> Self {
        Self::default().with_brand(brand)
    }

    /// Filter on name only.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self::default().with_name(name)
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Brand constraint, if set and non-empty.
    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref().filter(|b| !b.is_empty())
    }

    /// Name constraint, if set and non-empty.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    /// True when no field constrains the result.
    pub fn is_empty(&self) -> bool {
        self.brand().is_none() && self.name().is_none()
    }

    /// Exact-equality match on every constrained field.
    pub fn matches(&self, coupon: &Coupon) -> bool {
        self.brand().map_or(true, |b| coupon.brand == b)
            && self.name().map_or(true, |n| coupon.name == n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Coupon {
        Coupon::new(
            "TestCoupon",
            "TestBrand",
            20,
            Utc.with_ymd_and_hms(2020, 2, 1, 12, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_assign_new_id_replaces_caller_id() {
        let mut coupon = sample().with_id("client-chosen");
        let id = coupon.assign_new_id().to_string();
        assert!(!id.is_empty());
        assert_ne!(id, "client-chosen");

        let mut other = sample();
        other.assign_new_id();
        assert_ne!(other.id, id);
    }

    #[test]
    fn test_insertion_time_is_millisecond_precision() {
        let t = insertion_time();
        assert_eq!(t.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn test_stamp_for_insert_truncates_expiry_to_millis() {
        let expiry = DateTime::parse_from_rfc3339("2021-01-01T00:00:00.123456Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut coupon = Coupon::new("n", "b", 1, expiry);
        coupon.stamp_for_insert();

        assert_eq!(coupon.expiry.timestamp_subsec_nanos(), 123_000_000);
        assert_eq!(coupon.expiry.timestamp(), expiry.timestamp());
        assert_eq!(coupon.created_at.timestamp_subsec_nanos() % 1_000_000, 0);
        assert_ne!(coupon.created_at, DateTime::<Utc>::default());
    }

    #[test]
    fn test_wire_format_field_names() {
        let json = serde_json::to_value(sample().with_id("c1")).unwrap();
        let obj = json.as_object().unwrap();
        for field in ["id", "name", "brand", "value", "created_at", "expiry"] {
            assert!(obj.contains_key(field), "missing {}", field);
        }
        assert_eq!(obj["expiry"], "2020-02-01T12:00:00Z");
    }

    #[test]
    fn test_request_body_without_id_or_created_at() {
        let body = r#"{"name":"n","brand":"b","value":5,"expiry":"2021-01-01T00:00:00Z"}"#;
        let coupon: Coupon = serde_json::from_str(body).unwrap();
        assert!(coupon.id.is_empty());
        assert_eq!(coupon.created_at, DateTime::<Utc>::default());
        assert_eq!(coupon.value, 5);
    }

    #[test]
    fn test_request_body_missing_required_field_is_rejected() {
        let body = r#"{"name":"n","value":5,"expiry":"2021-01-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<Coupon>(body).is_err());
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let coupon = sample();
        assert!(CouponFilter::default().is_empty());
        assert!(CouponFilter::default().matches(&coupon));

        let blank = CouponFilter::by_brand("").with_name("");
        assert!(blank.is_empty());
        assert!(blank.matches(&coupon));
    }

    #[test]
    fn test_filter_is_conjunctive() {
        let coupon = sample();
        assert!(CouponFilter::by_brand("TestBrand").matches(&coupon));
        assert!(CouponFilter::by_name("TestCoupon").matches(&coupon));
        assert!(CouponFilter::by_brand("TestBrand")
            .with_name("TestCoupon")
            .matches(&coupon));
        assert!(!CouponFilter::by_brand("TestBrand")
            .with_name("Other")
            .matches(&coupon));
    }

    #[test]
    fn test_filter_has_no_substring_matching() {
        let coupon = sample();
        assert!(!CouponFilter::by_brand("Test").matches(&coupon));
        assert!(!CouponFilter::by_name("testcoupon").matches(&coupon));
    }
}
