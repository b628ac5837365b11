// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Store error types for the coupon data-access layer.
//
// Every failure a store can report is one of four kinds: a malformed record,
// a missing record, a persistence failure (connection, write, query, decode
// or timeout) and an operation the store deliberately does not support.

use std::fmt::Display;

use thiserror::Error;

/// Errors returned by [`crate::CouponStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The record handed to the store is not acceptable (e.g. no id).
    #[error("invalid coupon: {0}")]
    Validation(String),

    /// No record exists with the requested id.
    #[error("coupon not found: {id}")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },

    /// The backend failed to connect, write, query or decode.
    #[error("{operation} failed: {message}")]
    Persistence {
        /// Store operation that failed (`insert`, `get_by_id`, `list`, ...).
        operation: &'static str,
        /// Failure detail, including the identifier for lookups.
        message: String,
    },

    /// The operation is intentionally not implemented.
    #[error("{0} is not supported")]
    Unsupported(&'static str),
}

impl StoreError {
    /// Build a [`StoreError::Persistence`] for `operation`.
    pub fn persistence(operation: &'static str, err: impl Display) -> Self {
        StoreError::Persistence {
            operation,
            message: err.to_string(),
        }
    }

    /// Build a [`StoreError::Persistence`] naming the coupon id involved.
    pub fn persistence_for(operation: &'static str, id: &str, err: impl Display) -> Self {
        StoreError::Persistence {
            operation,
            message: format!("coupon {}: {}", id, err),
        }
    }

    /// Attach the coupon id to a [`StoreError::Persistence`] raised before the
    /// operation knew which record it was serving (connect, timeout).
    /// Other variants pass through unchanged.
    pub fn for_coupon(self, id: &str) -> Self {
        match self {
            StoreError::Persistence { operation, message } => {
                StoreError::persistence_for(operation, id, message)
            }
            other => other,
        }
    }

    /// Build a [`StoreError::NotFound`] for `id`.
    pub fn not_found(id: impl Into<String>) -> Self {
        StoreError::NotFound { id: id.into() }
    }

    /// True for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// True for [`StoreError::Persistence`].
    pub fn is_persistence(&self) -> bool {
        matches!(self, StoreError::Persistence { .. })
    }
}
