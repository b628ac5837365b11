// SPDX-License-Identifier: PMPL-1.0-or-later
//! Store configuration.
//!
//! Read once at process start. A missing connection string is accepted here;
//! the MongoDB backend only reports it when the first operation tries to
//! connect.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Environment variable holding the MongoDB connection string.
pub const CONNECTION_STRING_VAR: &str = "MONGODB_CONNECTION_STRING";
/// Environment variable overriding the logical database name.
pub const DATABASE_VAR: &str = "COUPON_STORE_DATABASE";
/// Environment variable overriding the collection name.
pub const COLLECTION_VAR: &str = "COUPON_STORE_COLLECTION";
/// Environment variable overriding the per-operation timeout, in seconds.
pub const TIMEOUT_VAR: &str = "COUPON_STORE_TIMEOUT_SECS";

pub const DEFAULT_DATABASE: &str = "pbtt";
pub const DEFAULT_COLLECTION: &str = "coupons";
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Where and how the live store connects.
#[derive(Clone)]
pub struct StoreConfig {
    /// MongoDB URI. `None` until configured.
    pub connection_string: Option<String>,
    /// Logical database holding the coupon collection.
    pub database: String,
    /// Collection holding coupon documents.
    pub collection: String,
    /// Upper bound for each operation, connection setup included.
    pub operation_timeout: Duration,
}

impl StoreConfig {
    /// Config pointing at `connection_string` with default names and timeout.
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: Some(connection_string.into()),
            ..Self::default()
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.connection_string = get(CONNECTION_STRING_VAR);
        if let Some(database) = get(DATABASE_VAR) {
            config.database = database;
        }
        if let Some(collection) = get(COLLECTION_VAR) {
            config.collection = collection;
        }
        if let Some(raw) = get(TIMEOUT_VAR) {
            let secs: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    var: TIMEOUT_VAR,
                    value: raw.clone(),
                    reason: e.to_string(),
                }
            })?;
            if secs == 0 {
                return Err(ConfigError::InvalidValue {
                    var: TIMEOUT_VAR,
                    value: raw,
                    reason: "timeout must be positive".to_string(),
                });
            }
            config.operation_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

// Connection strings carry credentials.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field(
                "connection_string",
                &self.connection_string.as_ref().map(|_| "<redacted>"),
            )
            .field("database", &self.database)
            .field("collection", &self.collection)
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}
