// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// MongoDB-backed coupon store.
//
// # Design
//
// - One pooled `mongodb::Client`, created on the first operation and shared
//   by every later call. The driver manages its own connection pool.
// - Each operation, connection setup included, is bounded by
//   `StoreConfig::operation_timeout`. No retries.
// - Coupons are persisted through `CouponDocument`, which maps `id` onto the
//   collection's `_id` and stores timestamps as BSON datetimes.
// - List filters translate to a conjunction of equality clauses, brand first.

use std::future::Future;

use async_trait::async_trait;
use bson::{doc, Document};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::config::{StoreConfig, CONNECTION_STRING_VAR};
use crate::error::StoreError;
use crate::model::{Coupon, CouponFilter};
use crate::store::CouponStore;

/// Primary-key field of every MongoDB collection.
const PRIMARY_KEY_FIELD: &str = "_id";
const BRAND_FIELD: &str = "brand";
const NAME_FIELD: &str = "name";

/// Persisted shape of a coupon.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CouponDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    brand: String,
    value: i64,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    expiry: DateTime<Utc>,
}

impl From<&Coupon> for CouponDocument {
    fn from(c: &Coupon) -> Self {
        Self {
            id: c.id.clone(),
            name: c.name.clone(),
            brand: c.brand.clone(),
            value: c.value,
            created_at: c.created_at,
            expiry: c.expiry,
        }
    }
}

impl From<CouponDocument> for Coupon {
    fn from(d: CouponDocument) -> Self {
        Self {
            id: d.id,
            name: d.name,
            brand: d.brand,
            value: d.value,
            created_at: d.created_at,
            expiry: d.expiry,
        }
    }
}

/// Translate an optional list filter into a MongoDB query document.
///
/// One equality clause per non-empty field, brand before name. `None` or an
/// empty filter yields `{}`, which matches every document.
pub fn filter_document(filter: Option<&CouponFilter>) -> Document {
    let mut query = Document::new();
    if let Some(filter) = filter {
        if let Some(brand) = filter.brand() {
            query.insert(BRAND_FIELD, brand);
        }
        if let Some(name) = filter.name() {
            query.insert(NAME_FIELD, name);
        }
    }
    query
}

fn id_document(id: &str) -> Document {
    let mut query = Document::new();
    query.insert(PRIMARY_KEY_FIELD, id);
    query
}

/// A [`CouponStore`] backed by a MongoDB collection.
///
/// Construction never touches the network. The first operation parses the
/// connection string, builds the client and ensures the filter indexes; if
/// that fails the next operation tries again.
///
/// # Example
///
/// ```rust,no_run
/// use coupon_store::{CouponStore, MongoCouponStore, StoreConfig};
///
/// # tokio_test::block_on(async {
/// let store = MongoCouponStore::new(StoreConfig::new("mongodb://localhost:27017"));
/// let coupons = store.list(None).await.unwrap();
/// # });
/// ```
pub struct MongoCouponStore {
    config: StoreConfig,
    client: OnceCell<Client>,
}

impl MongoCouponStore {
    /// Create a store for `config`. Connects lazily.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    /// Return the configuration this store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Delete every document in the collection. Test fixture helper; not
    /// part of [`CouponStore`].
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<u64, StoreError> {
        self.bounded("clear", async {
            let collection = self.collection("clear").await?;
            let result = collection
                .delete_many(doc! {})
                .await
                .map_err(|e| StoreError::persistence("clear", e))?;
            Ok(result.deleted_count)
        })
        .await
    }

    /// Drop the collection and its indexes. Test fixture helper; not part of
    /// [`CouponStore`].
    #[instrument(skip(self), fields(collection = %self.config.collection))]
    pub async fn drop_collection(&self) -> Result<(), StoreError> {
        self.bounded("drop_collection", async {
            let collection = self.collection("drop_collection").await?;
            collection
                .drop()
                .await
                .map_err(|e| StoreError::persistence("drop_collection", e))
        })
        .await
    }

    /// Run `operation` under the configured timeout.
    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let timeout = self.config.operation_timeout;
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, ?timeout, "store operation timed out");
                Err(StoreError::persistence(
                    operation,
                    format!("timed out after {:?}", timeout),
                ))
            }
        }
    }

    /// The coupon collection on the shared client, connecting on first use.
    async fn collection(
        &self,
        operation: &'static str,
    ) -> Result<Collection<CouponDocument>, StoreError> {
        let client = self
            .client
            .get_or_try_init(|| connect(&self.config, operation))
            .await?;
        Ok(client
            .database(&self.config.database)
            .collection(&self.config.collection))
    }
}

impl std::fmt::Debug for MongoCouponStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoCouponStore")
            .field("config", &self.config)
            .field("connected", &self.client.initialized())
            .finish()
    }
}

async fn connect(config: &StoreConfig, operation: &'static str) -> Result<Client, StoreError> {
    let uri = config.connection_string.as_deref().ok_or_else(|| {
        StoreError::persistence(
            operation,
            format!("no connection string configured (set {})", CONNECTION_STRING_VAR),
        )
    })?;

    let mut options = ClientOptions::parse(uri)
        .await
        .map_err(|e| StoreError::persistence(operation, format!("invalid connection string: {}", e)))?;
    options.connect_timeout = Some(config.operation_timeout);
    options.server_selection_timeout = Some(config.operation_timeout);
    if options.app_name.is_none() {
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
    }

    let client = Client::with_options(options)
        .map_err(|e| StoreError::persistence(operation, format!("error creating client: {}", e)))?;

    let collection: Collection<CouponDocument> = client
        .database(&config.database)
        .collection(&config.collection);
    ensure_indexes(&collection)
        .await
        .map_err(|e| StoreError::persistence(operation, format!("error connecting to mongodb: {}", e)))?;

    info!(
        database = %config.database,
        collection = %config.collection,
        "connected to mongodb"
    );
    Ok(client)
}

/// Indexes backing brand and name filtering. Creating an existing index is
/// a no-op on the server.
async fn ensure_indexes(
    collection: &Collection<CouponDocument>,
) -> Result<(), mongodb::error::Error> {
    let mut brand_name = Document::new();
    brand_name.insert(BRAND_FIELD, 1);
    brand_name.insert(NAME_FIELD, 1);
    let mut name = Document::new();
    name.insert(NAME_FIELD, 1);

    let indexes = vec![
        IndexModel::builder().keys(brand_name).build(),
        IndexModel::builder().keys(name).build(),
    ];
    collection.create_indexes(indexes).await?;
    Ok(())
}

#[async_trait]
impl CouponStore for MongoCouponStore {
    #[instrument(skip(self, coupon), fields(id = %coupon.id))]
    async fn insert(&self, mut coupon: Coupon) -> Result<Coupon, StoreError> {
        if coupon.id.is_empty() {
            return Err(StoreError::Validation(
                "coupon id must be assigned before insert".to_string(),
            ));
        }
        coupon.stamp_for_insert();
        let document = CouponDocument::from(&coupon);

        self.bounded("insert", async {
            let collection = self.collection("insert").await?;
            collection.insert_one(&document).await.map_err(|e| {
                StoreError::persistence(
                    "insert",
                    format!("error creating document in mongodb: {}", e),
                )
            })?;
            Ok(())
        })
        .await
        .map_err(|e| e.for_coupon(&coupon.id))?;

        debug!("inserted coupon");
        Ok(coupon)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> Result<Coupon, StoreError> {
        let found = self
            .bounded("get_by_id", async {
                let collection = self.collection("get_by_id").await?;
                collection.find_one(id_document(id)).await.map_err(|e| {
                    StoreError::persistence(
                        "get_by_id",
                        format!("error decoding db response: {}", e),
                    )
                })
            })
            .await
            .map_err(|e| e.for_coupon(id))?;

        found
            .map(Coupon::from)
            .ok_or_else(|| StoreError::not_found(id))
    }

    #[instrument(skip(self))]
    async fn list(&self, filter: Option<&CouponFilter>) -> Result<Vec<Coupon>, StoreError> {
        let query = filter_document(filter);
        debug!(%query, "listing coupons");

        let documents: Vec<CouponDocument> = self
            .bounded("list", async {
                let collection = self.collection("list").await?;
                let cursor = collection
                    .find(query)
                    .await
                    .map_err(|e| StoreError::persistence("list", e))?;
                cursor
                    .try_collect()
                    .await
                    .map_err(|e| StoreError::persistence("list", format!("error decoding documents: {}", e)))
            })
            .await?;

        Ok(documents.into_iter().map(Coupon::from).collect())
    }

    fn name(&self) -> &str {
        "mongodb"
    }
}
