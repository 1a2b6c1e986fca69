//! In-memory transactional record store.
//!
//! Records are kept as JSON documents in indexed tables. Every committed
//! write publishes a new immutable [`snapshot::Snapshot`]; readers only ever
//! see committed snapshots. A write can also be left open as a
//! [`PendingWrite`] and finalized later, once some external condition (a
//! payment, say) has been decided.

mod snapshot;
mod transaction;

pub use transaction::{PendingWrite, TransactionState};

use crate::domain::table::{IndexKey, Schema};
use crate::error::{Result, ShopError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use snapshot::Snapshot;
use std::sync::Arc;
use tokio::sync::RwLock;

struct StoreInner {
    schema: Schema,
    live: RwLock<Arc<Snapshot>>,
}

/// A thread-safe store over the tables declared in a [`Schema`].
///
/// `Clone` shares the underlying snapshot.
#[derive(Clone)]
pub struct TransactionalStore {
    inner: Arc<StoreInner>,
}

impl TransactionalStore {
    /// Creates an empty store with one table per schema entry.
    pub fn new(schema: Schema) -> Result<Self> {
        schema.validate()?;
        let live = RwLock::new(Arc::new(Snapshot::empty(&schema)));
        Ok(Self {
            inner: Arc::new(StoreInner { schema, live }),
        })
    }

    /// Version of the committed snapshot. Bumped by every commit that changes it.
    pub async fn version(&self) -> u64 {
        self.snapshot().await.version
    }

    async fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.live.read().await.clone()
    }

    /// Returns the first record matching `key` on `index`.
    ///
    /// Fails with [`ShopError::NotFound`] when nothing matches.
    pub async fn read<R: DeserializeOwned>(
        &self,
        table: &str,
        index: &str,
        key: impl Into<IndexKey>,
    ) -> Result<R> {
        let key = key.into();
        let schema = self.inner.schema.table(table)?;
        let index_schema = schema.index(index)?;
        let snapshot = self.snapshot().await;
        let data = snapshot.table(table)?;
        let record = data
            .lookup(schema, index_schema, &key)
            .first()
            .and_then(|pk| data.get(pk))
            .cloned()
            .ok_or_else(|| ShopError::not_found(table, index, &key))?;
        Ok(serde_json::from_value(record)?)
    }

    /// Returns every record matching `key` on `index`, in primary key order.
    pub async fn read_all<R: DeserializeOwned>(
        &self,
        table: &str,
        index: &str,
        key: impl Into<IndexKey>,
    ) -> Result<Vec<R>> {
        let key = key.into();
        let schema = self.inner.schema.table(table)?;
        let index_schema = schema.index(index)?;
        let snapshot = self.snapshot().await;
        let data = snapshot.table(table)?;
        data.lookup(schema, index_schema, &key)
            .iter()
            .filter_map(|pk| data.get(pk))
            .map(|record| serde_json::from_value(record.clone()).map_err(ShopError::from))
            .collect()
    }

    /// Returns every record of a table, in primary key order.
    pub async fn scan<R: DeserializeOwned>(&self, table: &str) -> Result<Vec<R>> {
        let snapshot = self.snapshot().await;
        snapshot
            .table(table)?
            .rows()
            .map(|record| serde_json::from_value(record.clone()).map_err(ShopError::from))
            .collect()
    }

    /// Inserts all records and commits them as one atomic batch.
    pub async fn write<R: Serialize>(&self, table: &str, records: &[R]) -> Result<()> {
        let writes = self.encode(table, records)?;
        let version = self.apply(&writes).await?;
        tracing::debug!(table, records = writes.len(), version, "write committed");
        Ok(())
    }

    /// Inserts all records into a private copy of the committed snapshot and
    /// hands the open transaction back uncommitted.
    ///
    /// Constraint violations are reported here, synchronously. Nothing becomes
    /// visible to readers until the returned [`PendingWrite`] is committed.
    pub async fn write_after_external_condition<R: Serialize>(
        &self,
        table: &str,
        records: &[R],
    ) -> Result<PendingWrite> {
        let writes = self.encode(table, records)?;
        let base = self.snapshot().await;
        let mut working = Snapshot::clone(&base);
        for (table, record) in &writes {
            working.insert(self.inner.schema.table(table)?, record.clone())?;
        }
        tracing::debug!(
            table,
            records = writes.len(),
            base_version = base.version,
            "write opened, awaiting external condition"
        );
        Ok(PendingWrite::new(self.clone(), base.version, writes))
    }

    /// Deletes every record matching `key` on `index` and commits.
    pub async fn remove(&self, table: &str, index: &str, key: impl Into<IndexKey>) -> Result<usize> {
        let key = key.into();
        let schema = self.inner.schema.table(table)?;
        let index_schema = schema.index(index)?;

        let mut live = self.inner.live.write().await;
        let mut next = Snapshot::clone(&live);
        let removed = next.remove_matching(schema, index_schema, &key)?;
        if removed > 0 {
            next.version += 1;
            *live = Arc::new(next);
        }
        tracing::debug!(table, index, %key, removed, "records removed");
        Ok(removed)
    }

    fn encode<R: Serialize>(&self, table: &str, records: &[R]) -> Result<Vec<(String, Value)>> {
        self.inner.schema.table(table)?;
        records
            .iter()
            .map(|record| {
                serde_json::to_value(record)
                    .map(|value| (table.to_string(), value))
                    .map_err(ShopError::from)
            })
            .collect()
    }

    /// Applies a write set on top of the live snapshot and publishes the
    /// result, or leaves the live snapshot untouched if any insert fails.
    async fn apply(&self, writes: &[(String, Value)]) -> Result<u64> {
        let mut live = self.inner.live.write().await;
        let mut next = Snapshot::clone(&live);
        for (table, record) in writes {
            next.insert(self.inner.schema.table(table)?, record.clone())?;
        }
        if writes.is_empty() {
            return Ok(next.version);
        }
        next.version += 1;
        let version = next.version;
        *live = Arc::new(next);
        Ok(version)
    }
}
