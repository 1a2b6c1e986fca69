use super::TransactionalStore;
use crate::error::Result;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Open,
    Committed,
    Aborted,
}

/// A write transaction that has been opened but not yet finalized.
///
/// Commit and abort consume the handle, so a transaction is finalized at most
/// once. A handle dropped while still open is aborted.
pub struct PendingWrite {
    store: TransactionalStore,
    base_version: u64,
    writes: Vec<(String, Value)>,
    state: TransactionState,
}

impl PendingWrite {
    pub(super) fn new(
        store: TransactionalStore,
        base_version: u64,
        writes: Vec<(String, Value)>,
    ) -> Self {
        Self {
            store,
            base_version,
            writes,
            state: TransactionState::Open,
        }
    }

    /// Version of the committed snapshot the transaction was opened against.
    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Commits when `commit` is true, aborts otherwise.
    pub async fn finalize(self, commit: bool) -> Result<()> {
        if commit {
            self.commit().await
        } else {
            self.abort();
            Ok(())
        }
    }

    /// Publishes the pending writes on top of the live snapshot.
    ///
    /// Index constraints are checked again against the live snapshot; on a
    /// violation nothing is published and the transaction ends aborted.
    pub async fn commit(mut self) -> Result<()> {
        match self.store.apply(&self.writes).await {
            Ok(version) => {
                self.state = TransactionState::Committed;
                tracing::debug!(
                    records = self.writes.len(),
                    base_version = self.base_version,
                    version,
                    "pending write committed"
                );
                Ok(())
            }
            Err(err) => {
                self.state = TransactionState::Aborted;
                tracing::debug!(error = %err, "pending write failed to commit");
                Err(err)
            }
        }
    }

    /// Discards the pending writes. The live snapshot was never touched by
    /// them, so it stays exactly as the other writers left it.
    pub fn abort(mut self) {
        self.state = TransactionState::Aborted;
        tracing::debug!(
            records = self.writes.len(),
            base_version = self.base_version,
            "pending write aborted"
        );
    }
}

impl Drop for PendingWrite {
    fn drop(&mut self) {
        if self.state == TransactionState::Open {
            tracing::warn!(
                records = self.writes.len(),
                base_version = self.base_version,
                "pending write dropped without commit or abort. Implicitly aborting."
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::table::{Schema, TableSchema};
    use crate::infrastructure::store::{TransactionState, TransactionalStore};
    use serde_json::{Value, json};

    fn store() -> TransactionalStore {
        TransactionalStore::new(Schema::new().with_table(TableSchema::new("kv", "key", "key")))
            .unwrap()
    }

    #[tokio::test]
    async fn test_pending_write_starts_open() {
        let store = store();
        let pending = store
            .write_after_external_condition("kv", &[json!({"key": "a", "value": 1})])
            .await
            .unwrap();
        assert_eq!(pending.state(), TransactionState::Open);
        assert_eq!(pending.base_version(), 0);
        pending.abort();
    }

    #[tokio::test]
    async fn test_dropped_pending_write_never_commits() {
        let store = store();
        {
            let _pending = store
                .write_after_external_condition("kv", &[json!({"key": "a", "value": 1})])
                .await
                .unwrap();
        }
        assert!(store.read::<Value>("kv", "key", "a").await.unwrap_err().is_not_found());
        assert_eq!(store.version().await, 0);
    }

    #[tokio::test]
    async fn test_finalize_is_the_only_path_to_commit() {
        let store = store();
        let pending = store
            .write_after_external_condition("kv", &[json!({"key": "a", "value": 1})])
            .await
            .unwrap();

        // unrelated committed writes do not publish the open transaction
        store.write("kv", &[json!({"key": "b", "value": 2})]).await.unwrap();
        assert!(store.read::<Value>("kv", "key", "a").await.unwrap_err().is_not_found());

        pending.finalize(true).await.unwrap();
        let value: Value = store.read("kv", "key", "a").await.unwrap();
        assert_eq!(value["value"], 1);
    }
}
