use crate::domain::table::{IndexKey, IndexSchema, Schema, TableSchema};
use crate::error::{Result, ShopError};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

type SecondaryIndex = BTreeMap<IndexKey, BTreeSet<IndexKey>>;

/// Records of one table keyed by primary key, plus its secondary indexes.
#[derive(Debug, Clone, Default)]
pub(crate) struct TableData {
    rows: BTreeMap<IndexKey, Value>,
    /// index name -> indexed value -> primary keys of the records carrying it
    indexes: HashMap<String, SecondaryIndex>,
}

fn index_keys(index: &IndexSchema, record: &Value) -> Vec<IndexKey> {
    record
        .get(&index.field)
        .map(IndexKey::from_field)
        .unwrap_or_default()
}

impl TableData {
    /// Inserts a record, replacing any record with the same primary key.
    ///
    /// Fails without touching the table when the record has no primary key or
    /// a unique index already maps one of its values to another record.
    pub fn insert(&mut self, table: &TableSchema, record: Value) -> Result<()> {
        let pk = table.primary_key(&record)?;

        for index in table.secondary_indexes().filter(|idx| idx.unique) {
            let mut seen = BTreeSet::new();
            for key in index_keys(index, &record) {
                let taken = self
                    .indexes
                    .get(&index.name)
                    .and_then(|entries| entries.get(&key))
                    .is_some_and(|owners| owners.iter().any(|owner| *owner != pk));
                if taken || !seen.insert(key.clone()) {
                    return Err(ShopError::UniqueViolation {
                        table: table.name().to_string(),
                        index: index.name.clone(),
                        key: key.to_string(),
                    });
                }
            }
        }

        if let Some(previous) = self.rows.remove(&pk) {
            self.unindex(table, &pk, &previous);
        }
        for index in table.secondary_indexes() {
            for key in index_keys(index, &record) {
                self.indexes
                    .entry(index.name.clone())
                    .or_default()
                    .entry(key)
                    .or_default()
                    .insert(pk.clone());
            }
        }
        self.rows.insert(pk, record);
        Ok(())
    }

    pub fn remove(&mut self, table: &TableSchema, pk: &IndexKey) -> Option<Value> {
        let record = self.rows.remove(pk)?;
        self.unindex(table, pk, &record);
        Some(record)
    }

    fn unindex(&mut self, table: &TableSchema, pk: &IndexKey, record: &Value) {
        for index in table.secondary_indexes() {
            let Some(entries) = self.indexes.get_mut(&index.name) else {
                continue;
            };
            for key in index_keys(index, record) {
                if let Some(owners) = entries.get_mut(&key) {
                    owners.remove(pk);
                    if owners.is_empty() {
                        entries.remove(&key);
                    }
                }
            }
        }
    }

    /// Primary keys of every record matching `key` on `index`, in key order.
    pub fn lookup(&self, table: &TableSchema, index: &IndexSchema, key: &IndexKey) -> Vec<IndexKey> {
        if index.name == table.primary().name {
            return self
                .rows
                .contains_key(key)
                .then(|| key.clone())
                .into_iter()
                .collect();
        }
        self.indexes
            .get(&index.name)
            .and_then(|entries| entries.get(key))
            .map(|owners| owners.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get(&self, pk: &IndexKey) -> Option<&Value> {
        self.rows.get(pk)
    }

    pub fn rows(&self) -> impl Iterator<Item = &Value> {
        self.rows.values()
    }
}

/// An immutable, versioned view of every table.
///
/// Tables are shared between snapshots and copied on first write.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    pub version: u64,
    tables: HashMap<String, Arc<TableData>>,
}

impl Snapshot {
    pub fn empty(schema: &Schema) -> Self {
        Self {
            version: 0,
            tables: schema
                .tables()
                .map(|table| (table.name().to_string(), Arc::new(TableData::default())))
                .collect(),
        }
    }

    pub fn table(&self, name: &str) -> Result<&TableData> {
        self.tables
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| ShopError::UnknownTable(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut TableData> {
        self.tables
            .get_mut(name)
            .map(Arc::make_mut)
            .ok_or_else(|| ShopError::UnknownTable(name.to_string()))
    }

    pub fn insert(&mut self, table: &TableSchema, record: Value) -> Result<()> {
        self.table_mut(table.name())?.insert(table, record)
    }

    /// Removes every record matching `key` on `index`, returning how many went.
    pub fn remove_matching(&mut self, table: &TableSchema, index: &IndexSchema, key: &IndexKey) -> Result<usize> {
        let matches = self.table(table.name())?.lookup(table, index, key);
        if matches.is_empty() {
            return Ok(0);
        }
        let data = self.table_mut(table.name())?;
        Ok(matches
            .iter()
            .filter_map(|pk| data.remove(table, pk))
            .count())
    }
}
