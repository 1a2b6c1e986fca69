use crate::error::{Result, ShopError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A value an index can be keyed on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    Bool(bool),
    Uint(u64),
    Str(String),
}

impl IndexKey {
    /// Extracts every index key carried by a field value.
    ///
    /// Scalars yield one key, objects yield one key per map key and arrays one
    /// key per element. Missing and null fields yield nothing.
    pub fn from_field(value: &Value) -> Vec<IndexKey> {
        match value {
            Value::Bool(b) => vec![IndexKey::Bool(*b)],
            Value::Number(n) => n.as_u64().map(IndexKey::Uint).into_iter().collect(),
            Value::String(s) => vec![IndexKey::Str(s.clone())],
            // JSON object keys are strings; numeric ones index as integers
            Value::Object(map) => map
                .keys()
                .map(|key| match key.parse::<u64>() {
                    Ok(n) => IndexKey::Uint(n),
                    Err(_) => IndexKey::Str(key.clone()),
                })
                .collect(),
            Value::Array(items) => items.iter().flat_map(IndexKey::from_field).collect(),
            Value::Null => Vec::new(),
        }
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Bool(b) => write!(f, "{b}"),
            IndexKey::Uint(n) => write!(f, "{n}"),
            IndexKey::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<u64> for IndexKey {
    fn from(value: u64) -> Self {
        IndexKey::Uint(value)
    }
}

impl From<u32> for IndexKey {
    fn from(value: u32) -> Self {
        IndexKey::Uint(value.into())
    }
}

impl From<bool> for IndexKey {
    fn from(value: bool) -> Self {
        IndexKey::Bool(value)
    }
}

impl From<&str> for IndexKey {
    fn from(value: &str) -> Self {
        IndexKey::Str(value.to_string())
    }
}

impl From<String> for IndexKey {
    fn from(value: String) -> Self {
        IndexKey::Str(value)
    }
}

/// A lookup index over one field of a table's records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    pub name: String,
    pub field: String,
    pub unique: bool,
}

/// Describes a named table and the indexes declared over its records.
///
/// Exactly one index is the primary index. It is always unique and every
/// record must carry a single scalar value for its field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: String,
    primary: String,
    indexes: BTreeMap<String, IndexSchema>,
    duplicates: Vec<String>,
}

impl TableSchema {
    pub fn new(name: &str, primary_index: &str, field: &str) -> Self {
        let mut indexes = BTreeMap::new();
        indexes.insert(
            primary_index.to_string(),
            IndexSchema {
                name: primary_index.to_string(),
                field: field.to_string(),
                unique: true,
            },
        );
        Self {
            name: name.to_string(),
            primary: primary_index.to_string(),
            indexes,
            duplicates: Vec::new(),
        }
    }

    /// Declares a secondary index. Redeclaring an existing index name is
    /// rejected by [`TableSchema::validate`].
    pub fn with_index(mut self, name: &str, field: &str, unique: bool) -> Self {
        if self.indexes.contains_key(name) {
            self.duplicates.push(name.to_string());
            return self;
        }
        self.indexes.insert(
            name.to_string(),
            IndexSchema {
                name: name.to_string(),
                field: field.to_string(),
                unique,
            },
        );
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary(&self) -> &IndexSchema {
        // inserted by new() and never replaced
        &self.indexes[&self.primary]
    }

    pub fn index(&self, name: &str) -> Result<&IndexSchema> {
        self.indexes.get(name).ok_or_else(|| ShopError::UnknownIndex {
            table: self.name.clone(),
            index: name.to_string(),
        })
    }

    pub fn secondary_indexes(&self) -> impl Iterator<Item = &IndexSchema> {
        self.indexes.values().filter(|idx| idx.name != self.primary)
    }

    /// Extracts the primary key of a record, rejecting records without one.
    pub fn primary_key(&self, record: &Value) -> Result<IndexKey> {
        let field = &self.primary().field;
        let mut keys = match record.get(field) {
            Some(value @ (Value::Bool(_) | Value::Number(_) | Value::String(_))) => {
                IndexKey::from_field(value)
            }
            _ => Vec::new(),
        };
        match keys.pop() {
            Some(key) if keys.is_empty() => Ok(key),
            _ => Err(ShopError::ValidationError(format!(
                "record for {} has no usable primary key field {}",
                self.name, field
            ))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ShopError::Schema("table name cannot be empty".into()));
        }
        if let Some(name) = self.duplicates.first() {
            return Err(ShopError::Schema(format!(
                "index {} declared twice on {}",
                name, self.name
            )));
        }
        if let Some(idx) = self.indexes.values().find(|idx| idx.field.is_empty()) {
            return Err(ShopError::Schema(format!(
                "index {} on {} has no field",
                idx.name, self.name
            )));
        }
        Ok(())
    }
}

/// The set of tables a store is created with.
///
/// Built once at startup and handed to the store; there is no global registry.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    tables: BTreeMap<String, TableSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: TableSchema) -> Self {
        self.add_table(table);
        self
    }

    pub fn add_table(&mut self, table: TableSchema) {
        self.tables.insert(table.name().to_string(), table);
    }

    pub fn table(&self, name: &str) -> Result<&TableSchema> {
        self.tables
            .get(name)
            .ok_or_else(|| ShopError::UnknownTable(name.to_string()))
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    pub fn validate(&self) -> Result<()> {
        if self.tables.is_empty() {
            return Err(ShopError::Schema("schema declares no tables".into()));
        }
        self.tables.values().try_for_each(TableSchema::validate)
    }
}
