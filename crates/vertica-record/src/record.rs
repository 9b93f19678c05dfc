//! Untyped record state.
//!
//! [`Record`] is the attribute store behind every active record: an ordered
//! attribute map, the snapshot taken at the last load or save (used for
//! dirty tracking), the lifecycle state and any loaded relations.

use indexmap::{IndexMap, IndexSet};
use vertica_core::{Row, Value};

/// Lifecycle of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordState {
    /// Built in memory, never written.
    #[default]
    New,
    /// Loaded from or written to the database.
    Persisted,
    /// Deleted from the database.
    Deleted,
}

/// Loaded relation data.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    One(Option<Record>),
    Many(Vec<Record>),
}

impl Related {
    /// The related records as a slice-like iterator, whatever the multiplicity.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        let (one, many) = match self {
            Related::One(record) => (record.as_ref(), &[][..]),
            Related::Many(records) => (None, records.as_slice()),
        };
        one.into_iter().chain(many.iter())
    }

    pub fn len(&self) -> usize {
        self.records().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Attribute store of one row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    table: String,
    attributes: IndexMap<String, Value>,
    old_attributes: Option<IndexMap<String, Value>>,
    extras: IndexSet<String>,
    state: RecordState,
    related: IndexMap<String, Related>,
}

impl Record {
    /// A new, empty record for `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Build a persisted record from a fetched row.
    ///
    /// Every column of the row becomes an attribute. Columns missing from
    /// `catalog_columns` (computed aliases and the like) are flagged as
    /// extras. An empty catalog list flags nothing.
    pub fn from_row(table: impl Into<String>, catalog_columns: &[String], row: Row) -> Self {
        let mut record = Self::new(table);
        for (column, value) in row.into_pairs() {
            let known = catalog_columns.is_empty()
                || catalog_columns
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(&column));
            if !known {
                record.extras.insert(column.clone());
            }
            record.attributes.insert(column, value);
        }
        record.mark_persisted();
        record
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn state(&self) -> RecordState {
        self.state
    }

    pub fn is_new(&self) -> bool {
        self.state == RecordState::New
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attributes(&self) -> &IndexMap<String, Value> {
        &self.attributes
    }

    /// Attribute names that are not catalog columns.
    pub fn extras(&self) -> impl Iterator<Item = &str> {
        self.extras.iter().map(String::as_str)
    }

    pub fn is_extra(&self, name: &str) -> bool {
        self.extras.contains(name)
    }

    /// Value of `name` at the last load or save.
    pub fn old_attribute(&self, name: &str) -> Option<&Value> {
        self.old_attributes.as_ref().and_then(|old| old.get(name))
    }

    /// Attributes changed since the last load or save, optionally limited
    /// to `names`. Every attribute of a never-saved record is dirty.
    pub fn dirty_attributes(&self, names: Option<&[&str]>) -> IndexMap<String, Value> {
        self.attributes
            .iter()
            .filter(|(name, _)| names.is_none_or(|n| n.contains(&name.as_str())))
            .filter(|(name, value)| {
                self.old_attributes
                    .as_ref()
                    .is_none_or(|old| old.get(name.as_str()) != Some(*value))
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty_attributes(None).is_empty()
    }

    /// Snapshot the current attributes and mark the record persisted.
    pub fn mark_persisted(&mut self) {
        self.old_attributes = Some(self.attributes.clone());
        self.state = RecordState::Persisted;
    }

    /// Merge the values just written into the snapshot and mark the record
    /// persisted. Attributes not in `written` keep their dirty state.
    pub fn mark_written(&mut self, written: &IndexMap<String, Value>) {
        let snapshot = self.old_attributes.get_or_insert_with(IndexMap::new);
        for (name, value) in written {
            snapshot.insert(name.clone(), value.clone());
        }
        self.state = RecordState::Persisted;
    }

    pub fn mark_deleted(&mut self) {
        self.state = RecordState::Deleted;
    }

    // ========================================================================
    // Relations
    // ========================================================================

    pub fn related(&self, name: &str) -> Option<&Related> {
        self.related.get(name)
    }

    pub fn set_related(&mut self, name: impl Into<String>, related: Related) {
        self.related.insert(name.into(), related);
    }

    pub fn is_relation_populated(&self, name: &str) -> bool {
        self.related.contains_key(name)
    }

    /// JSON object of the attributes, with loaded relations nested under
    /// their names.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map: serde_json::Map<String, serde_json::Value> = self
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        for (name, related) in &self.related {
            let value = match related {
                Related::One(None) => serde_json::Value::Null,
                Related::One(Some(record)) => record.to_json(),
                Related::Many(records) => {
                    serde_json::Value::Array(records.iter().map(Record::to_json).collect())
                }
            };
            map.insert(name.clone(), value);
        }
        serde_json::Value::Object(map)
    }
}
