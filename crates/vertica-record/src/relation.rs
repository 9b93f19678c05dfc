//! Relations between record types.
//!
//! A [`Relation`] links a parent record to rows of another table by one
//! column pair. Loading is planned in two phases: the parent rows are
//! already fetched, then one follow-up `IN (...)` query per relation hop
//! fetches the related rows for every parent at once. A `via` relation is
//! two hops: the intermediate relation first, then the target keyed by the
//! intermediate rows.

use std::collections::HashMap;

use vertica_core::{Driver, Error, Result, Value};
use vertica_query::{Condition, Query};

use crate::connection::Connection;
use crate::record::{Record, Related};

/// How many related rows a parent has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    One,
    Many,
}

/// Declaration of a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    name: String,
    table: String,
    foreign_key: String,
    local_key: String,
    multiplicity: Multiplicity,
    via: Option<String>,
}

impl Relation {
    /// One related row: `table.foreign_key = parent.local_key`.
    pub fn has_one(
        name: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            foreign_key: foreign_key.into(),
            local_key: local_key.into(),
            multiplicity: Multiplicity::One,
            via: None,
        }
    }

    /// Many related rows: `table.foreign_key = parent.local_key`.
    pub fn has_many(
        name: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
        local_key: impl Into<String>,
    ) -> Self {
        Self {
            multiplicity: Multiplicity::Many,
            ..Self::has_one(name, table, foreign_key, local_key)
        }
    }

    /// Reach the target through another relation of the same parent. The
    /// local key then names a column of the intermediate rows.
    #[must_use]
    pub fn via(mut self, relation: impl Into<String>) -> Self {
        self.via = Some(relation.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn foreign_key(&self) -> &str {
        &self.foreign_key
    }

    pub fn local_key(&self) -> &str {
        &self.local_key
    }

    pub fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    pub fn via_relation(&self) -> Option<&str> {
        self.via.as_deref()
    }
}

/// Comparable form of a key value; NULL never matches.
fn key_of(value: &Value) -> Option<String> {
    (!value.is_null()).then(|| value.to_string())
}

fn find<'r>(relations: &'r [Relation], name: &str) -> Result<&'r Relation> {
    relations
        .iter()
        .find(|r| r.name == name)
        .ok_or_else(|| Error::Unsupported(format!("unknown relation {name:?}")))
}

/// Load relation `name` onto every parent.
///
/// `relations` is the parent type's declaration list, used to resolve
/// `via` intermediates. An intermediate already loaded on every parent is
/// reused instead of queried again.
pub(crate) fn load<D: Driver>(
    conn: &mut Connection<D>,
    relations: &[Relation],
    name: &str,
    parents: &mut [&mut Record],
) -> Result<()> {
    let relation = find(relations, name)?;
    let Some(via_name) = relation.via_relation() else {
        return load_direct(conn, relation, parents);
    };

    let via = find(relations, via_name)?;
    if via.via_relation().is_some() {
        return Err(Error::Unsupported(format!(
            "relation {name:?} goes through {via_name:?}, which is itself a via relation"
        )));
    }
    if !parents.iter().all(|p| p.is_relation_populated(via_name)) {
        load_direct(conn, via, parents)?;
    }

    // Second hop, keyed by the intermediate rows.
    let keys: Vec<Value> = parents
        .iter()
        .filter_map(|p| p.related(via_name))
        .flat_map(|related| related.records())
        .filter_map(|r| r.get(&relation.local_key).cloned())
        .collect();
    let targets = fetch(conn, relation, keys)?;

    for parent in parents.iter_mut() {
        let matched: Vec<Record> = parent
            .related(via_name)
            .map(|related| {
                let wanted: Vec<String> = related
                    .records()
                    .filter_map(|r| r.get(&relation.local_key).and_then(key_of))
                    .collect();
                wanted
                    .iter()
                    .filter_map(|k| targets.get(k))
                    .flatten()
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        parent.set_related(relation.name.clone(), assemble(relation, matched));
    }
    Ok(())
}

fn load_direct<D: Driver>(
    conn: &mut Connection<D>,
    relation: &Relation,
    parents: &mut [&mut Record],
) -> Result<()> {
    let keys: Vec<Value> = parents
        .iter()
        .filter_map(|p| p.get(&relation.local_key).cloned())
        .collect();
    let targets = fetch(conn, relation, keys)?;

    for parent in parents.iter_mut() {
        let matched = parent
            .get(&relation.local_key)
            .and_then(key_of)
            .and_then(|k| targets.get(&k))
            .cloned()
            .unwrap_or_default();
        parent.set_related(relation.name.clone(), assemble(relation, matched));
    }
    Ok(())
}

/// One `SELECT * FROM table WHERE foreign_key IN (...)` for the distinct
/// non-null keys, grouped by foreign-key value. Related records are not
/// checked against the catalog, so none of their attributes is an extra.
fn fetch<D: Driver>(
    conn: &mut Connection<D>,
    relation: &Relation,
    keys: Vec<Value>,
) -> Result<HashMap<String, Vec<Record>>> {
    let mut seen = std::collections::HashSet::new();
    let keys: Vec<Value> = keys
        .into_iter()
        .filter(|k| key_of(k).is_some_and(|s| seen.insert(s)))
        .collect();
    let mut grouped: HashMap<String, Vec<Record>> = HashMap::new();
    if keys.is_empty() {
        return Ok(grouped);
    }

    let query = Query::from(relation.table.clone())
        .filter(Condition::in_list(relation.foreign_key.clone(), keys));
    let statement = conn.query_builder().build(&query)?;
    let rows = conn.exec(&statement)?.all_rows();
    tracing::debug!(
        relation = %relation.name,
        table = %relation.table,
        rows = rows.len(),
        "Loaded relation"
    );

    for row in rows {
        let record = Record::from_row(relation.table.clone(), &[], row);
        if let Some(key) = record.get(&relation.foreign_key).and_then(key_of) {
            grouped.entry(key).or_default().push(record);
        }
    }
    Ok(grouped)
}

fn assemble(relation: &Relation, records: Vec<Record>) -> Related {
    match relation.multiplicity {
        Multiplicity::One => Related::One(records.into_iter().next()),
        Multiplicity::Many => Related::Many(records),
    }
}
