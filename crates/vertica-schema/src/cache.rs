//! Per-table schema cache.
//!
//! Column lists and inferred primary keys are read from the catalog once per
//! table and kept until the cache is invalidated. A cache is shared through
//! `Arc` and may be injected into several connections.
//!
//! Each table has its own initialization slot. Concurrent first lookups of
//! the same table run a single loader; lookups of different tables do not
//! wait on each other. A failing loader leaves the slot empty.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use vertica_core::Result;

type Slot<T> = Arc<Mutex<Option<T>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct Slots<T> {
    entries: Mutex<HashMap<String, Slot<T>>>,
}

impl<T: Clone> Slots<T> {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, table: &str) -> Slot<T> {
        let mut entries = lock(&self.entries);
        Arc::clone(entries.entry(table.to_string()).or_default())
    }

    fn peek(&self, table: &str) -> Option<T> {
        let slot = lock(&self.entries).get(table).cloned()?;
        let value = lock(&slot).clone();
        value
    }

    fn remove(&self, table: &str) -> bool {
        lock(&self.entries).remove(table).is_some()
    }

    fn clear(&self) {
        lock(&self.entries).clear();
    }

    fn len(&self) -> usize {
        lock(&self.entries)
            .values()
            .filter(|slot| lock(slot).is_some())
            .count()
    }
}

/// Lookup counters, for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that ran a catalog loader.
    pub loads: u64,
}

/// Shared cache of table column lists and primary keys.
#[derive(Debug)]
pub struct SchemaCache {
    columns: Slots<Arc<[String]>>,
    primary_keys: Slots<String>,
    hits: AtomicU64,
    loads: AtomicU64,
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaCache {
    pub fn new() -> Self {
        Self {
            columns: Slots::new(),
            primary_keys: Slots::new(),
            hits: AtomicU64::new(0),
            loads: AtomicU64::new(0),
        }
    }

    /// New cache wrapped for sharing.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Column names of `table`, running `load` on the first lookup.
    pub fn columns_or_load<F>(&self, table: &str, load: F) -> Result<Arc<[String]>>
    where
        F: FnOnce() -> Result<Vec<String>>,
    {
        self.get_or_load(&self.columns, table, || load().map(Arc::from))
    }

    /// Primary-key column of `table` (possibly empty), running `load` on the
    /// first lookup.
    pub fn primary_key_or_load<F>(&self, table: &str, load: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        self.get_or_load(&self.primary_keys, table, load)
    }

    /// Cached column names, without loading.
    pub fn cached_columns(&self, table: &str) -> Option<Arc<[String]>> {
        self.columns.peek(table)
    }

    /// Cached primary key, without loading.
    pub fn cached_primary_key(&self, table: &str) -> Option<String> {
        self.primary_keys.peek(table)
    }

    /// Forget everything cached for `table`. Returns whether anything was cached.
    pub fn invalidate(&self, table: &str) -> bool {
        let columns = self.columns.remove(table);
        let primary_key = self.primary_keys.remove(table);
        if columns || primary_key {
            tracing::debug!(table = %table, "Schema cache invalidated");
        }
        columns || primary_key
    }

    /// Forget every table.
    pub fn clear(&self) {
        self.columns.clear();
        self.primary_keys.clear();
        tracing::debug!("Schema cache cleared");
    }

    /// Number of tables with a cached column list.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
        }
    }

    fn get_or_load<T, F>(&self, slots: &Slots<T>, table: &str, load: F) -> Result<T>
    where
        T: Clone,
        F: FnOnce() -> Result<T>,
    {
        let slot = slots.slot(table);
        let mut guard = lock(&slot);
        if let Some(value) = guard.as_ref() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(value.clone());
        }
        self.loads.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(table = %table, "Schema cache miss, reading catalog");
        let value = load()?;
        *guard = Some(value.clone());
        Ok(value)
    }
}
