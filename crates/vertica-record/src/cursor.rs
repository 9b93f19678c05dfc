//! Fetched result sets.

use std::vec;

use vertica_core::{Row, Value};

/// The rows of one executed statement, consumed front to back.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    rows: vec::IntoIter<Row>,
}

impl Cursor {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: rows.into_iter(),
        }
    }

    /// The next row, or `None` when the set is exhausted.
    pub fn next_row(&mut self) -> Option<Row> {
        self.rows.next()
    }

    /// Every remaining row.
    pub fn all_rows(self) -> Vec<Row> {
        self.rows.collect()
    }

    /// First column of the next row.
    pub fn scalar(mut self) -> Option<Value> {
        self.next_row().and_then(|row| row.values().first().cloned())
    }

    /// Rows not yet consumed.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

impl Iterator for Cursor {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.next_row()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}
