//! In-memory record tables with column-union semantics.
//!
//! A [`Table`] is the unit every pipeline stage operates on: an ordered list of
//! named columns and rows of optional string cells, every row aligned to the
//! table's column layout. Missing values are `None`, never empty-string
//! placeholders, so "column absent in this source" and "cell left blank" read
//! the same way downstream.

use std::collections::HashMap;

use crate::error::IngestError;

/// An ordered, column-aligned record table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// Create an empty table with the given column layout.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Table::default();
        for col in columns {
            table.ensure_column(&col.into());
        }
        table
    }

    /// Column names, in layout order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Add a column if absent, null-filling existing rows. Returns its index.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.columns.len();
        self.columns.push(name.to_string());
        self.index.insert(name.to_string(), idx);
        for row in &mut self.rows {
            row.push(None);
        }
        idx
    }

    /// Append a row given in this table's column order.
    ///
    /// Short rows are null-padded; excess cells are dropped. Empty strings are
    /// normalized to nulls.
    pub fn push_row<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut row: Vec<Option<String>> = cells
            .into_iter()
            .take(self.columns.len())
            .map(|cell| cell.filter(|s| !s.is_empty()))
            .collect();
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    /// Cell value at (row, column name); `None` for null cells and for columns
    /// this table does not have.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let idx = *self.index.get(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Set a cell, growing nothing: the column must already exist.
    pub fn set_value(&mut self, row: usize, column: &str, value: Option<String>) {
        let idx = self.index[column];
        self.rows[row][idx] = value.filter(|s| !s.is_empty());
    }

    /// Overwrite a whole column with one value (used for `provided_by` tagging).
    pub fn fill_column(&mut self, column: &str, value: &str) {
        let idx = self.ensure_column(column);
        for row in &mut self.rows {
            row[idx] = Some(value.to_string());
        }
    }

    /// Replace null cells in a column with a sentinel. No-op if the column is
    /// absent.
    pub fn fill_null(&mut self, column: &str, sentinel: &str) {
        let Some(&idx) = self.index.get(column) else {
            return;
        };
        for row in &mut self.rows {
            if row[idx].is_none() {
                row[idx] = Some(sentinel.to_string());
            }
        }
    }

    /// Iterate one column's cells in row order. Missing column reads as all-null.
    pub fn column_values(&self, column: &str) -> impl Iterator<Item = Option<&str>> + '_ {
        let idx = self.index.get(column).copied();
        self.rows
            .iter()
            .map(move |row| idx.and_then(|i| row[i].as_deref()))
    }

    /// A new table with the same layout containing the given rows, in order.
    pub fn subset(&self, row_indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            index: self.index.clone(),
            rows: row_indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Raw row access for equality checks.
    pub(crate) fn row(&self, idx: usize) -> &[Option<String>] {
        &self.rows[idx]
    }

    /// Union N tables into one.
    ///
    /// The result's column set is the union of all input column sets in
    /// first-seen order; rows keep input order, then within-input row order,
    /// with null cells wherever a source lacked a column. Unioning nothing is
    /// the one failure mode.
    pub fn union(tables: Vec<Table>) -> Result<Table, IngestError> {
        if tables.is_empty() {
            return Err(IngestError::EmptyUnion);
        }
        let mut merged = Table::default();
        for table in &tables {
            for col in &table.columns {
                merged.ensure_column(col);
            }
        }
        for table in tables {
            for row in &table.rows {
                let mut cells: Vec<Option<String>> = vec![None; merged.columns.len()];
                for (col, cell) in table.columns.iter().zip(row) {
                    cells[merged.index[col]] = cell.clone();
                }
                merged.rows.push(cells);
            }
        }
        Ok(merged)
    }
}
