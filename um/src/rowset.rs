//! Runtime column-indexed rows
//!
//! The destination shape is only known after introspecting the live tables,
//! so rows are held as a rectangular set of named columns rather than typed
//! records.

use std::fmt;

/// A single scalar cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// Render the value as plain text; NULL renders as the empty string
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Int(v) => v.to_string(),
            Self::UInt(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Text(v) => v.clone(),
            Self::Bytes(v) => String::from_utf8_lossy(v).into_owned(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            other => write!(f, "{}", other.to_text()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// Ordered column names plus rows of values, one value per column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RowSet {
    /// Build a row set; every row must have one value per column
    ///
    /// # Panics
    ///
    /// Panics if a row's length differs from the column count. Backends size
    /// each row from the result's own column list, so a mismatch is a bug.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        assert!(
            rows.iter().all(|r| r.len() == columns.len()),
            "row length must match column count"
        );
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value of `name` in row `row`, or None if the column is absent
    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.position(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Replace the column's values in place, or append it as a new trailing column
    ///
    /// # Panics
    ///
    /// Panics if `values` does not hold exactly one value per row. Callers
    /// derive `values` by mapping over this set's rows.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) {
        assert_eq!(values.len(), self.rows.len(), "column length must match row count");

        match self.position(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Rename `from` to `to`. An existing column already called `to` is dropped first.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return self.has_column(from);
        }
        if !self.has_column(from) {
            return false;
        }
        self.drop_column(to);
        if let Some(idx) = self.position(from) {
            self.columns[idx] = to.to_string();
        }
        true
    }

    /// Remove a column; returns false if it was not present
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.position(name) else {
            return false;
        };
        self.columns.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        true
    }

    /// Move the named columns to the end, in the given order.
    /// Other columns keep their relative order; absent names are ignored.
    pub fn move_to_end(&mut self, names: &[&str]) {
        let mut order: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !names.contains(&self.columns[i].as_str()))
            .collect();
        order.extend(names.iter().filter_map(|n| self.position(n)));

        self.columns = order.iter().map(|&i| self.columns[i].clone()).collect();
        for row in &mut self.rows {
            let old = std::mem::take(row);
            *row = order.iter().map(|&i| old[i].clone()).collect();
        }
    }
}
