use std::collections::HashMap;
use std::sync::Arc;

use crate::types::DbValue;

/// A fetched row keyed by column name.
///
/// The column names and the name-to-index lookup are shared by every row of one
/// execute, so building a named row costs one vector of values.
#[derive(Debug, Clone)]
pub struct NamedRow {
    /// The column names for this row (shared across all rows of a result)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub values: Vec<DbValue>,
    column_index: Arc<HashMap<String, usize>>,
}

impl NamedRow {
    pub(crate) fn new(
        column_names: Arc<Vec<String>>,
        column_index: Arc<HashMap<String, usize>>,
        values: Vec<DbValue>,
    ) -> Self {
        Self {
            column_names,
            values,
            column_index,
        }
    }

    /// Get the index of a column by name
    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index.get(column_name).copied()
    }

    /// Get a value from the row by column name.
    ///
    /// Returns `None` if the column wasn't found. A NULL column is `Some(&DbValue::Nil)`.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&DbValue> {
        self.get_column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Iterate `(name, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DbValue)> {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

/// One fetched row, in the shape the caller asked for.
#[derive(Debug, Clone)]
pub enum Row {
    /// Values in column order.
    Positional(Vec<DbValue>),
    /// Values keyed by lower-cased column name.
    Named(NamedRow),
}

impl Row {
    /// Value by zero-based column position.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&DbValue> {
        match self {
            Row::Positional(values) => values.get(index),
            Row::Named(row) => row.values.get(index),
        }
    }

    /// Value by column name. Always `None` for positional rows.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&DbValue> {
        match self {
            Row::Positional(_) => None,
            Row::Named(row) => row.get(column_name),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Row::Positional(values) => values.len(),
            Row::Named(row) => row.values.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the row, keeping only the values in column order.
    #[must_use]
    pub fn into_values(self) -> Vec<DbValue> {
        match self {
            Row::Positional(values) => values,
            Row::Named(row) => row.values,
        }
    }
}
