mod row;

pub use row::{NamedRow, Row};

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::ColumnDescriptor;
use crate::error::SqlDbdError;
use crate::statement::Statement;

/// Lazy sequence of rows produced by one execute.
///
/// Each `next` is one [`Statement::fetch`]; the sequence ends at the no-more-rows
/// sentinel and does not rewind. Re-executing the statement starts a fresh sequence.
pub struct Rows<'stmt> {
    statement: &'stmt mut Statement,
    named: bool,
    done: bool,
}

impl<'stmt> Rows<'stmt> {
    pub(crate) fn new(statement: &'stmt mut Statement, named: bool) -> Self {
        Self {
            statement,
            named,
            done: false,
        }
    }
}

impl Iterator for Rows<'_> {
    type Item = Result<Row, SqlDbdError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.statement.fetch(self.named) {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

/// Column names plus the name lookup shared by the named rows of one execute.
#[derive(Debug, Clone)]
pub(crate) struct ColumnIndex {
    pub(crate) names: Arc<Vec<String>>,
    pub(crate) lookup: Arc<HashMap<String, usize>>,
}

impl ColumnIndex {
    pub(crate) fn from_descriptors(columns: &[ColumnDescriptor]) -> Self {
        let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        let lookup = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect::<HashMap<_, _>>();
        Self {
            names: Arc::new(names),
            lookup: Arc::new(lookup),
        }
    }
}
