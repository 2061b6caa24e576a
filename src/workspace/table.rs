//! Column table workspace.

use super::Workspace;
use crate::error::{FrameworkError, Result};
use std::any::Any;
use std::sync::Arc;

/// A table of named `f64` columns that all have the same number of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableWorkspace {
    columns: Vec<(String, Vec<f64>)>,
    row_count: usize,
}

impl TableWorkspace {
    /// Create an empty table with `row_count` rows.
    pub fn new(row_count: usize) -> Self {
        Self {
            columns: Vec::new(),
            row_count,
        }
    }

    /// Add a zero-filled column.
    pub fn add_column(&mut self, name: &str) -> Result<()> {
        if self.columns.iter().any(|(n, _)| n == name) {
            return Err(FrameworkError::DuplicateName(format!("column '{}'", name)));
        }
        self.columns
            .push((name.to_string(), vec![0.0; self.row_count]));
        Ok(())
    }

    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
            .ok_or_else(|| FrameworkError::NotFound(format!("column '{}'", name)))
    }

    pub fn set_cell(&mut self, column: &str, row: usize, value: f64) -> Result<()> {
        let row_count = self.row_count;
        let values = self
            .columns
            .iter_mut()
            .find(|(n, _)| n == column)
            .map(|(_, values)| values)
            .ok_or_else(|| FrameworkError::NotFound(format!("column '{}'", column)))?;
        let cell = values.get_mut(row).ok_or_else(|| {
            FrameworkError::OutOfRange(format!("row {} of {}", row, row_count))
        })?;
        *cell = value;
        Ok(())
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }
}

impl Workspace for TableWorkspace {
    fn id(&self) -> &'static str {
        "TableWorkspace"
    }

    fn memory_size(&self) -> usize {
        self.columns.len() * self.row_count * std::mem::size_of::<f64>()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
