//! Minimal columnar frame used as the tabular payload

use super::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Bytes per row charged to the offset of a string value
const UTF8_OFFSET_BYTES: u64 = 8;

/// Typed column storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnData {
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Bool(Vec<bool>),
    Utf8(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            Self::Int64(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::Bool(v) => v.len(),
            Self::Utf8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int64(_) => "int64",
            Self::Float64(_) => "float64",
            Self::Bool(_) => "bool",
            Self::Utf8(_) => "utf8",
        }
    }

    /// In-memory footprint of the values
    pub fn volume(&self) -> u64 {
        match self {
            Self::Int64(v) => v.len() as u64 * 8,
            Self::Float64(v) => v.len() as u64 * 8,
            Self::Bool(v) => v.len() as u64,
            Self::Utf8(v) => v
                .iter()
                .map(|s| s.len() as u64 + UTF8_OFFSET_BYTES)
                .sum(),
        }
    }

    /// Render one cell for display
    pub fn cell(&self, row: usize) -> Option<String> {
        match self {
            Self::Int64(v) => v.get(row).map(|x| x.to_string()),
            Self::Float64(v) => v.get(row).map(|x| x.to_string()),
            Self::Bool(v) => v.get(row).map(|x| x.to_string()),
            Self::Utf8(v) => v.get(row).cloned(),
        }
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Ordered set of equally long, uniquely named columns
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataFrame {
    columns: Vec<Column>,
}

impl DataFrame {
    /// Build a frame, checking column lengths and names
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let frame = Self { columns };
        frame.validate()?;
        Ok(frame)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Check the shape invariants (also used after decoding from disk)
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(CacheError::InvalidFrame(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }

        if let Some(first) = self.columns.first() {
            let rows = first.data.len();
            if let Some(bad) = self.columns.iter().find(|c| c.data.len() != rows) {
                return Err(CacheError::InvalidFrame(format!(
                    "column '{}' has {} rows, expected {}",
                    bad.name,
                    bad.data.len(),
                    rows
                )));
            }
        }

        Ok(())
    }

    /// Append a column
    pub fn with_column(mut self, name: impl Into<String>, data: ColumnData) -> Result<Self> {
        self.columns.push(Column::new(name, data));
        self.validate()?;
        Ok(self)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Estimated in-memory size in bytes
    pub fn volume(&self) -> u64 {
        volume_of(self)
    }
}

/// Volume estimator: sum of per-column value footprints
pub fn volume_of(df: &DataFrame) -> u64 {
    df.columns.iter().map(|c| c.data.volume()).sum()
}
