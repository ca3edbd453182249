//! CSV to frame conversion

use anyhow::{Context, Result, bail};
use featcache::{Column, ColumnData, DataFrame};
use std::path::Path;

/// Read a header + rows CSV file into a frame.
///
/// Each column takes the first type every cell parses as: i64, f64, bool,
/// otherwise string.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.is_empty() {
        bail!("CSV file {} has no columns", path.display());
    }

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV row {}", row + 1))?;
        if record.len() != headers.len() {
            bail!(
                "CSV row {} has {} fields, expected {}",
                row + 1,
                record.len(),
                headers.len()
            );
        }
        for (column, field) in cells.iter_mut().zip(record.iter()) {
            column.push(field.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| Column::new(name, infer_column(values)))
        .collect();

    Ok(DataFrame::new(columns)?)
}

fn infer_column(values: Vec<String>) -> ColumnData {
    if let Some(ints) = parse_all::<i64>(&values) {
        return ColumnData::Int64(ints);
    }
    if let Some(floats) = parse_all::<f64>(&values) {
        return ColumnData::Float64(floats);
    }
    if let Some(bools) = parse_all::<bool>(&values) {
        return ColumnData::Bool(bools);
    }
    ColumnData::Utf8(values)
}

fn parse_all<T: std::str::FromStr>(values: &[String]) -> Option<Vec<T>> {
    values.iter().map(|v| v.trim().parse().ok()).collect()
}
