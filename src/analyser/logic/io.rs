//! Reading and writing datasets, and pulling columns out of them as text cells.
//!
//! Every column is read as text so the profiler, not the CSV reader, decides
//! what is numeric. Columns that the cleaner has already converted stay
//! numeric in the frame and are stringified again on extraction.

use crate::config::ProfilerSettings;
use crate::error::{Result, ResultExt as _, StatError};
use polars::prelude::*;
use std::path::Path;

/// Loads a CSV file with a header row, every column typed as text.
///
/// # Errors
///
/// Fails for extensions other than `.csv` and for unreadable files.
pub fn load_df(path: &Path) -> Result<DataFrame> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();
    if ext != "csv" {
        return Err(StatError::DataProcessing(format!(
            "Unsupported file extension: {ext}"
        )));
    }

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()?
        .collect()
        .with_context(|| format!("Failed to read CSV {}", path.display()))?;

    tracing::info!(
        "Loaded {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_df(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
    CsvWriter::new(file)
        .include_header(true)
        .finish(df)
        .context("Failed to write CSV file")?;
    Ok(())
}

/// Builds a frame of text columns. Used by the cleaner and by tests.
///
/// # Errors
///
/// Fails when the columns have different lengths or repeat a name.
pub fn frame_from_text(columns: &[(&str, Vec<Option<String>>)]) -> Result<DataFrame> {
    let cols: Vec<Column> = columns
        .iter()
        .map(|(name, cells)| Column::from(Series::new((*name).into(), cells.as_slice())))
        .collect();
    Ok(DataFrame::new(cols)?)
}

/// Raw cell text of a column, nulls as `None`, nothing else altered.
///
/// # Errors
///
/// `MissingColumn` when the frame has no such column.
pub fn raw_cells(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| StatError::MissingColumn(name.to_owned()))?;
    let text = column.as_materialized_series().cast(&DataType::String)?;
    let cells = text
        .str()?
        .into_iter()
        .map(|cell| cell.map(str::to_owned))
        .collect();
    Ok(cells)
}

/// Cells of a column trimmed, with every configured missing token mapped to
/// `None`.
///
/// # Errors
///
/// `MissingColumn` when the frame has no such column.
pub fn column_cells(
    df: &DataFrame,
    name: &str,
    settings: &ProfilerSettings,
) -> Result<Vec<Option<String>>> {
    Ok(raw_cells(df, name)?
        .into_iter()
        .map(|cell| {
            cell.filter(|c| !settings.is_missing(c))
                .map(|c| c.trim().to_owned())
        })
        .collect())
}

/// Parses a trimmed cell as a finite number.
pub fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Cells parsed as numbers; missing or non-numeric cells become `None`.
pub fn numeric_cells(cells: &[Option<String>]) -> Vec<Option<f64>> {
    cells
        .iter()
        .map(|c| c.as_deref().and_then(parse_number))
        .collect()
}

/// Names of all columns in frame order.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect()
}
