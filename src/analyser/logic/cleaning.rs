use super::io;
use crate::config::{AnalysisSettings, AuditLog, CleaningSettings};
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const ISSUE_NUMERIC_FORMAT: &str = "Corrected inconsistent numeric formatting in";
pub const ISSUE_WHITESPACE: &str = "Removed hidden whitespace and formatting artifacts.";
pub const ISSUE_MISSING: &str = "Standardized missing values introduced during numeric conversion.";
pub const ISSUE_NONE: &str = "No major data quality issues detected.";

/// What the cleaner changed, in user-facing wording plus counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningReport {
    pub issues: Vec<String>,
    /// Columns converted to numbers.
    pub converted_columns: Vec<String>,
    /// Converted columns where at least one cell needed correcting.
    pub numeric_fixes: usize,
    pub renamed_columns: usize,
    /// Cells that became missing because they did not parse.
    pub missing_introduced: usize,
    pub audit: AuditLog,
}

/// Cell text after the numeric repairs: trimmed, thousands separators
/// dropped, letter O read as zero.
pub fn repair_numeric_text(cell: &str, settings: &CleaningSettings) -> String {
    let mut text = cell.trim().to_owned();
    if settings.strip_thousands_separators {
        text = text.replace(',', "");
    }
    if settings.letter_o_as_zero {
        text = text.replace(['O', 'o'], "0");
    }
    text
}

pub fn normalize_column_name(name: &str) -> String {
    name.trim().replace('\u{a0}', " ")
}

struct NumericAttempt {
    values: Vec<Option<f64>>,
    success_ratio: f64,
    /// Cells that parsed only after repair, or did not parse at all.
    corrected: usize,
    missing_before: usize,
}

fn attempt_numeric(cells: &[Option<String>], settings: &CleaningSettings) -> NumericAttempt {
    let mut corrected = 0;
    let mut missing_before = 0;
    let values: Vec<Option<f64>> = cells
        .iter()
        .map(|cell| {
            let Some(text) = cell else {
                missing_before += 1;
                return None;
            };
            let direct = io::parse_number(text);
            let repaired = io::parse_number(&repair_numeric_text(text, settings));
            if direct.is_none() {
                corrected += 1;
            }
            repaired
        })
        .collect();

    let parsed = values.iter().filter(|v| v.is_some()).count();
    let success_ratio = if cells.is_empty() {
        0.0
    } else {
        parsed as f64 / cells.len() as f64
    };

    NumericAttempt {
        values,
        success_ratio,
        corrected,
        missing_before,
    }
}

/// Normalises column names and converts mostly-numeric text columns to
/// numbers. Cells matching `settings.profiler.missing_tokens` are missing
/// before conversion and never count as repairs. The result has the same
/// shape and column order as `df`.
///
/// # Errors
///
/// Fails when two column names collide after normalisation.
pub fn clean_dataset(
    df: &DataFrame,
    settings: &AnalysisSettings,
) -> Result<(DataFrame, CleaningReport)> {
    let mut report = CleaningReport::default();
    let mut columns = Vec::with_capacity(df.width());

    for name in io::column_names(df) {
        let clean_name = normalize_column_name(&name);
        if clean_name != name {
            report.renamed_columns += 1;
            report
                .audit
                .push("rename", format!("'{name}' -> '{clean_name}'"));
        }

        let cells = io::column_cells(df, &name, &settings.profiler)?;
        let attempt = attempt_numeric(&cells, &settings.cleaning);

        if attempt.success_ratio > settings.cleaning.numeric_success_ratio {
            let missing_after = attempt.values.iter().filter(|v| v.is_none()).count();
            let introduced = missing_after.saturating_sub(attempt.missing_before);
            report.missing_introduced += introduced;
            if attempt.corrected > 0 {
                report.numeric_fixes += 1;
            }
            report.converted_columns.push(clean_name.clone());
            report.audit.push(
                "numeric",
                format!(
                    "'{clean_name}': {} cell(s) corrected, {introduced} set missing",
                    attempt.corrected
                ),
            );
            tracing::debug!(
                "Column '{clean_name}' converted to numeric ({:.0}% parsed)",
                attempt.success_ratio * 100.0
            );
            columns.push(Column::from(Series::new(
                clean_name.as_str().into(),
                attempt.values,
            )));
        } else {
            let mut column = df.column(&name)?.clone();
            column.rename(clean_name.as_str().into());
            columns.push(column);
        }
    }

    if report.numeric_fixes > 0 {
        report.issues.push(format!(
            "{ISSUE_NUMERIC_FORMAT} {} column(s).",
            report.numeric_fixes
        ));
    }
    if report.renamed_columns > 0 {
        report.issues.push(ISSUE_WHITESPACE.to_owned());
    }
    if report.missing_introduced > 0 {
        report.issues.push(ISSUE_MISSING.to_owned());
    }
    if report.issues.is_empty() {
        report.issues.push(ISSUE_NONE.to_owned());
    }

    tracing::info!(
        "Cleaned {} column(s): {} converted, {} renamed",
        df.width(),
        report.converted_columns.len(),
        report.renamed_columns
    );

    Ok((DataFrame::new(columns)?, report))
}
