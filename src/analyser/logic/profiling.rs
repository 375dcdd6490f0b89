//! Variable profiling: decides whether each column is continuous or
//! categorical and computes the diagnostics the test selector relies on.
//!
//! Classification works on text cells so that numbers stored as strings,
//! already-cleaned numeric columns and genuinely categorical text all go
//! through the same rules:
//!
//! 1. fewer than `numeric_ratio_threshold` of all cells parse → categorical
//! 2. no parsed values at all → categorical
//! 3. at most `max_categorical_levels` distinct values → categorical
//! 4. distinct/parsed ratio below `min_unique_ratio` → categorical
//! 5. otherwise continuous
//!
//! Continuous columns get a Shapiro-Wilk p-value (when there are enough
//! non-constant values) and a z-score outlier flag. Categorical columns get
//! their levels in first-occurrence order.

use super::descriptive;
use super::io;
use super::normality;
use super::types::{DataProfile, STUDY_DESIGN_OBSERVATIONAL, VariableKind, VariableProfile};
use crate::config::ProfilerSettings;
use crate::error::{Result, StatError};
use polars::prelude::DataFrame;
use std::collections::{BTreeMap, HashSet};

/// Share of all cells (missing included) that parse as numbers.
pub fn numeric_ratio(cells: &[Option<String>]) -> f64 {
    if cells.is_empty() {
        return 0.0;
    }
    let parsed = io::numeric_cells(cells).iter().flatten().count();
    parsed as f64 / cells.len() as f64
}

pub fn missing_pct(cells: &[Option<String>]) -> f64 {
    if cells.is_empty() {
        return 0.0;
    }
    let missing = cells.iter().filter(|c| c.is_none()).count();
    100.0 * missing as f64 / cells.len() as f64
}

pub fn infer_kind(cells: &[Option<String>], settings: &ProfilerSettings) -> VariableKind {
    if numeric_ratio(cells) < settings.numeric_ratio_threshold {
        return VariableKind::Categorical;
    }

    let values: Vec<f64> = io::numeric_cells(cells).into_iter().flatten().collect();
    if values.is_empty() {
        return VariableKind::Categorical;
    }

    let unique = descriptive::distinct_count(&values);
    if unique <= settings.max_categorical_levels {
        return VariableKind::Categorical;
    }
    let unique_ratio = unique as f64 / values.len() as f64;
    if unique_ratio < settings.min_unique_ratio {
        return VariableKind::Categorical;
    }

    VariableKind::Continuous
}

/// Distinct non-missing cells in the order they first appear.
pub fn levels(cells: &[Option<String>]) -> Vec<String> {
    let mut seen = HashSet::new();
    cells
        .iter()
        .flatten()
        .filter(|c| seen.insert(c.as_str()))
        .cloned()
        .collect()
}

pub fn profile_column(cells: &[Option<String>], settings: &ProfilerSettings) -> VariableProfile {
    profile_as(cells, infer_kind(cells, settings), settings)
}

/// Profiles `cells` as `kind` regardless of what inference would say. Used
/// when the user confirms a different type for a column.
pub fn profile_as(
    cells: &[Option<String>],
    kind: VariableKind,
    settings: &ProfilerSettings,
) -> VariableProfile {
    let mut profile = VariableProfile {
        kind,
        levels: None,
        normality_p: None,
        normal: None,
        missing_pct: missing_pct(cells),
        outliers_present: false,
    };

    match kind {
        VariableKind::Continuous => {
            let values: Vec<f64> = io::numeric_cells(cells).into_iter().flatten().collect();
            if values.len() >= settings.min_normality_sample {
                match normality::shapiro_wilk(&values) {
                    Ok(sw) => {
                        profile.normality_p = Some(sw.p_value);
                        profile.normal = Some(sw.p_value > settings.normality_alpha);
                    }
                    Err(StatError::DegenerateInput(reason)) => {
                        tracing::debug!("Normality not assessed: {reason}");
                    }
                    Err(e) => tracing::warn!("Normality test failed: {e}"),
                }
            }
            profile.outliers_present =
                descriptive::has_outliers(&values, settings.outlier_z_threshold);
        }
        VariableKind::Categorical => profile.levels = Some(levels(cells)),
        VariableKind::Ordinal | VariableKind::Datetime => {}
    }

    profile
}

/// Profiles every column of `df`.
///
/// # Errors
///
/// Only fails if a column cannot be converted to text.
pub fn profile_dataset(df: &DataFrame, settings: &ProfilerSettings) -> Result<DataProfile> {
    let mut variables = BTreeMap::new();
    for name in io::column_names(df) {
        let cells = io::column_cells(df, &name, settings)?;
        let profile = profile_column(&cells, settings);
        tracing::debug!(
            "Profiled '{name}' as {} (missing {:.1}%, normal {:?})",
            profile.kind,
            profile.missing_pct,
            profile.normal
        );
        variables.insert(name, profile);
    }

    Ok(DataProfile {
        variables,
        sample_size: df.height(),
        group_sizes: None,
        study_design: STUDY_DESIGN_OBSERVATIONAL.to_owned(),
        warnings: Vec::new(),
    })
}
