//! Shapiro-Wilk normality test, backed by the `normality` crate.
//!
//! The crate accepts 3 to 5000 observations. Larger samples are not tested:
//! a warning is logged and the caller treats normality as unknown.

use crate::error::{Result, StatError};
use serde::{Deserialize, Serialize};

pub const MIN_SAMPLE: usize = 3;
pub const MAX_SAMPLE: usize = 5000;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapiroWilk {
    pub w: f64,
    pub p_value: f64,
}

/// Runs the test on `values` (missing values already removed).
///
/// # Errors
///
/// `DegenerateInput` when fewer than three values are supplied, the sample
/// has zero range, or it is larger than the test supports.
pub fn shapiro_wilk(values: &[f64]) -> Result<ShapiroWilk> {
    let n = values.len();
    if n < MIN_SAMPLE {
        return Err(StatError::DegenerateInput(format!(
            "Shapiro-Wilk needs at least {MIN_SAMPLE} observations, got {n}"
        )));
    }
    if n > MAX_SAMPLE {
        tracing::warn!("Skipping Shapiro-Wilk on {n} observations (limit {MAX_SAMPLE})");
        return Err(StatError::DegenerateInput(format!(
            "Shapiro-Wilk supports at most {MAX_SAMPLE} observations, got {n}"
        )));
    }

    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if max - min <= f64::EPSILON * max.abs().max(1.0) {
        return Err(StatError::DegenerateInput(
            "Shapiro-Wilk is undefined for data with zero range".to_owned(),
        ));
    }

    let result = ::normality::shapiro_wilk(values.iter().copied())
        .map_err(|e| StatError::DegenerateInput(format!("Shapiro-Wilk failed: {e}")))?;
    Ok(ShapiroWilk {
        w: result.statistic,
        p_value: result.p_value.clamp(0.0, 1.0),
    })
}
