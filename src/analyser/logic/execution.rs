//! Runs a [`TestPlan`] against a dataset.
//!
//! The executor pulls the two plan columns out of the frame, splits or pairs
//! them as the test requires and hands plain samples to [`super::hypothesis`].
//! Group comparisons also report per-group descriptive statistics.

use super::descriptive;
use super::hypothesis::{self, ContingencyTable, TestOutcome};
use super::io;
use super::types::{GroupStats, TestKind, TestPlan, TestResults};
use crate::config::ProfilerSettings;
use crate::error::{Result, StatError};
use polars::prelude::DataFrame;
use std::cmp::Ordering;
use indexmap::IndexMap;

/// Observations of a numeric outcome split by the levels of a grouping column.
#[derive(Debug, Clone, PartialEq)]
pub struct Groups {
    pub labels: Vec<String>,
    pub samples: Vec<Vec<f64>>,
}

impl Groups {
    /// Groups that have at least one observation, in label order.
    pub fn non_empty(&self) -> Vec<&[f64]> {
        self.samples
            .iter()
            .filter(|s| !s.is_empty())
            .map(Vec::as_slice)
            .collect()
    }
}

/// Sorts labels numerically when every one parses as a number, otherwise
/// lexicographically.
pub fn order_labels(labels: &mut [String]) {
    let numeric: Option<Vec<f64>> = labels.iter().map(|l| io::parse_number(l)).collect();
    if numeric.is_some() {
        labels.sort_by(|a, b| {
            match (io::parse_number(a), io::parse_number(b)) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => Ordering::Equal,
            }
            .then_with(|| a.cmp(b))
        });
    } else {
        labels.sort();
    }
}

fn distinct_ordered(cells: &[Option<String>]) -> Vec<String> {
    let mut labels: Vec<String> = cells.iter().flatten().cloned().collect();
    labels.sort();
    labels.dedup();
    order_labels(&mut labels);
    labels
}

/// Parses every non-missing cell of `column`; any cell that is present but
/// not a number is a type error.
fn numeric_column(cells: &[Option<String>], column: &str) -> Result<Vec<Option<f64>>> {
    cells
        .iter()
        .map(|cell| match cell {
            None => Ok(None),
            Some(text) => io::parse_number(text).map(Some).ok_or_else(|| {
                StatError::TypeMismatch {
                    column: column.to_owned(),
                    expected: "numeric".to_owned(),
                }
            }),
        })
        .collect()
}

/// Splits the numeric `dv` by the levels of `iv`. Rows missing either value
/// are skipped; a level whose outcome values are all missing is kept as an
/// empty group.
///
/// # Errors
///
/// `MissingColumn` for unknown columns, `TypeMismatch` for a non-numeric
/// outcome.
pub fn split_groups(
    df: &DataFrame,
    dv: &str,
    iv: &str,
    settings: &ProfilerSettings,
) -> Result<Groups> {
    let dv_cells = io::column_cells(df, dv, settings)?;
    let iv_cells = io::column_cells(df, iv, settings)?;
    let values = numeric_column(&dv_cells, dv)?;

    let labels = distinct_ordered(&iv_cells);
    let mut samples = vec![Vec::new(); labels.len()];
    for (label, value) in iv_cells.iter().zip(values) {
        if let (Some(label), Some(value)) = (label, value)
            && let Some(i) = labels.iter().position(|l| l == label)
        {
            samples[i].push(value);
        }
    }

    Ok(Groups { labels, samples })
}

pub fn describe(values: &[f64]) -> GroupStats {
    GroupStats {
        mean: descriptive::mean(values),
        median: descriptive::median(values),
        sd: descriptive::std_dev(values, 1),
        n: values.len(),
    }
}

/// Mean, median, sample sd and n of `dv` for every level of `iv`, in
/// [`order_labels`] order.
///
/// # Errors
///
/// Same as [`split_groups`].
pub fn group_summary(
    df: &DataFrame,
    dv: &str,
    iv: &str,
    settings: &ProfilerSettings,
) -> Result<IndexMap<String, GroupStats>> {
    let groups = split_groups(df, dv, iv, settings)?;
    Ok(summarise(&groups))
}

fn summarise(groups: &Groups) -> IndexMap<String, GroupStats> {
    groups
        .labels
        .iter()
        .zip(&groups.samples)
        .map(|(label, sample)| (label.clone(), describe(sample)))
        .collect()
}

fn two_groups<'a>(groups: &'a Groups, test: TestKind) -> Result<(&'a [f64], &'a [f64])> {
    let non_empty = groups.non_empty();
    match non_empty.as_slice() {
        &[a, b] => Ok((a, b)),
        found if found.len() < 2 => Err(StatError::InsufficientGroups {
            required: 2,
            found: found.len(),
        }),
        found => Err(StatError::UnsupportedComparison(format!(
            "{test} compares exactly two groups, found {}",
            found.len()
        ))),
    }
}

fn several_groups(groups: &Groups) -> Result<Vec<Vec<f64>>> {
    let non_empty: Vec<Vec<f64>> = groups.non_empty().into_iter().map(<[f64]>::to_vec).collect();
    if non_empty.len() < 2 {
        return Err(StatError::InsufficientGroups {
            required: 2,
            found: non_empty.len(),
        });
    }
    Ok(non_empty)
}

fn paired_values(
    df: &DataFrame,
    x: &str,
    y: &str,
    settings: &ProfilerSettings,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let xs = numeric_column(&io::column_cells(df, x, settings)?, x)?;
    let ys = numeric_column(&io::column_cells(df, y, settings)?, y)?;
    Ok(xs
        .into_iter()
        .zip(ys)
        .filter_map(|pair| match pair {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        })
        .unzip())
}

fn contingency(
    df: &DataFrame,
    dv: &str,
    iv: &str,
    settings: &ProfilerSettings,
) -> Result<ContingencyTable> {
    let dv_cells = io::column_cells(df, dv, settings)?;
    let iv_cells = io::column_cells(df, iv, settings)?;
    let complete: Vec<(&str, &str)> = dv_cells
        .iter()
        .zip(&iv_cells)
        .filter_map(|(r, c)| Some((r.as_deref()?, c.as_deref()?)))
        .collect();

    let mut rows: Vec<String> = complete.iter().map(|(r, _)| (*r).to_owned()).collect();
    rows.sort();
    rows.dedup();
    order_labels(&mut rows);
    let mut columns: Vec<String> = complete.iter().map(|(_, c)| (*c).to_owned()).collect();
    columns.sort();
    columns.dedup();
    order_labels(&mut columns);

    Ok(ContingencyTable::from_pairs(complete, rows, columns))
}

/// Runs `plan` with the default missing-value tokens.
///
/// # Errors
///
/// See [`execute_test_with`].
pub fn execute_test(df: &DataFrame, plan: &TestPlan) -> Result<TestResults> {
    execute_test_with(df, plan, &ProfilerSettings::default())
}

/// Runs `plan`, reading missing values according to `settings`.
///
/// # Errors
///
/// - `MissingColumn` if either plan column is absent
/// - `TypeMismatch` if a numeric column holds text
/// - `InsufficientGroups` with fewer than two non-empty groups or levels
/// - `UnsupportedComparison` when a two-sample test sees more than two groups
/// - `DegenerateInput` for zero variance or too few observations
pub fn execute_test_with(
    df: &DataFrame,
    plan: &TestPlan,
    settings: &ProfilerSettings,
) -> Result<TestResults> {
    let dv = plan.dependent_variable.as_str();
    let iv = plan.independent_variable.as_str();
    let test = plan.selected_test;
    tracing::info!("Running {test} on '{dv}' by '{iv}'");

    let (outcome, group_statistics): (TestOutcome, _) = match test {
        TestKind::IndependentTTest | TestKind::MannWhitneyU => {
            let groups = split_groups(df, dv, iv, settings)?;
            let (a, b) = two_groups(&groups, test)?;
            let outcome = if test == TestKind::IndependentTTest {
                hypothesis::welch_t_test(a, b)?
            } else {
                hypothesis::mann_whitney_u(a, b)?
            };
            (outcome, Some(summarise(&groups)))
        }
        TestKind::OneWayAnova | TestKind::KruskalWallis => {
            let groups = split_groups(df, dv, iv, settings)?;
            let samples = several_groups(&groups)?;
            let outcome = if test == TestKind::OneWayAnova {
                hypothesis::one_way_anova(&samples)?
            } else {
                hypothesis::kruskal_wallis(&samples)?
            };
            (outcome, Some(summarise(&groups)))
        }
        TestKind::ChiSquare => {
            let table = contingency(df, dv, iv, settings)?;
            let outcome = hypothesis::chi_square_independence(&table)?;
            (
                TestOutcome {
                    effect_size: None,
                    ..outcome
                },
                None,
            )
        }
        TestKind::Pearson | TestKind::Spearman => {
            let (x, y) = paired_values(df, dv, iv, settings)?;
            let outcome = if test == TestKind::Pearson {
                hypothesis::pearson(&x, &y)?
            } else {
                hypothesis::spearman(&x, &y)?
            };
            (outcome, None)
        }
    };

    tracing::debug!(
        "{test}: statistic {:.4}, p {:.4}",
        outcome.statistic,
        outcome.p_value
    );

    Ok(TestResults {
        test,
        statistic: outcome.statistic,
        p_value: outcome.p_value,
        effect_size: outcome.effect_size,
        confidence_interval: None,
        group_statistics,
    })
}

/// Resolves a free-text test name, then runs it on `dv` by `iv`.
///
/// # Errors
///
/// `UnsupportedTest` if the name is not one of the seven tests, otherwise as
/// [`execute_test`].
pub fn execute_named(df: &DataFrame, dv: &str, iv: &str, test_name: &str) -> Result<TestResults> {
    let test: TestKind = test_name.parse()?;
    let plan = TestPlan {
        dependent_variable: dv.to_owned(),
        independent_variable: iv.to_owned(),
        selected_test: test,
        assumptions: Vec::new(),
        effect_size: test.effect_size_metric(),
        justification: String::new(),
        alpha: super::types::DEFAULT_ALPHA,
    };
    execute_test(df, &plan)
}
