//! Test statistics and p-values for the seven supported hypothesis tests.
//!
//! Each function takes already-cleaned samples (no missing values) and returns
//! a [`TestOutcome`]. Input that would make a statistic undefined (too few
//! observations, zero variance, everything tied) is reported as
//! [`StatError::DegenerateInput`] before any division happens.
//!
//! The conventions follow the usual scientific-Python defaults so results can
//! be cross-checked: Welch's t-test, Mann-Whitney U reported for the first
//! sample, Yates' correction for 2×2 contingency tables and t-based p-values
//! for both correlation coefficients.

use super::descriptive::{self, Ranking};
use crate::error::{Result, StatError};
use statrs::distribution::{ChiSquared, ContinuousCDF as _, FisherSnedecor, Normal, StudentsT};

/// Exact Mann-Whitney p-values are used when the smaller sample is at most this
/// size and nothing is tied.
pub const MWU_EXACT_MAX: usize = 8;

/// Upper bound, in bits, on `C(n1 + n2, min(n1, n2))` for the exact
/// Mann-Whitney table. Keeps every intermediate count inside `i128`.
const MWU_EXACT_MAX_BITS: f64 = 100.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
    pub effect_size: Option<f64>,
}

fn degenerate(msg: impl Into<String>) -> StatError {
    StatError::DegenerateInput(msg.into())
}

fn clamp_p(p: f64) -> f64 {
    if p.is_nan() { 1.0 } else { p.clamp(0.0, 1.0) }
}

fn t_two_sided(t: f64, df: f64) -> Result<f64> {
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| degenerate(e.to_string()))?;
    Ok(clamp_p(2.0 * dist.sf(t.abs())))
}

fn normal_sf(z: f64) -> Result<f64> {
    let dist = Normal::new(0.0, 1.0).map_err(|e| degenerate(e.to_string()))?;
    Ok(dist.sf(z))
}

fn chi2_sf(x: f64, df: f64) -> Result<f64> {
    let dist = ChiSquared::new(df).map_err(|e| degenerate(e.to_string()))?;
    Ok(clamp_p(dist.sf(x)))
}

fn require_len(values: &[f64], min: usize, what: &str) -> Result<()> {
    if values.len() < min {
        return Err(degenerate(format!(
            "{what} needs at least {min} observations, got {}",
            values.len()
        )));
    }
    Ok(())
}

/// Welch's unequal-variance t-test, two-sided, with Cohen's d as effect size.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> Result<TestOutcome> {
    require_len(a, 2, "t-test group")?;
    require_len(b, 2, "t-test group")?;

    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (m1, m2) = (
        descriptive::mean(a).unwrap_or_default(),
        descriptive::mean(b).unwrap_or_default(),
    );
    let v1 = descriptive::variance(a, 1).unwrap_or_default();
    let v2 = descriptive::variance(b, 1).unwrap_or_default();

    let se1 = v1 / n1;
    let se2 = v2 / n2;
    let se = (se1 + se2).sqrt();
    if se <= 0.0 {
        return Err(degenerate("t-test on two groups with zero variance"));
    }

    let t = (m1 - m2) / se;
    let df = (se1 + se2).powi(2) / (se1.powi(2) / (n1 - 1.0) + se2.powi(2) / (n2 - 1.0));
    let p_value = t_two_sided(t, df)?;

    Ok(TestOutcome {
        statistic: t,
        p_value,
        effect_size: Some(cohens_d(a, b)?),
    })
}

/// Cohen's d with the pooled standard deviation.
pub fn cohens_d(a: &[f64], b: &[f64]) -> Result<f64> {
    require_len(a, 2, "Cohen's d group")?;
    require_len(b, 2, "Cohen's d group")?;
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let v1 = descriptive::variance(a, 1).unwrap_or_default();
    let v2 = descriptive::variance(b, 1).unwrap_or_default();
    let pooled = (((n1 - 1.0) * v1 + (n2 - 1.0) * v2) / (n1 + n2 - 2.0)).sqrt();
    if pooled <= 0.0 {
        return Err(degenerate("Cohen's d with zero pooled standard deviation"));
    }
    let diff = descriptive::mean(a).unwrap_or_default() - descriptive::mean(b).unwrap_or_default();
    Ok(diff / pooled)
}

/// One-way ANOVA F test with partial eta-squared.
pub fn one_way_anova(groups: &[Vec<f64>]) -> Result<TestOutcome> {
    let k = groups.len();
    if k < 2 {
        return Err(StatError::InsufficientGroups {
            required: 2,
            found: k,
        });
    }
    let all: Vec<f64> = groups.iter().flatten().copied().collect();
    let n = all.len();
    if n <= k {
        return Err(degenerate(format!(
            "ANOVA needs more observations ({n}) than groups ({k})"
        )));
    }

    let grand = descriptive::mean(&all).unwrap_or_default();
    let ss_between: f64 = groups
        .iter()
        .map(|g| g.len() as f64 * (descriptive::mean(g).unwrap_or(grand) - grand).powi(2))
        .sum();
    let ss_within: f64 = groups.iter().map(|g| descriptive::sum_of_squares(g)).sum();
    if ss_within <= 0.0 {
        return Err(degenerate("ANOVA with zero within-group variance"));
    }

    let df_between = (k - 1) as f64;
    let df_within = (n - k) as f64;
    let f = (ss_between / df_between) / (ss_within / df_within);
    let dist = FisherSnedecor::new(df_between, df_within).map_err(|e| degenerate(e.to_string()))?;
    let p_value = clamp_p(dist.sf(f));

    Ok(TestOutcome {
        statistic: f,
        p_value,
        effect_size: Some(ss_between / (ss_between + ss_within)),
    })
}

/// Kruskal-Wallis H with tie correction. No standardized effect size.
pub fn kruskal_wallis(groups: &[Vec<f64>]) -> Result<TestOutcome> {
    let k = groups.len();
    if k < 2 {
        return Err(StatError::InsufficientGroups {
            required: 2,
            found: k,
        });
    }
    let all: Vec<f64> = groups.iter().flatten().copied().collect();
    let n = all.len() as f64;
    let ranking = descriptive::rank_average(&all);

    let mut offset = 0;
    let mut h = 0.0;
    for g in groups {
        let rank_sum: f64 = ranking.ranks[offset..offset + g.len()].iter().sum();
        h += rank_sum * rank_sum / g.len() as f64;
        offset += g.len();
    }
    h = 12.0 / (n * (n + 1.0)) * h - 3.0 * (n + 1.0);

    let correction = 1.0 - ranking.tie_term() / (n * n * n - n);
    if correction <= 0.0 {
        return Err(degenerate("Kruskal-Wallis with all values tied"));
    }
    h /= correction;

    Ok(TestOutcome {
        statistic: h,
        p_value: chi2_sf(h, (k - 1) as f64)?,
        effect_size: None,
    })
}

/// Two-sided Mann-Whitney U.
///
/// The statistic is U for the first sample. The effect size is
/// `|U| / sqrt(n1 + n2)`, a rank-biserial-like approximation kept for
/// continuity with earlier reports; it is not the textbook
/// `r = 1 - 2U / (n1 n2)`.
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> Result<TestOutcome> {
    require_len(a, 1, "Mann-Whitney group")?;
    require_len(b, 1, "Mann-Whitney group")?;

    let (n1, n2) = (a.len(), b.len());
    let pooled: Vec<f64> = a.iter().chain(b).copied().collect();
    let ranking = descriptive::rank_average(&pooled);
    let r1: f64 = ranking.ranks[..n1].iter().sum();

    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let u1 = r1 - n1f * (n1f + 1.0) / 2.0;
    let u2 = n1f * n2f - u1;
    let u = u1.max(u2);

    let use_exact = n1.min(n2) <= MWU_EXACT_MAX
        && ranking.tie_sizes.is_empty()
        && mwu_exact_fits(n1, n2);
    let p_value = if use_exact {
        mwu_exact_sf(u.round() as usize, n1, n2)
    } else {
        mwu_asymptotic_sf(u, n1, n2, &ranking)?
    };

    Ok(TestOutcome {
        statistic: u1,
        p_value: clamp_p(2.0 * p_value),
        effect_size: Some(u1.abs() / (n1f + n2f).sqrt()),
    })
}

/// Whether the arrangement count `C(n1 + n2, m)` stays within
/// `MWU_EXACT_MAX_BITS`. Larger problems use the normal approximation.
fn mwu_exact_fits(n1: usize, n2: usize) -> bool {
    let (m, n) = if n1 <= n2 { (n1, n2) } else { (n2, n1) };
    let bits: f64 = (1..=m)
        .map(|i| ((n + i) as f64 / i as f64).log2())
        .sum();
    bits <= MWU_EXACT_MAX_BITS
}

/// P(U >= u) under the null, by expanding the Gaussian binomial coefficient
/// `prod_{i=1..m} (1 - q^(n+i)) / (1 - q^i)`.
fn mwu_exact_sf(u: usize, n1: usize, n2: usize) -> f64 {
    let (m, n) = if n1 <= n2 { (n1, n2) } else { (n2, n1) };
    let max_u = m * n;
    let mut counts: Vec<i128> = vec![0; max_u + 1];
    counts[0] = 1;

    for i in 1..=m {
        let shift = n + i;
        for k in (shift..=max_u).rev() {
            counts[k] -= counts[k - shift];
        }
        for k in i..=max_u {
            counts[k] += counts[k - i];
        }
    }

    let total: i128 = counts.iter().sum();
    let upper: i128 = counts.iter().skip(u).sum();
    upper as f64 / total as f64
}

fn mwu_asymptotic_sf(u: f64, n1: usize, n2: usize, ranking: &Ranking) -> Result<f64> {
    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let n = n1f + n2f;
    let mu = n1f * n2f / 2.0;
    let variance = n1f * n2f / 12.0 * ((n + 1.0) - ranking.tie_term() / (n * (n - 1.0)));
    if variance <= 0.0 {
        return Err(degenerate("Mann-Whitney U with all values tied"));
    }
    // continuity correction
    let z = (u - mu - 0.5) / variance.sqrt();
    normal_sf(z)
}

/// Observed contingency table with row/column labels.
#[derive(Clone, Debug, PartialEq)]
pub struct ContingencyTable {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub counts: Vec<Vec<f64>>,
}

impl ContingencyTable {
    /// Cross-tabulates label pairs; row and column order follow `rows`/`columns`.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
        rows: Vec<String>,
        columns: Vec<String>,
    ) -> Self {
        let mut counts = vec![vec![0.0; columns.len()]; rows.len()];
        for (r, c) in pairs {
            if let (Some(i), Some(j)) = (
                rows.iter().position(|x| x == r),
                columns.iter().position(|x| x == c),
            ) {
                counts[i][j] += 1.0;
            }
        }
        Self {
            rows,
            columns,
            counts,
        }
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().flatten().sum()
    }
}

/// Pearson chi-square test of independence; Yates' correction when dof = 1.
pub fn chi_square_independence(table: &ContingencyTable) -> Result<TestOutcome> {
    let r = table.rows.len();
    let c = table.columns.len();
    let found = r.min(c);
    if found < 2 {
        return Err(StatError::InsufficientGroups { required: 2, found });
    }

    let row_sums: Vec<f64> = table.counts.iter().map(|row| row.iter().sum()).collect();
    let col_sums: Vec<f64> = (0..c)
        .map(|j| table.counts.iter().map(|row| row[j]).sum())
        .collect();
    let n = table.total();
    if row_sums.iter().chain(&col_sums).any(|s| *s <= 0.0) {
        return Err(degenerate("contingency table has an empty row or column"));
    }

    let dof = (r - 1) * (c - 1);
    let mut chi2 = 0.0;
    for (i, row) in table.counts.iter().enumerate() {
        for (j, observed) in row.iter().enumerate() {
            let expected = row_sums[i] * col_sums[j] / n;
            let mut diff = observed - expected;
            if dof == 1 {
                diff = diff.signum() * (diff.abs() - 0.5).max(0.0);
            }
            chi2 += diff * diff / expected;
        }
    }

    Ok(TestOutcome {
        statistic: chi2,
        p_value: chi2_sf(chi2, dof as f64)?,
        effect_size: None,
    })
}

/// Cramér's V from a chi-square statistic. The executor leaves the chi-square
/// effect size empty; callers that want V derive it here.
pub fn cramers_v(chi2: f64, n: f64, rows: usize, columns: usize) -> Option<f64> {
    let k = rows.min(columns);
    if k < 2 || n <= 0.0 {
        return None;
    }
    Some((chi2 / (n * (k - 1) as f64)).sqrt())
}

fn correlation(x: &[f64], y: &[f64]) -> Result<f64> {
    let mx = descriptive::mean(x).unwrap_or_default();
    let my = descriptive::mean(y).unwrap_or_default();
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return Err(degenerate("correlation with a constant variable"));
    }
    Ok((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

fn correlation_outcome(r: f64, n: usize) -> Result<TestOutcome> {
    let df = (n - 2) as f64;
    let p_value = if (1.0 - r.abs()) <= f64::EPSILON {
        0.0
    } else {
        let t = r * (df / (1.0 - r * r)).sqrt();
        t_two_sided(t, df)?
    };
    Ok(TestOutcome {
        statistic: r,
        p_value,
        effect_size: Some(r),
    })
}

fn require_pairs(x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        return Err(degenerate("correlation inputs differ in length"));
    }
    require_len(x, 3, "correlation")
}

pub fn pearson(x: &[f64], y: &[f64]) -> Result<TestOutcome> {
    require_pairs(x, y)?;
    correlation_outcome(correlation(x, y)?, x.len())
}

pub fn spearman(x: &[f64], y: &[f64]) -> Result<TestOutcome> {
    require_pairs(x, y)?;
    let rx = descriptive::rank_average(x).ranks;
    let ry = descriptive::rank_average(y).ranks;
    correlation_outcome(correlation(&rx, &ry)?, x.len())
}
