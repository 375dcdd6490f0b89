//! Descriptive statistics and ranking helpers shared by the profiler and the
//! hypothesis tests.
//!
//! All functions work on plain `f64` slices that have already had missing
//! values removed. Functions that cannot produce a value for short or constant
//! input return `None` instead of dividing by zero.

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Variance with `ddof` delta degrees of freedom (1 for the sample variance).
pub fn variance(values: &[f64], ddof: usize) -> Option<f64> {
    let n = values.len();
    if n <= ddof {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(ss / (n - ddof) as f64)
}

pub fn std_dev(values: &[f64], ddof: usize) -> Option<f64> {
    variance(values, ddof).map(f64::sqrt)
}

pub fn sum_of_squares(values: &[f64]) -> f64 {
    match mean(values) {
        Some(m) => values.iter().map(|v| (v - m).powi(2)).sum(),
        None => 0.0,
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted_copy(values);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(f64::midpoint(sorted[mid - 1], sorted[mid]))
    } else {
        Some(sorted[mid])
    }
}

pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Standard scores using the population standard deviation. `None` when the
/// input is empty or constant.
pub fn z_scores(values: &[f64]) -> Option<Vec<f64>> {
    let m = mean(values)?;
    let sd = std_dev(values, 0)?;
    if sd <= f64::EPSILON * m.abs().max(1.0) {
        return None;
    }
    Some(values.iter().map(|v| (v - m) / sd).collect())
}

pub fn has_outliers(values: &[f64], threshold: f64) -> bool {
    z_scores(values).is_some_and(|z| z.iter().any(|v| v.abs() > threshold))
}

pub fn distinct_count(values: &[f64]) -> usize {
    let mut sorted = sorted_copy(values);
    // -0.0 and 0.0 are the same value for counting purposes
    for v in &mut sorted {
        if *v == 0.0 {
            *v = 0.0;
        }
    }
    sorted.dedup_by(|a, b| a.total_cmp(b).is_eq());
    sorted.len()
}

/// Ranks with ties averaged (1-based).
#[derive(Debug, Clone)]
pub struct Ranking {
    pub ranks: Vec<f64>,
    /// Size of every tie block with more than one member.
    pub tie_sizes: Vec<usize>,
}

impl Ranking {
    /// `Σ (t³ - t)` over tie blocks, used by the tie corrections.
    pub fn tie_term(&self) -> f64 {
        self.tie_sizes
            .iter()
            .map(|&t| {
                let t = t as f64;
                t * t * t - t
            })
            .sum()
    }
}

pub fn rank_average(values: &[f64]) -> Ranking {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut tie_sizes = Vec::new();
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end share the average of ranks start+1 ..= end
        let avg = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg;
        }
        if end - start > 1 {
            tie_sizes.push(end - start);
        }
        start = end;
    }

    Ranking { ranks, tie_sizes }
}
