//! APA-style rows for test results: a descriptive table per group and a
//! one-row summary of the test. Only the cell text is produced here; layout
//! belongs to whoever renders it.

use super::types::TestResults;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupRow {
    pub group: String,
    pub n: usize,
    pub mean: String,
    pub sd: String,
    pub median: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct GroupTable {
    pub rows: Vec<GroupRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRow {
    pub test: String,
    pub statistic: String,
    pub p: String,
    pub effect_size: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestTable {
    pub rows: Vec<TestRow>,
}

fn fixed(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(String::new, |v| format!("{v:.decimals$}"))
}

/// p-values without the leading zero: `.032`, and `< .001` below that.
pub fn format_p(p: f64) -> String {
    if p < 0.001 {
        return "< .001".to_owned();
    }
    let text = format!("{p:.3}");
    match text.strip_prefix("0.") {
        Some(rest) => format!(".{rest}"),
        None => text,
    }
}

/// One row per group; empty when the results carry no group statistics.
pub fn group_table(results: &TestResults) -> GroupTable {
    let rows = results
        .group_statistics
        .iter()
        .flatten()
        .map(|(group, stats)| GroupRow {
            group: group.clone(),
            n: stats.n,
            mean: fixed(stats.mean, 2),
            sd: fixed(stats.sd, 2),
            median: fixed(stats.median, 2),
        })
        .collect();
    GroupTable { rows }
}

pub fn test_table(results: &TestResults) -> TestTable {
    TestTable {
        rows: vec![TestRow {
            test: results.test.to_string(),
            statistic: format!("{:.3}", results.statistic),
            p: format_p(results.p_value),
            effect_size: fixed(results.effect_size, 2),
        }],
    }
}

fn write_table(f: &mut fmt::Formatter<'_>, header: &[&str], rows: &[Vec<String>]) -> fmt::Result {
    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_owned()
    };

    writeln!(f, "{}", line(header.to_vec()))?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(f, "{}", line(rule.iter().map(String::as_str).collect()))?;
    for row in rows {
        writeln!(f, "{}", line(row.iter().map(String::as_str).collect()))?;
    }
    Ok(())
}

impl fmt::Display for GroupTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| {
                vec![
                    r.group.clone(),
                    r.n.to_string(),
                    r.mean.clone(),
                    r.sd.clone(),
                    r.median.clone(),
                ]
            })
            .collect();
        write_table(f, &["Group", "n", "Mean", "SD", "Median"], &rows)
    }
}

impl fmt::Display for TestTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| {
                vec![
                    r.test.clone(),
                    r.statistic.clone(),
                    r.p.clone(),
                    r.effect_size.clone(),
                ]
            })
            .collect();
        write_table(f, &["Test", "Statistic", "p", "Effect size"], &rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyser::logic::types::{GroupStats, TestKind};
    use indexmap::IndexMap;

    fn results() -> TestResults {
        let mut groups = IndexMap::new();
        groups.insert(
            "A".to_owned(),
            GroupStats {
                mean: Some(11.6),
                median: Some(12.0),
                sd: Some(1.140_175),
                n: 5,
            },
        );
        groups.insert(
            "B".to_owned(),
            GroupStats {
                mean: Some(7.0),
                median: Some(7.0),
                sd: None,
                n: 1,
            },
        );
        TestResults {
            test: TestKind::IndependentTTest,
            statistic: -10.781_234,
            p_value: 0.000_012,
            effect_size: Some(-6.82),
            confidence_interval: None,
            group_statistics: Some(groups),
        }
    }

    #[test]
    fn test_format_p() {
        assert_eq!(format_p(0.032), ".032");
        assert_eq!(format_p(0.0004), "< .001");
        assert_eq!(format_p(0.001), ".001");
        assert_eq!(format_p(0.5), ".500");
        assert_eq!(format_p(1.0), "1.000");
    }

    #[test]
    fn test_group_table_rounds_and_blanks() {
        let table = group_table(&results());
        assert_eq!(table.rows.len(), 2);
        let first = table.rows.first().expect("row A");
        assert_eq!(first.mean, "11.60");
        assert_eq!(first.sd, "1.14");
        let second = table.rows.get(1).expect("row B");
        assert_eq!(second.sd, "");
    }

    #[test]
    fn test_test_table_and_display() {
        let table = test_table(&results());
        let row = table.rows.first().expect("one row");
        assert_eq!(row.statistic, "-10.781");
        assert_eq!(row.p, "< .001");
        assert_eq!(row.effect_size, "-6.82");

        let text = table.to_string();
        assert!(text.starts_with("Test"));
        assert!(text.contains("Independent-samples t-test"));
    }

    #[test]
    fn test_group_table_empty_without_groups() {
        let mut r = results();
        r.group_statistics = None;
        assert!(group_table(&r).rows.is_empty());
    }
}
