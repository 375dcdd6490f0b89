use super::{categorical_profile, continuous_profile, frame, two_group_frame};
use crate::analyser::logic::*;
use crate::error::{Result, StatError};

fn plan(dv: &str, iv: &str, test: TestKind) -> TestPlan {
    TestPlan {
        dependent_variable: dv.to_owned(),
        independent_variable: iv.to_owned(),
        selected_test: test,
        assumptions: Vec::new(),
        effect_size: test.effect_size_metric(),
        justification: String::new(),
        alpha: 0.05,
    }
}

fn three_group_frame() -> polars::prelude::DataFrame {
    frame(&[
        ("y", &["1", "2", "3", "4", "5", "6", "7", "8", "9"]),
        ("g", &["a", "a", "a", "b", "b", "b", "c", "c", "c"]),
    ])
}

#[test]
fn test_mann_whitney_exact_small_samples() -> Result<()> {
    let df = frame(&[
        ("y", &["1", "2", "3", "4", "5", "6"]),
        ("g", &["a", "a", "a", "b", "b", "b"]),
    ]);
    let results = execute_test(&df, &plan("y", "g", TestKind::MannWhitneyU))?;
    // U of the first group is 0; two-sided exact p is 2 / C(6, 3)
    assert!(results.statistic.abs() < 1e-12);
    assert!((results.p_value - 0.1).abs() < 1e-12);
    assert_eq!(results.effect_size, Some(0.0));
    assert_eq!(results.group_statistics.map(|g| g.len()), Some(2));
    Ok(())
}

#[test]
fn test_anova_and_kruskal_on_three_groups() -> Result<()> {
    let df = three_group_frame();

    let anova = execute_test(&df, &plan("y", "g", TestKind::OneWayAnova))?;
    // SSB = 54, SSW = 6, F = (54 / 2) / (6 / 6)
    assert!((anova.statistic - 27.0).abs() < 1e-9);
    assert!((anova.effect_size.unwrap() - 0.9).abs() < 1e-9);
    assert!(anova.p_value < 0.01);
    assert_eq!(anova.group_statistics.as_ref().map(|g| g.len()), Some(3));

    let kruskal = execute_test(&df, &plan("y", "g", TestKind::KruskalWallis))?;
    assert!((kruskal.statistic - 7.2).abs() < 1e-9);
    assert!(kruskal.effect_size.is_none());
    assert!(kruskal.p_value < 0.05);
    Ok(())
}

#[test]
fn test_correlations_use_complete_pairs() -> Result<()> {
    let df = frame(&[
        ("y", &["2", "4", "6", "8", "", "12", "14"]),
        ("x", &["1", "2", "3", "4", "5", "6", ""]),
    ]);
    let pearson = execute_test(&df, &plan("y", "x", TestKind::Pearson))?;
    assert!((pearson.statistic - 1.0).abs() < 1e-12);
    assert_eq!(pearson.effect_size, Some(pearson.statistic));
    assert!(pearson.p_value.abs() < 1e-12);
    assert!(pearson.group_statistics.is_none());

    let cubic = frame(&[
        ("y", &["1", "8", "27", "64", "125", "216"]),
        ("x", &["1", "2", "3", "4", "5", "6"]),
    ]);
    let spearman = execute_test(&cubic, &plan("y", "x", TestKind::Spearman))?;
    assert!((spearman.statistic - 1.0).abs() < 1e-12);
    Ok(())
}

#[test]
fn test_groups_follow_numeric_label_order() -> Result<()> {
    let df = frame(&[
        ("y", &["5", "6", "7", "1", "2", "3"]),
        ("dose", &["10", "10", "10", "2", "2", "2"]),
    ]);
    let results = execute_test(&df, &plan("y", "dose", TestKind::IndependentTTest))?;
    // "2" is the first group, so its lower mean gives a negative t
    assert!(results.statistic < 0.0);

    let labels: Vec<&str> = results
        .group_statistics
        .iter()
        .flatten()
        .map(|(label, _)| label.as_str())
        .collect();
    assert_eq!(labels, vec!["2", "10"]);
    let table = apa::group_table(&results);
    let rows: Vec<&str> = table.rows.iter().map(|r| r.group.as_str()).collect();
    assert_eq!(rows, vec!["2", "10"]);
    Ok(())
}

#[test]
fn test_group_summary_skips_missing_outcomes() -> Result<()> {
    let df = frame(&[
        ("y", &["1", "", "3", "", "", "9"]),
        ("g", &["a", "a", "a", "b", "b", "c"]),
    ]);
    let summary = group_summary(&df, "y", "g", &crate::config::ProfilerSettings::default())?;
    assert_eq!(summary["a"].n, 2);
    assert_eq!(summary["a"].mean, Some(2.0));
    assert_eq!(summary["b"].n, 0);
    assert!(summary["b"].mean.is_none() && summary["b"].median.is_none());
    assert_eq!(summary["c"].n, 1);
    assert!(summary["c"].sd.is_none());
    Ok(())
}

#[test]
fn test_error_taxonomy() {
    let df = two_group_frame();

    let err = execute_named(&df, "score", "group", "Fisher exact").unwrap_err();
    assert!(matches!(err, StatError::UnsupportedTest(_)));

    let err = execute_test(&df, &plan("weight", "group", TestKind::IndependentTTest)).unwrap_err();
    assert!(matches!(err, StatError::MissingColumn(ref c) if c == "weight"));

    let err = execute_test(&df, &plan("group", "score", TestKind::Pearson)).unwrap_err();
    assert!(matches!(err, StatError::TypeMismatch { ref column, .. } if column == "group"));

    let one_group = frame(&[("y", &["1", "2", "3"]), ("g", &["a", "a", "a"])]);
    let err = execute_test(&one_group, &plan("y", "g", TestKind::OneWayAnova)).unwrap_err();
    assert!(matches!(err, StatError::InsufficientGroups { required: 2, found: 1 }));

    let err = execute_test(&three_group_frame(), &plan("y", "g", TestKind::IndependentTTest))
        .unwrap_err();
    assert!(matches!(err, StatError::UnsupportedComparison(_)));

    let flat = frame(&[
        ("y", &["4", "4", "4", "4"]),
        ("g", &["a", "a", "b", "b"]),
    ]);
    let err = execute_test(&flat, &plan("y", "g", TestKind::IndependentTTest)).unwrap_err();
    assert!(matches!(err, StatError::DegenerateInput(_)));

    let short = frame(&[("y", &["1", "2"]), ("x", &["3", "5"])]);
    let err = execute_test(&short, &plan("y", "x", TestKind::Spearman)).unwrap_err();
    assert!(matches!(err, StatError::DegenerateInput(_)));

    let single_level = frame(&[("a", &["x", "x", "y"]), ("b", &["u", "u", "u"])]);
    let err = execute_test(&single_level, &plan("a", "b", TestKind::ChiSquare)).unwrap_err();
    assert!(matches!(err, StatError::InsufficientGroups { .. }));
}

#[test]
fn test_named_execution_accepts_aliases() -> Result<()> {
    let results = execute_named(&two_group_frame(), "score", "group", "welch t-test")?;
    assert_eq!(results.test, TestKind::IndependentTTest);
    Ok(())
}

#[test]
fn test_selected_plans_always_execute_as_named() -> Result<()> {
    let df = frame(&[
        ("y", &["3.1", "4.7", "2.2", "5.9", "4.4", "6.1", "7.3", "5.5", "8.8", "6.6", "9.1", "7.7"]),
        ("x", &["1.0", "2.1", "0.7", "3.3", "2.9", "3.8", "4.6", "3.1", "6.0", "4.4", "6.5", "5.2"]),
        ("g2", &["a", "b", "a", "b", "a", "b", "a", "b", "a", "b", "a", "b"]),
        ("g3", &["a", "b", "c", "a", "b", "c", "a", "b", "c", "a", "b", "c"]),
    ]);
    let cases = [
        ("g2", Some(2), categorical_profile(&["a", "b"])),
        ("g3", Some(3), categorical_profile(&["a", "b", "c"])),
        ("x", None, continuous_profile(Some(true))),
    ];
    for (iv, groups, iv_profile) in cases {
        for normal in [Some(true), Some(false), None] {
            let selected = select_test("y", &continuous_profile(normal), iv, &iv_profile, groups)?;
            match execute_test(&df, &selected) {
                Err(StatError::UnsupportedTest(name)) => panic!("{name} not executable"),
                other => {
                    let results = other?;
                    assert_eq!(results.test, selected.selected_test);
                }
            }
        }
    }

    let chi = select_test(
        "g2",
        &categorical_profile(&["a", "b"]),
        "g3",
        &categorical_profile(&["a", "b", "c"]),
        Some(3),
    )?;
    assert_eq!(execute_test(&df, &chi)?.test, TestKind::ChiSquare);
    Ok(())
}
