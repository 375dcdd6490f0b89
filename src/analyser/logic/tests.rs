#![expect(
    clippy::unwrap_used,
    clippy::panic,
    clippy::expect_used,
    clippy::indexing_slicing
)]
use super::*;
use crate::config::AnalysisSettings;
use crate::error::Result;
use polars::prelude::*;

mod execution;
mod selection;

/// Text frame from literal columns; an empty string becomes a null cell.
fn frame(columns: &[(&str, &[&str])]) -> DataFrame {
    let cols: Vec<(&str, Vec<Option<String>>)> = columns
        .iter()
        .map(|(name, cells)| {
            let cells = cells
                .iter()
                .map(|c| (!c.is_empty()).then(|| (*c).to_owned()))
                .collect();
            (*name, cells)
        })
        .collect();
    io::frame_from_text(&cols).expect("valid test frame")
}

fn two_group_frame() -> DataFrame {
    frame(&[
        (
            "score",
            &["10", "12", "11", "13", "12", "20", "22", "19", "21", "23"],
        ),
        ("group", &["A", "A", "A", "A", "A", "B", "B", "B", "B", "B"]),
    ])
}

fn continuous_profile(normal: Option<bool>) -> VariableProfile {
    VariableProfile {
        kind: VariableKind::Continuous,
        levels: None,
        normality_p: normal.map(|n| if n { 0.5 } else { 0.01 }),
        normal,
        missing_pct: 0.0,
        outliers_present: false,
    }
}

fn categorical_profile(levels: &[&str]) -> VariableProfile {
    VariableProfile {
        kind: VariableKind::Categorical,
        levels: Some(levels.iter().map(|l| (*l).to_owned()).collect()),
        normality_p: None,
        normal: None,
        missing_pct: 0.0,
        outliers_present: false,
    }
}

#[test]
fn test_two_normal_groups_select_and_run_t_test() -> Result<()> {
    let df = two_group_frame();
    let plan = select_test(
        "score",
        &continuous_profile(Some(true)),
        "group",
        &categorical_profile(&["A", "B"]),
        Some(2),
    )?;
    assert_eq!(plan.selected_test, TestKind::IndependentTTest);
    assert_eq!(plan.effect_size, EffectSizeMetric::CohensD);
    assert!((plan.alpha - 0.05).abs() < f64::EPSILON);

    let results = execute_test(&df, &plan)?;
    assert_eq!(results.test, TestKind::IndependentTTest);
    assert!(results.p_value < 0.05);
    assert!(results.effect_size.unwrap().abs() > 1.0);
    assert!(results.confidence_interval.is_none());

    let groups = results.group_statistics.unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups["A"].n, 5);
    assert!((groups["A"].mean.unwrap() - 11.6).abs() < 1e-9);
    assert!((groups["B"].median.unwrap() - 21.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_categorical_pair_runs_chi_square() -> Result<()> {
    let df = frame(&[
        (
            "answer",
            &[
                "yes", "no", "yes", "yes", "no", "no", "yes", "no", "yes", "no", "yes", "yes",
            ],
        ),
        (
            "site",
            &["A", "A", "A", "A", "B", "B", "B", "B", "C", "C", "C", "C"],
        ),
    ]);
    let settings = AnalysisSettings::default();
    let profile = profile_dataset(&df, &settings.profiler)?;
    let answer = profile.variable("answer").unwrap();
    let site = profile.variable("site").unwrap();
    assert!(answer.is_categorical() && site.is_categorical());

    for normal in [Some(true), Some(false), None] {
        let mut dv = answer.clone();
        dv.normal = normal;
        let plan = select_test("answer", &dv, "site", site, Some(3))?;
        assert_eq!(plan.selected_test, TestKind::ChiSquare);
    }

    let plan = select_test("answer", answer, "site", site, Some(3))?;
    let results = execute_test(&df, &plan)?;
    assert!(results.statistic >= 0.0);
    assert!((0.0..=1.0).contains(&results.p_value));
    assert!(results.effect_size.is_none());
    assert!(results.group_statistics.is_none());
    Ok(())
}

#[test]
fn test_session_pipeline() -> Result<()> {
    let df = two_group_frame();
    let mut session = crate::analyser::AnalysisSession::new(&df, AnalysisSettings::default())?;

    // ten distinct values is still categorical until the user says otherwise
    assert!(session.profile().variable("score").unwrap().is_categorical());

    let err = session.run().unwrap_err();
    assert!(matches!(err, crate::error::StatError::InvalidState(_)));

    let score = session.confirm_type("score", VariableKind::Continuous)?;
    assert!(score.levels.is_none());
    assert!(score.normality_p.is_some());
    assert_eq!(
        session.confirmed_types().get("score"),
        Some(&VariableKind::Continuous)
    );

    let test = session.plan("score", "group")?.selected_test;
    assert!(matches!(
        test,
        TestKind::IndependentTTest | TestKind::MannWhitneyU
    ));
    let sizes = session.profile().group_sizes.clone().unwrap();
    assert_eq!(sizes.get("A"), Some(&5));
    assert_eq!(sizes.get("B"), Some(&5));

    let results = session.run()?;
    assert_eq!(results.test, test);
    assert!(results.p_value < 0.05);

    // a new plan discards the previous results
    session.plan("score", "group")?;
    assert!(session.results().is_none());
    Ok(())
}

#[test]
fn test_session_unknown_column() -> Result<()> {
    let mut session =
        crate::analyser::AnalysisSession::new(&two_group_frame(), AnalysisSettings::default())?;
    assert!(matches!(
        session.confirm_type("weight", VariableKind::Continuous),
        Err(crate::error::StatError::MissingColumn(_))
    ));
    assert!(matches!(
        session.plan("weight", "group"),
        Err(crate::error::StatError::MissingColumn(_))
    ));
    Ok(())
}

#[test]
fn test_apa_tables_from_results() -> Result<()> {
    let df = two_group_frame();
    let plan = select_test(
        "score",
        &continuous_profile(Some(true)),
        "group",
        &categorical_profile(&["A", "B"]),
        Some(2),
    )?;
    let results = execute_test(&df, &plan)?;

    let groups = group_table(&results);
    assert_eq!(groups.rows.len(), 2);
    assert_eq!(groups.rows[0].group, "A");
    assert_eq!(groups.rows[0].mean, "11.60");

    let test = test_table(&results);
    assert_eq!(test.rows[0].p, "< .001");
    assert!(test.to_string().contains("Independent-samples t-test"));
    Ok(())
}
