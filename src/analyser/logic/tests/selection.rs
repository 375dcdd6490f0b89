use super::{categorical_profile, continuous_profile};
use crate::analyser::logic::*;
use crate::error::StatError;

fn kind_profile(kind: VariableKind, normal: Option<bool>) -> VariableProfile {
    VariableProfile {
        kind,
        levels: (kind == VariableKind::Categorical).then(Vec::new),
        normality_p: None,
        normal,
        missing_pct: 0.0,
        outliers_present: false,
    }
}

#[test]
fn test_decision_table() {
    let iv_cat = categorical_profile(&["a", "b", "c"]);
    let cases = [
        (Some(true), Some(2), TestKind::IndependentTTest),
        (Some(false), Some(2), TestKind::MannWhitneyU),
        (None, Some(2), TestKind::MannWhitneyU),
        (Some(true), Some(3), TestKind::OneWayAnova),
        (Some(true), Some(7), TestKind::OneWayAnova),
        (Some(false), Some(3), TestKind::KruskalWallis),
        (None, Some(4), TestKind::KruskalWallis),
    ];
    for (normal, groups, expected) in cases {
        let plan = select_test("y", &continuous_profile(normal), "g", &iv_cat, groups)
            .expect("supported pair");
        assert_eq!(plan.selected_test, expected, "normal {normal:?} groups {groups:?}");
        assert_eq!(plan.effect_size, expected.effect_size_metric());
        assert_eq!(plan.dependent_variable, "y");
        assert_eq!(plan.independent_variable, "g");
        assert!(!plan.assumptions.is_empty());
        assert!(!plan.justification.is_empty());
    }

    let x = continuous_profile(Some(true));
    let pearson = select_test("y", &continuous_profile(Some(true)), "x", &x, None).unwrap();
    assert_eq!(pearson.selected_test, TestKind::Pearson);
    assert_eq!(pearson.effect_size, EffectSizeMetric::PearsonR);

    // only the dependent variable's normality matters
    let spearman =
        select_test("y", &continuous_profile(Some(false)), "x", &x, None).unwrap();
    assert_eq!(spearman.selected_test, TestKind::Spearman);
}

#[test]
fn test_effect_size_metrics() {
    let iv = categorical_profile(&["a", "b"]);
    let t = select_test("y", &continuous_profile(Some(true)), "g", &iv, Some(2)).unwrap();
    assert_eq!(t.effect_size, EffectSizeMetric::CohensD);
    let k = select_test("y", &continuous_profile(Some(false)), "g", &iv, Some(3)).unwrap();
    assert_eq!(k.effect_size, EffectSizeMetric::NotStandardized);
    let c = select_test("y", &categorical_profile(&["u", "v"]), "g", &iv, Some(2)).unwrap();
    assert_eq!(c.effect_size, EffectSizeMetric::CramersV);
}

#[test]
fn test_pairs_outside_the_table_are_unsupported() {
    let cat = categorical_profile(&["a", "b"]);
    let cont = continuous_profile(Some(true));

    for groups in [None, Some(0), Some(1)] {
        let err = select_test("y", &cont, "g", &cat, groups).unwrap_err();
        assert!(matches!(err, StatError::UnsupportedComparison(_)), "{groups:?}");
    }

    let err = select_test("y", &cat, "x", &cont, None).unwrap_err();
    assert!(matches!(err, StatError::UnsupportedComparison(_)));

    for kind in [VariableKind::Ordinal, VariableKind::Datetime] {
        let odd = kind_profile(kind, None);
        assert!(matches!(
            select_test("y", &odd, "x", &cont, None),
            Err(StatError::UnsupportedComparison(_))
        ));
        assert!(matches!(
            select_test("y", &cont, "x", &odd, Some(2)),
            Err(StatError::UnsupportedComparison(_))
        ));
    }
}

#[test]
fn test_chi_square_never_for_continuous_dependent() {
    for iv_kind in VariableKind::ALL {
        for normal in [Some(true), Some(false), None] {
            for groups in [None, Some(0), Some(1), Some(2), Some(3), Some(12)] {
                let dv = kind_profile(VariableKind::Continuous, normal);
                let iv = kind_profile(iv_kind, None);
                if let Ok(plan) = select_test("y", &dv, "x", &iv, groups) {
                    assert_ne!(plan.selected_test, TestKind::ChiSquare);
                }
            }
        }
    }
}

#[test]
fn test_selection_is_deterministic() {
    let dv = continuous_profile(Some(false));
    let iv = categorical_profile(&["a", "b", "c"]);
    let first = select_test("y", &dv, "g", &iv, Some(3)).unwrap();
    let second = select_test("y", &dv, "g", &iv, Some(3)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_test_names_resolve() {
    for kind in TestKind::ALL {
        assert_eq!(kind.as_str().parse::<TestKind>().unwrap(), kind);
        assert_eq!(kind.as_str().to_uppercase().parse::<TestKind>().unwrap(), kind);
    }
    assert_eq!("t-test".parse::<TestKind>().unwrap(), TestKind::IndependentTTest);
    assert_eq!("ANOVA".parse::<TestKind>().unwrap(), TestKind::OneWayAnova);
    assert!(matches!(
        "Fisher exact".parse::<TestKind>(),
        Err(StatError::UnsupportedTest(_))
    ));
}
