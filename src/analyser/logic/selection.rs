//! Rule table mapping a (dependent, independent) pair to a hypothesis test.
//!
//! | dependent   | independent | groups | normal | test                 |
//! |-------------|-------------|--------|--------|----------------------|
//! | categorical | categorical | any    | -      | chi-square           |
//! | continuous  | categorical | 2      | yes/no | t-test / Mann-Whitney|
//! | continuous  | categorical | > 2    | yes/no | ANOVA / Kruskal      |
//! | continuous  | continuous  | -      | yes/no | Pearson / Spearman   |
//!
//! "Normal" always refers to the dependent variable, and a normality flag
//! that was never computed counts as not normal. Any other combination is an
//! [`StatError::UnsupportedComparison`].

use super::types::{DEFAULT_ALPHA, TestKind, TestPlan, VariableKind, VariableProfile};
use crate::error::{Result, StatError};

/// Chooses the test for `dependent` explained by `independent`.
///
/// `group_count` is the number of distinct non-missing values of the
/// independent variable and is only consulted when it is categorical.
///
/// # Errors
///
/// `UnsupportedComparison` for pairs outside the rule table, including a
/// categorical independent variable with fewer than two groups.
pub fn select_test(
    dependent: &str,
    dv_profile: &VariableProfile,
    independent: &str,
    iv_profile: &VariableProfile,
    group_count: Option<usize>,
) -> Result<TestPlan> {
    let normal = dv_profile.is_normal();
    let test = match (dv_profile.kind, iv_profile.kind) {
        (VariableKind::Categorical, VariableKind::Categorical) => TestKind::ChiSquare,
        (VariableKind::Continuous, VariableKind::Categorical) => match group_count {
            Some(2) if normal => TestKind::IndependentTTest,
            Some(2) => TestKind::MannWhitneyU,
            Some(g) if g > 2 && normal => TestKind::OneWayAnova,
            Some(g) if g > 2 => TestKind::KruskalWallis,
            other => {
                return Err(StatError::UnsupportedComparison(format!(
                    "'{independent}' must define at least two groups, found {}",
                    other.map_or_else(|| "none".to_owned(), |g| g.to_string())
                )));
            }
        },
        (VariableKind::Continuous, VariableKind::Continuous) => {
            if normal {
                TestKind::Pearson
            } else {
                TestKind::Spearman
            }
        }
        (dv, iv) => {
            return Err(StatError::UnsupportedComparison(format!(
                "no test for a {dv} outcome '{dependent}' with a {iv} predictor '{independent}'"
            )));
        }
    };

    tracing::debug!("Selected {test} for '{dependent}' ~ '{independent}'");

    Ok(TestPlan {
        dependent_variable: dependent.to_owned(),
        independent_variable: independent.to_owned(),
        selected_test: test,
        assumptions: assumptions(test),
        effect_size: test.effect_size_metric(),
        justification: justification(test, dependent, independent, dv_profile, group_count),
        alpha: DEFAULT_ALPHA,
    })
}

fn assumptions(test: TestKind) -> Vec<String> {
    let items: &[&str] = match test {
        TestKind::IndependentTTest => &[
            "Observations are independent",
            "The outcome is approximately normally distributed within each group",
            "Variances are not assumed equal (Welch correction)",
        ],
        TestKind::MannWhitneyU => &[
            "Observations are independent",
            "The outcome is at least ordinal",
            "No normality assumption is made",
        ],
        TestKind::OneWayAnova => &[
            "Observations are independent",
            "The outcome is approximately normally distributed within each group",
            "Group variances are approximately equal",
        ],
        TestKind::KruskalWallis => &[
            "Observations are independent",
            "The outcome is at least ordinal",
            "No normality assumption is made",
        ],
        TestKind::ChiSquare => &[
            "Observations are independent",
            "Each observation falls in exactly one cell",
            "Expected cell counts are at least 5",
        ],
        TestKind::Pearson => &[
            "Observations are independent pairs",
            "Both variables are approximately normally distributed",
            "The relationship is linear",
        ],
        TestKind::Spearman => &[
            "Observations are independent pairs",
            "The relationship is monotonic",
            "No normality assumption is made",
        ],
    };
    items.iter().map(|s| (*s).to_owned()).collect()
}

fn distribution_phrase(dv: &VariableProfile) -> String {
    match (dv.normal, dv.normality_p) {
        (Some(true), Some(p)) => {
            format!("is consistent with a normal distribution (Shapiro-Wilk p = {p:.3})")
        }
        (Some(false), Some(p)) => {
            format!("departs from normality (Shapiro-Wilk p = {p:.3})")
        }
        _ => "could not be assessed for normality, so normality is not assumed".to_owned(),
    }
}

fn justification(
    test: TestKind,
    dependent: &str,
    independent: &str,
    dv: &VariableProfile,
    group_count: Option<usize>,
) -> String {
    let approach = if test.is_parametric() { "parametric" } else { "non-parametric" };
    if test.is_group_comparison() {
        let groups = group_count.unwrap_or_default();
        let compares = if test.is_parametric() {
            "group means"
        } else {
            "rank distributions without assuming normality"
        };
        format!(
            "'{dependent}' is continuous and {}. With {groups} groups of '{independent}', \
             the {approach} {test} compares {compares}.",
            distribution_phrase(dv)
        )
    } else if test.is_correlation() {
        let measures = if test.is_parametric() {
            "linear association"
        } else {
            "monotonic association on ranks"
        };
        format!(
            "Both variables are continuous and '{dependent}' {}, so the {approach} {test} \
             measures their {measures}.",
            distribution_phrase(dv)
        )
    } else {
        format!(
            "Both '{dependent}' and '{independent}' are categorical, so their association is \
             tested with a chi-square test of independence. No distributional assumption \
             applies to the outcome."
        )
    }
}
