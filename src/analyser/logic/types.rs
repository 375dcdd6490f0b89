use crate::error::StatError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Significance threshold carried by every plan.
pub const DEFAULT_ALPHA: f64 = 0.05;

pub const STUDY_DESIGN_OBSERVATIONAL: &str = "observational";

#[derive(Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Debug, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Continuous,
    Categorical,
    Ordinal,
    Datetime,
}

impl std::fmt::Display for VariableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl VariableKind {
    pub const ALL: [Self; 4] = [
        Self::Continuous,
        Self::Categorical,
        Self::Ordinal,
        Self::Datetime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Categorical => "categorical",
            Self::Ordinal => "ordinal",
            Self::Datetime => "datetime",
        }
    }
}

impl FromStr for VariableKind {
    type Err = StatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| StatError::Config(format!("Unknown variable type: {s}")))
    }
}

#[derive(Clone, Deserialize, Serialize, PartialEq, Debug)]
pub struct VariableProfile {
    #[serde(rename = "type")]
    pub kind: VariableKind,
    pub levels: Option<Vec<String>>,
    pub normality_p: Option<f64>,
    pub normal: Option<bool>,
    pub missing_pct: f64,
    pub outliers_present: bool,
}

impl VariableProfile {
    pub fn is_continuous(&self) -> bool {
        self.kind == VariableKind::Continuous
    }

    pub fn is_categorical(&self) -> bool {
        self.kind == VariableKind::Categorical
    }

    /// `Some(true)` only when a normality test ran and did not reject.
    pub fn is_normal(&self) -> bool {
        self.normal == Some(true)
    }
}

#[derive(Clone, Deserialize, Serialize, PartialEq, Debug)]
pub struct DataProfile {
    pub variables: BTreeMap<String, VariableProfile>,
    pub sample_size: usize,
    pub group_sizes: Option<BTreeMap<String, usize>>,
    pub study_design: String,
    pub warnings: Vec<String>,
}

impl DataProfile {
    pub fn variable(&self, name: &str) -> Option<&VariableProfile> {
        self.variables.get(name)
    }

    pub fn variables_of_kind(&self, kind: VariableKind) -> Vec<&str> {
        self.variables
            .iter()
            .filter(|(_, p)| p.kind == kind)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// The seven tests the selector can choose. Resolved once and threaded
/// unchanged through execution and reporting.
#[derive(Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Debug, Hash)]
pub enum TestKind {
    #[serde(rename = "Independent-samples t-test")]
    IndependentTTest,
    #[serde(rename = "Mann-Whitney U")]
    MannWhitneyU,
    #[serde(rename = "One-way ANOVA")]
    OneWayAnova,
    #[serde(rename = "Kruskal-Wallis")]
    KruskalWallis,
    #[serde(rename = "Chi-square test of independence")]
    ChiSquare,
    #[serde(rename = "Pearson correlation")]
    Pearson,
    #[serde(rename = "Spearman correlation")]
    Spearman,
}

impl std::fmt::Display for TestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TestKind {
    pub const ALL: [Self; 7] = [
        Self::IndependentTTest,
        Self::MannWhitneyU,
        Self::OneWayAnova,
        Self::KruskalWallis,
        Self::ChiSquare,
        Self::Pearson,
        Self::Spearman,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IndependentTTest => "Independent-samples t-test",
            Self::MannWhitneyU => "Mann-Whitney U",
            Self::OneWayAnova => "One-way ANOVA",
            Self::KruskalWallis => "Kruskal-Wallis",
            Self::ChiSquare => "Chi-square test of independence",
            Self::Pearson => "Pearson correlation",
            Self::Spearman => "Spearman correlation",
        }
    }

    pub fn is_parametric(&self) -> bool {
        matches!(
            self,
            Self::IndependentTTest | Self::OneWayAnova | Self::Pearson
        )
    }

    pub fn is_correlation(&self) -> bool {
        matches!(self, Self::Pearson | Self::Spearman)
    }

    /// Tests comparing a continuous outcome across levels of a grouping variable.
    pub fn is_group_comparison(&self) -> bool {
        matches!(
            self,
            Self::IndependentTTest | Self::MannWhitneyU | Self::OneWayAnova | Self::KruskalWallis
        )
    }

    pub fn effect_size_metric(&self) -> EffectSizeMetric {
        match self {
            Self::IndependentTTest => EffectSizeMetric::CohensD,
            Self::MannWhitneyU => EffectSizeMetric::R,
            Self::OneWayAnova => EffectSizeMetric::PartialEtaSquared,
            Self::KruskalWallis => EffectSizeMetric::NotStandardized,
            Self::ChiSquare => EffectSizeMetric::CramersV,
            Self::Pearson => EffectSizeMetric::PearsonR,
            Self::Spearman => EffectSizeMetric::SpearmanRho,
        }
    }
}

impl FromStr for TestKind {
    type Err = StatError;

    /// Accepts canonical names and the usual shorthand ("t-test", "anova",
    /// "chi-square", "mann-whitney", ...), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();

        if let Some(kind) = Self::ALL.into_iter().find(|k| {
            k.as_str()
                .to_lowercase()
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                == key
        }) {
            return Ok(kind);
        }

        let kind = match key.as_str() {
            "ttest" | "independentttest" | "welchttest" | "studentttest" => Self::IndependentTTest,
            "mannwhitney" | "mannwhitneyutest" | "wilcoxonranksum" | "mwu" => Self::MannWhitneyU,
            "anova" | "onewayanovatest" => Self::OneWayAnova,
            "kruskal" | "kruskalwallistest" | "kruskalwallish" => Self::KruskalWallis,
            "chisquare" | "chisquared" | "chi2" | "chisquaretest" => Self::ChiSquare,
            "pearson" | "pearsonr" => Self::Pearson,
            "spearman" | "spearmanrho" | "spearmanr" => Self::Spearman,
            _ => return Err(StatError::UnsupportedTest(s.to_owned())),
        };
        Ok(kind)
    }
}

#[derive(Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Debug)]
pub enum EffectSizeMetric {
    #[serde(rename = "Cohen's d")]
    CohensD,
    #[serde(rename = "r")]
    R,
    #[serde(rename = "Partial eta-squared")]
    PartialEtaSquared,
    #[serde(rename = "None (no standardized effect size)")]
    NotStandardized,
    #[serde(rename = "Cramér's V")]
    CramersV,
    #[serde(rename = "Pearson r")]
    PearsonR,
    #[serde(rename = "Spearman rho")]
    SpearmanRho,
}

impl EffectSizeMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CohensD => "Cohen's d",
            Self::R => "r",
            Self::PartialEtaSquared => "Partial eta-squared",
            Self::NotStandardized => "None (no standardized effect size)",
            Self::CramersV => "Cramér's V",
            Self::PearsonR => "Pearson r",
            Self::SpearmanRho => "Spearman rho",
        }
    }
}

impl std::fmt::Display for EffectSizeMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Deserialize, Serialize, PartialEq, Debug)]
pub struct TestPlan {
    pub dependent_variable: String,
    pub independent_variable: String,
    pub selected_test: TestKind,
    pub assumptions: Vec<String>,
    pub effect_size: EffectSizeMetric,
    pub justification: String,
    pub alpha: f64,
}

#[derive(Clone, Deserialize, Serialize, PartialEq, Debug, Default)]
pub struct GroupStats {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub sd: Option<f64>,
    pub n: usize,
}

#[derive(Clone, Deserialize, Serialize, PartialEq, Debug)]
pub struct TestResults {
    pub test: TestKind,
    pub statistic: f64,
    pub p_value: f64,
    pub effect_size: Option<f64>,
    pub confidence_interval: Option<[f64; 2]>,
    /// Per-group statistics in the order the groups were tested.
    pub group_statistics: Option<IndexMap<String, GroupStats>>,
}

impl TestResults {
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}
