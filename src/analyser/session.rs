//! Caller-owned analysis state.
//!
//! An [`AnalysisSession`] walks one dataset through the pipeline:
//!
//! - **Cleaned**: on construction the raw frame is cleaned and profiled
//! - **Confirmed**: the user may override inferred types, one column at a time
//! - **Planned**: a test is selected for a (dependent, independent) pair
//! - **Run**: the plan is executed and results are kept until the next plan
//!
//! ```no_run
//! use statpilot::analyser::AnalysisSession;
//! use statpilot::analyser::logic::VariableKind;
//! use statpilot::config::AnalysisSettings;
//! use std::path::Path;
//!
//! # fn example() -> statpilot::error::Result<()> {
//! let mut session = AnalysisSession::from_path(Path::new("survey.csv"), AnalysisSettings::default())?;
//! session.confirm_type("score", VariableKind::Continuous)?;
//! session.plan("score", "group")?;
//! let results = session.run()?;
//! println!("p = {:.3}", results.p_value);
//! # Ok(())
//! # }
//! ```

use super::logic::cleaning::{self, CleaningReport};
use super::logic::types::{DataProfile, TestPlan, TestResults, VariableKind, VariableProfile};
use super::logic::{execution, io, profiling, selection};
use crate::config::AnalysisSettings;
use crate::error::{Result, StatError};
use polars::prelude::DataFrame;
use std::collections::BTreeMap;
use std::path::Path;

pub struct AnalysisSession {
    settings: AnalysisSettings,
    data: DataFrame,
    cleaning: CleaningReport,
    profile: DataProfile,
    confirmed: BTreeMap<String, VariableKind>,
    plan: Option<TestPlan>,
    results: Option<TestResults>,
}

impl AnalysisSession {
    /// Cleans and profiles `raw`.
    ///
    /// # Errors
    ///
    /// Fails if cleaning or profiling the frame fails.
    pub fn new(raw: &DataFrame, settings: AnalysisSettings) -> Result<Self> {
        let (data, cleaning) = cleaning::clean_dataset(raw, &settings)?;
        let profile = profiling::profile_dataset(&data, &settings.profiler)?;
        tracing::info!(
            "Session ready: {} rows, {} variables",
            profile.sample_size,
            profile.variables.len()
        );
        Ok(Self {
            settings,
            data,
            cleaning,
            profile,
            confirmed: BTreeMap::new(),
            plan: None,
            results: None,
        })
    }

    /// # Errors
    ///
    /// Fails if the file cannot be read as CSV, or as [`Self::new`].
    pub fn from_path(path: &Path, settings: AnalysisSettings) -> Result<Self> {
        let raw = io::load_df(path)?;
        Self::new(&raw, settings)
    }

    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn cleaning_report(&self) -> &CleaningReport {
        &self.cleaning
    }

    pub fn profile(&self) -> &DataProfile {
        &self.profile
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Types the user has confirmed so far.
    pub fn confirmed_types(&self) -> &BTreeMap<String, VariableKind> {
        &self.confirmed
    }

    pub fn test_plan(&self) -> Option<&TestPlan> {
        self.plan.as_ref()
    }

    pub fn results(&self) -> Option<&TestResults> {
        self.results.as_ref()
    }

    fn cells(&self, column: &str) -> Result<Vec<Option<String>>> {
        io::column_cells(&self.data, column, &self.settings.profiler)
    }

    fn variable(&self, column: &str) -> Result<&VariableProfile> {
        self.profile
            .variable(column)
            .ok_or_else(|| StatError::MissingColumn(column.to_owned()))
    }

    /// Records `kind` as the type of `column` and recomputes that column's
    /// diagnostics under it. Any existing plan and results are discarded
    /// since they may no longer match the data types.
    ///
    /// # Errors
    ///
    /// `MissingColumn` if the dataset has no such column.
    pub fn confirm_type(&mut self, column: &str, kind: VariableKind) -> Result<&VariableProfile> {
        let cells = self.cells(column)?;
        let profile = profiling::profile_as(&cells, kind, &self.settings.profiler);
        tracing::info!("Confirmed '{column}' as {kind}");

        self.confirmed.insert(column.to_owned(), kind);
        self.plan = None;
        self.results = None;
        self.profile.group_sizes = None;
        self.profile.variables.insert(column.to_owned(), profile);
        self.variable(column)
    }

    /// Selects a test for `dependent` by `independent`, replacing any previous
    /// plan and clearing previous results.
    ///
    /// # Errors
    ///
    /// `MissingColumn` for unknown columns, `UnsupportedComparison` when no
    /// test fits the pair.
    pub fn plan(&mut self, dependent: &str, independent: &str) -> Result<&TestPlan> {
        self.plan = None;
        self.results = None;
        self.profile.group_sizes = None;

        let dv_profile = self.variable(dependent)?.clone();
        let iv_profile = self.variable(independent)?.clone();

        let group_count = if iv_profile.is_categorical() {
            let sizes = self.level_counts(independent)?;
            let count = sizes.len();
            self.profile.group_sizes = Some(sizes);
            Some(count)
        } else {
            None
        };

        let plan = selection::select_test(
            dependent,
            &dv_profile,
            independent,
            &iv_profile,
            group_count,
        )?;
        tracing::info!(
            "Planned {} for '{dependent}' by '{independent}'",
            plan.selected_test
        );
        Ok(self.plan.insert(plan))
    }

    /// Executes the current plan.
    ///
    /// # Errors
    ///
    /// `InvalidState` when no plan has been selected, otherwise whatever the
    /// test itself reports.
    pub fn run(&mut self) -> Result<&TestResults> {
        let plan = self.plan.as_ref().ok_or_else(|| {
            StatError::InvalidState("no test plan has been selected".to_owned())
        })?;
        let results = execution::execute_test_with(&self.data, plan, &self.settings.profiler)?;
        Ok(self.results.insert(results))
    }

    fn level_counts(&self, column: &str) -> Result<BTreeMap<String, usize>> {
        let mut counts = BTreeMap::new();
        for cell in self.cells(column)?.into_iter().flatten() {
            *counts.entry(cell).or_insert(0) += 1;
        }
        Ok(counts)
    }
}
