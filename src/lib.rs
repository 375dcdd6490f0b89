//! # statpilot - hypothesis test selection for tabular data
//!
//! statpilot takes a dataset, works out which columns are continuous and
//! which are categorical, picks the appropriate hypothesis test for a pair of
//! variables and runs it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use statpilot::analyser::AnalysisSession;
//! use statpilot::config::AnalysisSettings;
//! use std::path::Path;
//!
//! # fn example() -> statpilot::error::Result<()> {
//! let mut session = AnalysisSession::from_path(Path::new("data.csv"), AnalysisSettings::default())?;
//! let plan = session.plan("score", "group")?;
//! println!("Selected {}", plan.selected_test);
//!
//! let results = session.run()?;
//! println!("statistic {:.3}, p {:.3}", results.statistic, results.p_value);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`analyser`]: the pipeline and the session that drives it
//!   - [`analyser::logic::profiling`]: variable type inference and diagnostics
//!   - [`analyser::logic::selection`]: the rule table choosing a test
//!   - [`analyser::logic::execution`]: running a plan against a dataset
//!   - [`analyser::logic::hypothesis`]: the seven test statistics
//!   - [`analyser::logic::cleaning`]: numeric repair of messy columns
//! - [`config`]: thresholds and cleaning options, loaded from JSON
//! - [`error`]: error types and handling utilities
//! - [`logging`]: subscriber setup for binaries
//!
//! ## Decision rules
//!
//! | Dependent   | Independent | Normal dependent | Test                       |
//! |-------------|-------------|------------------|----------------------------|
//! | categorical | categorical | -                | Chi-square                 |
//! | continuous  | 2 groups    | yes / no         | t-test / Mann-Whitney U    |
//! | continuous  | > 2 groups  | yes / no         | ANOVA / Kruskal-Wallis     |
//! | continuous  | continuous  | yes / no         | Pearson / Spearman         |

#![warn(clippy::all, rust_2018_idioms)]

pub mod analyser;
pub mod config;
pub mod error;
pub mod logging;
