//! Centralized error handling for statpilot.
//!
//! Every failure the analysis core can produce is a variant of [`StatError`].
//! The first five variants are the statistical taxonomy that callers are
//! expected to render as a plain-language message; the rest wrap the
//! surrounding plumbing (I/O, data frames, settings).
//!
//! ## Matching on failures
//!
//! ```
//! use statpilot::error::StatError;
//!
//! fn user_message(err: &StatError) -> String {
//!     match err {
//!         StatError::InsufficientGroups { found, .. } => {
//!             format!("Only {found} group(s) contain data; at least two are needed.")
//!         }
//!         StatError::TypeMismatch { column, .. } => {
//!             format!("Column '{column}' must contain numbers for this test.")
//!         }
//!         other => other.to_string(),
//!     }
//! }
//! ```
//!
//! ## Context Extension Trait
//!
//! [`ResultExt`] adds `.context()` to any `Result` whose error converts into
//! [`StatError`]:
//!
//! ```no_run
//! use statpilot::error::ResultExt as _;
//!
//! fn read_settings() -> statpilot::error::Result<String> {
//!     std::fs::read_to_string("settings.json").context("Failed to read settings")
//! }
//! ```

use std::fmt;

/// Main error type for statpilot operations.
#[derive(Debug)]
pub enum StatError {
    /// The selector cannot map the type/cardinality combination to a known test.
    UnsupportedComparison(String),

    /// The executor was handed a test identifier it does not know.
    UnsupportedTest(String),

    /// Fewer non-empty groups than the test needs after dropping missing values.
    InsufficientGroups { required: usize, found: usize },

    /// Numeric data was required but the column holds something else.
    TypeMismatch { column: String, expected: String },

    /// Zero-length or zero-variance input feeding a statistic that needs variance.
    DegenerateInput(String),

    /// A referenced column does not exist in the dataset.
    MissingColumn(String),

    /// An operation was called before the state it depends on exists.
    InvalidState(String),

    /// Data frame errors (polars, parsing, etc.)
    DataProcessing(String),

    /// I/O errors
    Io(std::io::Error),

    /// Settings and serialisation errors
    Config(String),
}

impl fmt::Display for StatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedComparison(msg) => write!(f, "Unsupported comparison: {msg}"),
            Self::UnsupportedTest(name) => write!(f, "Unsupported test: {name}"),
            Self::InsufficientGroups { required, found } => write!(
                f,
                "Insufficient groups: {required} required, {found} with data"
            ),
            Self::TypeMismatch { column, expected } => {
                write!(f, "Type mismatch: column '{column}' is not {expected}")
            }
            Self::DegenerateInput(msg) => write!(f, "Degenerate input: {msg}"),
            Self::MissingColumn(name) => write!(f, "Column not found: {name}"),
            Self::InvalidState(msg) => write!(f, "Invalid state: {msg}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for StatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StatError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for StatError {
    fn from(err: anyhow::Error) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

impl From<serde_json::Error> for StatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for StatError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

/// Result type alias for statpilot operations.
pub type Result<T> = std::result::Result<T, StatError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<StatError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| wrap(e.into(), msg.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

// Keeps the statistical variants intact so callers can still match on them.
fn wrap(err: StatError, msg: String) -> StatError {
    match err {
        StatError::Io(e) => StatError::Io(std::io::Error::new(e.kind(), format!("{msg}: {e}"))),
        StatError::DataProcessing(inner) => StatError::DataProcessing(format!("{msg}: {inner}")),
        StatError::Config(inner) => StatError::Config(format!("{msg}: {inner}")),
        other => other,
    }
}
