use crate::error::{Result, ResultExt as _, StatError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const MAX_AUDIT_ENTRIES: usize = 1000;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub details: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, action: impl Into<String>, details: impl Into<String>) {
        self.entries.push(AuditEntry {
            timestamp: Utc::now(),
            action: action.into(),
            details: details.into(),
        });

        if self.entries.len() > MAX_AUDIT_ENTRIES {
            self.entries.drain(0..self.entries.len() - MAX_AUDIT_ENTRIES);
        }
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Thresholds used when classifying columns and assessing assumptions.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProfilerSettings {
    /// Below this share of parseable cells a column is categorical.
    pub numeric_ratio_threshold: f64,
    /// Numeric columns with at most this many distinct values are categorical.
    pub max_categorical_levels: usize,
    /// Numeric columns whose distinct/non-missing ratio is below this are categorical.
    pub min_unique_ratio: f64,
    pub min_normality_sample: usize,
    /// `normal` is true when the Shapiro-Wilk p-value exceeds this.
    pub normality_alpha: f64,
    pub outlier_z_threshold: f64,
    /// Cell contents treated as missing (compared after trimming).
    pub missing_tokens: Vec<String>,
}

impl Default for ProfilerSettings {
    fn default() -> Self {
        Self {
            numeric_ratio_threshold: 0.9,
            max_categorical_levels: 10,
            min_unique_ratio: 0.05,
            min_normality_sample: 3,
            normality_alpha: 0.05,
            outlier_z_threshold: 3.0,
            missing_tokens: ["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "none"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

impl ProfilerSettings {
    pub fn is_missing(&self, cell: &str) -> bool {
        let trimmed = cell.trim();
        self.missing_tokens.iter().any(|t| t == trimmed)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CleaningSettings {
    /// A column becomes numeric when more than this share of cells parses.
    pub numeric_success_ratio: f64,
    /// Read a letter O as the digit 0 inside mostly-numeric columns.
    pub letter_o_as_zero: bool,
    pub strip_thousands_separators: bool,
}

impl Default for CleaningSettings {
    fn default() -> Self {
        Self {
            numeric_success_ratio: 0.8,
            letter_o_as_zero: true,
            strip_thousands_separators: true,
        }
    }
}

/// Everything tunable about an analysis run. The significance level is not
/// part of it: plans always carry 0.05.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AnalysisSettings {
    pub profiler: ProfilerSettings,
    pub cleaning: CleaningSettings,
}

impl AnalysisSettings {
    /// Reads settings from a JSON file; absent keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?;
        let settings: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads from `path` when given, else from the default location if a file
    /// exists there, else the built-in defaults.
    ///
    /// # Errors
    ///
    /// Only an explicitly requested file that fails to load is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(p) = path {
            return Self::load(p);
        }
        match default_settings_path() {
            Some(p) if p.exists() => Self::load(&p).or_else(|e| {
                tracing::warn!("Ignoring unreadable settings at {}: {e}", p.display());
                Ok(Self::default())
            }),
            _ => Ok(Self::default()),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        let p = &self.profiler;
        let ratios = [
            ("numeric_ratio_threshold", p.numeric_ratio_threshold),
            ("min_unique_ratio", p.min_unique_ratio),
            ("normality_alpha", p.normality_alpha),
            ("numeric_success_ratio", self.cleaning.numeric_success_ratio),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(StatError::Config(format!(
                    "{name} must be between 0 and 1, got {value}"
                )));
            }
        }
        if p.outlier_z_threshold <= 0.0 {
            return Err(StatError::Config(
                "outlier_z_threshold must be positive".to_owned(),
            ));
        }
        if p.min_normality_sample < 3 {
            return Err(StatError::Config(
                "min_normality_sample cannot be below 3".to_owned(),
            ));
        }
        Ok(())
    }
}

/// `<config dir>/statpilot/settings.json`
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("statpilot").join("settings.json"))
}
