use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use statpilot::analyser::AnalysisSession;
use statpilot::analyser::logic::types::{DEFAULT_ALPHA, DataProfile, TestPlan, TestResults};
use statpilot::analyser::logic::{self, VariableKind};
use statpilot::config::AnalysisSettings;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "statpilot",
    version,
    about = "Choose and run the right hypothesis test for a CSV dataset"
)]
pub struct Cli {
    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to the data directory
    #[arg(long, global = true)]
    pub log_file: bool,

    /// Path to a JSON settings file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    /// Plain-text APA-style tables
    Apa,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clean and profile every column
    Profile {
        file: PathBuf,

        /// Confirm a column type, e.g. `age=continuous` (repeatable)
        #[arg(long = "override", value_parser = parse_override)]
        overrides: Vec<(String, VariableKind)>,
    },
    /// Clean a file and report what changed
    Clean {
        file: PathBuf,

        /// Write the cleaned data to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Select a test for a pair of variables
    Plan {
        file: PathBuf,

        #[arg(short, long)]
        dependent: String,

        #[arg(short, long)]
        independent: String,

        #[arg(long = "override", value_parser = parse_override)]
        overrides: Vec<(String, VariableKind)>,
    },
    /// Select and run a test
    Run {
        file: PathBuf,

        #[arg(short, long)]
        dependent: String,

        #[arg(short, long)]
        independent: String,

        /// Run this test instead of the selected one
        #[arg(short, long)]
        test: Option<String>,

        #[arg(long = "override", value_parser = parse_override)]
        overrides: Vec<(String, VariableKind)>,
    },
}

fn parse_override(s: &str) -> Result<(String, VariableKind), String> {
    let (column, kind) = s
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=KIND, got '{s}'"))?;
    let kind = kind.trim().parse::<VariableKind>().map_err(|e| e.to_string())?;
    Ok((column.trim().to_owned(), kind))
}

pub fn run_command(cli: Cli) -> Result<()> {
    let settings = AnalysisSettings::load_or_default(cli.config.as_deref())
        .context("Failed to load settings")?;
    let format = cli.format;

    match cli.command {
        Commands::Profile { file, overrides } => {
            let session = open_session(&file, settings, &overrides)?;
            match format {
                OutputFormat::Json => print_json(session.profile()),
                OutputFormat::Apa => {
                    print!("{}", profile_text(session.profile()));
                    Ok(())
                }
            }
        }
        Commands::Clean { file, output } => handle_clean(&file, output.as_deref(), &settings),
        Commands::Plan {
            file,
            dependent,
            independent,
            overrides,
        } => {
            let mut session = open_session(&file, settings, &overrides)?;
            let plan = session.plan(&dependent, &independent)?;
            match format {
                OutputFormat::Json => print_json(plan),
                OutputFormat::Apa => {
                    print!("{}", plan_text(plan));
                    Ok(())
                }
            }
        }
        Commands::Run {
            file,
            dependent,
            independent,
            test,
            overrides,
        } => {
            let mut session = open_session(&file, settings, &overrides)?;
            let (results, alpha) = match test {
                Some(name) => (
                    logic::execute_named(session.data(), &dependent, &independent, &name)?,
                    DEFAULT_ALPHA,
                ),
                None => {
                    let alpha = session.plan(&dependent, &independent)?.alpha;
                    (session.run()?.clone(), alpha)
                }
            };
            print_results(&results, alpha, format)
        }
    }
}

fn open_session(
    file: &Path,
    settings: AnalysisSettings,
    overrides: &[(String, VariableKind)],
) -> Result<AnalysisSession> {
    let mut session = AnalysisSession::from_path(file, settings)
        .with_context(|| format!("Failed to analyse {}", file.display()))?;
    for (column, kind) in overrides {
        session.confirm_type(column, *kind)?;
    }
    Ok(session)
}

fn handle_clean(file: &Path, output: Option<&Path>, settings: &AnalysisSettings) -> Result<()> {
    let raw = logic::load_df(file)?;
    let (mut cleaned, report) = logic::clean_dataset(&raw, settings)?;
    if let Some(path) = output {
        logic::save_df(&mut cleaned, path)?;
        tracing::info!("Cleaned data written to {}", path.display());
    }
    print_json(&report)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_results(results: &TestResults, alpha: f64, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(results),
        OutputFormat::Apa => {
            let groups = logic::group_table(results);
            if !groups.rows.is_empty() {
                println!("{groups}");
            }
            print!("{}", logic::test_table(results));
            println!("{}", significance_text(results, alpha));
            Ok(())
        }
    }
}

fn significance_text(results: &TestResults, alpha: f64) -> String {
    let verdict = if results.is_significant(alpha) {
        "significant"
    } else {
        "not significant"
    };
    format!("{} is {verdict} at alpha = {alpha}", results.test)
}

fn profile_text(profile: &DataProfile) -> String {
    let mut out = format!("{} observations ({})\n", profile.sample_size, profile.study_design);
    for (name, var) in &profile.variables {
        let detail = match (&var.levels, var.normality_p) {
            (Some(levels), _) => format!("{} levels", levels.len()),
            (None, Some(p)) => format!("Shapiro-Wilk p {}", logic::format_p(p)),
            (None, None) => String::new(),
        };
        out.push_str(&format!(
            "{name}: {} {detail} missing {:.1}%{}\n",
            var.kind,
            var.missing_pct,
            if var.outliers_present { " outliers" } else { "" }
        ));
    }
    out
}

fn plan_text(plan: &TestPlan) -> String {
    let mut out = format!(
        "{} ({} by {}), alpha {}\nEffect size: {}\n{}\nAssumptions:\n",
        plan.selected_test,
        plan.dependent_variable,
        plan.independent_variable,
        plan.alpha,
        plan.effect_size,
        plan.justification
    );
    for a in &plan.assumptions {
        out.push_str(&format!("- {a}\n"));
    }
    out
}
