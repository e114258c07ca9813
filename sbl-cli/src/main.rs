//! SARIF baselining CLI.
//!
//! Compares a current SARIF log against a baseline log and either writes the
//! baselined log or prints a summary of the comparison.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use sarif_baseline::{load_log, AmbiguityPolicy, BaselineConfig, MatchMode, SarifLogMatcher};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// SARIF result baselining tool
#[derive(Parser)]
#[command(name = "sbl")]
#[command(version)]
#[command(
    about = "Matches SARIF results across scans and assigns baseline states",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Baselining config file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log matcher stages at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Baseline a current log and write the result
    #[command(visible_alias = "m")]
    Match {
        /// Baseline log (the earlier scan)
        baseline: PathBuf,
        /// Current log (the later scan)
        current: PathBuf,
        /// Output file (default: stdout)
        output: Option<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Print how many results are new, unchanged, updated and absent
    #[command(visible_alias = "s")]
    Summary {
        /// Baseline log (the earlier scan)
        baseline: PathBuf,
        /// Current log (the later scan)
        current: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        overrides: Overrides,
    },
}

/// Command-line settings that take precedence over the config file.
#[derive(clap::Args)]
struct Overrides {
    /// What to do when a result matches several baseline results (first, defer)
    #[arg(long)]
    ambiguity: Option<AmbiguityPolicy>,

    /// Do not retry unmatched results with remapped paths
    #[arg(long)]
    no_remap: bool,

    /// Classify by rule id only, without pairing individual results
    #[arg(long)]
    rule_id_only: bool,
}

impl Overrides {
    fn apply(&self, config: &mut BaselineConfig) {
        if let Some(ambiguity) = self.ambiguity {
            config.ambiguity = ambiguity;
        }
        if self.no_remap {
            config.remapping.enabled = false;
        }
        if self.rule_id_only {
            config.mode = MatchMode::RuleId;
        }
    }
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_level.into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Match {
            baseline,
            current,
            output,
            overrides,
        } => load_config(cli.config.as_deref(), overrides)
            .and_then(|config| run_match(baseline, current, output.as_deref(), config)),
        Commands::Summary {
            baseline,
            current,
            json,
            overrides,
        } => load_config(cli.config.as_deref(), overrides)
            .and_then(|config| run_summary(baseline, current, *json, config)),
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

fn load_config(
    path: Option<&Path>,
    overrides: &Overrides,
) -> Result<BaselineConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => BaselineConfig::load(path)?,
        None => BaselineConfig::default(),
    };
    overrides.apply(&mut config);
    Ok(config)
}

/// Baselines `current_path` against `baseline_path` and writes the log.
fn run_match(
    baseline_path: &Path,
    current_path: &Path,
    output_path: Option<&Path>,
    config: BaselineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(path = %baseline_path.display(), "loading baseline");
    let baseline = load_log(baseline_path)?;
    info!(path = %current_path.display(), "loading current");
    let current = load_log(current_path)?;

    let (log, stats) =
        SarifLogMatcher::new(config).match_logs_with_stats(&[baseline], &[current]);

    let mut output: Box<dyn Write> = match output_path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    };
    serde_json::to_writer_pretty(&mut output, &log)?;
    writeln!(output)?;
    output.flush()?;

    info!(
        results = log.result_count(),
        matched = stats.matched_count(),
        ambiguous = stats.ambiguous_count(),
        "wrote baselined log"
    );
    Ok(())
}

/// Prints state and matcher counts for a comparison.
fn run_summary(
    baseline_path: &Path,
    current_path: &Path,
    json: bool,
    config: BaselineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let baseline = load_log(baseline_path)?;
    let current = load_log(current_path)?;

    let (_, stats) = SarifLogMatcher::new(config).match_logs_with_stats(&[baseline], &[current]);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &stats)?;
        writeln!(out)?;
    } else {
        stats.write_summary(&mut out)?;
    }
    Ok(())
}
