use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use shotdiff_common::{load_config, AppConfig, ComparisonProfile, ComparisonTargets};
use shotdiff_core::{ComparisonOptions, ComparisonReport, FileDescriptor, TextFileComparison};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Exit code when `--fail-on-difference` is set and a comparison differs
const EXIT_DIFFERENCE: i32 = 2;

#[derive(Parser)]
#[command(name = "shotdiff")]
#[command(version)]
#[command(about = "Compare regenerated screenshot descriptions against their accepted originals", long_about = None)]
struct Cli {
    /// Configuration file (default: shotdiff.toml next to the binary or in the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare one actual file with its original and write a diff if they differ
    Compare {
        /// Freshly generated file
        actual: PathBuf,

        /// Previously accepted file
        original: PathBuf,

        /// Where to write the unified diff
        diff: PathBuf,

        /// Public URL of the actual file
        actual_url: String,

        /// Public URL of the original file
        original_url: String,

        /// Public URL of the diff file
        diff_url: String,

        /// Output results as JSON
        #[arg(long)]
        json: bool,

        /// Exit with status 2 when the files differ
        #[arg(long)]
        fail_on_difference: bool,
    },

    /// Run every comparison listed in the configuration file
    Run {
        /// Only run comparisons with these names (can be specified multiple times)
        #[arg(short, long)]
        only: Vec<String>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,

        /// Exit with status 2 when any comparison differs
        #[arg(long)]
        fail_on_difference: bool,
    },
}

#[derive(Serialize)]
struct NamedReport {
    name: String,
    #[serde(flatten)]
    report: ComparisonReport,
}

fn main() {
    // Initialize tracing to stderr (so JSON output can go cleanly to stdout)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compare {
            actual,
            original,
            diff,
            actual_url,
            original_url,
            diff_url,
            json,
            fail_on_difference,
        } => {
            let targets =
                ComparisonTargets::new(actual, original, diff, actual_url, original_url, diff_url);
            run_compare(cli.config, targets, json)
                .map(|differs| exit_code(differs, fail_on_difference))
        }
        Commands::Run {
            only,
            json,
            fail_on_difference,
        } => run_batch(cli.config, &only, json)
            .map(|differs| exit_code(differs, fail_on_difference)),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Comparison failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn exit_code(differs: bool, fail_on_difference: bool) -> i32 {
    if differs && fail_on_difference {
        EXIT_DIFFERENCE
    } else {
        0
    }
}

fn load_app_config(path: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let loaded = load_config(path.as_deref()).context("loading configuration")?;
    if loaded.exists {
        info!("Using configuration {}", loaded.path.display());
    }
    Ok(loaded.config)
}

fn process(
    targets: ComparisonTargets,
    options: ComparisonOptions,
) -> anyhow::Result<TextFileComparison> {
    let mut comparison = TextFileComparison::new(targets)?.with_options(options);
    comparison
        .process()
        .with_context(|| format!("comparing {}", comparison.file_actual().path().display()))?;
    Ok(comparison)
}

/// Returns whether the files differ
fn run_compare(
    config: Option<PathBuf>,
    targets: ComparisonTargets,
    json: bool,
) -> anyhow::Result<bool> {
    let config = load_app_config(config)?;
    let comparison = process(targets, ComparisonOptions::from(&config))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&comparison.report())?);
    } else {
        print!("{}", format_summary(None, &comparison));
    }

    Ok(comparison.difference() > 0.0)
}

/// Returns whether any comparison differs
fn run_batch(config: Option<PathBuf>, only: &[String], json: bool) -> anyhow::Result<bool> {
    let config = load_app_config(config)?;
    let profiles = select_profiles(&config.comparisons, only)?;
    let options = ComparisonOptions::from(&config);

    info!("Running {} comparison(s)", profiles.len());

    let mut reports = Vec::new();
    let mut any_differs = false;
    for profile in profiles {
        let comparison = process(profile.targets.clone(), options.clone())
            .with_context(|| format!("comparison '{}'", profile.name))?;
        any_differs |= comparison.difference() > 0.0;

        if json {
            reports.push(NamedReport {
                name: profile.name.clone(),
                report: comparison.report(),
            });
        } else {
            print!("{}", format_summary(Some(&profile.name), &comparison));
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    Ok(any_differs)
}

fn select_profiles<'a>(
    profiles: &'a [ComparisonProfile],
    only: &[String],
) -> anyhow::Result<Vec<&'a ComparisonProfile>> {
    if profiles.is_empty() {
        bail!("no [[comparisons]] configured");
    }
    if only.is_empty() {
        return Ok(profiles.iter().collect());
    }

    for name in only {
        if !profiles.iter().any(|p| &p.name == name) {
            bail!("unknown comparison '{}'", name);
        }
    }
    Ok(profiles
        .iter()
        .filter(|p| only.contains(&p.name))
        .collect())
}

fn format_summary(name: Option<&str>, comparison: &TextFileComparison) -> String {
    let mut out = String::new();
    if let Some(name) = name {
        out.push_str(&format!("[{}]\n", name));
    }
    out.push_str(&format!("  Difference: {:.3}\n", comparison.difference()));
    out.push_str(&format_file("Actual", comparison.file_actual()));
    out.push_str(&format_file("Original", comparison.file_original()));
    out.push_str(&format_file("Diff", comparison.file_diff()));
    out
}

fn format_file(label: &str, file: &FileDescriptor) -> String {
    let state = if file.is_existing() { "exists" } else { "missing" };
    format!(
        "  {:<9} {} ({})\n",
        format!("{}:", label),
        file.uri_with_cache_bust(),
        state
    )
}
