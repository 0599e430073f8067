//! Rift Match CLI Tool
//!
//! Checks whether a request's attribute groups satisfy an expectation's
//! matchers and prints the per-group verdicts.
//!
//! Usage:
//!   rift-match --expectation expectation.yaml --request request.json [OPTIONS]
//!
//! Both files hold `headers`, `cookies`, `queryStringParameters` and
//! `pathParameters` groups in JSON or YAML.
//!
//! Exit status: 0 on match, 1 on no match, 2 if an input cannot be loaded.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use rift_matching::{AttributesMatcher, MatchingConfig, RequestAttributes};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Rift Match - evaluate expectation matchers against a request
#[derive(Parser, Debug)]
#[command(name = "rift-match")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Expectation attribute definition (JSON or YAML)
    #[arg(short, long)]
    expectation: PathBuf,

    /// Request attributes to match (JSON or YAML)
    #[arg(short, long)]
    request: PathBuf,

    /// Matching configuration file
    #[arg(short, long, env = "RIFT_MATCHING_CONFIG")]
    config: Option<PathBuf>,

    /// Compare two expectation definitions instead of matching live traffic
    #[arg(long)]
    control_plane: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// `RUST_LOG` wins when set; otherwise `--verbose` picks the level.
fn filter_directives(verbose: bool, rust_log: Option<&str>) -> String {
    match rust_log.map(str::trim).filter(|directives| !directives.is_empty()) {
        Some(directives) => directives.to_string(),
        None if verbose => "debug".to_string(),
        None => "info".to_string(),
    }
}

fn init_logging(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = EnvFilter::new(filter_directives(verbose, rust_log.as_deref()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_attributes(path: &Path) -> Result<RequestAttributes, anyhow::Error> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

fn load_config(args: &Args) -> Result<MatchingConfig, anyhow::Error> {
    let mut config = match &args.config {
        Some(path) => MatchingConfig::from_file(path)?,
        None => MatchingConfig::default(),
    };
    if args.control_plane {
        config.control_plane = true;
    }
    config.detailed_match_failures = true;
    Ok(config)
}

fn run(args: &Args) -> Result<bool, anyhow::Error> {
    let config = load_config(args)?;
    debug!(?config, "Loaded matching configuration");

    let expectation = load_attributes(&args.expectation)?;
    let request = load_attributes(&args.request)?;
    let matcher = AttributesMatcher::new(&expectation, config)
        .with_context(|| format!("invalid expectation {}", args.expectation.display()))?;

    let report = matcher.matches_with_report(&request);
    print!("{report}");
    Ok(report.matched())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(true) => {
            info!("Request matched expectation");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            info!("Request did not match expectation");
            ExitCode::from(1)
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
