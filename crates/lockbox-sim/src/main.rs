//! Lockbox sandbox simulator.
//!
//! Loads a crate configuration, runs a scripted session against the
//! in-memory world and prints a JSON report.
//!
//! ```text
//! lockbox-sim [CONFIG] [--seed N]
//! ```
//!
//! `CONFIG` defaults to `config/lockbox.json`; a missing default file falls
//! back to built-in defaults. Log verbosity follows `RUST_LOG`.

mod demo;
mod session;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use lockbox_core::{CrateConfig, CrateController};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config/lockbox.json";
const DEFAULT_SEED: u64 = 0x5eed;

struct Args {
    config: Option<PathBuf>,
    seed: u64,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    init_tracing();
    let args = parse_args(std::env::args().skip(1))?;
    let config = load_config(args.config.as_deref())?;
    info!(
        seed = args.seed,
        spawn_points = config.spawn_points.len(),
        "=== Lockbox Sim Startup ==="
    );

    let controller = CrateController::new(config, demo::world(args.seed), args.seed);
    let report = session::run(controller)?;

    let json = serde_json::to_string_pretty(&report).context("failed to encode report")?;
    println!("{json}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args {
        config: None,
        seed: DEFAULT_SEED,
    };
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--seed" => {
                let value = raw.next().context("--seed needs a value")?;
                args.seed = value
                    .parse()
                    .with_context(|| format!("invalid seed '{value}'"))?;
            }
            flag if flag.starts_with("--") => bail!("unknown flag '{flag}'"),
            path => {
                if args.config.is_some() {
                    bail!("more than one config path given");
                }
                args.config = Some(PathBuf::from(path));
            }
        }
    }
    Ok(args)
}

fn load_config(explicit: Option<&Path>) -> Result<CrateConfig> {
    if let Some(path) = explicit {
        return CrateConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()));
    }
    let default = Path::new(DEFAULT_CONFIG);
    if default.exists() {
        return CrateConfig::load(default)
            .with_context(|| format!("failed to load config from {DEFAULT_CONFIG}"));
    }
    warn!(path = DEFAULT_CONFIG, "no config file, using built-in defaults");
    Ok(CrateConfig::default())
}
