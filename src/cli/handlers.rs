//! Command handlers; each returns the process exit code

use super::commands::{CatalogArgs, DetectArgs};
use super::output::OutputFormatter;
use crate::catalog::Catalog;
use crate::config::{CatalogSource, DetectConfig};
use crate::detector::Detector;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error};

pub fn handle_detect(args: &DetectArgs) -> i32 {
    match run_detect(args) {
        Ok(output) => {
            print!("{}", ensure_newline(output));
            0
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

pub fn handle_catalog(args: &CatalogArgs) -> i32 {
    match run_catalog(args) {
        Ok(output) => {
            print!("{}", ensure_newline(output));
            0
        }
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn run_detect(args: &DetectArgs) -> Result<String> {
    let config = detect_config(args)?;
    debug!(%config, "Effective configuration");

    let detector = Detector::new(config).context("Failed to initialize detector")?;

    let path = match &args.path {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    let report = detector.detect_report(&path);
    OutputFormatter::new(args.format.into()).format_report(&report, args.stats)
}

/// Environment first, then command-line flags on top
fn detect_config(args: &DetectArgs) -> Result<DetectConfig> {
    let mut config = DetectConfig::from_env().context("Invalid STACKPROBE_* environment")?;

    if let Some(path) = &args.catalog {
        config.catalog = CatalogSource::Path(path.clone());
    }
    if let Some(threads) = args.threads {
        config.scan.threads = threads;
    }
    if let Some(secs) = args.timeout {
        config.scan.timeout = Some(Duration::from_secs(secs));
    }
    if let Some(depth) = args.max_depth {
        config.scan.max_depth = Some(depth);
    }
    if let Some(mode) = args.match_mode {
        config.match_mode = mode.into();
    }
    if args.no_locate {
        config.locate_root = false;
    }
    if args.respect_gitignore {
        config.scan.respect_gitignore = true;
    }
    config.extra_excluded_dirs.extend(args.exclude.iter().cloned());

    config.validate()?;
    Ok(config)
}

fn run_catalog(args: &CatalogArgs) -> Result<String> {
    let catalog = match &args.catalog {
        Some(path) => load_catalog(path)?,
        None => Catalog::builtin().context("Built-in catalog is invalid")?,
    };
    OutputFormatter::new(args.format.into()).format_catalog(&catalog)
}

fn load_catalog(path: &Path) -> Result<Catalog> {
    Catalog::from_path(path).with_context(|| format!("Failed to load catalog {}", path.display()))
}

fn ensure_newline(mut output: String) -> String {
    if !output.ends_with('\n') {
        output.push('\n');
    }
    output
}
