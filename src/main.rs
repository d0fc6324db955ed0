//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `venor` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Catalog loading and `--site` filtering
//! - Per-username report files
//!
//! All core functionality is implemented in the library crate.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use venor::config::{Opt, LOCAL_DATA_PATH};
use venor::initialization::init_logger_with;
use venor::{catalog, report, check_username, ConsoleNotify, RunOptions, TransportMode};

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();

    init_logger_with(opt.log_level.clone().into()).context("Failed to initialize logger")?;

    // Contradictory transport options abort before any probe is built.
    let transport = TransportMode::from_options(opt.tor, opt.unique_tor, opt.proxy.as_deref())?;

    let source = if opt.local {
        LOCAL_DATA_PATH.to_string()
    } else {
        opt.json_file
            .clone()
            .unwrap_or_else(|| LOCAL_DATA_PATH.to_string())
    };
    let mut sites = catalog::load(&source)
        .await
        .with_context(|| format!("Failed to load site catalog from {source}"))?;
    if !opt.sites.is_empty() {
        sites = sites.filter(&opt.sites)?;
    }

    let notifier = ConsoleNotify::new(opt.verbose, opt.print_all, !opt.no_color);
    let options = RunOptions {
        transport,
        timeout: opt.timeout.map(Duration::from_secs_f64),
    };

    for username in &opt.usernames {
        let results = check_username(username, &sites, &options, &notifier).await?;

        let report_path = if let Some(output) = &opt.output {
            output.clone()
        } else if let Some(folder) = &opt.folderoutput {
            std::fs::create_dir_all(folder)
                .with_context(|| format!("Failed to create output folder {}", folder.display()))?;
            folder.join(format!("{username}.txt"))
        } else {
            PathBuf::from(format!("{username}.txt"))
        };
        let found = report::write_text_report(&report_path, &results)?;
        log::debug!(
            "Wrote {} claimed sites for '{}' to {}",
            found,
            username,
            report_path.display()
        );

        if opt.csv {
            report::write_csv_report(&PathBuf::from(format!("{username}.csv")), &results)?;
        }

        println!();
    }

    Ok(())
}
