//! CLI option types and parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Command-line options.
#[derive(Debug, Parser)]
#[command(
    name = "venor",
    version,
    about = "Venor: Find Usernames Across Social Networks"
)]
pub struct Opt {
    /// One or more usernames to check
    #[arg(value_name = "USERNAMES", required = true)]
    pub usernames: Vec<String>,

    /// Display extra information per result (response times)
    #[arg(short, long)]
    pub verbose: bool,

    /// Save results to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Save results to a folder, one file per username
    #[arg(long, value_name = "DIR", conflicts_with = "output")]
    pub folderoutput: Option<PathBuf>,

    /// Make requests over Tor (requires a local Tor client)
    #[arg(short, long)]
    pub tor: bool,

    /// Use a new Tor circuit for each request
    #[arg(short, long)]
    pub unique_tor: bool,

    /// Also save results in CSV format
    #[arg(long)]
    pub csv: bool,

    /// Limit analysis to these sites (repeatable, case-insensitive)
    #[arg(long = "site", value_name = "SITE_NAME")]
    pub sites: Vec<String>,

    /// Make requests over a proxy, e.g. socks5://127.0.0.1:1080
    #[arg(short, long, value_name = "PROXY_URL")]
    pub proxy: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "TIMEOUT", value_parser = parse_timeout)]
    pub timeout: Option<f64>,

    /// Output all results, not just the sites where the username was found
    #[arg(long)]
    pub print_all: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Use the bundled resources/data.json catalog
    #[arg(short, long)]
    pub local: bool,

    /// Load the site catalog from this file or URL
    #[arg(long, value_name = "PATH_OR_URL")]
    pub json_file: Option<String>,

    /// Log level
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,
}

/// Validates the `--timeout` argument: must parse as a number greater than 0.
fn parse_timeout(value: &str) -> Result<f64, String> {
    let timeout: f64 = value
        .parse()
        .map_err(|_| format!("Timeout '{value}' must be a number."))?;
    if timeout <= 0.0 {
        return Err(format!("Timeout '{value}' must be greater than 0.0s."));
    }
    Ok(timeout)
}
