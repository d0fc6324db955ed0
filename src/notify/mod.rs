//! Result notification sinks.
//!
//! The engine reports progress through the three-method [`Notify`] contract
//! and knows nothing about formatting. [`ConsoleNotify`] is the interactive
//! implementation; tests substitute recording sinks.

use colored::Colorize;

use crate::probe::{ProbeOutcome, QueryStatus};

/// Notification sink for a run.
///
/// `update` is called exactly once per site, in catalog order, after the
/// site's outcome is finalized.
pub trait Notify: Send + Sync {
    /// A run for this username is starting.
    fn start(&self, username: &str);
    /// One site's outcome is final.
    fn update(&self, outcome: &ProbeOutcome);
    /// The run finished; no further updates will arrive.
    fn finish(&self);
}

/// Console notifier with colored `[+]`/`[-]` result lines.
pub struct ConsoleNotify {
    verbose: bool,
    print_all: bool,
}

impl ConsoleNotify {
    /// Creates a console notifier.
    ///
    /// `verbose` appends response times, `print_all` also prints sites where
    /// the username was not found, and `color` globally toggles ANSI colors.
    pub fn new(verbose: bool, print_all: bool, color: bool) -> Self {
        if !color {
            colored::control::set_override(false);
        }
        ConsoleNotify { verbose, print_all }
    }

    fn latency_suffix(&self, outcome: &ProbeOutcome) -> String {
        match outcome.latency_secs() {
            Some(secs) if self.verbose => format!(" [{:.0} ms]", secs * 1000.0),
            _ => String::new(),
        }
    }
}

impl Notify for ConsoleNotify {
    fn start(&self, username: &str) {
        println!(
            "{}{}{} Checking username {} on:",
            "[".white(),
            "*".green(),
            "]".white(),
            username.bright_white()
        );
    }

    fn update(&self, outcome: &ProbeOutcome) {
        let marker_found = format!("{}{}{}", "[".white(), "+".green(), "]".white());
        let marker_miss = format!("{}{}{}", "[".white(), "-".red(), "]".white());
        match outcome.status {
            QueryStatus::Claimed => {
                println!(
                    "{} {}: {}{}",
                    marker_found,
                    outcome.site.green(),
                    outcome.url_user,
                    self.latency_suffix(outcome)
                );
            }
            QueryStatus::Available if self.print_all => {
                println!(
                    "{} {}: {}{}",
                    marker_miss,
                    outcome.site.green(),
                    "Not Found!".yellow(),
                    self.latency_suffix(outcome)
                );
            }
            QueryStatus::Unknown if self.print_all => {
                let context = outcome.error_context().unwrap_or("Unknown Error");
                println!("{} {}: {}", marker_miss, outcome.site.green(), context.red());
            }
            QueryStatus::Illegal if self.print_all => {
                println!(
                    "{} {}: {}",
                    marker_miss,
                    outcome.site.green(),
                    "Illegal Username Format For This Site!".yellow()
                );
            }
            _ => {}
        }
    }

    fn finish(&self) {
        println!("Search completed.");
    }
}

/// Notifier that drops everything. Useful for library callers that only
/// want the returned result set.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotify;

impl Notify for SilentNotify {
    fn start(&self, _username: &str) {}
    fn update(&self, _outcome: &ProbeOutcome) {}
    fn finish(&self) {}
}
