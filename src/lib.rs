//! venor library: find usernames across social networks.
//!
//! The core is a concurrent probing-and-classification engine: given a
//! catalog of site descriptors, it launches one HTTP probe per site under a
//! bounded worker pool, interprets each response with the site's
//! classification rule, and returns a uniform, catalog-ordered result set.
//! Probes can go out directly, through a proxy, or over Tor with optional
//! per-request circuit rotation.
//!
//! # Example
//!
//! ```no_run
//! use venor::{catalog, check_username, RunOptions, SilentNotify, TransportMode};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let sites = catalog::load("resources/data.json").await?;
//! let options = RunOptions {
//!     transport: TransportMode::Direct,
//!     timeout: Some(std::time::Duration::from_secs(10)),
//! };
//! let results = check_username("alice", &sites, &options, &SilentNotify).await?;
//! for outcome in results.claimed() {
//!     println!("{}: {}", outcome.site, outcome.url_user);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod catalog;
pub mod config;
pub mod initialization;
pub mod notify;
pub mod probe;
pub mod report;
pub mod transport;

// Re-export public API
pub use notify::{ConsoleNotify, Notify, SilentNotify};
pub use probe::{FailureKind, ProbeOutcome, QueryStatus, ResultSet};
pub use run::{check_username, check_username_over, RunOptions};
pub use transport::{Connection, TransportMode};

// Internal run module (orchestrates the two-phase engine)
mod run {
    use std::time::Duration;

    use anyhow::{Context, Result};
    use log::info;

    use crate::catalog::Catalog;
    use crate::notify::Notify;
    use crate::probe::{self, FailureStats, ResultSet};
    use crate::transport::{Connection, TransportMode};

    /// Options for one probing run.
    #[derive(Debug, Clone)]
    pub struct RunOptions {
        /// How probe traffic is routed.
        pub transport: TransportMode,
        /// Per-probe deadline; `None` means no deadline.
        pub timeout: Option<Duration>,
    }

    impl Default for RunOptions {
        fn default() -> Self {
            RunOptions {
                transport: TransportMode::Direct,
                timeout: None,
            }
        }
    }

    /// Checks one username against every site in the catalog.
    ///
    /// Opens a connection for the requested transport, runs the submission
    /// and collection phases, and returns the completed result set covering
    /// every site exactly once. Per-site network failures are reported as
    /// `Unknown` outcomes, never as errors.
    ///
    /// # Errors
    ///
    /// Fails only on whole-run configuration problems: the transport
    /// connection could not be opened.
    pub async fn check_username(
        username: &str,
        catalog: &Catalog,
        options: &RunOptions,
        notifier: &dyn Notify,
    ) -> Result<ResultSet> {
        let connection = Connection::open(&options.transport)
            .context("Failed to initialize the transport")?;
        check_username_over(username, catalog, &connection, options.timeout, notifier).await
    }

    /// Like [`check_username`], but over an already-open connection.
    ///
    /// Lets callers reuse one connection across usernames, or inject a
    /// connection with a substituted identity rotator.
    pub async fn check_username_over(
        username: &str,
        catalog: &Catalog,
        connection: &Connection,
        timeout: Option<Duration>,
        notifier: &dyn Notify,
    ) -> Result<ResultSet> {
        notifier.start(username);
        let stats = FailureStats::new();
        let results = probe::run_probes(username, catalog, connection, timeout, notifier, &stats).await;
        notifier.finish();

        stats.log_summary();
        info!(
            "Checked '{}' on {} sites: {} claimed, {} failures",
            username,
            results.len(),
            results.claimed().count(),
            stats.total()
        );
        Ok(results)
    }
}
