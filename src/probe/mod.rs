//! The probing engine: request dispatch, response classification, and
//! result aggregation.
//!
//! A run is a strict two-phase protocol over the catalog. The submission
//! phase walks sites in catalog order, short-circuiting illegal usernames
//! and spawning everything else onto a worker pool capped at
//! `min(20, site count)`. The collection phase walks the same order again,
//! awaiting each site's own handle, classifying the
//! result, and notifying the sink. Per-site failures become `Unknown`
//! results and never abort the run.

mod classify;
mod collect;
mod outcome;
mod request;
mod stats;

use std::time::Duration;

use crate::catalog::Catalog;
use crate::notify::Notify;
use crate::transport::Connection;

pub use classify::{categorize_request_error, classify, FailureKind};
pub use outcome::{ProbeOutcome, QueryStatus, ResultSet};
pub use stats::FailureStats;

/// Probes every site in the catalog for one username over an already-open
/// connection.
///
/// Runs the submission phase, then the collection phase, and returns the
/// completed result set; the notifier receives one `update` per site in
/// catalog order. Failure counts land in `stats`.
pub async fn run_probes(
    username: &str,
    catalog: &Catalog,
    connection: &Connection,
    timeout: Option<Duration>,
    notifier: &dyn Notify,
    stats: &FailureStats,
) -> ResultSet {
    let submissions = request::submit_all(username, catalog, connection, timeout).await;
    collect::collect_all(username, catalog, submissions, notifier, stats).await
}
