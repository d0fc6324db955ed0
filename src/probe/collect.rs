//! Result collection and aggregation.
//!
//! The collection phase makes one pass over the catalog, awaiting each
//! site's own pending handle, classifying, and notifying. Notification
//! order therefore always equals catalog order, whatever order the probes
//! actually completed in: a slow early site delays visibility of later
//! results, never their execution.

use log::warn;

use super::classify::classify;
use super::outcome::{ProbeOutcome, QueryStatus, ResultSet};
use super::request::{FetchReply, ProbeError, Submission};
use super::stats::FailureStats;
use crate::catalog::{Catalog, Site};
use crate::notify::Notify;

/// Collects every submission into a finalized [`ResultSet`], notifying the
/// sink once per site in catalog order.
pub(crate) async fn collect_all(
    username: &str,
    catalog: &Catalog,
    submissions: Vec<Submission>,
    notifier: &dyn Notify,
    stats: &FailureStats,
) -> ResultSet {
    let mut results = ResultSet::with_capacity(catalog.len());
    for (site, submission) in catalog.iter().zip(submissions) {
        let outcome = match submission {
            Submission::Illegal => illegal_outcome(username, site),
            Submission::InFlight(handle) => {
                let reply = match handle.await {
                    Ok(reply) => reply,
                    Err(join_error) => {
                        warn!("Probe task for {} panicked: {join_error:?}", site.name);
                        FetchReply {
                            result: Err(ProbeError::Panicked),
                            elapsed: None,
                        }
                    }
                };
                finalize(username, site, reply, stats)
            }
        };
        notifier.update(&outcome);
        results.push(outcome);
    }
    results
}

/// Terminal outcome for a username the site's filter rejected.
fn illegal_outcome(username: &str, site: &Site) -> ProbeOutcome {
    ProbeOutcome {
        username: username.to_string(),
        site: site.name.clone(),
        url_main: site.url_main.clone(),
        url_user: site.user_url(username),
        status: QueryStatus::Illegal,
        http_status: None,
        response_body: String::new(),
        latency: None,
        failure: None,
    }
}

/// Classifies one completed (or failed) probe into its outcome.
fn finalize(username: &str, site: &Site, reply: FetchReply, stats: &FailureStats) -> ProbeOutcome {
    let mut outcome = ProbeOutcome {
        username: username.to_string(),
        site: site.name.clone(),
        url_main: site.url_main.clone(),
        url_user: site.user_url(username),
        status: QueryStatus::Unknown,
        http_status: None,
        response_body: String::new(),
        latency: reply.elapsed,
        failure: None,
    };
    match reply.result {
        Ok(response) => {
            outcome.status = classify(&site.rule, response.status, &response.body);
            outcome.http_status = Some(response.status);
            outcome.response_body = response.body;
        }
        Err(error) => {
            let kind = error.failure_kind();
            warn!("Probe for {} failed ({}): {error}", site.name, kind.as_str());
            stats.record(kind);
            outcome.failure = Some(kind);
        }
    }
    outcome
}
