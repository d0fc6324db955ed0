//! Probe building and submission (the dispatcher).
//!
//! The submission phase walks the catalog once, in order. For each site it
//! either rejects the username outright (`Illegal`, no network call) or
//! builds the probe request and spawns it onto the bounded worker pool,
//! keeping the returned handle for the collection phase. Submission never
//! waits on network I/O: pool permits are acquired inside the spawned task.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};
use rand::seq::IndexedRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::RequestBuilder;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::classify::{categorize_request_error, FailureKind};
use crate::catalog::{Catalog, Site};
use crate::config::{MAX_WORKERS, USER_AGENTS};
use crate::transport::Connection;

/// Why a spawned probe produced no response.
#[derive(Error, Debug)]
pub(crate) enum ProbeError {
    /// The request failed in transit.
    #[error(transparent)]
    Request(#[from] reqwest::Error),

    /// The worker pool was torn down before the probe ran.
    #[error("worker pool closed before the probe ran")]
    PoolClosed,

    /// The probe task panicked.
    #[error("probe task panicked")]
    Panicked,
}

impl ProbeError {
    pub(crate) fn failure_kind(&self) -> FailureKind {
        match self {
            ProbeError::Request(e) => categorize_request_error(e),
            ProbeError::PoolClosed | ProbeError::Panicked => FailureKind::Unknown,
        }
    }
}

/// A successfully completed network call, before classification.
pub(crate) struct FetchedResponse {
    pub status: u16,
    pub body: String,
}

/// What a spawned probe task resolves to.
pub(crate) struct FetchReply {
    pub result: Result<FetchedResponse, ProbeError>,
    /// Wall-clock time from submission to a complete response. Absent when
    /// the call failed before completing.
    pub elapsed: Option<Duration>,
}

/// Per-site output of the submission phase.
pub(crate) enum Submission {
    /// The username failed the site's format filter; nothing was sent.
    Illegal,
    /// A probe is in flight (or already finished) on the worker pool.
    InFlight(JoinHandle<FetchReply>),
}

/// Submits probes for every eligible site, in catalog order.
///
/// Returns one [`Submission`] per site, index-aligned with the catalog.
/// When the connection rotates identity, rotation is requested right after
/// each submission, still inside this single pass.
pub(crate) async fn submit_all(
    username: &str,
    catalog: &Catalog,
    connection: &Connection,
    timeout: Option<Duration>,
) -> Vec<Submission> {
    let workers = MAX_WORKERS.min(catalog.len()).max(1);
    let pool = Arc::new(Semaphore::new(workers));
    debug!(
        "Submitting {} probes for '{}' over {} workers",
        catalog.len(),
        username,
        workers
    );

    let mut submissions = Vec::with_capacity(catalog.len());
    for site in catalog.iter() {
        if !site.accepts(username) {
            debug!("'{}' rejected by {} username filter", username, site.name);
            submissions.push(Submission::Illegal);
            continue;
        }

        let request = build_probe(connection, site, username, timeout);
        let pool = Arc::clone(&pool);
        // Submission-time start: latency includes any wait for a pool permit,
        // mirroring how in-flight time is observed by the caller.
        let started = Instant::now();
        let handle = tokio::spawn(async move {
            let _permit = match pool.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return FetchReply {
                        result: Err(ProbeError::PoolClosed),
                        elapsed: None,
                    }
                }
            };
            match execute(request).await {
                Ok(response) => FetchReply {
                    elapsed: Some(started.elapsed()),
                    result: Ok(response),
                },
                Err(e) => FetchReply {
                    result: Err(e),
                    elapsed: None,
                },
            }
        });
        submissions.push(Submission::InFlight(handle));

        // Serialized with submission by construction: only this pass calls it.
        connection.rotate_identity().await;
    }
    submissions
}

/// Builds one probe request: method and redirect policy from the site's
/// rule, a rotated User-Agent overridden by site headers, optional deadline.
fn build_probe(
    connection: &Connection,
    site: &Site,
    username: &str,
    timeout: Option<Duration>,
) -> RequestBuilder {
    let client = connection.client_for(&site.rule);
    let url = site.probe_url(username);
    let mut request = if site.rule.uses_head() {
        client.head(&url)
    } else {
        client.get(&url)
    };
    // Site headers are merged over the rotated default, so a site that pins
    // its own User-Agent wins.
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(random_user_agent()) {
        headers.insert(USER_AGENT, value);
    }
    for (name, value) in &site.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!("Ignoring invalid header '{name}' for {}", site.name),
        }
    }
    request = request.headers(headers);
    if let Some(deadline) = timeout {
        request = request.timeout(deadline);
    }
    request
}

/// Runs the network call and materializes the response.
async fn execute(request: RequestBuilder) -> Result<FetchedResponse, ProbeError> {
    let response = request.send().await?;
    let status = response.status().as_u16();
    // A body that fails to decode is treated as empty, like a HEAD response.
    let body = response.text().await.unwrap_or_default();
    Ok(FetchedResponse { status, body })
}

fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}
