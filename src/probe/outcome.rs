//! Probe outcome and result-set types.

use std::time::Duration;

use strum_macros::EnumIter as EnumIterMacro;

use super::classify::FailureKind;

/// Terminal verdict for one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum QueryStatus {
    /// The username exists at the site.
    Claimed,
    /// The username does not exist at the site.
    Available,
    /// The verdict could not be determined (network or proxy failure).
    Unknown,
    /// The username does not satisfy the site's allowed format; no request
    /// was made.
    Illegal,
}

impl QueryStatus {
    /// Stable string form, used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Claimed => "Claimed",
            QueryStatus::Available => "Available",
            QueryStatus::Unknown => "Unknown",
            QueryStatus::Illegal => "Illegal",
        }
    }
}

impl std::fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finalized result of probing one site for one username.
///
/// Built across the run's two phases and immutable once the collection
/// phase has notified it.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    /// The username that was probed.
    pub username: String,
    /// Site name, the catalog key.
    pub site: String,
    /// The site's landing page.
    pub url_main: String,
    /// The resolved profile URL for this username.
    pub url_user: String,
    /// Terminal verdict.
    pub status: QueryStatus,
    /// HTTP status code, when a response arrived.
    pub http_status: Option<u16>,
    /// Response body, empty when none arrived.
    pub response_body: String,
    /// Wall-clock duration of the network call. Absent when the call never
    /// executed (illegal username) or failed before completing.
    pub latency: Option<Duration>,
    /// Failure category, present exactly when `status` is `Unknown`.
    pub failure: Option<FailureKind>,
}

impl ProbeOutcome {
    /// Human-readable failure category, present only for `Unknown` results.
    pub fn error_context(&self) -> Option<&'static str> {
        self.failure.map(|f| f.as_str())
    }

    /// Latency in seconds, for reports.
    pub fn latency_secs(&self) -> Option<f64> {
        self.latency.map(|d| d.as_secs_f64())
    }
}

/// Results of one run, in catalog order.
///
/// Handed to the caller only after the collection phase completes; never
/// mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    entries: Vec<ProbeOutcome>,
}

impl ResultSet {
    pub(crate) fn with_capacity(n: usize) -> Self {
        ResultSet {
            entries: Vec::with_capacity(n),
        }
    }

    pub(crate) fn push(&mut self, outcome: ProbeOutcome) {
        self.entries.push(outcome);
    }

    /// Number of probed sites.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the run produced no results.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates outcomes in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &ProbeOutcome> {
        self.entries.iter()
    }

    /// Looks up the outcome for a site by name.
    pub fn get(&self, site: &str) -> Option<&ProbeOutcome> {
        self.entries.iter().find(|o| o.site == site)
    }

    /// Iterates only the sites where the username was found.
    pub fn claimed(&self) -> impl Iterator<Item = &ProbeOutcome> {
        self.entries
            .iter()
            .filter(|o| o.status == QueryStatus::Claimed)
    }
}
