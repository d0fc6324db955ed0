//! Response classification.
//!
//! Turns a completed (or failed) probe into a [`QueryStatus`]. Network
//! failures are categorized first and short-circuit rule evaluation; a
//! successful response is interpreted by the site's classification rule.

use strum_macros::EnumIter as EnumIterMacro;

use super::outcome::QueryStatus;
use crate::catalog::ClassifyRule;

/// Failure categories for probes that never produced a usable response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum FailureKind {
    /// HTTP-level failure (bad status handling, redirect loop).
    Http,
    /// The configured proxy could not be used.
    Proxy,
    /// TCP/TLS connection could not be established.
    Connecting,
    /// The probe exceeded its deadline.
    Timeout,
    /// Anything else.
    Unknown,
}

impl FailureKind {
    /// The human-readable failure context attached to `Unknown` results.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Http => "HTTP Error",
            FailureKind::Proxy => "Proxy Error",
            FailureKind::Connecting => "Error Connecting",
            FailureKind::Timeout => "Timeout Error",
            FailureKind::Unknown => "Unknown Error",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categorizes a `reqwest::Error` into a [`FailureKind`].
///
/// Timeouts are checked first so a connect timeout counts as a timeout.
/// Connect failures through a proxy surface as connect errors in reqwest,
/// so the error chain is inspected to attribute them to the proxy.
pub fn categorize_request_error(error: &reqwest::Error) -> FailureKind {
    if error.is_timeout() {
        FailureKind::Timeout
    } else if error.is_connect() {
        if mentions_proxy(error) {
            FailureKind::Proxy
        } else {
            FailureKind::Connecting
        }
    } else if error.is_status() || error.is_redirect() {
        FailureKind::Http
    } else {
        FailureKind::Unknown
    }
}

/// Walks the error chain looking for proxy involvement.
fn mentions_proxy(error: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(error);
    while let Some(err) = source {
        let text = err.to_string().to_ascii_lowercase();
        if text.contains("proxy") || text.contains("socks") {
            return true;
        }
        source = err.source();
    }
    false
}

/// Applies a site's classification rule to a completed response.
///
/// `Message`: any needle present in the body means the site served its
/// "no such user" page, so the username is available. `StatusCode` and
/// `ResponseUrl` both read the status code: 2xx means claimed.
pub fn classify(rule: &ClassifyRule, http_status: u16, body: &str) -> QueryStatus {
    match rule {
        ClassifyRule::Message { needles } => {
            if needles.iter().any(|needle| body.contains(needle)) {
                QueryStatus::Available
            } else {
                QueryStatus::Claimed
            }
        }
        ClassifyRule::StatusCode { .. } | ClassifyRule::ResponseUrl => {
            if (200..300).contains(&http_status) {
                QueryStatus::Claimed
            } else {
                QueryStatus::Available
            }
        }
    }
}
