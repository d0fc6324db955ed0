//! Transport provider: how probes reach the network.
//!
//! A run opens one [`Connection`] and shares it across every probe. The
//! connection carries two `reqwest` clients because redirect policy is a
//! client-level setting: one client never follows redirects (used by the
//! `Message` and `StatusCode` rules) and one follows them (used by
//! `ResponseUrl`). Anonymized mode routes both clients through a local Tor
//! SOCKS proxy and, when per-request rotation is requested, attaches an
//! [`IdentityRotator`] that the dispatcher invokes after each submission.

mod tor;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::warn;
use reqwest::{Client, ClientBuilder, Proxy};
use thiserror::Error;

use crate::catalog::ClassifyRule;
use crate::config::{TOR_ROTATE_TIMEOUT, TOR_SOCKS_PROXY};

pub use tor::TorControl;

/// Maximum redirect hops for the redirect-following client.
const MAX_REDIRECT_HOPS: usize = 10;

/// How probe traffic is routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportMode {
    /// Plain direct connections.
    Direct,
    /// All probes go through the given proxy URL.
    Proxied(String),
    /// All probes go through a local Tor client.
    Anonymized {
        /// Request a fresh circuit after each probe submission.
        rotate_per_request: bool,
    },
}

impl TransportMode {
    /// Derives the transport mode from the CLI flags.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ConflictingOptions`] when both Tor and a
    /// proxy are requested. This is a caller configuration error and is
    /// detected before any probe is built.
    pub fn from_options(
        tor: bool,
        unique_tor: bool,
        proxy: Option<&str>,
    ) -> Result<Self, TransportError> {
        if (tor || unique_tor) && proxy.is_some() {
            return Err(TransportError::ConflictingOptions);
        }
        Ok(if tor || unique_tor {
            TransportMode::Anonymized {
                rotate_per_request: unique_tor,
            }
        } else if let Some(proxy) = proxy {
            TransportMode::Proxied(proxy.to_string())
        } else {
            TransportMode::Direct
        })
    }
}

/// Errors raised while setting up or operating the transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Tor and an explicit proxy were requested at the same time.
    #[error("Tor and Proxy cannot be used simultaneously.")]
    ConflictingOptions,

    /// The HTTP client could not be built (bad proxy URL, TLS setup, ...).
    #[error("HTTP client initialization error: {0}")]
    ClientBuild(#[from] reqwest::Error),

    /// The Tor control port rejected a command or could not be reached.
    #[error("Tor control error: {0}")]
    TorControl(String),

    /// I/O failure talking to the Tor control port.
    #[error("Tor control I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Requests a fresh network identity between probes.
///
/// The production implementation is [`TorControl`]; tests substitute a
/// counting double.
#[async_trait]
pub trait IdentityRotator: Send + Sync {
    /// Requests a new circuit. Implementations should return quickly; the
    /// dispatcher treats failures as non-fatal.
    async fn rotate(&self) -> Result<(), TransportError>;
}

/// Connection context shared by all probes of a run.
pub struct Connection {
    plain_client: Client,
    redirect_client: Client,
    rotator: Option<Arc<dyn IdentityRotator>>,
}

impl Connection {
    /// Opens a connection context for the given transport mode.
    ///
    /// # Errors
    ///
    /// Fails if either underlying HTTP client cannot be built, for example
    /// when a proxy URL does not parse.
    pub fn open(mode: &TransportMode) -> Result<Connection, TransportError> {
        let plain_client = builder_for(mode)?
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        let redirect_client = builder_for(mode)?
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECT_HOPS))
            .build()?;
        let rotator: Option<Arc<dyn IdentityRotator>> = match mode {
            TransportMode::Anonymized {
                rotate_per_request: true,
            } => Some(Arc::new(TorControl::default())),
            _ => None,
        };
        Ok(Connection {
            plain_client,
            redirect_client,
            rotator,
        })
    }

    /// Replaces the identity rotator. Used by tests to observe rotation
    /// without a running Tor client.
    pub fn with_rotator(mut self, rotator: Arc<dyn IdentityRotator>) -> Self {
        self.rotator = Some(rotator);
        self
    }

    /// Picks the client whose redirect policy matches the rule.
    pub fn client_for(&self, rule: &ClassifyRule) -> &Client {
        if rule.follows_redirects() {
            &self.redirect_client
        } else {
            &self.plain_client
        }
    }

    /// Whether this connection rotates identity between probes.
    pub fn rotates_identity(&self) -> bool {
        self.rotator.is_some()
    }

    /// Requests a fresh identity, best-effort.
    ///
    /// A no-op unless a rotator is attached. Failures and timeouts are
    /// logged and swallowed; a dead control port must not stop the
    /// submission pass.
    pub async fn rotate_identity(&self) {
        let Some(rotator) = &self.rotator else {
            return;
        };
        match tokio::time::timeout(TOR_ROTATE_TIMEOUT, rotator.rotate()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Identity rotation failed: {e}"),
            Err(_) => warn!(
                "Identity rotation timed out after {}s",
                TOR_ROTATE_TIMEOUT.as_secs()
            ),
        }
    }
}

/// Base client builder for a transport mode: proxy wiring plus the settings
/// shared by both clients.
fn builder_for(mode: &TransportMode) -> Result<ClientBuilder, TransportError> {
    let builder = ClientBuilder::new().connect_timeout(Duration::from_secs(10));
    Ok(match mode {
        TransportMode::Direct => builder,
        TransportMode::Proxied(url) => builder.proxy(Proxy::all(url)?),
        TransportMode::Anonymized { .. } => builder.proxy(Proxy::all(TOR_SOCKS_PROXY)?),
    })
}
