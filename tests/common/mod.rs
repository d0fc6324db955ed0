//! Shared test support: catalog builders, recording sinks, and a minimal
//! hand-rolled HTTP stub server for behaviors httptest cannot express
//! (response delays, connection counting, refused connections).

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use venor::catalog::{Catalog, ClassifyRule, Site};
use venor::{Notify, ProbeOutcome};

/// Builds a site probing the given URL with the given rule and no filter.
pub fn site(name: &str, url: &str, rule: ClassifyRule) -> Site {
    Site {
        name: name.to_string(),
        url_main: url.trim_end_matches("{}").to_string(),
        url: url.to_string(),
        url_probe: None,
        headers: HashMap::new(),
        rule,
        username_filter: None,
    }
}

/// Convenience: a GET-based status-code site.
pub fn status_site(name: &str, url: &str) -> Site {
    site(name, url, ClassifyRule::StatusCode { head_only: false })
}

pub fn catalog(sites: Vec<Site>) -> Catalog {
    Catalog::from_sites(sites)
}

/// Notifier recording the order of callbacks.
#[derive(Default)]
pub struct RecordingNotify {
    events: Mutex<Vec<String>>,
}

impl RecordingNotify {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl Notify for RecordingNotify {
    fn start(&self, username: &str) {
        self.events.lock().unwrap().push(format!("start:{username}"));
    }

    fn update(&self, outcome: &ProbeOutcome) {
        self.events
            .lock()
            .unwrap()
            .push(format!("update:{}:{}", outcome.site, outcome.status));
    }

    fn finish(&self) {
        self.events.lock().unwrap().push("finish".to_string());
    }
}

/// Counters exposed by [`spawn_stub_server`].
#[derive(Default)]
pub struct StubCounters {
    in_flight: AtomicUsize,
    /// Highest number of simultaneously open requests observed.
    pub peak: AtomicUsize,
    /// Total requests served.
    pub total: AtomicUsize,
}

/// Spawns a minimal HTTP/1.1 server answering every request with the given
/// status and body after an optional delay. Returns its address and the
/// request counters.
pub async fn spawn_stub_server(
    delay: Duration,
    status: u16,
    body: &'static str,
) -> (SocketAddr, Arc<StubCounters>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let counters = Arc::new(StubCounters::default());
    let shared = Arc::clone(&counters);

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let counters = Arc::clone(&shared);
            tokio::spawn(async move {
                let current = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                counters.peak.fetch_max(current, Ordering::SeqCst);
                counters.total.fetch_add(1, Ordering::SeqCst);

                // Read until the end of the request head so the client does
                // not see a reset while still writing.
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                loop {
                    match stream.read(&mut chunk).await {
                        Ok(0) => break,
                        Ok(n) => {
                            buf.extend_from_slice(&chunk[..n]);
                            if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }

                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }

                let response = format!(
                    "HTTP/1.1 {status} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;

                counters.in_flight.fetch_sub(1, Ordering::SeqCst);
            });
        }
    });

    (addr, counters)
}

/// Finds a local port that refuses connections: bind, read the port, drop.
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
