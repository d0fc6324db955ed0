//! Configuration constants.
//!
//! Defaults for the probing engine: worker-pool cap, Tor endpoints, the
//! bundled catalog path, and the User-Agent rotation pool.

use std::time::Duration;

/// Upper bound on concurrent in-flight probes.
///
/// The effective pool size for a run is `min(MAX_WORKERS, site count)`, so
/// small catalogs never allocate more permits than they can use.
pub const MAX_WORKERS: usize = 20;

/// SOCKS5 endpoint of a locally running Tor client.
///
/// The `socks5h` scheme routes DNS resolution through the proxy as well,
/// which is required for Tor (leaking DNS defeats the point).
pub const TOR_SOCKS_PROXY: &str = "socks5h://127.0.0.1:9050";

/// Tor control-port address used to request a fresh circuit (SIGNAL NEWNYM).
pub const TOR_CONTROL_ADDR: &str = "127.0.0.1:9051";

/// Cap on a single control-port rotation attempt. Rotation is best-effort;
/// once this elapses the submission loop moves on regardless.
pub const TOR_ROTATE_TIMEOUT: Duration = Duration::from_secs(5);

/// Bundled site catalog, relative to the working directory.
pub const LOCAL_DATA_PATH: &str = "resources/data.json";

/// User-Agent rotation pool.
///
/// One entry is chosen at random per probe and merged under any site-specific
/// headers, so a site that pins its own `User-Agent` wins.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
];
