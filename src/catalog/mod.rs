//! Site catalog: target descriptors and catalog loading.
//!
//! A catalog maps site names to everything the engine needs to probe one
//! site: URL templates, extra headers, the classification rule, and an
//! optional username filter. Iteration order is the order sites appear in
//! the catalog file, and every ordering guarantee downstream (submission,
//! notification, reports) derives from it.

mod load;

use std::collections::HashMap;

use regex::Regex;
use thiserror::Error;

pub use load::load;

/// How a completed probe is turned into an existence verdict.
///
/// The rule also determines the HTTP method (HEAD is permitted only for
/// `StatusCode` with `head_only`) and whether redirects are followed
/// (only for `ResponseUrl`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifyRule {
    /// The response body is searched for the given needles; if any needle is
    /// present the username is available, otherwise it is claimed.
    Message {
        /// Substrings whose presence in the body means "no such user".
        /// Matching is case-sensitive and short-circuits on the first hit.
        needles: Vec<String>,
    },
    /// A 2xx status code means the username is claimed.
    StatusCode {
        /// Probe with HEAD instead of GET. Defaults to true in catalog files.
        head_only: bool,
    },
    /// A 2xx status code after following redirects means claimed.
    ResponseUrl,
}

impl ClassifyRule {
    /// Whether probes for this rule follow redirects.
    pub fn follows_redirects(&self) -> bool {
        matches!(self, ClassifyRule::ResponseUrl)
    }

    /// Whether probes for this rule use HEAD instead of GET.
    pub fn uses_head(&self) -> bool {
        matches!(self, ClassifyRule::StatusCode { head_only: true })
    }
}

/// One probing target: a social network profile endpoint.
#[derive(Debug, Clone)]
pub struct Site {
    /// Unique site name, the catalog key.
    pub name: String,
    /// Landing page of the site, reported alongside results.
    pub url_main: String,
    /// Profile URL template with one `{}` slot for the username.
    pub url: String,
    /// Optional separate probe URL template; defaults to `url`.
    pub url_probe: Option<String>,
    /// Extra request headers, merged over the engine defaults.
    pub headers: HashMap<String, String>,
    /// Classification rule for this site.
    pub rule: ClassifyRule,
    /// Usernames not matching this pattern are rejected without a request.
    pub username_filter: Option<Regex>,
}

impl Site {
    /// Resolves the profile URL for a username.
    pub fn user_url(&self, username: &str) -> String {
        self.url.replace("{}", username)
    }

    /// Resolves the URL actually probed for a username.
    pub fn probe_url(&self, username: &str) -> String {
        self.url_probe
            .as_deref()
            .unwrap_or(&self.url)
            .replace("{}", username)
    }

    /// Whether this site accepts the username format at all.
    pub fn accepts(&self, username: &str) -> bool {
        self.username_filter
            .as_ref()
            .is_none_or(|re| re.is_match(username))
    }
}

/// Errors raised while loading or filtering a site catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// The remote catalog could not be fetched.
    #[error("Failed to fetch catalog: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The catalog is not valid JSON of the expected shape.
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// The catalog contained no usable sites.
    #[error("Catalog contains no usable sites")]
    Empty,

    /// A `--site` filter matched nothing.
    #[error("Sites not found: {0}")]
    SitesNotFound(String),
}

/// An ordered collection of sites, keyed by name.
///
/// Order is catalog-file order and is the canonical iteration order for a
/// run: probes are submitted and results notified in this order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    sites: Vec<Site>,
}

impl Catalog {
    /// Builds a catalog from an already ordered list of sites.
    pub fn from_sites(sites: Vec<Site>) -> Self {
        Catalog { sites }
    }

    /// Number of sites in the catalog.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Iterates sites in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Site> {
        self.sites.iter()
    }

    /// Looks up a site by exact name.
    pub fn get(&self, name: &str) -> Option<&Site> {
        self.sites.iter().find(|s| s.name == name)
    }

    /// Restricts the catalog to the named sites, case-insensitively.
    ///
    /// Relative order of the kept sites is preserved. Names that match no
    /// site are reported together in a single error.
    pub fn filter(&self, names: &[String]) -> Result<Catalog, CatalogError> {
        let mut kept: Vec<Site> = Vec::new();
        let mut missing = Vec::new();
        for name in names {
            // A name given twice matched the first time around.
            let mut matched = kept.iter().any(|s| s.name.eq_ignore_ascii_case(name));
            for site in &self.sites {
                if site.name.eq_ignore_ascii_case(name)
                    && !kept.iter().any(|s| s.name == site.name)
                {
                    kept.push(site.clone());
                    matched = true;
                }
            }
            if !matched {
                missing.push(format!("'{name}'"));
            }
        }
        if !missing.is_empty() {
            return Err(CatalogError::SitesNotFound(missing.join(", ")));
        }
        // Keep catalog-file order, not the order the names were given in.
        let mut filtered: Vec<Site> = self
            .sites
            .iter()
            .filter(|s| kept.iter().any(|k| k.name == s.name))
            .cloned()
            .collect();
        filtered.dedup_by(|a, b| a.name == b.name);
        Ok(Catalog { sites: filtered })
    }
}
