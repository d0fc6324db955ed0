//! Catalog loading from a local JSON file or a remote URL.
//!
//! The catalog format is a JSON object mapping site names to site records:
//!
//! ```json
//! {
//!   "GitHub": {
//!     "errorType": "status_code",
//!     "url": "https://github.com/{}",
//!     "urlMain": "https://github.com",
//!     "regexCheck": "^[a-zA-Z0-9](?:-?[a-zA-Z0-9]){0,38}$"
//!   }
//! }
//! ```
//!
//! Sites with an unknown `errorType`, a missing required field, or an
//! ill-formed `regexCheck` are dropped with a warning naming the site; a bad
//! entry never takes the rest of the catalog down with it.

use std::collections::HashMap;

use log::warn;
use regex::Regex;
use serde::Deserialize;

use super::{Catalog, CatalogError, ClassifyRule, Site};

/// `errorMsg` can be a single string or a list of strings; both mean the
/// same thing (substring containment, first match wins).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Needles {
    One(String),
    Many(Vec<String>),
}

impl From<Needles> for Vec<String> {
    fn from(n: Needles) -> Self {
        match n {
            Needles::One(s) => vec![s],
            Needles::Many(v) => v,
        }
    }
}

/// Raw catalog record as it appears on disk. Unknown fields are ignored so
/// catalogs carrying extra metadata still load.
#[derive(Debug, Deserialize)]
struct RawSite {
    #[serde(rename = "errorType")]
    error_type: Option<String>,
    #[serde(rename = "errorMsg")]
    error_msg: Option<Needles>,
    url: Option<String>,
    #[serde(rename = "urlMain")]
    url_main: Option<String>,
    #[serde(rename = "urlProbe")]
    url_probe: Option<String>,
    #[serde(rename = "regexCheck")]
    regex_check: Option<String>,
    headers: Option<HashMap<String, String>>,
    #[serde(rename = "request_head_only")]
    request_head_only: Option<bool>,
}

/// Loads a catalog from a local path or an `http(s)://` URL.
///
/// # Errors
///
/// Fails if the source cannot be read or is not valid JSON, or if no usable
/// site survives validation. Individually broken sites are dropped with a
/// warning instead of failing the load.
pub async fn load(source: &str) -> Result<Catalog, CatalogError> {
    let text = if source.starts_with("http://") || source.starts_with("https://") {
        reqwest::get(source).await?.error_for_status()?.text().await?
    } else {
        tokio::fs::read_to_string(source).await?
    };
    parse(&text)
}

/// Parses catalog JSON, preserving the file's site order.
fn parse(text: &str) -> Result<Catalog, CatalogError> {
    // serde_json's preserve_order feature keeps Map in insertion order, which
    // becomes the canonical iteration order for the whole run.
    let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(text)?;

    let mut sites = Vec::with_capacity(raw.len());
    for (name, value) in raw {
        let record: RawSite = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                warn!("Ignoring site '{name}': malformed record ({e})");
                continue;
            }
        };
        match build_site(&name, record) {
            Ok(site) => sites.push(site),
            Err(reason) => warn!("Ignoring site '{name}': {reason}"),
        }
    }

    if sites.is_empty() {
        return Err(CatalogError::Empty);
    }
    Ok(Catalog::from_sites(sites))
}

/// Validates one raw record into a `Site`, naming the first problem found.
fn build_site(name: &str, raw: RawSite) -> Result<Site, String> {
    let url = raw.url.ok_or("missing 'url'")?;
    let url_main = raw.url_main.ok_or("missing 'urlMain'")?;

    let rule = match raw.error_type.as_deref() {
        Some("message") => {
            let needles: Vec<String> = raw
                .error_msg
                .map(Into::into)
                .ok_or("errorType 'message' requires 'errorMsg'")?;
            if needles.is_empty() {
                return Err("errorType 'message' requires a non-empty 'errorMsg'".to_string());
            }
            ClassifyRule::Message { needles }
        }
        Some("status_code") => ClassifyRule::StatusCode {
            head_only: raw.request_head_only.unwrap_or(true),
        },
        Some("response_url") => ClassifyRule::ResponseUrl,
        Some(other) => return Err(format!("unknown errorType '{other}'")),
        None => return Err("missing 'errorType'".to_string()),
    };

    let username_filter = match raw.regex_check {
        Some(pattern) => Some(
            Regex::new(&pattern).map_err(|e| format!("invalid regexCheck '{pattern}': {e}"))?,
        ),
        None => None,
    };

    Ok(Site {
        name: name.to_string(),
        url_main,
        url,
        url_probe: raw.url_probe,
        headers: raw.headers.unwrap_or_default(),
        rule,
        username_filter,
    })
}
