//! Result reports: plain-text existence report and CSV export.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use csv::Writer;

use crate::probe::ResultSet;

/// Writes the plain-text existence report: one claimed profile URL per line
/// plus a closing total. Returns how many sites claimed the username.
///
/// # Errors
///
/// Fails if the file cannot be created or written.
pub fn write_text_report(path: &Path, results: &ResultSet) -> Result<usize> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    let mut exists_counter = 0usize;
    for outcome in results.claimed() {
        writeln!(file, "{}", outcome.url_user)?;
        exists_counter += 1;
    }
    writeln!(
        file,
        "Total Websites Username Detected On : {exists_counter}"
    )?;
    Ok(exists_counter)
}

/// Writes the tabular CSV export, one row per site in catalog order.
///
/// Columns: `username,name,url_main,url_user,exists,http_status,response_time_s`.
/// The status cell holds `?` and the latency cell is empty when the probe
/// never completed.
///
/// # Errors
///
/// Fails if the file cannot be created or a row cannot be serialized.
pub fn write_csv_report(path: &Path, results: &ResultSet) -> Result<()> {
    let mut writer = Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    writer.write_record([
        "username",
        "name",
        "url_main",
        "url_user",
        "exists",
        "http_status",
        "response_time_s",
    ])?;
    for outcome in results.iter() {
        writer.write_record([
            outcome.username.as_str(),
            outcome.site.as_str(),
            outcome.url_main.as_str(),
            outcome.url_user.as_str(),
            outcome.status.as_str(),
            &outcome
                .http_status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "?".to_string()),
            &outcome
                .latency_secs()
                .map(|s| format!("{s}"))
                .unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
