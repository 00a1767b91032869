//! Server report export.
//!
//! The report is the server table as HTML saved with an `.xls` extension,
//! which spreadsheet applications open as a sheet.

use super::error::ReportError;
use crate::model::ServerRecord;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::info;

pub const REPORT_FILE_NAME: &str = "server-report.xls";

static HTML_SPECIAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[&<>"']"#).expect("escape pattern is valid"));

fn escape_html(text: &str) -> String {
    HTML_SPECIAL
        .replace_all(text, |caps: &Captures| match &caps[0] {
            "&" => "&amp;",
            "<" => "&lt;",
            ">" => "&gt;",
            "\"" => "&quot;",
            _ => "&#39;",
        })
        .into_owned()
}

pub fn render_report(records: &[ServerRecord]) -> String {
    let mut html = String::from(
        "<table id=\"servers\">\n<thead>\n<tr><th>ID</th><th>IP Address</th><th>Name</th>\
         <th>Memory</th><th>Type</th><th>Status</th><th>Last Ping</th></tr>\n</thead>\n<tbody>\n",
    );
    for record in records {
        let last_ping = record
            .last_ping
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            record.id,
            escape_html(&record.address),
            escape_html(&record.name),
            escape_html(&record.memory),
            escape_html(&record.server_type),
            record.status.label(),
            last_ping,
        ));
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

/// Download directory, then home, then the working directory.
pub fn default_report_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Writes the report into `dir` and returns the file path.
pub fn export_report(records: &[ServerRecord], dir: &Path) -> Result<PathBuf, ReportError> {
    let path = dir.join(REPORT_FILE_NAME);
    std::fs::create_dir_all(dir)
        .and_then(|_| std::fs::write(&path, render_report(records)))
        .map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;
    info!(path = %path.display(), rows = records.len(), "report exported");
    Ok(path)
}
