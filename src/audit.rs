use crate::{FileFailure, FileOutcome};
use chrono::{Local, SecondsFormat};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Append-only text log of every processed file.
///
/// Each entry holds a timestamp, the `input -> output` pair and the full list
/// of removals, followed by a blank line:
///
/// ```text
/// [2026-10-19T09:12:44+02:00] /in/a.pdf -> /out/a.pdf
/// (Trailer > Root) OpenAction: 5 0 R
/// 1 item(s) removed
/// ```
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a file that was sanitized, whether or not anything was removed.
    pub fn record_outcome(&self, outcome: &FileOutcome) -> io::Result<()> {
        let mut entry = header(&outcome.input, &outcome.output);
        for record in outcome.result.records() {
            entry.push_str(&record.to_string());
            entry.push('\n');
        }
        if outcome.result.changed() {
            entry.push_str(&format!("{} item(s) removed\n", outcome.result.len()));
        } else {
            entry.push_str("nothing to clean\n");
        }
        self.append(&entry)
    }

    /// Record a file that could not be sanitized.
    pub fn record_failure(&self, failure: &FileFailure) -> io::Result<()> {
        let output = failure.output.as_deref().unwrap_or_else(|| Path::new("-"));
        let mut entry = header(&failure.input, output);
        entry.push_str(&format!("failed: {}\n", failure.error));
        self.append(&entry)
    }

    fn append(&self, entry: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{entry}")
    }
}

fn header(input: &Path, output: &Path) -> String {
    format!(
        "[{}] {} -> {}\n",
        Local::now().to_rfc3339_opts(SecondsFormat::Secs, false),
        input.display(),
        output.display()
    )
}
