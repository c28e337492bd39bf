use crate::pdf_utils;
use lopdf::Dictionary;
use std::fmt;

// ── RemovalRecord ────────────────────────────────────────────────────────────

/// One entry removed from a dictionary during sanitization.
///
/// Displays as `(<location>) <key>: <value>`, the format used both for the
/// console output and the audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalRecord {
    /// Human-readable path from a root, e.g. `"Page 3 > Annots[0]"`.
    pub location: String,

    /// The removed key, without the leading slash (e.g. `"OpenAction"`).
    pub key: String,

    /// The removed value in PDF syntax, or `"null"` for a null value.
    pub value: String,
}

impl fmt::Display for RemovalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {}: {}", self.location, self.key, self.value)
    }
}

// ── SanitizationResult ───────────────────────────────────────────────────────

/// The outcome of one sanitization pass.
///
/// Records are ordered by pass step (trailer, outlines, catalog, pages),
/// depth-first within each step.
#[derive(Debug, Clone, Default)]
pub struct SanitizationResult {
    records: Vec<RemovalRecord>,
}

impl SanitizationResult {
    pub(crate) fn from_records(records: Vec<RemovalRecord>) -> Self {
        Self { records }
    }

    /// Every removal, in the order it happened.
    pub fn records(&self) -> &[RemovalRecord] {
        &self.records
    }

    /// Returns `true` when at least one entry was removed.
    pub fn changed(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<RemovalRecord> {
        self.records
    }
}

// ── RemovalLog ───────────────────────────────────────────────────────────────

/// Callback invoked for every removal as soon as it happens.
pub type RemovalSink<'a> = &'a mut dyn FnMut(&RemovalRecord);

/// Append-only record of the removals made during one pass.
pub(crate) struct RemovalLog<'a> {
    records: Vec<RemovalRecord>,
    sink: Option<RemovalSink<'a>>,
}

impl<'a> RemovalLog<'a> {
    pub(crate) fn new(sink: Option<RemovalSink<'a>>) -> Self {
        Self {
            records: Vec::new(),
            sink,
        }
    }

    /// Remove `key` from `dict` if present and record it under `location`.
    ///
    /// Returns `true` when something was removed.
    pub(crate) fn take(&mut self, location: &str, dict: &mut Dictionary, key: &[u8]) -> bool {
        let Some(removed) = dict.remove(key) else {
            return false;
        };

        let record = RemovalRecord {
            location: location.to_owned(),
            key: String::from_utf8_lossy(key).into_owned(),
            value: pdf_utils::describe(&removed),
        };
        log::debug!("removed {record}");

        if let Some(sink) = self.sink.as_mut() {
            sink(&record);
        }
        self.records.push(record);
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn finish(self) -> SanitizationResult {
        SanitizationResult::from_records(self.records)
    }
}
