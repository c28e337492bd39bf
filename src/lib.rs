//! # pdfscrub
//!
//! A Rust library for stripping active content out of PDF documents.
//!
//! ## What this crate does
//!
//! 1. **Walk the object graph**: starting from the trailer, the outline
//!    (bookmark) tree, the catalog and every page, each reachable dictionary is
//!    visited exactly once, however many paths lead to it and however cyclic
//!    the graph is.
//! 2. **Remove active content**: JavaScript, automatic actions (`/AA`),
//!    open actions, launch actions, and embedded or attached files are deleted
//!    from every visited dictionary. Nothing else is touched.
//! 3. **Keep an audit trail**: every removal is recorded with a readable
//!    location such as `Page 3 > Annots[0]`, the key, and the removed value.
//! 4. **Write only when needed**: a document with nothing to remove is never
//!    re-serialized.
//!
//! ## Quick example
//!
//! ```no_run
//! use pdfscrub::PdfCleaner;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cleaned = PdfCleaner::from_path("suspicious.pdf")?.clean()?;
//!
//! for record in cleaned.result().records() {
//!     println!("{record}");
//! }
//!
//! if cleaned.changed() {
//!     cleaned.save("clean.pdf")?;
//! }
//! # Ok(())
//! # }
//! ```

use lopdf::ObjectId;
use std::path::PathBuf;
use thiserror::Error;

mod audit;
mod batch;
mod cleaner;
mod engine;
mod outline;
pub mod pdf_utils;
mod policy;
mod record;
mod validator;
mod walker;

pub use audit::AuditLog;
pub use batch::{run, scrub_file, BatchReport, FileFailure, FileOutcome};
pub use cleaner::{CleanedDocument, PdfCleaner};
pub use engine::DocumentSanitizer;
pub use policy::{ACTION_KEY, LAUNCH_ACTION, REMOVED_KEYS};
pub use record::{RemovalRecord, RemovalSink, SanitizationResult};

// ── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration for [`PdfCleaner`] and [`DocumentSanitizer`].
#[derive(Debug, Clone, Default)]
pub struct CleanerConfig {
    /// When `true`, every `/A` action dictionary is removed from its parent,
    /// not only confirmed `/Launch` actions. This also strips harmless
    /// navigation actions such as `/GoTo` and `/URI`.
    pub strip_all_actions: bool,

    /// If set, every processed file appends an entry (timestamp, paths and
    /// the full removal summary) to this file.
    pub audit_log: Option<PathBuf>,
}

// ── Error type ───────────────────────────────────────────────────────────────

/// Every error that this crate can produce.
#[derive(Error, Debug)]
pub enum ScrubError {
    /// The input path names neither a file nor a directory.
    #[error("Input file does not exist: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The destination already exists; it is never overwritten.
    #[error("Output file already exists: {}", .0.display())]
    OutputAlreadyExists(PathBuf),

    /// Input and output resolve to the same file (compared case-insensitively).
    #[error("Input and output file is not allowed to be the same file: {}", .0.display())]
    SameInputOutputPath(PathBuf),

    /// The input is a directory but the output is not.
    #[error("Input path was a folder, but output path was not a folder: {}", .0.display())]
    InputOutputTypeMismatch(PathBuf),

    /// The underlying lopdf codec failed to parse or serialize the document.
    #[error("PDF codec error: {0}")]
    Codec(#[from] lopdf::Error),

    /// A reference points at an object that is not in the document.
    #[error("PDF codec error: object {number} {generation} R is referenced but missing")]
    MissingObject { number: u32, generation: u16 },

    /// A filesystem I/O error occurred (e.g. when writing the output file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ScrubError>;

impl ScrubError {
    pub(crate) fn missing_object((number, generation): ObjectId) -> Self {
        ScrubError::MissingObject { number, generation }
    }
}
