use crate::record::RemovalSink;
use crate::{CleanerConfig, DocumentSanitizer, Result, SanitizationResult};
use lopdf::Document;
use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::Path;

// ── PdfCleaner ────────────────────────────────────────────────────────────────

/// Entry point for sanitizing a single PDF.
///
/// # Creating a cleaner
///
/// ```no_run
/// use pdfscrub::{CleanerConfig, PdfCleaner};
///
/// // From a file path
/// let c = PdfCleaner::from_path("input.pdf").unwrap();
///
/// // From an in-memory buffer
/// let bytes = std::fs::read("input.pdf").unwrap();
/// let c = PdfCleaner::from_bytes(&bytes).unwrap();
///
/// // With custom configuration
/// let cfg = CleanerConfig {
///     strip_all_actions: true,
///     ..Default::default()
/// };
/// let c = PdfCleaner::with_config("input.pdf", cfg).unwrap();
/// ```
///
/// [`clean`](PdfCleaner::clean) consumes the cleaner, so each parsed document
/// is sanitized exactly once.
pub struct PdfCleaner {
    document: Document,
    config: CleanerConfig,
}

impl PdfCleaner {
    // ── Constructors ──────────────────────────────────────────────────────────

    /// Load a PDF from the file system.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_config(path, CleanerConfig::default())
    }

    /// Load a PDF from an in-memory byte slice.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(Self {
            document: Document::load_mem(data)?,
            config: CleanerConfig::default(),
        })
    }

    /// Load a PDF from the file system with a custom [`CleanerConfig`].
    pub fn with_config<P: AsRef<Path>>(path: P, config: CleanerConfig) -> Result<Self> {
        Ok(Self {
            document: Document::load(path)?,
            config,
        })
    }

    /// Wrap an already parsed document.
    pub fn from_document(document: Document, config: CleanerConfig) -> Self {
        Self { document, config }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// Returns a reference to the underlying [`lopdf::Document`].
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Returns a reference to the active [`CleanerConfig`].
    pub fn config(&self) -> &CleanerConfig {
        &self.config
    }

    // ── Sanitization ──────────────────────────────────────────────────────────

    /// Run one sanitization pass over the document.
    pub fn clean(self) -> Result<CleanedDocument> {
        let sanitizer = DocumentSanitizer::new(&self.config);
        self.run(sanitizer)
    }

    /// Like [`clean`](PdfCleaner::clean), reporting each removal to `sink`
    /// while the pass runs.
    ///
    /// ```no_run
    /// use pdfscrub::PdfCleaner;
    ///
    /// let cleaned = PdfCleaner::from_path("input.pdf")
    ///     .unwrap()
    ///     .clean_with_sink(&mut |record| println!("{record}"))
    ///     .unwrap();
    /// println!("{} item(s) removed", cleaned.result().len());
    /// ```
    pub fn clean_with_sink(self, sink: RemovalSink<'_>) -> Result<CleanedDocument> {
        let sanitizer = DocumentSanitizer::with_sink(&self.config, sink);
        self.run(sanitizer)
    }

    fn run(mut self, sanitizer: DocumentSanitizer<'_>) -> Result<CleanedDocument> {
        let result = sanitizer.sanitize(&mut self.document)?;
        Ok(CleanedDocument {
            document: self.document,
            result,
        })
    }
}

// ── CleanedDocument ───────────────────────────────────────────────────────────

/// A sanitized document together with the removals that produced it.
pub struct CleanedDocument {
    document: Document,
    result: SanitizationResult,
}

impl CleanedDocument {
    pub fn result(&self) -> &SanitizationResult {
        &self.result
    }

    /// Returns `true` when the pass removed anything.
    pub fn changed(&self) -> bool {
        self.result.changed()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Write the sanitized document to `path`.
    ///
    /// Nothing is written when the pass changed nothing; the return value tells
    /// which case happened. The file is created exclusively, so an existing
    /// file is never overwritten.
    pub fn save<P: AsRef<Path>>(mut self, path: P) -> Result<bool> {
        if !self.changed() {
            return Ok(false);
        }

        let path = path.as_ref();
        let file = OpenOptions::new().write(true).create_new(true).open(path)?;
        if let Err(e) = write_document(&mut self.document, file) {
            // Never leave a truncated PDF behind.
            let _ = std::fs::remove_file(path);
            return Err(e);
        }
        Ok(true)
    }

    /// Serialize the sanitized document, or `None` when nothing changed.
    pub fn to_bytes(mut self) -> Result<Option<Vec<u8>>> {
        if !self.changed() {
            return Ok(None);
        }

        let mut buffer = Vec::new();
        self.document.save_to(&mut buffer)?;
        Ok(Some(buffer))
    }

    /// Split into the sanitized document and the pass result.
    pub fn into_parts(self) -> (Document, SanitizationResult) {
        (self.document, self.result)
    }
}

fn write_document(document: &mut Document, file: File) -> Result<()> {
    let mut writer = BufWriter::new(file);
    document.save_to(&mut writer)?;
    writer.into_inner().map_err(|e| e.into_error())?;
    Ok(())
}
