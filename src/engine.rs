use crate::outline;
use crate::pdf_utils;
use crate::record::RemovalSink;
use crate::walker::SanitizerSession;
use crate::{CleanerConfig, Result, SanitizationResult};
use lopdf::Document;

/// Runs one sanitization pass over a parsed document.
///
/// The pass covers, in order: the trailer, the outline tree, the catalog, and
/// every page together with its `/Kids` array. Removals are reported in that
/// order, depth-first within each step. Steps whose structure is absent are
/// skipped.
///
/// A sanitizer owns the visited set and removal log of exactly one pass, so
/// [`sanitize`](DocumentSanitizer::sanitize) takes it by value and it cannot
/// be run twice:
///
/// ```compile_fail
/// use pdfscrub::{CleanerConfig, DocumentSanitizer};
///
/// let mut doc = lopdf::Document::with_version("1.7");
/// let sanitizer = DocumentSanitizer::new(&CleanerConfig::default());
/// sanitizer.sanitize(&mut doc).unwrap();
/// sanitizer.sanitize(&mut doc).unwrap();
/// ```
pub struct DocumentSanitizer<'a> {
    session: SanitizerSession<'a>,
}

impl<'a> DocumentSanitizer<'a> {
    pub fn new(config: &CleanerConfig) -> Self {
        Self {
            session: SanitizerSession::new(config, None),
        }
    }

    /// Like [`new`](DocumentSanitizer::new), but `sink` also receives every
    /// removal as soon as it is made.
    pub fn with_sink(config: &CleanerConfig, sink: RemovalSink<'a>) -> Self {
        Self {
            session: SanitizerSession::new(config, Some(sink)),
        }
    }

    /// Sanitize `document` in place.
    ///
    /// A reference to an object missing from the document aborts the pass with
    /// [`ScrubError::MissingObject`](crate::ScrubError::MissingObject); the
    /// document may then be partially sanitized and must not be saved.
    pub fn sanitize(mut self, document: &mut Document) -> Result<SanitizationResult> {
        log::info!("sanitizing document with {} objects", document.objects.len());

        self.session.walk_trailer(document)?;
        log::debug!("trailer done, {} removal(s)", self.session.removals());

        if let Some(root) = outline::collect_outline(document) {
            self.session.walk_outline(document, &root)?;
            log::debug!("outlines done, {} removal(s)", self.session.removals());
        }

        if let Some(catalog_id) = pdf_utils::catalog_id(document) {
            self.session.walk_reference(document, catalog_id, "Catalog")?;
        }

        for (number, page_id) in document.get_pages() {
            let label = format!("Page {number}");
            self.session.walk_reference(document, page_id, &label)?;
            self.session
                .walk_page_kids(document, page_id, &format!("{label} Kids"))?;
        }

        log::info!(
            "visited {} objects, {} removal(s)",
            self.session.visited.len(),
            self.session.removals()
        );
        Ok(self.session.finish())
    }
}
