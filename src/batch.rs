use crate::record::RemovalSink;
use crate::validator::PathValidator;
use crate::{AuditLog, CleanerConfig, PdfCleaner, Result, SanitizationResult, ScrubError};
use std::path::{Path, PathBuf};

// ── Per-file results ─────────────────────────────────────────────────────────

/// A file that was sanitized successfully.
#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,

    /// Where the sanitized copy goes. Only written when `written` is `true`.
    pub output: PathBuf,

    pub result: SanitizationResult,

    /// `false` when there was nothing to clean and no file was produced.
    pub written: bool,
}

/// A file that could not be sanitized.
#[derive(Debug)]
pub struct FileFailure {
    pub input: PathBuf,

    /// The resolved output file, if validation got that far.
    pub output: Option<PathBuf>,

    pub error: ScrubError,
}

/// The aggregate result of [`run`].
#[derive(Debug, Default)]
pub struct BatchReport {
    pub processed: Vec<FileOutcome>,
    pub failed: Vec<FileFailure>,
}

impl BatchReport {
    /// Returns `true` when no file failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Process exit code: `0` on success, `1` if any file failed.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// Number of sanitized files that were written.
    pub fn written(&self) -> usize {
        self.processed.iter().filter(|o| o.written).count()
    }
}

// ── Single file ──────────────────────────────────────────────────────────────

/// Sanitize `input` into `output`.
///
/// Paths are validated before the document is parsed: the input must be an
/// existing file, the output must not exist and must not be the input. When
/// `output` is a directory, the file keeps its name inside it. The output is
/// only written if something was removed.
///
/// If [`CleanerConfig::audit_log`] is set, the outcome is appended to it.
pub fn scrub_file(
    input: &Path,
    output: &Path,
    config: &CleanerConfig,
    sink: RemovalSink<'_>,
) -> std::result::Result<FileOutcome, FileFailure> {
    let audit = config.audit_log.as_ref().map(AuditLog::new);

    let outcome = PathValidator::new(input, output)
        .resolve_output_file()
        .map_err(|error| FileFailure {
            input: input.to_path_buf(),
            output: None,
            error,
        })
        .and_then(|target| {
            clean_into(input, &target, config, sink).map_err(|error| FileFailure {
                input: input.to_path_buf(),
                output: Some(target),
                error,
            })
        });

    if let Some(audit) = audit {
        let written = match &outcome {
            Ok(done) => audit.record_outcome(done),
            Err(failure) => audit.record_failure(failure),
        };
        if let Err(e) = written {
            log::warn!("could not append to audit log {}: {e}", audit.path().display());
        }
    }

    outcome
}

fn clean_into(
    input: &Path,
    target: &Path,
    config: &CleanerConfig,
    sink: RemovalSink<'_>,
) -> Result<FileOutcome> {
    log::info!("cleaning {} -> {}", input.display(), target.display());

    let cleaned = PdfCleaner::with_config(input, config.clone())?.clean_with_sink(sink)?;
    let result = cleaned.result().clone();
    let written = cleaned.save(target)?;

    if written {
        log::info!("wrote {} ({} item(s) removed)", target.display(), result.len());
    } else {
        log::info!("nothing to clean in {}, no output written", input.display());
    }

    Ok(FileOutcome {
        input: input.to_path_buf(),
        output: target.to_path_buf(),
        result,
        written,
    })
}

// ── File or directory ────────────────────────────────────────────────────────

/// Sanitize a single file, or every `*.pdf` file of a directory.
///
/// In directory mode `output` must be an existing directory; files are taken
/// in name order, non-recursively. A failing file is recorded in the report
/// and does not stop the others. Only errors that prevent processing from
/// starting at all are returned as `Err`.
///
/// ```no_run
/// use pdfscrub::CleanerConfig;
/// use std::path::Path;
///
/// let report = pdfscrub::run(
///     Path::new("inbox"),
///     Path::new("clean"),
///     &CleanerConfig::default(),
///     &mut |record| println!("{record}"),
/// )
/// .unwrap();
/// std::process::exit(report.exit_code());
/// ```
pub fn run(
    input: &Path,
    output: &Path,
    config: &CleanerConfig,
    sink: RemovalSink<'_>,
) -> Result<BatchReport> {
    let mut report = BatchReport::default();

    if !input.is_dir() {
        match scrub_file(input, output, config, sink) {
            Ok(outcome) => report.processed.push(outcome),
            Err(failure) => report.failed.push(failure),
        }
        return Ok(report);
    }

    PathValidator::new(input, output).validate_directories()?;

    let files = pdf_files(input)?;
    log::info!("found {} PDF file(s) in {}", files.len(), input.display());

    for file in files {
        match scrub_file(&file, output, config, &mut *sink) {
            Ok(outcome) => report.processed.push(outcome),
            Err(failure) => {
                log::warn!("skipping {}: {}", failure.input.display(), failure.error);
                report.failed.push(failure);
            }
        }
    }

    Ok(report)
}

/// List the `*.pdf` files of `dir` (extension compared case-insensitively),
/// sorted by path.
fn pdf_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt", "c.pdf.bak"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let files = pdf_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.PDF", "b.pdf"]);
    }

    #[test]
    fn report_exit_code_reflects_failures() {
        let mut report = BatchReport::default();
        assert_eq!(report.exit_code(), 0);

        report.failed.push(FileFailure {
            input: PathBuf::from("x.pdf"),
            output: None,
            error: ScrubError::InputNotFound(PathBuf::from("x.pdf")),
        });
        assert!(!report.is_success());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn directory_to_file_is_a_type_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.pdf");
        std::fs::write(&file, b"").unwrap();

        let err = run(dir.path(), &file, &CleanerConfig::default(), &mut |_| {}).unwrap_err();
        assert!(matches!(err, ScrubError::InputOutputTypeMismatch(_)));
    }

    #[test]
    fn missing_input_is_a_failed_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("ghost.pdf");

        let report = run(&input, dir.path(), &CleanerConfig::default(), &mut |_| {}).unwrap();
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(report.failed[0].error, ScrubError::InputNotFound(_)));
    }
}
