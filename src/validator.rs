use crate::{Result, ScrubError};
use std::path::{Component, Path, PathBuf};

// ── PathValidator ─────────────────────────────────────────────────────────────
//
// This is an internal type. Callers use `scrub_file` / `run`, which delegate
// here before any document is parsed.

pub(crate) struct PathValidator<'a> {
    input: &'a Path,
    output: &'a Path,
}

impl<'a> PathValidator<'a> {
    pub(crate) fn new(input: &'a Path, output: &'a Path) -> Self {
        Self { input, output }
    }

    /// Resolve the file the sanitized document would be written to.
    ///
    /// When the output names an existing directory, the input's file name is
    /// appended to it. The target is refused when it is the input itself
    /// (compared case-insensitively) or when it already exists.
    pub(crate) fn resolve_output_file(&self) -> Result<PathBuf> {
        if !self.input.is_file() {
            return Err(ScrubError::InputNotFound(self.input.to_path_buf()));
        }

        let target = match self.input.file_name() {
            Some(name) if self.output.is_dir() => self.output.join(name),
            _ => self.output.to_path_buf(),
        };

        if same_file_name(self.input, &target)? {
            return Err(ScrubError::SameInputOutputPath(self.input.to_path_buf()));
        }
        if target.exists() {
            return Err(ScrubError::OutputAlreadyExists(target));
        }

        Ok(target)
    }

    /// Check directory mode: the output must be an existing directory too.
    pub(crate) fn validate_directories(&self) -> Result<()> {
        if !self.input.is_dir() {
            return Err(ScrubError::InputNotFound(self.input.to_path_buf()));
        }
        if !self.output.is_dir() {
            return Err(ScrubError::InputOutputTypeMismatch(self.output.to_path_buf()));
        }
        Ok(())
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

/// Compare two paths after making them absolute, ignoring ASCII and Unicode
/// case so `Report.PDF` and `report.pdf` count as the same file.
fn same_file_name(a: &Path, b: &Path) -> Result<bool> {
    let a = absolute(a)?;
    let b = absolute(b)?;
    Ok(a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase())
}

/// Make `path` absolute and drop `.` and `..` components lexically.
///
/// The output path usually does not exist yet, so `canonicalize` is not an
/// option here.
fn absolute(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}
