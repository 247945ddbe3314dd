//! File selection sources feeding the intake controller.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::images::RawImage;
use crate::images::mime::{detect_mime_type, normalize_input_path};

/// Produces the ordered candidate set for one intake pass.
///
/// A source is one-shot: a second `select` yields whatever is left (usually
/// nothing).
pub trait FileSource {
    /// # Errors
    /// Returns an error when the selection itself cannot be produced.
    fn select(&mut self) -> Result<Vec<RawImage>>;
}

impl FileSource for Vec<RawImage> {
    fn select(&mut self) -> Result<Vec<RawImage>> {
        Ok(std::mem::take(self))
    }
}

/// A path that could not be turned into a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPath {
    pub path: PathBuf,
    pub reason: String,
}

/// Reads candidates from files and directories on disk.
///
/// Directories contribute their regular files (not recursive), ordered by
/// file name. MIME types come from magic bytes with an extension fallback.
#[derive(Debug, Clone, Default)]
pub struct PathSource {
    paths: Vec<PathBuf>,
    skipped: Vec<SkippedPath>,
}

impl PathSource {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
            skipped: Vec::new(),
        }
    }

    /// Builds a source from user-typed paths, undoing shell escaping and `~/`.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        Self::new(args.iter().map(|arg| normalize_input_path(arg.as_ref())))
    }

    /// Paths skipped by the last `select`.
    pub fn skipped(&self) -> &[SkippedPath] {
        &self.skipped
    }

    fn skip(&mut self, path: &Path, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(path = %path.display(), %reason, "skipping path");
        self.skipped.push(SkippedPath {
            path: path.to_path_buf(),
            reason,
        });
    }

    fn expand(&mut self, path: &Path) -> Vec<PathBuf> {
        if !path.is_dir() {
            return vec![path.to_path_buf()];
        }

        match fs::read_dir(path) {
            Ok(entries) => {
                let mut files: Vec<PathBuf> = entries
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|p| p.is_file())
                    .collect();
                files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
                files
            }
            Err(e) => {
                self.skip(path, e.to_string());
                Vec::new()
            }
        }
    }

    fn read(&mut self, path: &Path) -> Option<RawImage> {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            self.skip(path, "no file name");
            return None;
        };

        match fs::read(path) {
            Ok(data) => {
                let mime_type = detect_mime_type(path, &data);
                Some(RawImage::new(name, mime_type, data))
            }
            Err(e) => {
                self.skip(path, e.to_string());
                None
            }
        }
    }
}

impl FileSource for PathSource {
    fn select(&mut self) -> Result<Vec<RawImage>> {
        self.skipped.clear();
        let paths = std::mem::take(&mut self.paths);

        let mut candidates = Vec::new();
        for path in &paths {
            for file in self.expand(path) {
                if let Some(image) = self.read(&file) {
                    candidates.push(image);
                }
            }
        }

        tracing::debug!(
            candidates = candidates.len(),
            skipped = self.skipped.len(),
            "selected files"
        );
        Ok(candidates)
    }
}
