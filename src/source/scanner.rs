//! Directory walk producing candidate source files.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::SourceConfig;

/// A file selected for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path on disk.
    pub path: PathBuf,
    /// Path relative to the scan root, `/`-separated. Used as the
    /// `filename` half of every function key from this file.
    pub relative: String,
}

/// Walks a directory tree and yields files with the configured suffix.
///
/// Directories whose name is in the exclusion set are pruned at any depth,
/// so nothing below them is ever read.
#[derive(Debug, Clone)]
pub struct SourceScanner {
    extension: String,
    exclude: HashSet<String>,
}

impl SourceScanner {
    pub fn new<I, S>(extension: &str, exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extension: extension.trim_start_matches('.').to_string(),
            exclude: exclude.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(&config.extension, config.exclude.iter().cloned())
    }

    /// Lazily walks `root` in file-name order.
    ///
    /// Unreadable entries are logged and skipped. A `root` that is itself a
    /// matching file yields just that file.
    pub fn scan<'a>(&'a self, root: &'a Path) -> impl Iterator<Item = SourceFile> + 'a {
        WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !self.is_excluded_dir(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable entry");
                    None
                }
            })
            .filter(move |entry| {
                entry.file_type().is_file() && self.matches_extension(entry.path())
            })
            .map(move |entry| {
                let path = entry.into_path();
                let relative = relative_name(root, &path);
                SourceFile { path, relative }
            })
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        // The root itself is never pruned, even if its name is excluded
        entry.depth() > 0
            && entry.file_type().is_dir()
            && self
                .exclude
                .contains(entry.file_name().to_string_lossy().as_ref())
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.to_string_lossy() == self.extension)
    }
}

fn relative_name(root: &Path, path: &Path) -> String {
    let relative = match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel,
        // Scanning a single file: keep its file name
        _ => path.file_name().map(Path::new).unwrap_or(path),
    };

    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
