use std::{
    collections::HashSet,
    ffi::OsString,
    fs,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Content substituted for files above the size cap.
pub const TOO_LARGE_SENTINEL: &str = "[File too large to include in evaluation]";
/// Content substituted for files that cannot be read as UTF-8 text.
pub const BINARY_SENTINEL: &str = "[Binary file not included in evaluation]";
/// Largest file (in bytes) whose content is read.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 500 * 1024;
pub const DEFAULT_REPORT_FILE: &str = "Result.md";

/// Directories never descended into.
const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    "node_modules",
    "dist",
    "build",
    "target",
    "vendor",
    "__pycache__",
    "coverage",
];

const EXCLUDED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "svg", "webp", // images
    "woff", "woff2", "ttf", "eot", "otf", // fonts
    "mp3", "mp4", "wav", "avi", "mov", // media
    "zip", "tar", "gz", "tgz", "rar", "7z", "jar", // archives
    "pdf", "exe", "dll", "so", "dylib", "o", "a", "class", "pyc", "lock",
];

/// One scanned file: relative path, content (or sentinel) and true byte size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the collection root, `/`-separated.
    pub path: String,
    pub content: String,
    pub size: u64,
}

impl FileRecord {
    /// Lower-cased extension of the file name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }
}

/// Tunables for file collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Additional glob patterns (relative to the root) to exclude.
    pub extra_excludes: Vec<String>,
    pub max_file_bytes: u64,
    /// Name of the report file the pipeline writes; never collected.
    pub report_file_name: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            extra_excludes: Vec::new(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            report_file_name: DEFAULT_REPORT_FILE.to_string(),
        }
    }
}

/// Walks a directory tree and reads eligible files into [`FileRecord`]s.
pub struct FileCollector {
    root: PathBuf,
    excludes: GlobSet,
    excluded_dirs: Arc<HashSet<OsString>>,
    max_file_bytes: u64,
}

impl FileCollector {
    pub fn new(root: impl Into<PathBuf>, config: &CollectorConfig) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            bail!("collection root {} is not a directory", root.display());
        }

        let mut patterns: Vec<String> = EXCLUDED_DIRS
            .iter()
            .map(|dir| format!("**/{dir}/**"))
            .collect();
        patterns.push(format!("**/*.{{{}}}", EXCLUDED_EXTENSIONS.join(",")));
        patterns.push(format!("**/{}", config.report_file_name));
        patterns.extend(config.extra_excludes.iter().cloned());

        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = GlobBuilder::new(pattern)
                .case_insensitive(true)
                .literal_separator(true)
                .build()
                .with_context(|| format!("invalid exclude pattern `{pattern}`"))?;
            builder.add(glob);
        }
        let excludes = builder
            .build()
            .context("failed to compile exclude patterns")?;

        Ok(Self {
            root,
            excludes,
            excluded_dirs: Arc::new(EXCLUDED_DIRS.iter().map(OsString::from).collect()),
            max_file_bytes: config.max_file_bytes,
        })
    }

    /// Whether a root-relative, `/`-separated path is excluded.
    pub fn is_excluded(&self, relative: &str) -> bool {
        self.excludes.is_match(relative)
    }

    /// Collect every eligible file under the root in traversal order.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn collect(&self) -> Result<Vec<FileRecord>> {
        let excluded_dirs = Arc::clone(&self.excluded_dirs);
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().map_or(false, |ft| ft.is_dir());
                !(entry.depth() > 0 && is_dir && excluded_dirs.contains(entry.file_name()))
            })
            .build();

        let mut records = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable directory entry");
                    continue;
                }
            };
            // Links are not followed by the walker; they are resolved in `read_record`.
            if !entry
                .file_type()
                .map_or(false, |ft| ft.is_file() || ft.is_symlink())
            {
                continue;
            }
            let Some(relative) = relative_path(&self.root, entry.path()) else {
                continue;
            };
            if self.is_excluded(&relative) {
                debug!(path = %relative, "excluded");
                continue;
            }
            if let Some(record) = self.read_record(entry.path(), relative) {
                records.push(record);
            }
        }

        info!(files = records.len(), "collected repository files");
        Ok(records)
    }

    fn read_record(&self, path: &Path, relative: String) -> Option<FileRecord> {
        let size = match fs::metadata(path) {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => {
                debug!(path = %relative, "symlink target is not a regular file; skipping");
                return None;
            }
            Err(err) => {
                warn!(path = %relative, error = %err, "failed to stat file; skipping");
                return None;
            }
        };
        let content = if size > self.max_file_bytes {
            debug!(path = %relative, size, "file exceeds size cap");
            TOO_LARGE_SENTINEL.to_string()
        } else {
            match fs::read_to_string(path) {
                Ok(content) => content,
                Err(err) => {
                    debug!(path = %relative, error = %err, "file is not readable as text");
                    BINARY_SENTINEL.to_string()
                }
            }
        };
        Some(FileRecord {
            path: relative,
            content,
            size,
        })
    }
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
