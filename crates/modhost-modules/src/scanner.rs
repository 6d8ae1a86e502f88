//! Module discovery.
//!
//! Walks a module root, loads every file the [`CodeLoader`] understands and
//! records its documentation and public callables. Per-file failures are
//! logged and reported, never fatal.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{ModuleError, ModuleResult};
use crate::import_path::ImportPath;
use crate::loader::CodeLoader;
use crate::output::OutputSink;
use crate::record::{ModuleRecord, RegistryDocument};

/// Result of one scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Records in visitation order.
    pub modules: Vec<ModuleRecord>,
    /// Files that failed to load.
    pub skipped: Vec<ModuleError>,
    /// Files ignored because an earlier file had the same name.
    pub duplicates: Vec<ModuleError>,
}

impl ScanReport {
    /// Consume the report, keeping only the records.
    #[must_use]
    pub fn into_document(self) -> RegistryDocument {
        RegistryDocument::new(self.modules)
    }
}

/// Builds module records from a directory tree.
#[derive(Debug)]
pub struct Scanner {
    loader: Arc<dyn CodeLoader>,
    import_prefix: Option<String>,
    base_dir: Option<PathBuf>,
}

impl Scanner {
    /// Create a scanner that uses `loader` for introspection.
    #[must_use]
    pub fn new(loader: Arc<dyn CodeLoader>) -> Self {
        Self {
            loader,
            import_prefix: None,
            base_dir: None,
        }
    }

    /// Override the leading import path segments. By default they are the
    /// root's path relative to the base directory, or the root directory's
    /// name when the root is not under it.
    #[must_use]
    pub fn with_import_prefix(mut self, prefix: Option<String>) -> Self {
        self.import_prefix = prefix;
        self
    }

    /// Directory that import paths are resolved against.
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Scan `root` recursively.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::Scan`] if `root` itself cannot be read or has
    /// no usable name for the import prefix. Failures on individual files
    /// are collected in [`ScanReport::skipped`].
    pub fn scan(&self, root: &Path) -> ModuleResult<ScanReport> {
        let root = root.canonicalize().map_err(|e| ModuleError::Scan {
            path: root.to_path_buf(),
            message: e.to_string(),
        })?;
        let prefix = self.prefix_for(&root)?;
        let extension = self.loader.extension();

        let mut report = ScanReport::default();
        let mut seen: HashMap<String, PathBuf> = HashMap::new();

        for entry in WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(root.as_path()).to_path_buf();
                    warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                    report.skipped.push(ModuleError::Scan {
                        path,
                        message: e.to_string(),
                    });
                    continue;
                },
            };

            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(extension) {
                continue;
            }
            let file_type = entry.file_type();
            if file_type.is_symlink() {
                if !path.is_file() {
                    debug!(path = %path.display(), "skipping symlink that is not a file");
                    continue;
                }
            } else if !file_type.is_file() {
                continue;
            }

            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            if let Some(first) = seen.get(name) {
                let err = ModuleError::DuplicateModuleName {
                    name: name.to_owned(),
                    path: path.to_path_buf(),
                    first: first.clone(),
                };
                warn!(module = name, path = %path.display(), first = %first.display(), "duplicate module name");
                report.duplicates.push(err);
                continue;
            }

            match self.introspect(&root, path, &prefix, name) {
                Ok(record) => {
                    debug!(module = name, functions = record.functions.len(), "scanned module");
                    seen.insert(name.to_owned(), path.to_path_buf());
                    report.modules.push(record);
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping module");
                    report.skipped.push(e);
                },
            }
        }

        info!(
            root = %root.display(),
            count = report.modules.len(),
            skipped = report.skipped.len(),
            duplicates = report.duplicates.len(),
            "module scan complete"
        );
        Ok(report)
    }

    fn prefix_for(&self, root: &Path) -> ModuleResult<Vec<String>> {
        let segments = if let Some(prefix) = &self.import_prefix {
            prefix.split('.').map(str::to_owned).collect()
        } else if let Some(relative) = self
            .base_dir
            .as_deref()
            .and_then(|base| relative_segments(root, base))
        {
            // Root is the base directory itself: files sit at the top level.
            if relative.is_empty() {
                return Ok(relative);
            }
            relative
        } else {
            root.file_name()
                .and_then(|n| n.to_str())
                .map(|n| vec![n.to_owned()])
                .unwrap_or_default()
        };

        ImportPath::from_segments(&segments).map_err(|e| ModuleError::Scan {
            path: root.to_path_buf(),
            message: format!("module root gives no usable import prefix: {e}"),
        })?;
        Ok(segments)
    }

    fn introspect(
        &self,
        root: &Path,
        path: &Path,
        prefix: &[String],
        name: &str,
    ) -> ModuleResult<ModuleRecord> {
        let scan_err = |message: String| ModuleError::Scan {
            path: path.to_path_buf(),
            message,
        };

        let dirs = path
            .parent()
            .and_then(|p| p.strip_prefix(root).ok())
            .map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let segments = prefix
            .iter()
            .cloned()
            .chain(dirs)
            .chain(std::iter::once(name.to_owned()));
        let import_path =
            ImportPath::from_segments(segments).map_err(|e| scan_err(e.to_string()))?;

        let mut sink = OutputSink::new();
        let handle = self
            .loader
            .load(path, &mut sink)
            .map_err(|e| scan_err(e.to_string()))?;
        if !sink.is_empty() {
            debug!(module = name, output = sink.contents(), "discarded scan-time output");
        }

        let functions = handle
            .members()
            .into_iter()
            .filter(|m| !m.starts_with("__"));

        Ok(ModuleRecord::new(name, import_path.dotted())
            .with_description(handle.doc().as_deref())
            .with_functions(functions))
    }
}

/// `root` relative to `base` as path segments, if `root` lies under it.
fn relative_segments(root: &Path, base: &Path) -> Option<Vec<String>> {
    let base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());
    let relative = root.strip_prefix(&base).ok()?;
    Some(
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect(),
    )
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|s| s.starts_with('.'))
}
