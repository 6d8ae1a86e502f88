//! Turning registry names into loaded modules.
//!
//! Resolution reads the registry fresh, then looks for the record's import
//! path under each primary search root (a previously healed root first).
//! When no primary root has the file, the fallback roots are tried; a hit
//! there is written back to the registry as a healing marker so the next
//! resolution succeeds on the primary attempt.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{ModuleError, ModuleResult};
use crate::import_path::ImportPath;
use crate::loader::{CodeLoader, LoadError, ModuleHandle};
use crate::output::OutputSink;
use crate::registry::RegistryStore;

/// Directories searched for module files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRoots {
    /// Relative roots are joined onto this directory.
    pub base_dir: PathBuf,
    /// Primary roots, tried in order.
    pub search_paths: Vec<PathBuf>,
    /// Roots tried only when no primary root has the file.
    pub fallback_paths: Vec<PathBuf>,
}

impl SearchRoots {
    /// Roots relative to `base_dir` with the usual defaults (`.` primary,
    /// `..` fallback).
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            search_paths: vec![PathBuf::from(".")],
            fallback_paths: vec![PathBuf::from("..")],
        }
    }

    /// Replace the primary roots.
    #[must_use]
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    /// Replace the fallback roots.
    #[must_use]
    pub fn with_fallback_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.fallback_paths = paths;
        self
    }

    fn absolute(&self, root: &Path) -> PathBuf {
        if root.is_absolute() {
            root.to_path_buf()
        } else {
            self.base_dir.join(root)
        }
    }
}

/// A module ready for invocation.
pub struct ResolvedModule {
    /// Registry name.
    pub name: String,
    /// Import path as stored after resolution (healed if a fallback hit).
    pub import_path: String,
    /// File the module was loaded from.
    pub path: PathBuf,
    /// Whether the file was found only under a fallback root.
    pub via_fallback: bool,
    /// Output printed by the module's top-level statements.
    pub load_output: String,
    /// The loaded module.
    pub handle: Box<dyn ModuleHandle>,
}

impl fmt::Debug for ResolvedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedModule")
            .field("name", &self.name)
            .field("import_path", &self.import_path)
            .field("path", &self.path)
            .field("via_fallback", &self.via_fallback)
            .finish_non_exhaustive()
    }
}

enum Attempt {
    Found {
        root: PathBuf,
        path: PathBuf,
        handle: Box<dyn ModuleHandle>,
        output: String,
    },
    Missing,
}

/// Resolves module names through the registry.
#[derive(Debug)]
pub struct Resolver {
    registry: Arc<RegistryStore>,
    loader: Arc<dyn CodeLoader>,
    roots: SearchRoots,
}

impl Resolver {
    /// Create a resolver.
    #[must_use]
    pub fn new(registry: Arc<RegistryStore>, loader: Arc<dyn CodeLoader>, roots: SearchRoots) -> Self {
        Self {
            registry,
            loader,
            roots,
        }
    }

    /// The configured search roots.
    #[must_use]
    pub fn roots(&self) -> &SearchRoots {
        &self.roots
    }

    /// Resolve and load the module registered as `name`.
    ///
    /// # Errors
    ///
    /// - [`ModuleError::ModuleNotFound`] if `name` is not registered or no
    ///   root contains the file.
    /// - [`ModuleError::ModuleLoad`] if the stored import path is malformed
    ///   or the file fails to load.
    pub fn resolve(&self, name: &str) -> ModuleResult<ResolvedModule> {
        let document = self.registry.load();
        let Some(record) = document.find(name) else {
            debug!(module = name, "module not registered");
            return Err(ModuleError::ModuleNotFound(name.to_owned()));
        };

        let import = ImportPath::parse(&record.import_path).map_err(|e| {
            warn!(module = name, import_path = %record.import_path, error = %e, "invalid import path");
            ModuleError::ModuleLoad {
                module: name.to_owned(),
                message: e.to_string(),
            }
        })?;
        let relative = import.relative_file(self.loader.extension());

        let primary = self.primary_roots(&import);
        if let Attempt::Found {
            path,
            handle,
            output,
            ..
        } = self.attempt(name, &primary, &relative)?
        {
            debug!(module = name, path = %path.display(), "resolved module");
            return Ok(ResolvedModule {
                name: name.to_owned(),
                import_path: record.import_path.clone(),
                path,
                via_fallback: false,
                load_output: output,
                handle,
            });
        }

        let Attempt::Found {
            root,
            path,
            handle,
            output,
        } = self.attempt(name, &self.roots.fallback_paths, &relative)?
        else {
            warn!(module = name, import_path = %import.dotted(), "module file not found in any search root");
            return Err(ModuleError::ModuleNotFound(name.to_owned()));
        };

        let healed = import.healed_at(&root.display().to_string()).to_string();
        info!(module = name, path = %path.display(), import_path = %healed, "resolved module via fallback");
        if let Err(e) = self.registry.patch_import_path(name, &healed) {
            warn!(module = name, error = %e, "could not record healed import path");
        }

        Ok(ResolvedModule {
            name: name.to_owned(),
            import_path: healed,
            path,
            via_fallback: true,
            load_output: output,
            handle,
        })
    }

    /// The healed root, if any, followed by the search paths, each once.
    fn primary_roots(&self, import: &ImportPath) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = import.healed_root().map(PathBuf::from).into_iter().collect();
        for root in &self.roots.search_paths {
            if !roots.contains(root) {
                roots.push(root.clone());
            }
        }
        roots
    }

    /// Try each root in order. A file that exists but fails to load stops
    /// the search.
    fn attempt(&self, name: &str, roots: &[PathBuf], relative: &Path) -> ModuleResult<Attempt> {
        for root in roots {
            let candidate = self.roots.absolute(root).join(relative);
            if !candidate.is_file() {
                debug!(module = name, candidate = %candidate.display(), "no module file");
                continue;
            }

            let mut sink = OutputSink::new();
            match self.loader.load(&candidate, &mut sink) {
                Ok(handle) => {
                    if !sink.is_empty() {
                        debug!(module = name, output = sink.contents(), "module printed while loading");
                    }
                    return Ok(Attempt::Found {
                        root: root.clone(),
                        path: candidate,
                        handle,
                        output: sink.into_string(),
                    });
                },
                Err(LoadError::NotFound(_)) => continue,
                Err(e) => {
                    warn!(module = name, path = %candidate.display(), error = %e, "module failed to load");
                    return Err(ModuleError::ModuleLoad {
                        module: name.to_owned(),
                        message: e.to_string(),
                    });
                },
            }
        }
        Ok(Attempt::Missing)
    }
}
