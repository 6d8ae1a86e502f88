//! Throwaway workspaces for end-to-end tests.

use std::path::{Path, PathBuf};

use modhost_modules::{ModuleService, ServiceSettings};
use tempfile::TempDir;

/// A temporary directory laid out like a real installation:
///
/// ```text
/// <tmp>/
///   modules/          fallback copy of the module tree (`..` from work)
///   work/             base directory
///     modules/        module root
///     modules.yaml    registry document
/// ```
#[derive(Debug)]
pub struct TestWorkspace {
    dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    /// Create an empty workspace.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp workspace");
        std::fs::create_dir_all(dir.path().join("work").join("modules"))
            .expect("create module root");
        Self { dir }
    }

    /// Base directory the service resolves relative paths against.
    #[must_use]
    pub fn base_dir(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    /// Module root scanned by the service.
    #[must_use]
    pub fn modules_root(&self) -> PathBuf {
        self.base_dir().join("modules")
    }

    /// Registry document location.
    #[must_use]
    pub fn registry_path(&self) -> PathBuf {
        self.base_dir().join("modules.yaml")
    }

    /// Directory reached through the default `..` fallback root.
    #[must_use]
    pub fn fallback_dir(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Write a module under the module root. `rel` includes the extension.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_module(&self, rel: &str, source: &str) -> PathBuf {
        write_file(&self.modules_root(), rel, source)
    }

    /// Write a module under `<tmp>/modules`, visible only through the
    /// fallback root.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_fallback_module(&self, rel: &str, source: &str) -> PathBuf {
        write_file(&self.fallback_dir().join("modules"), rel, source)
    }

    /// Write raw text as the registry document.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write_registry(&self, content: &str) {
        std::fs::write(self.registry_path(), content).expect("write registry");
    }

    /// Current registry document text, or `None` if absent.
    #[must_use]
    pub fn read_registry(&self) -> Option<String> {
        std::fs::read_to_string(self.registry_path()).ok()
    }

    /// Service settings pointing into this workspace.
    #[must_use]
    pub fn settings(&self) -> ServiceSettings {
        ServiceSettings::new(self.base_dir())
    }

    /// A service over this workspace.
    #[must_use]
    pub fn service(&self) -> ModuleService {
        ModuleService::new(self.settings())
    }

    /// Scan the module root, save the registry and return the service.
    ///
    /// # Panics
    ///
    /// Panics if the scan or save fails.
    #[must_use]
    pub fn scan_and_save(&self) -> ModuleService {
        let service = self.service();
        service.rebuild_registry().expect("rebuild registry");
        service
    }
}

fn write_file(root: &Path, rel: &str, source: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create module directory");
    }
    std::fs::write(&path, source).expect("write module file");
    path
}
