//! On-disk registry document.
//!
//! The registry is a single YAML file holding every
//! [`ModuleRecord`](crate::record::ModuleRecord). Reads
//! never fail: a missing or corrupt document is an empty registry. Writes
//! replace the whole document atomically (temp file + rename) under an
//! advisory lock on a `.lk` sibling file, so concurrent writers in other
//! processes serialize on the read-modify-write.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use fs2::FileExt;
use tracing::{debug, error, info, warn};

use crate::error::{ModuleError, ModuleResult};
use crate::record::RegistryDocument;

const HEADER: &str = "# Generated by modhost. Rebuild with `modhost scan`.\n\n";

/// Reads and writes the registry document.
#[derive(Debug)]
pub struct RegistryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockMode {
    Shared,
    Exclusive,
}

impl RegistryStore {
    /// Store backed by the document at `path`. Nothing is touched until the
    /// first read or write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Location of the registry document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current document.
    ///
    /// Missing, unreadable and malformed documents all yield an empty
    /// registry; the cause is logged.
    #[must_use]
    pub fn load(&self) -> RegistryDocument {
        let _lock = match self.acquire(LockMode::Shared) {
            Ok(lock) => lock,
            Err(e) => {
                warn!(error = %e, "reading registry without a lock");
                None
            },
        };
        self.read_unlocked()
    }

    /// Replace the document on disk.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::RegistryUnavailable`] if the document cannot be
    /// serialized or written.
    pub fn save(&self, document: &RegistryDocument) -> ModuleResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let _lock = self.acquire(LockMode::Exclusive)?;
        self.write_unlocked(document)
    }

    /// Rewrite the `import_path` of the first record named `name`.
    ///
    /// The whole document is read, modified and written back while the
    /// writer lock is held. Returns `false` if no record matched.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::RegistryUnavailable`] if the lock cannot be
    /// taken or the document cannot be written.
    pub fn patch_import_path(&self, name: &str, new_path: &str) -> ModuleResult<bool> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let _lock = self.acquire(LockMode::Exclusive)?;

        let mut document = self.read_unlocked();
        let Some(record) = document.find_mut(name) else {
            debug!(module = name, "no registry record to patch");
            return Ok(false);
        };
        if record.import_path == new_path {
            return Ok(true);
        }
        new_path.clone_into(&mut record.import_path);

        self.write_unlocked(&document)?;
        info!(module = name, import_path = new_path, "patched registry import path");
        Ok(true)
    }

    fn read_unlocked(&self) -> RegistryDocument {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "registry document not found, treating as empty");
                return RegistryDocument::default();
            },
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to read registry document");
                return RegistryDocument::default();
            },
        };

        // A file holding only comments or whitespace parses as YAML null.
        if content.lines().all(|l| l.trim().is_empty() || l.trim_start().starts_with('#')) {
            return RegistryDocument::default();
        }

        match serde_yaml::from_str::<RegistryDocument>(&content) {
            Ok(document) => document,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "registry document is corrupt, treating as empty");
                RegistryDocument::default()
            },
        }
    }

    fn write_unlocked(&self, document: &RegistryDocument) -> ModuleResult<()> {
        let body = serde_yaml::to_string(document).map_err(|e| self.unavailable(&e))?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|e| self.unavailable(&e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| self.unavailable(&e))?;
        tmp.write_all(HEADER.as_bytes())
            .map_err(|e| self.unavailable(&e))?;
        tmp.write_all(body.as_bytes())
            .map_err(|e| self.unavailable(&e))?;
        tmp.as_file().sync_all().map_err(|e| self.unavailable(&e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.unavailable(&e.error))?;

        debug!(path = %self.path.display(), modules = document.len(), "saved registry document");
        Ok(())
    }

    /// Advisory lock on the `.lk` sibling. Shared mode never creates the
    /// lock file; with no lock file there is no writer to wait for.
    fn acquire(&self, mode: LockMode) -> ModuleResult<Option<File>> {
        let lock_path = self.path.with_extension("lk");

        match mode {
            LockMode::Shared => match File::open(&lock_path) {
                Ok(file) => {
                    file.lock_shared().map_err(|e| self.unavailable(&e))?;
                    Ok(Some(file))
                },
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(self.unavailable(&e)),
            },
            LockMode::Exclusive => {
                if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|e| self.unavailable(&e))?;
                }
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .truncate(false)
                    .read(true)
                    .write(true)
                    .open(&lock_path)
                    .map_err(|e| self.unavailable(&e))?;
                file.lock_exclusive().map_err(|e| self.unavailable(&e))?;
                Ok(Some(file))
            },
        }
    }

    fn unavailable(&self, err: &dyn std::fmt::Display) -> ModuleError {
        error!(path = %self.path.display(), error = %err, "registry write failed");
        ModuleError::RegistryUnavailable {
            path: self.path.clone(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::ErrorKind;
    use crate::record::ModuleRecord;

    fn sample() -> RegistryDocument {
        RegistryDocument::new(vec![
            ModuleRecord::new("greet", "modules.greet").with_functions(["hello"]),
            ModuleRecord::new("calc", "modules.math.calc")
                .with_description(Some("Arithmetic."))
                .with_functions(["add", "sub"]),
        ])
    }

    #[test]
    fn missing_document_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::new(dir.path().join("modules.yaml"));
        assert!(store.load().is_empty());
        assert!(!dir.path().join("modules.lk").exists());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::new(dir.path().join("state").join("modules.yaml"));

        store.save(&sample()).unwrap();
        assert_eq!(store.load(), sample());

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with("# Generated by modhost"));
        assert!(raw.contains("modules:"));
    }

    #[test]
    fn corrupt_and_blank_documents_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modules.yaml");
        let store = RegistryStore::new(&path);

        std::fs::write(&path, "modules: [unclosed").unwrap();
        assert!(store.load().is_empty());

        std::fs::write(&path, "# nothing yet\n\n").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn hand_written_record_gets_default_description() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modules.yaml");
        std::fs::write(&path, "modules:\n  - name: m\n    import_path: modules.m\n").unwrap();

        let document = RegistryStore::new(&path).load();
        let record = document.find("m").unwrap();
        assert_eq!(record.description, crate::record::NO_DESCRIPTION);
        assert!(record.functions.is_empty());
    }

    #[test]
    fn patch_rewrites_first_match_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = RegistryStore::new(dir.path().join("modules.yaml"));
        let mut document = sample();
        document.modules.push(ModuleRecord::new("greet", "other.greet"));
        store.save(&document).unwrap();

        assert!(store.patch_import_path("greet", "modules.greet # healed: ..").unwrap());
        let reloaded = store.load();
        assert_eq!(reloaded.modules[0].import_path, "modules.greet # healed: ..");
        assert_eq!(reloaded.modules[2].import_path, "other.greet");

        assert!(!store.patch_import_path("absent", "x.y").unwrap());
    }

    #[test]
    fn save_to_unwritable_location_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        let store = RegistryStore::new(blocker.join("modules.yaml"));
        let err = store.save(&sample()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RegistryUnavailable);
    }

    #[test]
    fn concurrent_patches_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RegistryStore::new(dir.path().join("modules.yaml")));
        store.save(&sample()).unwrap();

        let patches = [
            ("greet", "modules.greet # healed: a"),
            ("calc", "modules.math.calc # healed: b"),
        ];
        let handles: Vec<_> = patches
            .into_iter()
            .map(|(name, path)| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.patch_import_path(name, path).unwrap())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }

        let document = store.load();
        assert!(document.find("greet").unwrap().import_path.ends_with("healed: a"));
        assert!(document.find("calc").unwrap().import_path.ends_with("healed: b"));
    }
}
