//! The invocation boundary.
//!
//! [`ModuleService`] is the one type an embedding layer talks to. It wires
//! the scanner, registry store, resolver and invocation engine together and
//! returns every failure as a [`ModuleError`] whose
//! [`report`](ModuleError::report) is the `{kind, message}` record.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, info_span, warn};

use crate::error::{ModuleError, ModuleResult};
use crate::invoke::{Invocation, invoke_captured, list_functions};
use crate::loader::{CodeLoader, LoadError, RhaiLoader};
use crate::output::OutputSink;
use crate::record::{ModuleRecord, RegistryDocument};
use crate::registry::RegistryStore;
use crate::resolver::{ResolvedModule, Resolver, SearchRoots};
use crate::scanner::{ScanReport, Scanner};
use crate::value::Value;

/// Runtime settings for a [`ModuleService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Registry document location.
    pub registry_path: PathBuf,
    /// Directory scanned by [`ModuleService::rebuild_registry`].
    pub modules_root: PathBuf,
    /// Leading import path segments; defaults to the module root's path
    /// relative to the base directory.
    pub import_prefix: Option<String>,
    /// Where the resolver looks for module files.
    pub roots: SearchRoots,
}

impl ServiceSettings {
    /// Defaults relative to `base_dir`: `modules.yaml`, `modules/`, `.`
    /// and `..`.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            registry_path: base_dir.join("modules.yaml"),
            modules_root: base_dir.join("modules"),
            import_prefix: None,
            roots: SearchRoots::new(base_dir),
        }
    }
}

/// Lists, resolves and runs registered modules.
#[derive(Debug)]
pub struct ModuleService {
    settings: ServiceSettings,
    loader: Arc<dyn CodeLoader>,
    registry: Arc<RegistryStore>,
    resolver: Resolver,
}

impl ModuleService {
    /// Service backed by Rhai scripts.
    #[must_use]
    pub fn new(settings: ServiceSettings) -> Self {
        Self::with_loader(settings, Arc::new(RhaiLoader::new()))
    }

    /// Service backed by a custom loader.
    #[must_use]
    pub fn with_loader(settings: ServiceSettings, loader: Arc<dyn CodeLoader>) -> Self {
        let registry = Arc::new(RegistryStore::new(settings.registry_path.clone()));
        let resolver = Resolver::new(
            Arc::clone(&registry),
            Arc::clone(&loader),
            resolver_roots(&settings),
        );
        Self {
            settings,
            loader,
            registry,
            resolver,
        }
    }

    /// The active settings.
    #[must_use]
    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// The registry store.
    #[must_use]
    pub fn registry(&self) -> &RegistryStore {
        &self.registry
    }

    /// The resolver.
    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Every registered module. Empty if the registry is missing or corrupt.
    #[must_use]
    pub fn list_modules(&self) -> Vec<ModuleRecord> {
        self.registry.load().modules
    }

    /// Callable names of a registered module, taken from the loaded module
    /// rather than the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::ModuleNotFound`] or [`ModuleError::ModuleLoad`]
    /// if the module cannot be resolved.
    pub fn get_functions(&self, module: &str) -> ModuleResult<Vec<String>> {
        let resolved = self.resolver.resolve(module)?;
        Ok(list_functions(&resolved))
    }

    /// Resolve `module` and call `function`.
    ///
    /// # Errors
    ///
    /// Any resolution error, [`ModuleError::FunctionNotFound`], or
    /// [`ModuleError::Execution`].
    pub fn execute(
        &self,
        module: &str,
        function: &str,
        args: Vec<Value>,
        kwargs: BTreeMap<String, Value>,
    ) -> ModuleResult<Invocation> {
        let _span = info_span!("execute", module, function).entered();
        let mut resolved = self.resolver.resolve(module)?;
        let invocation = invoke_captured(&mut resolved, function, args, kwargs)?;
        info!(
            output_bytes = invocation.output.len(),
            via_fallback = resolved.via_fallback,
            "executed module function"
        );
        Ok(invocation)
    }

    /// Scan the module root and replace the registry with the result.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::Scan`] if the root cannot be created or read,
    /// or [`ModuleError::RegistryUnavailable`] if the registry cannot be
    /// written.
    pub fn rebuild_registry(&self) -> ModuleResult<ScanReport> {
        self.ensure_modules_root()?;
        let report = Scanner::new(Arc::clone(&self.loader))
            .with_import_prefix(self.settings.import_prefix.clone())
            .with_base_dir(&self.settings.roots.base_dir)
            .scan(&self.settings.modules_root)?;

        let document = RegistryDocument::new(report.modules.clone());
        self.registry.save(&document)?;
        info!(
            registry = %self.registry.path().display(),
            modules = document.len(),
            "registry rebuilt"
        );
        Ok(report)
    }

    /// Run `<modules_root>/<subfolder>/<module>` directly, bypassing the
    /// registry. The function is called with no arguments.
    ///
    /// # Errors
    ///
    /// - [`ModuleError::ModuleNotFound`] if the subfolder or file is missing
    ///   or either name is not a single path component.
    /// - [`ModuleError::ModuleLoad`] if the file fails to load.
    /// - Any invocation error.
    pub fn run_from_subfolder(
        &self,
        subfolder: &str,
        module: &str,
        function: &str,
    ) -> ModuleResult<Invocation> {
        let _span = info_span!("run", subfolder, module, function).entered();
        let label = format!("{subfolder}/{module}");
        if !is_plain_component(subfolder) || !is_plain_component(module) {
            warn!(module = %label, "rejected module location");
            return Err(ModuleError::ModuleNotFound(label));
        }

        let path = self
            .settings
            .modules_root
            .join(subfolder)
            .join(format!("{module}.{}", self.loader.extension()));
        if !path.is_file() {
            debug!(path = %path.display(), "module file missing");
            return Err(ModuleError::ModuleNotFound(label));
        }

        let mut sink = OutputSink::new();
        let handle = self.loader.load(&path, &mut sink).map_err(|e| match e {
            LoadError::NotFound(_) => ModuleError::ModuleNotFound(label.clone()),
            other => ModuleError::ModuleLoad {
                module: label.clone(),
                message: other.to_string(),
            },
        })?;

        let mut resolved = ResolvedModule {
            name: module.to_owned(),
            import_path: label,
            path,
            via_fallback: false,
            load_output: sink.into_string(),
            handle,
        };
        invoke_captured(&mut resolved, function, Vec::new(), BTreeMap::new())
    }

    /// Create the module root directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::Scan`] if the directory cannot be created.
    pub fn ensure_modules_root(&self) -> ModuleResult<()> {
        let root = &self.settings.modules_root;
        if root.is_dir() {
            return Ok(());
        }
        std::fs::create_dir_all(root).map_err(|e| ModuleError::Scan {
            path: root.clone(),
            message: format!("failed to create module root: {e}"),
        })?;
        info!(path = %root.display(), "created module root");
        Ok(())
    }
}

/// Configured roots, plus the module root's parent when the module root is
/// outside the base directory. Scanned import paths then start with the
/// root's own name and resolve from that parent.
fn resolver_roots(settings: &ServiceSettings) -> SearchRoots {
    let mut roots = settings.roots.clone();
    if settings.import_prefix.is_some() {
        return roots;
    }

    let canonical = |p: &Path| p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
    let modules_root = canonical(&settings.modules_root);
    if modules_root.starts_with(canonical(&roots.base_dir)) {
        return roots;
    }
    if let Some(parent) = settings.modules_root.parent() {
        let parent = parent.to_path_buf();
        if !roots.search_paths.contains(&parent) {
            debug!(root = %parent.display(), "adding module root parent to search paths");
            roots.search_paths.push(parent);
        }
    }
    roots
}

fn is_plain_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn service(dir: &Path) -> ModuleService {
        ModuleService::new(ServiceSettings::new(dir))
    }

    fn write(dir: &Path, rel: &str, body: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn rebuild_then_execute() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "modules/greet.rhai", "fn greet() { print(\"hi\"); 42 }\n");
        let service = service(dir.path());

        let report = service.rebuild_registry().unwrap();
        assert_eq!(report.modules.len(), 1);
        assert_eq!(service.list_modules()[0].import_path, "modules.greet");
        assert_eq!(service.get_functions("greet").unwrap(), vec!["greet"]);

        let inv = service
            .execute("greet", "greet", Vec::new(), BTreeMap::new())
            .unwrap();
        assert_eq!(inv.value, Value::Int(42));
        assert_eq!(inv.output, "hi\n");
    }

    #[test]
    fn rebuild_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        let report = service.rebuild_registry().unwrap();
        assert!(report.modules.is_empty());
        assert!(dir.path().join("modules").is_dir());
        assert!(dir.path().join("modules.yaml").is_file());
    }

    #[test]
    fn missing_registry_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(dir.path());
        assert!(service.list_modules().is_empty());
        let err = service.get_functions("anything").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModuleNotFound);
    }

    #[test]
    fn nested_module_root_resolves_after_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "lib/modules/greet.rhai", "fn greet() { print(\"hi\"); 42 }\n");
        let mut settings = ServiceSettings::new(dir.path());
        settings.modules_root = dir.path().join("lib").join("modules");
        let service = ModuleService::new(settings);

        service.rebuild_registry().unwrap();
        assert_eq!(service.list_modules()[0].import_path, "lib.modules.greet");

        let inv = service
            .execute("greet", "greet", Vec::new(), BTreeMap::new())
            .unwrap();
        assert_eq!(inv.value, Value::Int(42));
        assert_eq!(inv.output, "hi\n");
    }

    #[test]
    fn module_root_outside_base_resolves_through_its_parent() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("work");
        std::fs::create_dir_all(&base).unwrap();
        write(dir.path(), "opt/mods/greet.rhai", "fn greet() { 7 }\n");
        let mut settings = ServiceSettings::new(&base);
        settings.modules_root = dir.path().join("opt").join("mods");
        let service = ModuleService::new(settings);

        service.rebuild_registry().unwrap();
        assert_eq!(service.list_modules()[0].import_path, "mods.greet");
        assert_eq!(service.get_functions("greet").unwrap(), vec!["greet"]);
        let inv = service
            .execute("greet", "greet", Vec::new(), BTreeMap::new())
            .unwrap();
        assert_eq!(inv.value, Value::Int(7));
        assert!(!service.resolver().resolve("greet").unwrap().via_fallback);
    }

    #[test]
    fn run_from_subfolder_bypasses_registry() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "modules/tools/hello.rhai", "fn main() { print(\"ran\"); true }\n");
        let service = service(dir.path());

        let inv = service.run_from_subfolder("tools", "hello", "main").unwrap();
        assert_eq!(inv.value, Value::Bool(true));
        assert_eq!(inv.output, "ran\n");
        assert!(!dir.path().join("modules.yaml").exists());
    }

    #[test]
    fn run_from_subfolder_rejects_missing_and_traversal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "secret.rhai", "fn main() { 1 }\n");
        let service = service(dir.path());

        for (sub, module) in [("tools", "absent"), ("..", "secret"), ("a/b", "c")] {
            let err = service.run_from_subfolder(sub, module, "main").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ModuleNotFound, "{sub}/{module}");
        }
    }
}
