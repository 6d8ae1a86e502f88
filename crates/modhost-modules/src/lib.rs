//! Modhost Modules - discovery, registry and invocation of script modules.
//!
//! A module is a Rhai script under a module root. This crate provides:
//! - [`Scanner`]: walks the root and builds one [`ModuleRecord`] per file
//! - [`RegistryStore`]: persists records as a YAML registry document
//! - [`Resolver`]: loads a registered module, healing stale import paths
//!   through fallback search roots
//! - [`invoke`] / [`list_functions`]: calls a function with per-call output
//!   capture and lists what can be called
//! - [`ModuleService`]: the boundary an embedding layer uses
//!
//! # Example
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//!
//! use modhost_modules::{ModuleService, ServiceSettings};
//!
//! let service = ModuleService::new(ServiceSettings::new("."));
//! service.rebuild_registry()?;
//!
//! for record in service.list_modules() {
//!     println!("{}: {}", record.name, record.description);
//! }
//!
//! let result = service.execute("greet_module", "greet", Vec::new(), BTreeMap::new())?;
//! print!("{}", result.output);
//! println!("=> {}", result.value);
//! # Ok::<(), modhost_modules::ModuleError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod error;
pub mod import_path;
pub mod invoke;
pub mod loader;
pub mod output;
pub mod record;
pub mod registry;
pub mod resolver;
pub mod scanner;
pub mod service;
pub mod value;

pub use error::{ErrorKind, ErrorReport, ModuleError, ModuleResult};
pub use import_path::{HEALED_MARKER, ImportPath, ImportPathError};
pub use invoke::{Invocation, invoke, invoke_captured, list_functions};
pub use loader::{CallError, CodeLoader, LoadError, ModuleHandle, RhaiLoader};
pub use output::OutputSink;
pub use record::{ModuleRecord, NO_DESCRIPTION, RegistryDocument};
pub use registry::RegistryStore;
pub use resolver::{ResolvedModule, Resolver, SearchRoots};
pub use scanner::{ScanReport, Scanner};
pub use service::{ModuleService, ServiceSettings};
pub use value::Value;
