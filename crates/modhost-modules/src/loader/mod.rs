//! The seam between the host and a dynamic-code engine.
//!
//! A [`CodeLoader`] turns a file into a [`ModuleHandle`]; the handle exposes
//! documentation, callable names and a `call` entry point. The shipped
//! implementation is [`RhaiLoader`].

mod script;

use std::fmt;
use std::path::{Path, PathBuf};

pub use self::script::RhaiLoader;

use crate::output::OutputSink;
use crate::value::Value;

/// Why a module file could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file does not exist.
    #[error("module file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The source did not parse.
    #[error("syntax error in {}: {message}", path.display())]
    Syntax {
        /// File path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Top-level statements raised an error.
    #[error("initialization of {} failed: {message}", path.display())]
    Init {
        /// File path.
        path: PathBuf,
        /// Engine message.
        message: String,
    },
}

/// Error raised by a module function.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CallError(pub String);

/// Loads module files of one kind.
pub trait CodeLoader: Send + Sync {
    /// File extension (without the dot) this loader handles.
    fn extension(&self) -> &str;

    /// Load and initialize the file at `path`.
    ///
    /// Output printed by top-level statements goes to `sink`.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] describing why the file could not be loaded.
    fn load(&self, path: &Path, sink: &mut OutputSink) -> Result<Box<dyn ModuleHandle>, LoadError>;
}

impl fmt::Debug for dyn CodeLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeLoader")
            .field("extension", &self.extension())
            .finish_non_exhaustive()
    }
}

/// A loaded module.
///
/// Handles are process-local and not `Send`.
pub trait ModuleHandle {
    /// Module-level documentation, if any.
    fn doc(&self) -> Option<String>;

    /// Public callable names in enumeration order. May contain repeats
    /// (overloads) and names starting with `__`.
    fn members(&self) -> Vec<String>;

    /// Whether `name` is a public callable.
    fn has_callable(&self, name: &str) -> bool {
        self.members().iter().any(|m| m == name)
    }

    /// Call `name` with positional `args`, writing console output to `sink`.
    ///
    /// # Errors
    ///
    /// Returns a [`CallError`] carrying the engine's message if the function
    /// raises.
    fn call(&mut self, name: &str, args: Vec<Value>, sink: &mut OutputSink)
    -> Result<Value, CallError>;
}

impl fmt::Debug for dyn ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("members", &self.members())
            .finish_non_exhaustive()
    }
}
