//! Rhai script modules.
//!
//! - documentation: the script's `//!` comments
//! - callables: non-`private` `fn` definitions
//! - output: `print` and `debug` statements

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rhai::{AST, CallFnOptions, Dynamic, Engine, FnAccess, Map, Scope};
use tracing::trace;

use super::{CallError, CodeLoader, LoadError, ModuleHandle};
use crate::output::OutputSink;
use crate::value::Value;

/// Loads `*.rhai` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct RhaiLoader;

impl RhaiLoader {
    /// Create a loader.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CodeLoader for RhaiLoader {
    fn extension(&self) -> &str {
        "rhai"
    }

    fn load(&self, path: &Path, sink: &mut OutputSink) -> Result<Box<dyn ModuleHandle>, LoadError> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound(path.to_path_buf())
            } else {
                LoadError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let captured = Rc::new(RefCell::new(String::new()));
        let engine = capturing_engine(&captured);

        let ast = engine.compile(&source).map_err(|e| LoadError::Syntax {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut scope = Scope::new();
        let init = engine.run_ast_with_scope(&mut scope, &ast);
        sink.append(&captured.take());
        init.map_err(|e| LoadError::Init {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        trace!(path = %path.display(), "loaded rhai module");
        Ok(Box::new(RhaiModule {
            path: path.to_path_buf(),
            doc: module_doc(&ast),
            engine,
            ast,
            scope,
            captured,
        }))
    }
}

/// An engine whose `print`/`debug` output lands in `captured`.
fn capturing_engine(captured: &Rc<RefCell<String>>) -> Engine {
    let mut engine = Engine::new();

    let out = Rc::clone(captured);
    engine.on_print(move |text| push_line(&out, text));

    let out = Rc::clone(captured);
    engine.on_debug(move |text, _source, _pos| push_line(&out, text));

    engine
}

fn push_line(buf: &RefCell<String>, text: &str) {
    let mut buf = buf.borrow_mut();
    buf.push_str(text);
    buf.push('\n');
}

/// Joined `//!` comments with the markers stripped.
fn module_doc(ast: &AST) -> Option<String> {
    let text = ast
        .doc()
        .lines()
        .map(|line| {
            let line = line.trim_start();
            line.strip_prefix("//!")
                .map_or(line, |rest| rest.strip_prefix(' ').unwrap_or(rest))
        })
        .collect::<Vec<_>>()
        .join("\n");

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

/// A compiled and initialized Rhai script.
struct RhaiModule {
    path: PathBuf,
    doc: Option<String>,
    engine: Engine,
    ast: AST,
    scope: Scope<'static>,
    captured: Rc<RefCell<String>>,
}

impl ModuleHandle for RhaiModule {
    fn doc(&self) -> Option<String> {
        self.doc.clone()
    }

    fn members(&self) -> Vec<String> {
        // The AST's function table is hash-ordered; sort for a stable listing.
        let mut names: Vec<String> = self
            .ast
            .iter_functions()
            .filter(|f| !matches!(f.access, FnAccess::Private))
            .map(|f| f.name.to_string())
            .collect();
        names.sort();
        names
    }

    fn call(
        &mut self,
        name: &str,
        args: Vec<Value>,
        sink: &mut OutputSink,
    ) -> Result<Value, CallError> {
        self.captured.borrow_mut().clear();

        let args: Vec<Dynamic> = args.into_iter().map(to_dynamic).collect();
        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
        let result =
            self.engine
                .call_fn_with_options::<Dynamic>(options, &mut self.scope, &self.ast, name, args);

        sink.append(&self.captured.take());

        match result {
            Ok(value) => Ok(from_dynamic(value)),
            Err(e) => {
                trace!(path = %self.path.display(), function = name, error = %e, "rhai call failed");
                Err(CallError(e.to_string()))
            },
        }
    }
}

fn to_dynamic(value: Value) -> Dynamic {
    match value {
        Value::Null => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from(b),
        Value::Int(i) => Dynamic::from(i),
        Value::Float(f) => Dynamic::from(f),
        Value::String(s) => Dynamic::from(s),
        Value::Array(items) => Dynamic::from_array(items.into_iter().map(to_dynamic).collect()),
        Value::Map(map) => Dynamic::from_map(
            map.into_iter()
                .map(|(k, v)| (k.into(), to_dynamic(v)))
                .collect::<Map>(),
        ),
    }
}

fn from_dynamic(value: Dynamic) -> Value {
    if value.is_unit() {
        return Value::Null;
    }
    if let Ok(b) = value.as_bool() {
        return Value::Bool(b);
    }
    if let Ok(i) = value.as_int() {
        return Value::Int(i);
    }
    if let Ok(f) = value.as_float() {
        return Value::Float(f);
    }
    if value.is_string() {
        return value
            .into_string()
            .map_or(Value::Null, Value::String);
    }
    if value.is_array() {
        return value.into_array().map_or(Value::Null, |items| {
            Value::Array(items.into_iter().map(from_dynamic).collect())
        });
    }
    if value.is_map() {
        return value.try_cast::<Map>().map_or(Value::Null, |map| {
            Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k.to_string(), from_dynamic(v)))
                    .collect::<BTreeMap<_, _>>(),
            )
        });
    }
    // Chars, timestamps, function pointers and custom types.
    Value::String(value.to_string())
}
