//! Calling functions on resolved modules.

use std::collections::{BTreeMap, HashSet};
use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ModuleError, ModuleResult};
use crate::output::OutputSink;
use crate::resolver::ResolvedModule;
use crate::value::Value;

/// Successful invocation: the return value and everything printed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invocation {
    /// Function return value.
    pub value: Value,
    /// Captured output, one `\n`-terminated line per print.
    pub output: String,
}

fn is_internal(name: &str) -> bool {
    name.starts_with("__")
}

/// Call `function` on `module`, writing its output to `sink`.
///
/// Non-empty `kwargs` are passed as one trailing map argument after `args`.
///
/// # Errors
///
/// - [`ModuleError::FunctionNotFound`] if the module has no public callable
///   named `function`. Nothing is run.
/// - [`ModuleError::Execution`] if the function raises or the loader
///   panics. The error carries whatever was printed before the failure.
pub fn invoke(
    module: &mut ResolvedModule,
    function: &str,
    args: Vec<Value>,
    kwargs: BTreeMap<String, Value>,
    sink: &mut OutputSink,
) -> ModuleResult<Value> {
    if is_internal(function) || !module.handle.has_callable(function) {
        debug!(module = %module.name, function, "function not found");
        return Err(ModuleError::FunctionNotFound {
            module: module.name.clone(),
            function: function.to_owned(),
        });
    }

    let mut args = args;
    if !kwargs.is_empty() {
        args.push(Value::Map(kwargs));
    }

    let handle = &mut module.handle;
    let outcome = catch_unwind(AssertUnwindSafe(|| handle.call(function, args, sink)));

    let message = match outcome {
        Ok(Ok(value)) => {
            debug!(module = %module.name, function, result = value.type_name(), "invocation succeeded");
            return Ok(value);
        },
        Ok(Err(e)) => e.0,
        Err(payload) => panic_message(payload.as_ref()),
    };

    warn!(module = %module.name, function, error = %message, "invocation failed");
    Err(ModuleError::Execution {
        module: module.name.clone(),
        function: function.to_owned(),
        message,
        output: sink.contents().to_owned(),
    })
}

/// [`invoke`] with a fresh sink, returning the value and captured output.
///
/// # Errors
///
/// See [`invoke`].
pub fn invoke_captured(
    module: &mut ResolvedModule,
    function: &str,
    args: Vec<Value>,
    kwargs: BTreeMap<String, Value>,
) -> ModuleResult<Invocation> {
    let mut sink = OutputSink::new();
    let value = invoke(module, function, args, kwargs, &mut sink)?;
    Ok(Invocation {
        value,
        output: sink.into_string(),
    })
}

/// Public callable names, without `__` names, deduplicated in the
/// handle's enumeration order.
#[must_use]
pub fn list_functions(module: &ResolvedModule) -> Vec<String> {
    let mut seen = HashSet::new();
    module
        .handle
        .members()
        .into_iter()
        .filter(|name| !is_internal(name))
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("module panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("module panicked: {s}")
    } else {
        "module panicked".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::error::ErrorKind;
    use crate::loader::{CallError, CodeLoader, ModuleHandle, RhaiLoader};

    fn resolved(body: &str) -> (tempfile::TempDir, ResolvedModule) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.rhai");
        std::fs::write(&path, body).unwrap();
        let handle = RhaiLoader::new().load(&path, &mut OutputSink::new()).unwrap();
        (dir, wrap(path, handle))
    }

    fn wrap(path: PathBuf, handle: Box<dyn ModuleHandle>) -> ResolvedModule {
        ResolvedModule {
            name: "m".to_owned(),
            import_path: "modules.m".to_owned(),
            path,
            via_fallback: false,
            load_output: String::new(),
            handle,
        }
    }

    /// Native handle with overloads, an internal name and a panicking call.
    struct Native;

    impl ModuleHandle for Native {
        fn doc(&self) -> Option<String> {
            None
        }

        fn members(&self) -> Vec<String> {
            ["run", "__init", "run", "explode"].map(str::to_owned).to_vec()
        }

        fn call(&mut self, name: &str, _args: Vec<Value>, sink: &mut OutputSink) -> Result<Value, CallError> {
            sink.write_line("native");
            match name {
                "explode" => panic!("kaboom"),
                _ => Ok(Value::Bool(true)),
            }
        }
    }

    #[test]
    fn returns_value_and_output() {
        let (_dir, mut module) = resolved("fn greet() { print(\"hi\"); 42 }\n");
        let inv = invoke_captured(&mut module, "greet", Vec::new(), BTreeMap::new()).unwrap();
        assert_eq!(inv.value, Value::Int(42));
        assert_eq!(inv.output, "hi\n");
    }

    #[test]
    fn silent_function_has_empty_output() {
        let (_dir, mut module) = resolved("fn quiet() { () }\n");
        let inv = invoke_captured(&mut module, "quiet", Vec::new(), BTreeMap::new()).unwrap();
        assert!(inv.value.is_null());
        assert_eq!(inv.output, "");
    }

    #[test]
    fn unknown_function_is_not_run() {
        let (_dir, mut module) = resolved("fn greet() { print(\"side effect\"); 1 }\n");
        let mut sink = OutputSink::new();
        let err = invoke(&mut module, "bar", Vec::new(), BTreeMap::new(), &mut sink).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FunctionNotFound);
        assert!(sink.is_empty());
    }

    #[test]
    fn raised_error_carries_partial_output() {
        let (_dir, mut module) = resolved("fn boom() { print(\"step 1\"); throw \"bad input\"; }\n");
        let err = invoke_captured(&mut module, "boom", Vec::new(), BTreeMap::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionError);
        assert!(err.to_string().contains("bad input"));
        assert_eq!(err.captured_output(), Some("step 1\n"));
    }

    #[test]
    fn wrong_arity_is_an_execution_error() {
        let (_dir, mut module) = resolved("fn add(a, b) { a + b }\n");
        let err = invoke_captured(&mut module, "add", vec![Value::Int(1)], BTreeMap::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionError);
    }

    #[test]
    fn kwargs_become_trailing_map() {
        let (_dir, mut module) =
            resolved("fn greet(greeting, opts) { `${greeting}, ${opts.name}` }\n");
        let mut kwargs = BTreeMap::new();
        kwargs.insert("name".to_owned(), Value::from("Ada"));

        let inv = invoke_captured(&mut module, "greet", vec![Value::from("Hello")], kwargs).unwrap();
        assert_eq!(inv.value, Value::from("Hello, Ada"));
    }

    #[test]
    fn output_does_not_leak_between_calls() {
        let (_dir, mut module) = resolved(
            "fn one() { print(\"one\"); 1 }\nfn fail() { print(\"partial\"); throw \"x\"; }\n",
        );
        let first = invoke_captured(&mut module, "one", Vec::new(), BTreeMap::new()).unwrap();
        let _ = invoke_captured(&mut module, "fail", Vec::new(), BTreeMap::new()).unwrap_err();
        let third = invoke_captured(&mut module, "one", Vec::new(), BTreeMap::new()).unwrap();
        assert_eq!(first.output, "one\n");
        assert_eq!(third.output, "one\n");
    }

    #[test]
    fn panics_become_execution_errors() {
        let mut module = wrap(Path::new("native").to_path_buf(), Box::new(Native));
        let err = invoke_captured(&mut module, "explode", Vec::new(), BTreeMap::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutionError);
        assert!(err.to_string().contains("kaboom"));
        assert_eq!(err.captured_output(), Some("native\n"));
    }

    #[test]
    fn internal_names_are_hidden_and_uncallable() {
        let mut module = wrap(PathBuf::from("native"), Box::new(Native));
        assert_eq!(list_functions(&module), vec!["run", "explode"]);

        let err = invoke_captured(&mut module, "__init", Vec::new(), BTreeMap::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FunctionNotFound);
    }
}
