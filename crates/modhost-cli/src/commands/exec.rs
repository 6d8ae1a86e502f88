//! Exec command - call a function on a registered module.

use std::collections::BTreeMap;

use anyhow::Context;
use modhost_modules::{Invocation, ModuleService, Value};

use crate::formatter::OutputFormat;
use crate::theme::Theme;

/// Parse a JSON array of positional arguments.
pub(crate) fn parse_args(raw: Option<&str>) -> anyhow::Result<Vec<Value>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Vec::new());
    };
    serde_json::from_str(raw).with_context(|| format!("--args must be a JSON array, got: {raw}"))
}

/// Parse a JSON object of keyword arguments.
pub(crate) fn parse_kwargs(raw: Option<&str>) -> anyhow::Result<BTreeMap<String, Value>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(BTreeMap::new());
    };
    serde_json::from_str(raw).with_context(|| format!("--kwargs must be a JSON object, got: {raw}"))
}

/// Execute `module.function` and print its output and result.
pub(crate) fn run_exec(
    service: &ModuleService,
    module: &str,
    function: &str,
    args: Option<&str>,
    kwargs: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let args = parse_args(args)?;
    let kwargs = parse_kwargs(kwargs)?;
    let invocation = service.execute(module, function, args, kwargs)?;
    print_invocation(&invocation, format)
}

/// Print a successful invocation.
pub(crate) fn print_invocation(invocation: &Invocation, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(invocation)?),
        OutputFormat::Pretty => {
            print!("{}", invocation.output);
            let value = serde_json::to_string(&invocation.value)?;
            println!("{}", Theme::kv("result", &value));
        },
    }
    Ok(())
}
