//! Output format selection and failure reporting.

use std::fmt;
use std::str::FromStr;

use modhost_modules::ModuleError;

use crate::theme::Theme;

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum OutputFormat {
    /// Colored, human-readable.
    #[default]
    Pretty,
    /// Machine-readable JSON on stdout.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format '{other}' (expected pretty or json)")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        })
    }
}

/// Print a failed command. Module errors are printed as their
/// `{kind, message}` report.
pub(crate) fn print_failure(err: &anyhow::Error, format: OutputFormat) {
    let module_err = err.downcast_ref::<ModuleError>();

    match (format, module_err) {
        (OutputFormat::Json, Some(e)) => {
            let report = serde_json::to_string(&e.report())
                .unwrap_or_else(|_| format!("{{\"kind\":\"{}\"}}", e.kind()));
            println!("{report}");
        },
        (OutputFormat::Json, None) => {
            let body = serde_json::json!({ "kind": "Error", "message": format!("{err:#}") });
            println!("{body}");
        },
        (OutputFormat::Pretty, Some(e)) => {
            if let Some(output) = e.captured_output() {
                print!("{output}");
            }
            eprintln!("{}", Theme::error(&format!("{}: {e}", e.kind())));
        },
        (OutputFormat::Pretty, None) => {
            eprintln!("{}", Theme::error(&format!("{err:#}")));
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_formats() {
        assert_eq!("pretty".parse::<OutputFormat>(), Ok(OutputFormat::Pretty));
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("yaml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }
}
