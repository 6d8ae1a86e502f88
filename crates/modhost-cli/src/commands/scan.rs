//! Scan command - rebuild the registry from the module root.

use modhost_modules::{ModuleService, ScanReport};

use crate::formatter::OutputFormat;
use crate::theme::Theme;

/// Scan the module root and save the registry.
pub(crate) fn run_scan(service: &ModuleService, format: OutputFormat) -> anyhow::Result<()> {
    let report = service.rebuild_registry()?;
    let registry = service.registry().path().display().to_string();

    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "registry": registry,
                "modules": report.modules.iter().map(|m| &m.name).collect::<Vec<_>>(),
                "skipped": report.skipped.iter().map(|e| e.report()).collect::<Vec<_>>(),
                "duplicates": report.duplicates.iter().map(|e| e.report()).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        },
        OutputFormat::Pretty => print_summary(&report, &registry),
    }
    Ok(())
}

fn print_summary(report: &ScanReport, registry: &str) {
    for err in &report.skipped {
        println!("{}", Theme::warning(&err.to_string()));
    }
    for err in &report.duplicates {
        println!("{}", Theme::warning(&err.to_string()));
    }

    println!(
        "{}",
        Theme::success(&format!(
            "Registered {} module(s) in {registry}",
            report.modules.len()
        ))
    );
    if !report.skipped.is_empty() || !report.duplicates.is_empty() {
        println!(
            "{}",
            Theme::dimmed(&format!(
                "{} skipped, {} duplicate(s)",
                report.skipped.len(),
                report.duplicates.len()
            ))
        );
    }
}
