//! List command - show registered modules.

use colored::Colorize;
use modhost_modules::ModuleService;

use crate::formatter::OutputFormat;
use crate::theme::Theme;

/// Print every registered module with its description and functions.
pub(crate) fn list_modules(service: &ModuleService, format: OutputFormat) -> anyhow::Result<()> {
    let modules = service.list_modules();

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&modules)?);
        return Ok(());
    }

    if modules.is_empty() {
        println!(
            "{}",
            Theme::info("No modules registered. Run `modhost scan` first.")
        );
        return Ok(());
    }

    println!("\n{}", Theme::header("Registered Modules"));
    println!("{}", Theme::separator());
    for module in &modules {
        println!("{} {}", Theme::module(&module.name), Theme::dimmed(&module.import_path));
        for line in module.description.lines() {
            println!("    {line}");
        }
        let functions: Vec<_> = module.functions.iter().map(String::as_str).collect();
        if !functions.is_empty() {
            println!("    {} {}", "fn".dimmed(), functions.join(", "));
        }
    }
    println!();
    Ok(())
}
