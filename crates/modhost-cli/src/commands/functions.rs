//! Functions command - list callables on a module.

use modhost_modules::ModuleService;

use crate::formatter::OutputFormat;
use crate::theme::Theme;

/// Resolve `module` and print its callable names.
pub(crate) fn list_functions(
    service: &ModuleService,
    module: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let functions = service.get_functions(module)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&functions)?),
        OutputFormat::Pretty => {
            if functions.is_empty() {
                println!("{}", Theme::info(&format!("{module} has no public functions")));
            }
            for name in &functions {
                println!("{}", Theme::function(name));
            }
        },
    }
    Ok(())
}
