//! Prompt command - pick a module and function interactively.

use dialoguer::{Input, Select, theme::ColorfulTheme};
use modhost_modules::ModuleService;

use super::exec::{parse_args, parse_kwargs, print_invocation};
use crate::formatter::OutputFormat;
use crate::theme::Theme;

/// Interactive select-and-run loop over the three boundary operations.
pub(crate) fn run_prompt(service: &ModuleService, format: OutputFormat) -> anyhow::Result<()> {
    let modules = service.list_modules();
    if modules.is_empty() {
        println!(
            "{}",
            Theme::info("No modules registered. Run `modhost scan` first.")
        );
        return Ok(());
    }

    let labels: Vec<String> = modules
        .iter()
        .map(|m| {
            let summary = m.description.lines().next().unwrap_or_default();
            format!("{}  {}", m.name, Theme::dimmed(summary))
        })
        .collect();
    let Some(module_idx) = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Module")
        .items(&labels)
        .default(0)
        .interact_opt()?
    else {
        return Ok(());
    };
    let Some(module) = modules.get(module_idx) else {
        return Ok(());
    };

    let functions = service.get_functions(&module.name)?;
    if functions.is_empty() {
        println!(
            "{}",
            Theme::info(&format!("{} has no public functions", module.name))
        );
        return Ok(());
    }
    let Some(function_idx) = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Function")
        .items(&functions)
        .default(0)
        .interact_opt()?
    else {
        return Ok(());
    };
    let Some(function) = functions.get(function_idx) else {
        return Ok(());
    };

    let args: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Arguments (JSON array)")
        .default("[]".to_owned())
        .interact_text()?;
    let kwargs: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Keyword arguments (JSON object)")
        .default("{}".to_owned())
        .interact_text()?;

    let invocation = service.execute(
        &module.name,
        function,
        parse_args(Some(&args))?,
        parse_kwargs(Some(&kwargs))?,
    )?;
    println!("{}", Theme::separator());
    print_invocation(&invocation, format)
}
