//! Config command - show the resolved configuration.

use std::path::Path;

use modhost_config::{Config, ShowFormat};

/// Print the merged configuration with the layer each value came from.
pub(crate) fn show_config(workspace_root: &Path, format: ShowFormat) -> anyhow::Result<()> {
    let resolved = Config::load(Some(workspace_root))?;
    let rendered = resolved.show(format)?;
    println!("{rendered}");

    if format == ShowFormat::Toml && !resolved.loaded_files.is_empty() {
        println!();
        for file in &resolved.loaded_files {
            println!("# loaded: {file}");
        }
    }
    Ok(())
}
