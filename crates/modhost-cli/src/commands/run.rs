//! Run command - execute a module file directly, bypassing the registry.

use modhost_modules::ModuleService;

use super::exec::print_invocation;
use crate::formatter::OutputFormat;

/// Run `<modules_root>/<subfolder>/<module>::<function>()`.
pub(crate) fn run_direct(
    service: &ModuleService,
    subfolder: &str,
    module: &str,
    function: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let invocation = service.run_from_subfolder(subfolder, module, function)?;
    print_invocation(&invocation, format)
}
