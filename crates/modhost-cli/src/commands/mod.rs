//! CLI subcommand implementations.

pub(crate) mod config;
pub(crate) mod exec;
pub(crate) mod functions;
pub(crate) mod list;
pub(crate) mod prompt;
pub(crate) mod run;
pub(crate) mod scan;
