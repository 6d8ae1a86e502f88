//! Modhost Telemetry - logging and request tracing for the modhost plugin host.
//!
//! This crate provides:
//! - A [`LogConfig`] describing level, format and output target
//! - [`setup_logging`] which installs a `tracing` subscriber from that config
//! - [`RequestContext`] / [`RequestGuard`] for correlating the log lines of
//!   one command or invocation
//!
//! # Example
//!
//! ```rust,no_run
//! use modhost_telemetry::{LogConfig, LogFormat, RequestContext, setup_logging};
//!
//! # fn main() -> Result<(), modhost_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("modhost_modules=debug");
//! setup_logging(&config)?;
//!
//! let ctx = RequestContext::new("cli").with_operation("exec");
//! let span = ctx.span();
//! let _entered = span.enter();
//! tracing::info!("running module function");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::{RequestContext, RequestGuard};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
