//! Commonly used telemetry types.
//!
//! ```rust,no_run
//! use modhost_telemetry::prelude::*;
//!
//! # fn main() -> TelemetryResult<()> {
//! setup_logging(&LogConfig::new("debug").with_format(LogFormat::Compact))?;
//!
//! let _guard = RequestGuard::new(RequestContext::new("cli").with_operation("scan"));
//! tracing::info!("scanning");
//! # Ok(())
//! # }
//! ```

pub use crate::{TelemetryError, TelemetryResult};

pub use crate::{FileRotation, LogConfig, LogFormat, LogTarget};

pub use crate::{setup_default_logging, setup_logging};

pub use crate::{RequestContext, RequestGuard};
