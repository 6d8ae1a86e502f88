//! Modhost Test - shared test utilities for the modhost crates.
//!
//! This crate provides canned module scripts and a throwaway workspace
//! harness. Use it as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! modhost-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use modhost_test::{GREET_PRINTS_42, TestWorkspace};
//!
//! #[test]
//! fn greet_runs() {
//!     let ws = TestWorkspace::new();
//!     ws.write_module("greet_module.rhai", GREET_PRINTS_42);
//!     let service = ws.scan_and_save();
//!
//!     let result = service.execute("greet_module", "greet", vec![], Default::default());
//!     assert_eq!(result.unwrap().output, "hi\n");
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod harness;

pub use fixtures::*;
pub use harness::*;
