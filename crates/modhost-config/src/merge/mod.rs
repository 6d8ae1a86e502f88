//! Deep merge of TOML value trees with per-field source tracking.
//!
//! Merging raw [`toml::Value`] trees rather than deserialized structs keeps
//! "absent" distinct from "default": a key missing from an overlay never
//! clobbers the layer below it.

mod deep;
mod types;

pub use deep::{deep_merge_tracking, record_leaves};
pub use types::{ConfigLayer, FieldSources};
