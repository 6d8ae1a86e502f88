use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Which configuration layer a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigLayer {
    /// Embedded `defaults.toml`.
    Defaults,
    /// `~/.modhost/config.toml`.
    User,
    /// `{workspace}/.modhost/config.toml`.
    Workspace,
    /// `MODHOST_*` environment fallback.
    Environment,
}

impl ConfigLayer {
    /// Short tag used in annotated output.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Defaults => "defaults",
            Self::User => "user",
            Self::Workspace => "workspace",
            Self::Environment => "env",
        }
    }

    /// Whether the value was set by a config file.
    #[must_use]
    pub fn is_file(self) -> bool {
        matches!(self, Self::User | Self::Workspace)
    }
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::User => write!(f, "user (~/.modhost/config.toml)"),
            Self::Workspace => write!(f, "workspace (.modhost/config.toml)"),
            Self::Environment => write!(f, "environment variable"),
        }
    }
}

/// Dotted field path to the layer that last set it. Ordered so rendered
/// output is stable.
pub type FieldSources = BTreeMap<String, ConfigLayer>;
