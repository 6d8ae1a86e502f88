use serde::{Deserialize, Serialize};

/// Fully merged modhost configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registry document settings.
    pub registry: RegistrySection,
    /// Module discovery settings.
    pub modules: ModulesSection,
    /// Module resolution settings.
    pub resolver: ResolverSection,
    /// Logging settings.
    pub logging: LoggingSection,
}

/// `[registry]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySection {
    /// Location of the YAML registry document.
    pub path: String,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            path: "modules.yaml".to_owned(),
        }
    }
}

/// `[modules]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModulesSection {
    /// Directory scanned when rebuilding the registry.
    pub root: String,
    /// Leading segments of every generated import path. Defaults to the
    /// module root's path relative to the workspace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_prefix: Option<String>,
}

impl Default for ModulesSection {
    fn default() -> Self {
        Self {
            root: "modules".to_owned(),
            import_prefix: None,
        }
    }
}

/// `[resolver]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSection {
    /// Roots searched on the primary attempt.
    pub search_paths: Vec<String>,
    /// Roots searched when the primary attempt finds no file.
    pub fallback_paths: Vec<String>,
}

impl Default for ResolverSection {
    fn default() -> Self {
        Self {
            search_paths: vec![".".to_owned()],
            fallback_paths: vec!["..".to_owned()],
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Base level (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: String,
    /// Line layout (`pretty`, `compact`, `json`, `full`).
    pub format: String,
    /// Extra `target=level` directives.
    pub directives: Vec<String>,
    /// Write rolling log files into this directory instead of stderr.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            directory: None,
        }
    }
}
