//! Source-annotated rendering for `modhost config show`.

use std::fmt::Write as _;

use serde::Serialize;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::FieldSources;
use crate::types::Config;

/// A merged configuration plus where each value came from.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// The final configuration.
    pub config: Config,
    /// Dotted field path to the layer that set it.
    #[serde(rename = "sources")]
    pub field_sources: FieldSources,
    /// Config files that were read, lowest precedence first.
    pub loaded_files: Vec<String>,
}

/// Output format for [`ResolvedConfig::show`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowFormat {
    /// TOML with a trailing `# [layer]` comment on every value.
    Toml,
    /// JSON object with `config`, `sources` and `loaded_files`.
    Json,
}

impl ResolvedConfig {
    /// Render the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SerializeError`] if serialization fails.
    pub fn show(&self, format: ShowFormat) -> ConfigResult<String> {
        match format {
            ShowFormat::Toml => self.show_toml(),
            ShowFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| ConfigError::SerializeError(e.to_string())),
        }
    }

    fn show_toml(&self) -> ConfigResult<String> {
        let body = toml::to_string_pretty(&self.config)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        let mut output = String::from("# Resolved modhost configuration\n");
        output.push_str("# Source annotations: [defaults] [user] [workspace] [env]\n");
        if !self.loaded_files.is_empty() {
            output.push_str("#\n# Loaded files (lowest precedence first):\n");
            for (i, path) in self.loaded_files.iter().enumerate() {
                let _ = writeln!(output, "#   {}. {path}", i.saturating_add(1));
            }
        }
        output.push('\n');

        let mut section = String::new();
        for line in body.lines() {
            let trimmed = line.trim();
            if let Some(header) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                header.clone_into(&mut section);
                output.push_str(line);
                output.push('\n');
                continue;
            }

            match self.annotation_for(trimmed, &section) {
                Some(tag) => {
                    let _ = writeln!(output, "{line}  # [{tag}]");
                },
                None => {
                    output.push_str(line);
                    output.push('\n');
                },
            }
        }

        Ok(output)
    }

    fn annotation_for(&self, line: &str, section: &str) -> Option<&'static str> {
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let key = line.split('=').next()?.trim();
        if key.is_empty() {
            return None;
        }
        let path = if section.is_empty() {
            key.to_owned()
        } else {
            format!("{section}.{key}")
        };
        self.field_sources.get(&path).map(|layer| layer.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::ConfigLayer;

    fn resolved() -> ResolvedConfig {
        let mut field_sources = FieldSources::new();
        field_sources.insert("registry.path".to_owned(), ConfigLayer::Workspace);
        field_sources.insert("modules.root".to_owned(), ConfigLayer::Defaults);
        field_sources.insert("logging.level".to_owned(), ConfigLayer::Environment);
        ResolvedConfig {
            config: Config::default(),
            field_sources,
            loaded_files: vec!["/ws/.modhost/config.toml".to_owned()],
        }
    }

    #[test]
    fn toml_output_annotates_fields_per_section() {
        let out = resolved().show(ShowFormat::Toml).unwrap();

        assert!(out.starts_with("# Resolved modhost configuration"));
        assert!(out.contains("#   1. /ws/.modhost/config.toml"));
        assert!(out.contains("path = \"modules.yaml\"  # [workspace]"));
        assert!(out.contains("root = \"modules\"  # [defaults]"));
        assert!(out.contains("level = \"warn\"  # [env]"));
        assert!(out.contains("[resolver]"));
    }

    #[test]
    fn json_output_has_config_and_sources() {
        let out = resolved().show(ShowFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["config"]["registry"]["path"], "modules.yaml");
        assert_eq!(value["sources"]["registry.path"], "workspace");
        assert_eq!(value["loaded_files"][0], "/ws/.modhost/config.toml");
    }
}
