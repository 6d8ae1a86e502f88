//! Config file discovery and layered loading.
//!
//! 1. Parse the embedded `defaults.toml`
//! 2. Merge `~/.modhost/config.toml` (user)
//! 3. Merge `{workspace}/.modhost/config.toml` (workspace)
//! 4. Apply `MODHOST_*` env fallbacks for fields no file set
//! 5. Resolve `${VAR}` references
//! 6. Deserialize and validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars, resolve_env_references};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_leaves};
use crate::show::ResolvedConfig;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Directory holding config files, both under `$HOME` and a workspace.
pub const CONFIG_DIR: &str = ".modhost";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Maximum allowed config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: usize = 1_048_576;

/// Load the layered configuration using the process environment.
///
/// `workspace_root` enables the workspace layer. `home_override` replaces the
/// user config directory (it is treated as the `.modhost` directory itself).
///
/// # Errors
///
/// Returns a [`ConfigError`] if a config file is unreadable or malformed, or
/// the merged configuration fails validation.
pub fn load(
    workspace_root: Option<&Path>,
    home_override: Option<&Path>,
) -> ConfigResult<ResolvedConfig> {
    load_with_env(workspace_root, home_override, &collect_env_vars())
}

/// Same as [`load`] with an explicit environment map.
///
/// # Errors
///
/// See [`load`].
pub fn load_with_env(
    workspace_root: Option<&Path>,
    home_override: Option<&Path>,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<ResolvedConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_leaves(&merged, "", ConfigLayer::Defaults, &mut field_sources);

    let user_dir = match home_override {
        Some(dir) => dir.to_path_buf(),
        None => home_directory()?.join(CONFIG_DIR),
    };

    let mut layers = vec![(ConfigLayer::User, user_dir.join(CONFIG_FILE))];
    if let Some(ws) = workspace_root {
        layers.push((ConfigLayer::Workspace, workspace_config_path(ws)));
    }

    for (layer, path) in layers {
        if let Some(overlay) = try_load_file(&path)? {
            deep_merge_tracking(&mut merged, &overlay, "", layer, &mut field_sources);
            info!(path = %path.display(), layer = layer.tag(), "loaded config file");
            loaded_files.push(path.display().to_string());
        }
    }

    let env_count = apply_env_fallbacks(&mut merged, &mut field_sources, env_vars)?;
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    resolve_env_references(&mut merged, env_vars);

    let config: Config = merged
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ParseError {
            path: "<merged config>".to_owned(),
            source: e,
        })?;

    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Load a single config file with no layering (defaults fill the gaps).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file is missing, unreadable, malformed or
/// invalid.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let content = read_limited(path)?;
    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;
    validate::validate(&config)?;
    Ok(config)
}

/// Path of the workspace config file for `workspace_root`.
#[must_use]
pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(CONFIG_DIR).join(CONFIG_FILE)
}

fn read_limited(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    if content.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    Ok(content)
}

/// Read and parse a config file, or `None` if it does not exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match read_limited(path) {
        Ok(c) => c,
        Err(ConfigError::ReadError { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => return Err(e),
    };

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(Some(value))
}

fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, body: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILE), body).unwrap();
    }

    #[test]
    fn defaults_deserialize_to_default_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_with_no_files_uses_defaults() {
        let home = tempfile::tempdir().unwrap();
        let resolved = load_with_env(None, Some(home.path()), &HashMap::new()).unwrap();

        assert_eq!(resolved.config, Config::default());
        assert!(resolved.loaded_files.is_empty());
        assert_eq!(
            resolved.field_sources.get("registry.path"),
            Some(&ConfigLayer::Defaults)
        );
    }

    #[test]
    fn workspace_overrides_user() {
        let home = tempfile::tempdir().unwrap();
        let ws = tempfile::tempdir().unwrap();
        write_config(
            home.path(),
            "[registry]\npath = \"user.yaml\"\n[modules]\nroot = \"user_modules\"",
        );
        write_config(&ws.path().join(CONFIG_DIR), "[registry]\npath = \"ws.yaml\"");

        let resolved = load_with_env(Some(ws.path()), Some(home.path()), &HashMap::new()).unwrap();

        assert_eq!(resolved.config.registry.path, "ws.yaml");
        assert_eq!(resolved.config.modules.root, "user_modules");
        assert_eq!(
            resolved.field_sources.get("registry.path"),
            Some(&ConfigLayer::Workspace)
        );
        assert_eq!(
            resolved.field_sources.get("modules.root"),
            Some(&ConfigLayer::User)
        );
        assert_eq!(resolved.loaded_files.len(), 2);
    }

    #[test]
    fn env_is_fallback_only() {
        let home = tempfile::tempdir().unwrap();
        write_config(home.path(), "[logging]\nlevel = \"info\"");
        let env: HashMap<String, String> = [
            ("MODHOST_LOG_LEVEL", "trace"),
            ("MODHOST_REGISTRY_PATH", "/data/reg.yaml"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        let resolved = load_with_env(None, Some(home.path()), &env).unwrap();

        assert_eq!(resolved.config.logging.level, "info");
        assert_eq!(resolved.config.registry.path, "/data/reg.yaml");
        assert_eq!(
            resolved.field_sources.get("registry.path"),
            Some(&ConfigLayer::Environment)
        );
    }

    #[test]
    fn var_references_resolved_after_merge() {
        let home = tempfile::tempdir().unwrap();
        write_config(home.path(), "[registry]\npath = \"${STATE_DIR}/modules.yaml\"");
        let env: HashMap<String, String> =
            std::iter::once(("STATE_DIR".to_owned(), "/state".to_owned())).collect();

        let resolved = load_with_env(None, Some(home.path()), &env).unwrap();
        assert_eq!(resolved.config.registry.path, "/state/modules.yaml");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let home = tempfile::tempdir().unwrap();
        write_config(home.path(), "[registry\npath = ");

        let err = load_with_env(None, Some(home.path()), &HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn invalid_merged_value_fails_validation() {
        let home = tempfile::tempdir().unwrap();
        write_config(home.path(), "[logging]\nformat = \"xml\"");

        let err = load_with_env(None, Some(home.path()), &HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn oversized_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.toml");
        let data = "x = \"".to_owned() + &"a".repeat(1_100_000) + "\"";
        std::fs::write(&path, data).unwrap();

        let result = try_load_file(&path);
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn missing_file_is_skipped_but_load_file_errors() {
        let path = Path::new("/nonexistent/modhost/config.toml");
        assert!(try_load_file(path).unwrap().is_none());
        assert!(matches!(load_file(path), Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn load_file_fills_gaps_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[modules]\nroot = \"plugins\"").unwrap();

        let config = load_file(&path).unwrap();
        assert_eq!(config.modules.root, "plugins");
        assert_eq!(config.registry.path, "modules.yaml");
    }
}
