//! Post-merge validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace", "off"];
const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

/// Validate a merged configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    if config.registry.path.trim().is_empty() {
        return Err(invalid("registry.path", "must not be empty"));
    }

    if config.modules.root.trim().is_empty() {
        return Err(invalid("modules.root", "must not be empty"));
    }
    if let Some(prefix) = &config.modules.import_prefix {
        validate_import_prefix(prefix)?;
    }

    validate_roots("resolver.search_paths", &config.resolver.search_paths, false)?;
    validate_roots("resolver.fallback_paths", &config.resolver.fallback_paths, true)?;

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(invalid(
            "logging.level",
            format!(
                "unknown level '{}'; expected one of: {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    let format = config.logging.format.to_ascii_lowercase();
    if !LOG_FORMATS.contains(&format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unknown format '{}'; expected one of: {}",
                config.logging.format,
                LOG_FORMATS.join(", ")
            ),
        ));
    }

    Ok(())
}

fn validate_roots(field: &str, roots: &[String], may_be_empty: bool) -> ConfigResult<()> {
    if roots.is_empty() && !may_be_empty {
        return Err(invalid(field, "at least one root is required"));
    }
    if roots.iter().any(|r| r.trim().is_empty()) {
        return Err(invalid(field, "entries must not be empty"));
    }
    Ok(())
}

fn validate_import_prefix(prefix: &str) -> ConfigResult<()> {
    let ok = !prefix.is_empty()
        && prefix.split('.').all(|seg| {
            !seg.is_empty() && seg.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        });
    if ok {
        Ok(())
    } else {
        Err(invalid(
            "modules.import_prefix",
            format!("'{prefix}' is not a dotted identifier path"),
        ))
    }
}
