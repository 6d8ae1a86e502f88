//! Environment variable fallbacks and `${VAR}` reference resolution.
//!
//! Environment variables are a **fallback**, not an override: they only fill
//! fields that no config file set. Values that came from the embedded
//! defaults still count as unset.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fmt::Write as _;
use std::hash::BuildHasher;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources};

/// Mapping from an environment variable to a dotted config field.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
}

/// All supported `MODHOST_*` variables.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "MODHOST_REGISTRY_PATH",
        field_path: "registry.path",
    },
    EnvMapping {
        var_name: "MODHOST_MODULES_ROOT",
        field_path: "modules.root",
    },
    EnvMapping {
        var_name: "MODHOST_IMPORT_PREFIX",
        field_path: "modules.import_prefix",
    },
    EnvMapping {
        var_name: "MODHOST_SEARCH_PATHS",
        field_path: "resolver.search_paths",
    },
    EnvMapping {
        var_name: "MODHOST_FALLBACK_PATHS",
        field_path: "resolver.fallback_paths",
    },
    EnvMapping {
        var_name: "MODHOST_LOG_LEVEL",
        field_path: "logging.level",
    },
    EnvMapping {
        var_name: "MODHOST_LOG_FORMAT",
        field_path: "logging.format",
    },
    EnvMapping {
        var_name: "MODHOST_LOG_DIR",
        field_path: "logging.directory",
    },
];

/// Fields holding a list of paths. Their env values use the platform path
/// separator (`:` on Unix, `;` on Windows).
const PATH_LIST_FIELDS: &[&str] = &["resolver.search_paths", "resolver.fallback_paths"];

/// Names of every variable consulted by [`apply_env_fallbacks`].
#[must_use]
pub fn supported_vars() -> Vec<&'static str> {
    ENV_MAPPINGS.iter().map(|m| m.var_name).collect()
}

/// Apply environment fallbacks to fields no config file set.
///
/// Returns the number of variables applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a variable is set but empty.
pub fn apply_env_fallbacks<S: BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        if sources.get(mapping.field_path).is_some_and(|l| l.is_file()) {
            continue;
        }
        let Some(val) = env_vars.get(mapping.var_name) else {
            continue;
        };
        if val.trim().is_empty() {
            return Err(ConfigError::EnvError {
                var_name: mapping.var_name.to_owned(),
                message: "set but empty".to_owned(),
            });
        }

        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var fallback"
        );
        set_field(merged, mapping.field_path, coerce(mapping.field_path, val));
        sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
        count = count.saturating_add(1);
    }

    Ok(count)
}

/// Resolve `${VAR}` references inside every string value of the tree.
///
/// Unknown variables are left in place.
pub fn resolve_env_references<S: BuildHasher>(
    val: &mut toml::Value,
    env_vars: &HashMap<String, String, S>,
) {
    match val {
        toml::Value::String(s) => {
            if s.contains("${") {
                *s = resolve_string_refs(s, env_vars);
            }
        },
        toml::Value::Table(table) => {
            for (_, child) in table.iter_mut() {
                resolve_env_references(child, env_vars);
            }
        },
        toml::Value::Array(arr) => {
            for child in arr.iter_mut() {
                resolve_env_references(child, env_vars);
            }
        },
        _ => {},
    }
}

fn resolve_string_refs<S: BuildHasher>(input: &str, env_vars: &HashMap<String, String, S>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start.saturating_add(2)..];
        let Some(end) = after.find('}') else {
            // Unterminated: keep the remainder verbatim.
            result.push_str(&rest[start..]);
            return result;
        };

        let name = &after[..end];
        match env_vars.get(name) {
            Some(value) if !name.is_empty() => result.push_str(value),
            _ => {
                debug!(var = name, "unresolved env var reference in config");
                let _ = write!(result, "${{{name}}}");
            },
        }
        rest = &after[end.saturating_add(1)..];
    }

    result.push_str(rest);
    result
}

fn coerce(path: &str, val: &str) -> toml::Value {
    if PATH_LIST_FIELDS.contains(&path) {
        let items = std::env::split_paths(OsStr::new(val))
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| toml::Value::String(p.to_string_lossy().into_owned()))
            .collect();
        return toml::Value::Array(items);
    }
    toml::Value::String(val.to_owned())
}

/// Insert `value` at a dotted `path`, creating intermediate tables.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return;
    };

    let mut current = root;
    for segment in segments {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        let child = table
            .entry(segment)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
        if !child.is_table() {
            *child = toml::Value::Table(toml::map::Map::new());
        }
        current = child;
    }

    if let Some(table) = current.as_table_mut() {
        table.insert(leaf.to_owned(), value);
    }
}

/// Snapshot of the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn fallback_fills_default_valued_field() {
        let mut merged: toml::Value = toml::from_str("[registry]\npath = \"modules.yaml\"").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("registry.path".to_owned(), ConfigLayer::Defaults);
        let env = make_env(&[("MODHOST_REGISTRY_PATH", "/srv/registry.yaml")]);

        let count = apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap();

        assert_eq!(count, 1);
        assert_eq!(merged["registry"]["path"].as_str(), Some("/srv/registry.yaml"));
        assert_eq!(sources.get("registry.path"), Some(&ConfigLayer::Environment));
    }

    #[test]
    fn fallback_skips_file_set_field() {
        let mut merged: toml::Value = toml::from_str("[logging]\nlevel = \"warn\"").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("logging.level".to_owned(), ConfigLayer::Workspace);
        let env = make_env(&[("MODHOST_LOG_LEVEL", "debug")]);

        let count = apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap();

        assert_eq!(count, 0);
        assert_eq!(merged["logging"]["level"].as_str(), Some("warn"));
    }

    #[test]
    fn fallback_creates_missing_tables() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut sources = FieldSources::new();
        let env = make_env(&[("MODHOST_IMPORT_PREFIX", "plugins")]);

        apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap();

        assert_eq!(merged["modules"]["import_prefix"].as_str(), Some("plugins"));
    }

    #[cfg(unix)]
    #[test]
    fn path_lists_split_on_separator() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut sources = FieldSources::new();
        let env = make_env(&[("MODHOST_FALLBACK_PATHS", "../shared:/opt/modules")]);

        apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap();

        let paths: Vec<&str> = merged["resolver"]["fallback_paths"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(toml::Value::as_str)
            .collect();
        assert_eq!(paths, vec!["../shared", "/opt/modules"]);
    }

    #[test]
    fn empty_variable_is_an_error() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut sources = FieldSources::new();
        let env = make_env(&[("MODHOST_MODULES_ROOT", "  ")]);

        let err = apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap_err();
        assert!(matches!(err, ConfigError::EnvError { ref var_name, .. } if var_name == "MODHOST_MODULES_ROOT"));
    }

    #[test]
    fn resolves_references() {
        let mut val: toml::Value =
            toml::from_str("[registry]\npath = \"${DATA}/registry/${NAME}.yaml\"").unwrap();
        let env = make_env(&[("DATA", "/var/lib"), ("NAME", "mods")]);

        resolve_env_references(&mut val, &env);

        assert_eq!(val["registry"]["path"].as_str(), Some("/var/lib/registry/mods.yaml"));
    }

    #[test]
    fn unresolved_and_malformed_references_are_kept() {
        let env = make_env(&[]);
        assert_eq!(resolve_string_refs("${MISSING}/x", &env), "${MISSING}/x");
        assert_eq!(resolve_string_refs("a/${OPEN", &env), "a/${OPEN");
        assert_eq!(resolve_string_refs("cost $5", &env), "cost $5");
    }

    #[test]
    fn supported_vars_lists_every_mapping() {
        let vars = supported_vars();
        assert!(vars.contains(&"MODHOST_REGISTRY_PATH"));
        assert!(vars.contains(&"MODHOST_LOG_FORMAT"));
        assert_eq!(vars.len(), ENV_MAPPINGS.len());
    }
}
