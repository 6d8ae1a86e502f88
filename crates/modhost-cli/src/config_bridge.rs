//! Bridge from `modhost_config::Config` to runtime types.
//!
//! Relative paths in the configuration are resolved against the workspace
//! root, so `modhost --workspace <dir>` behaves the same from any cwd.

use std::path::{Path, PathBuf};

use modhost_config::Config;
use modhost_modules::{SearchRoots, ServiceSettings};
use modhost_telemetry::{FileRotation, LogConfig, LogFormat};

fn resolve(workspace_root: &Path, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace_root.join(path)
    }
}

/// Convert config to [`ServiceSettings`].
pub(crate) fn to_service_settings(cfg: &Config, workspace_root: &Path) -> ServiceSettings {
    let roots = SearchRoots::new(workspace_root)
        .with_search_paths(cfg.resolver.search_paths.iter().map(PathBuf::from).collect())
        .with_fallback_paths(cfg.resolver.fallback_paths.iter().map(PathBuf::from).collect());

    ServiceSettings {
        registry_path: resolve(workspace_root, &cfg.registry.path),
        modules_root: resolve(workspace_root, &cfg.modules.root),
        import_prefix: cfg.modules.import_prefix.clone(),
        roots,
    }
}

/// Convert config to [`LogConfig`].
pub(crate) fn to_log_config(cfg: &Config, workspace_root: &Path) -> LogConfig {
    let format = cfg
        .logging
        .format
        .parse::<LogFormat>()
        .unwrap_or(LogFormat::Compact);

    let mut log_config = LogConfig::new(&cfg.logging.level).with_format(format);

    for directive in &cfg.logging.directives {
        log_config = log_config.with_directive(directive);
    }

    if let Some(dir) = &cfg.logging.directory {
        log_config =
            log_config.with_file_logging(resolve(workspace_root, dir), "modhost", FileRotation::Daily);
    }

    log_config
}

#[cfg(test)]
mod tests {
    use modhost_telemetry::LogTarget;

    use super::*;

    #[test]
    fn relative_paths_join_workspace_root() {
        let cfg = Config::default();
        let settings = to_service_settings(&cfg, Path::new("/srv/app"));

        assert_eq!(settings.registry_path, Path::new("/srv/app/modules.yaml"));
        assert_eq!(settings.modules_root, Path::new("/srv/app/modules"));
        assert_eq!(settings.roots.base_dir, Path::new("/srv/app"));
        assert_eq!(settings.roots.search_paths, vec![PathBuf::from(".")]);
        assert_eq!(settings.roots.fallback_paths, vec![PathBuf::from("..")]);
        assert!(settings.import_prefix.is_none());
    }

    #[test]
    fn absolute_paths_are_kept() {
        let mut cfg = Config::default();
        "/var/lib/modhost/registry.yaml".clone_into(&mut cfg.registry.path);
        cfg.modules.import_prefix = Some("plugins".to_owned());

        let settings = to_service_settings(&cfg, Path::new("/srv/app"));
        assert_eq!(
            settings.registry_path,
            Path::new("/var/lib/modhost/registry.yaml")
        );
        assert_eq!(settings.import_prefix.as_deref(), Some("plugins"));
    }

    #[test]
    fn log_config_follows_logging_section() {
        let mut cfg = Config::default();
        "debug".clone_into(&mut cfg.logging.level);
        "json".clone_into(&mut cfg.logging.format);
        cfg.logging.directives = vec!["rhai=warn".to_owned()];
        cfg.logging.directory = Some("logs".to_owned());

        let lc = to_log_config(&cfg, Path::new("/srv/app"));
        assert_eq!(lc.level, "debug");
        assert_eq!(lc.format, LogFormat::Json);
        assert_eq!(lc.directives, vec!["rhai=warn"]);
        assert_eq!(lc.target, LogTarget::File(PathBuf::from("/srv/app/logs")));
        assert!(!lc.ansi);
    }
}
