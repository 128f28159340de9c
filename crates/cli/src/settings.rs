// Resolution of the config file and page store locations.
//
// Everything lives under `~/.linktitles/` unless overridden on the command
// line. A missing default config file means default settings; a missing
// explicit one is an error.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use linktitles_core::Config;
use tracing::debug;

/// Global directory: `~/.linktitles/`.
pub fn global_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".linktitles"))
}

/// Path to the global config file: `~/.linktitles/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("config.toml"))
}

/// Path to the default page store: `~/.linktitles/pages.db`.
pub fn global_db_path() -> Option<PathBuf> {
    global_dir().map(|d| d.join("pages.db"))
}

/// Load the linking policy from `explicit`, or from the global file if it
/// exists.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::load_from(path)
            .with_context(|| format!("failed to load config `{}`", path.display()));
    }

    match global_config_path() {
        Some(path) if path.is_file() => Config::load_from(&path)
            .with_context(|| format!("failed to load config `{}`", path.display())),
        _ => {
            debug!("no config file found, using defaults");
            Ok(Config::default())
        }
    }
}

/// The page store path: `explicit` or the global default.
pub fn resolve_db_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => global_db_path()
            .context("cannot determine home directory for the page store; pass --db <path>"),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use linktitles_core::title::NS_HELP;

    use super::*;

    #[test]
    fn explicit_config_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "smart_mode = false\ntarget_namespaces = [12]\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert!(!config.smart_mode);
        assert_eq!(config.target_namespaces, vec![NS_HELP]);
        assert_eq!(config.minimum_title_length, Config::default().minimum_title_length);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("absent.toml"));
    }

    #[test]
    fn invalid_config_keeps_config_error_in_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "source_namespaces = []\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(err.chain().any(|cause| cause.is::<linktitles_core::ConfigError>()));
    }

    #[test]
    fn explicit_db_path_wins() {
        let path = Path::new("/tmp/elsewhere.db");
        assert_eq!(resolve_db_path(Some(path)).unwrap(), path);
    }

    #[test]
    fn global_paths_share_one_directory() {
        if let (Some(config), Some(db)) = (global_config_path(), global_db_path()) {
            assert_eq!(config.parent(), db.parent());
            assert!(config.ends_with(".linktitles/config.toml"));
        }
    }
}
