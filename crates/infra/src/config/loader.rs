//! Configuration loader
//!
//! Loads storage configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `KEYVAL_DB_DIR` is unset, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//! 5. With no file either, uses defaults
//!
//! ## Environment Variables
//! - `KEYVAL_DB_DIR`: Directory holding the database (required)
//! - `KEYVAL_DB_NAME`: Database file name
//! - `KEYVAL_FLAT_STORE_PATH`: JSON file backing the flat store
//! - `KEYVAL_FLAT_STORE_QUOTA`: Flat store quota in bytes
//! - `KEYVAL_FORCE_BACKEND`: `relational` or `simple`
//! - `KEYVAL_BUSY_TIMEOUT_MS`: SQLite busy timeout
//! - `KEYVAL_ENABLE_WAL`: Whether WAL is enabled (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./keyval.{json,toml}` or `./config.{json,toml}` (current directory)
//! 2. The same names in the parent and grandparent directories
//! 3. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use keyval_domain::{Backend, Config, KeyValError, Result, StorageSettings};

const FILE_NAMES: [&str; 4] = ["keyval.json", "keyval.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `KeyValError::Config` if an environment value or a config file is
/// present but invalid.
pub fn load() -> Result<Config> {
    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) if std::env::var_os("KEYVAL_DB_DIR").is_some() => return Err(e),
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            match probe_config_paths() {
                Some(path) => load_from_file(Some(path))?,
                None => {
                    tracing::info!("No configuration found, using defaults");
                    Config::default()
                }
            }
        }
    };

    config.storage.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// `KEYVAL_DB_DIR` must be present; every other variable is optional.
///
/// # Errors
/// Returns `KeyValError::Config` if the required variable is missing or any
/// value fails to parse.
pub fn load_from_env() -> Result<Config> {
    let defaults = StorageSettings::default();

    let directory = env_var("KEYVAL_DB_DIR")?;
    let database_name = env_opt("KEYVAL_DB_NAME").unwrap_or(defaults.database_name);
    let flat_store_path = env_opt("KEYVAL_FLAT_STORE_PATH");
    let flat_store_quota_bytes = env_opt("KEYVAL_FLAT_STORE_QUOTA")
        .map(|s| {
            s.parse::<usize>()
                .map_err(|e| KeyValError::Config(format!("Invalid flat store quota: {}", e)))
        })
        .transpose()?;
    let force_backend = env_opt("KEYVAL_FORCE_BACKEND").map(|s| Backend::from_str(&s)).transpose()?;
    let busy_timeout_ms = env_opt("KEYVAL_BUSY_TIMEOUT_MS")
        .map(|s| {
            s.parse::<u64>()
                .map_err(|e| KeyValError::Config(format!("Invalid busy timeout: {}", e)))
        })
        .transpose()?
        .unwrap_or(defaults.busy_timeout_ms);
    let enable_wal = env_bool("KEYVAL_ENABLE_WAL", defaults.enable_wal);

    Ok(Config {
        storage: StorageSettings {
            directory,
            database_name,
            flat_store_path,
            flat_store_quota_bytes,
            force_backend,
            busy_timeout_ms,
            enable_wal,
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `KeyValError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(KeyValError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            KeyValError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| KeyValError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| KeyValError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| KeyValError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(KeyValError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut bases = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        bases.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            bases.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    bases
        .iter()
        .flat_map(|base| FILE_NAMES.iter().map(move |name| base.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        KeyValError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Get optional environment variable, treating empty as unset
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::config::ENV_LOCK;

    const ALL_VARS: [&str; 7] = [
        "KEYVAL_DB_DIR",
        "KEYVAL_DB_NAME",
        "KEYVAL_FLAT_STORE_PATH",
        "KEYVAL_FLAT_STORE_QUOTA",
        "KEYVAL_FORCE_BACKEND",
        "KEYVAL_BUSY_TIMEOUT_MS",
        "KEYVAL_ENABLE_WAL",
    ];

    fn clear_env() {
        for var in ALL_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock();

        std::env::set_var("KEYVAL_TEST_BOOL_YES", "YES");
        std::env::set_var("KEYVAL_TEST_BOOL_OFF", "off");
        std::env::remove_var("KEYVAL_TEST_BOOL_MISSING");

        assert!(env_bool("KEYVAL_TEST_BOOL_YES", false));
        assert!(!env_bool("KEYVAL_TEST_BOOL_OFF", true));
        assert!(env_bool("KEYVAL_TEST_BOOL_MISSING", true));

        std::env::remove_var("KEYVAL_TEST_BOOL_YES");
        std::env::remove_var("KEYVAL_TEST_BOOL_OFF");
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock();
        clear_env();

        std::env::set_var("KEYVAL_DB_DIR", "/tmp/keyval");
        std::env::set_var("KEYVAL_DB_NAME", "app.db");
        std::env::set_var("KEYVAL_FLAT_STORE_PATH", "/tmp/keyval/flat.json");
        std::env::set_var("KEYVAL_FLAT_STORE_QUOTA", "1024");
        std::env::set_var("KEYVAL_FORCE_BACKEND", "simple");
        std::env::set_var("KEYVAL_BUSY_TIMEOUT_MS", "250");
        std::env::set_var("KEYVAL_ENABLE_WAL", "false");

        let result = load_from_env();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.storage.directory, "/tmp/keyval");
        assert_eq!(config.storage.database_name, "app.db");
        assert_eq!(config.storage.flat_store_path.as_deref(), Some("/tmp/keyval/flat.json"));
        assert_eq!(config.storage.flat_store_quota_bytes, Some(1024));
        assert_eq!(config.storage.force_backend, Some(Backend::Simple));
        assert_eq!(config.storage.busy_timeout_ms, 250);
        assert!(!config.storage.enable_wal);
    }

    /// Validates defaults for optional variables.
    ///
    /// Assertions:
    /// - Confirms `database_name` equals `"_ionicstorage"`.
    /// - Confirms WAL stays enabled.
    #[test]
    fn test_load_from_env_only_required() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        std::env::set_var("KEYVAL_DB_DIR", "data");

        let result = load_from_env();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.storage.database_name, "_ionicstorage");
        assert_eq!(config.storage.force_backend, None);
        assert!(config.storage.enable_wal);
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock();
        clear_env();

        let result = load_from_env();
        assert!(matches!(result, Err(KeyValError::Config(_))), "Should be a Config error");
    }

    #[test]
    fn test_load_from_env_invalid_values() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        std::env::set_var("KEYVAL_DB_DIR", "data");
        std::env::set_var("KEYVAL_BUSY_TIMEOUT_MS", "soon");

        assert!(matches!(load_from_env(), Err(KeyValError::Config(_))));

        std::env::set_var("KEYVAL_BUSY_TIMEOUT_MS", "100");
        std::env::set_var("KEYVAL_FORCE_BACKEND", "redis");
        assert!(matches!(load_from_env(), Err(KeyValError::Config(_))));

        // An invalid env value isn't silently replaced by a config file
        assert!(matches!(load(), Err(KeyValError::Config(_))));
        clear_env();
    }

    #[test]
    fn test_load_from_file_json() {
        let json_content = r#"{
            "storage": {
                "directory": "/srv/keyval",
                "flat_store_quota_bytes": 2048
            }
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(path).ok();

        let config = result.unwrap();
        assert_eq!(config.storage.directory, "/srv/keyval");
        assert_eq!(config.storage.flat_store_quota_bytes, Some(2048));
        assert_eq!(config.storage.busy_timeout_ms, 5000);
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/keyval.json")));
        assert!(matches!(result, Err(KeyValError::Config(_))), "Should be a Config error");
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_content = r#"
[storage]
directory = "var"
force_backend = "relational"
enable_wal = false
"#;

        let config = parse_config(toml_content, Path::new("keyval.toml")).unwrap();
        assert_eq!(config.storage.force_backend, Some(Backend::Relational));
        assert!(!config.storage.enable_wal);
    }

    #[test]
    fn test_parse_config_invalid_json() {
        let result = parse_config(r#"{ "storage": "#, Path::new("keyval.json"));
        assert!(result.is_err(), "Should fail with invalid JSON");
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", Path::new("keyval.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }
}
