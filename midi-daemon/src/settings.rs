//! Configuration loading
//!
//! The router configuration is read once at startup from JSON. Lookup order:
//! the file named by `MIDIMUX_CONFIG`, then `$XDG_CONFIG_HOME/midimux/config.json`
//! (falling back to `~/.config/midimux/config.json`). With no file at the
//! default location the built-in defaults are used.

use std::path::{Path, PathBuf};

use midi_mux::{ConfigError, RouterConfig};
use thiserror::Error;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "MIDIMUX_CONFIG";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Invalid { path: PathBuf, source: ConfigError },
}

/// Where the configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// Get the XDG config directory for midimux
fn config_dir() -> Option<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config);
        if path.is_absolute() {
            return Some(path.join("midimux"));
        }
    }

    dirs::home_dir().map(|h| h.join(".config").join("midimux"))
}

/// Default config file path
pub fn default_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.json"))
}

/// Load the router configuration
///
/// An explicit `MIDIMUX_CONFIG` path must exist; the default path may not.
pub fn load() -> Result<(RouterConfig, ConfigSource), SettingsError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        let path = PathBuf::from(path);
        let config = load_from(&path)?;
        return Ok((config, ConfigSource::File(path)));
    }

    match default_path() {
        Some(path) if path.is_file() => {
            let config = load_from(&path)?;
            Ok((config, ConfigSource::File(path)))
        }
        _ => Ok((RouterConfig::default(), ConfigSource::Defaults)),
    }
}

/// Read, parse and validate one config file
pub fn load_from(path: &Path) -> Result<RouterConfig, SettingsError> {
    let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text, path)
}

fn parse(text: &str, path: &Path) -> Result<RouterConfig, SettingsError> {
    let config: RouterConfig =
        serde_json::from_str(text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate().map_err(|source| SettingsError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_object_gives_defaults() {
        let config = parse("{}", Path::new("config.json")).unwrap();
        assert_eq!(config, RouterConfig::default());
    }

    #[test]
    fn test_parse_rejects_invalid_values() {
        let json = r#"{ "emergency": { "channel": 17 } }"#;
        let err = parse(json, Path::new("config.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { .. }));
    }

    #[test]
    fn test_parse_rejects_bad_json() {
        let err = parse("{ ports: ", Path::new("config.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn test_load_from_missing_file() {
        let path = std::env::temp_dir().join("midimux-test-does-not-exist.json");
        let err = load_from(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("midimux-test-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "restart": { "quiescence_ms": 500 } }"#).unwrap();
        let config = load_from(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.restart.quiescence_ms, 500);
        assert_eq!(config.restart.process_name, "Strobot");
    }
}
