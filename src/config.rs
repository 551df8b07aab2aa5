//! Runtime settings
//!
//! Loaded from an optional config file (TOML, JSON or YAML by extension) and
//! then overridden by `EXECWARDEN_*` environment variables, nested keys
//! separated by `__` (e.g. `EXECWARDEN_ERROR__URL`).

use crate::environment::Environment;
use crate::error::ConfigError;
use crate::payload::ErrorTemplate;
use ::config::{Config, Environment as EnvSource, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "EXECWARDEN";
pub const CONFIG_DIRECTORY: &str = "execwarden";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Template for failure payloads
    pub error: ErrorTemplate,
    /// Lock file guarding against a second instance
    pub pid_file: Option<String>,
    /// Tracing filter directive, e.g. `info` or `execwarden=debug`
    pub log_level: Option<String>,
    pub env: EnvSettings,
}

/// Environment handed to child processes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvSettings {
    /// Start from the parent's environment instead of an empty one
    pub inherit: bool,
    /// Extra variables, applied on top
    pub vars: BTreeMap<String, String>,
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self {
            inherit: true,
            vars: BTreeMap::new(),
        }
    }
}

/// `<config dir>/execwarden/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIRECTORY).join(CONFIG_FILE_NAME))
}

impl Settings {
    /// Load settings.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        match path {
            Some(path) => builder = builder.add_source(File::from(path).required(true)),
            None => {
                if let Some(default) = default_config_path() {
                    builder = builder.add_source(File::from(default).required(false));
                }
            }
        }

        let settings: Settings = builder
            .add_source(EnvSource::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.error.name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "error.name".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.error.message.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "error.message".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Lock file path with `~` and `$VAR` expanded
    pub fn pid_file(&self) -> Option<PathBuf> {
        self.pid_file.as_deref().map(|raw| {
            let expanded = shellexpand::full(raw)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| shellexpand::tilde(raw).into_owned());
            PathBuf::from(expanded)
        })
    }

    /// Environment for child processes
    pub fn environment(&self) -> Environment {
        let base = if self.env.inherit {
            Environment::inherit()
        } else {
            Environment::empty()
        };
        self.env
            .vars
            .iter()
            .fold(base, |env, (key, value)| env.with(key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.error, ErrorTemplate::default());
        assert!(settings.env.inherit);
        assert!(settings.pid_file().is_none());
    }

    #[test]
    fn test_load_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            r#"
pid_file = "/tmp/execwarden-test.pid"

[error]
name = "script_error"
url = "https://example.invalid/errors"
message = "script failed"

[env]
inherit = false

[env.vars]
app_mode = "test"
"#,
        )
        .unwrap();

        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.error.name, "script_error");
        assert_eq!(
            settings.pid_file(),
            Some(PathBuf::from("/tmp/execwarden-test.pid"))
        );

        let env = settings.environment();
        assert_eq!(env.len(), 1);
        assert_eq!(env.get("app_mode"), Some(OsStr::new("test")));
    }

    #[test]
    fn test_partial_error_section_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[error]\nname = \"custom\"\n").unwrap();

        let settings = Settings::load(Some(path.as_path())).unwrap();
        assert_eq!(settings.error.name, "custom");
        assert_eq!(settings.error.url, ErrorTemplate::default().url);
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(Settings::load(Some(path.as_path())).is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[error]\nname = \"\"\n").unwrap();

        let err = Settings::load(Some(path.as_path())).unwrap_err();
        assert!(err.to_string().contains("error.name"));
    }
}
