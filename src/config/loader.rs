//! Settings Loader
//!
//! Layers raw workflow settings with the `config` crate. Highest precedence
//! first: command-line overrides, `CONVERGE_*` environment variables, the
//! settings file, then whatever defaults the target type applies.

use config::{Config, Environment, File, Value};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::defaults;
use crate::error::{ConvergeError, Result};

#[derive(Debug, Default)]
pub struct SettingsLoader {
    file: Option<PathBuf>,
    env_prefix: Option<String>,
    overrides: Vec<(String, Value)>,
}

impl SettingsLoader {
    /// Loader reading `file` if given, otherwise `converge.toml` in the working
    /// directory when it exists.
    pub fn new(file: Option<PathBuf>) -> Self {
        Self {
            file,
            env_prefix: Some(defaults::ENV_PREFIX.to_string()),
            overrides: Vec::new(),
        }
    }

    /// Loader that ignores the process environment.
    pub fn without_environment(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    /// Sets `key` when a value was given on the command line.
    pub fn with_override<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.overrides.push((key.to_string(), value.into()));
        }
        self
    }

    pub fn load<T: DeserializeOwned>(self) -> Result<T> {
        let mut builder = Config::builder();

        match &self.file {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConvergeError::configuration(
                        "config",
                        format!("settings file not found: {}", path.display()),
                    ));
                }
                debug!("Loading settings from: {}", path.display());
                builder = builder.add_source(File::from(path.as_path()).required(true));
            }
            None => {
                builder = builder
                    .add_source(File::from(Path::new(defaults::SETTINGS_FILE)).required(false));
            }
        }

        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(Environment::with_prefix(prefix).try_parsing(true));
        }

        for (key, value) in self.overrides {
            builder = builder.set_override(key, value)?;
        }

        Ok(builder.build()?.try_deserialize::<T>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Default, Deserialize)]
    struct Probe {
        region: Option<String>,
        application: Option<String>,
        debug: Option<bool>,
    }

    #[test]
    fn test_overrides_win_over_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("converge.toml");
        std::fs::write(&path, "region = \"eu-west-1\"\napplication = \"shop\"\n").unwrap();

        let probe: Probe = SettingsLoader::new(Some(path))
            .without_environment()
            .with_override("region", Some("ap-south-1"))
            .with_override::<bool>("debug", None)
            .load()
            .unwrap();

        assert_eq!(probe.region.as_deref(), Some("ap-south-1"));
        assert_eq!(probe.application.as_deref(), Some("shop"));
        assert_eq!(probe.debug, None);
    }

    #[test]
    fn test_missing_explicit_file_is_configuration_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = SettingsLoader::new(Some(temp_dir.path().join("absent.toml")))
            .without_environment()
            .load::<Probe>();
        assert!(matches!(result, Err(ConvergeError::Configuration { .. })));
    }
}
