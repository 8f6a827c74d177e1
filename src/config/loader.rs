use super::Config;
use crate::error::ConfigError;
use directories::UserDirs;
use std::fs;
use std::path::{Path, PathBuf};

impl Config {
    /// Load `config.toml` (explicit path or `~/.chatbridge/config.toml`),
    /// then apply environment overrides.
    ///
    /// A missing file is not an error: defaults are used and the environment
    /// becomes the only source.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match explicit_path {
            Some(path) => path.to_path_buf(),
            None => default_config_path()?,
        };

        let mut config = Self::load_file(&config_path)?.unwrap_or_else(|| {
            tracing::warn!(
                "no config file found at {}, falling back to environment variables",
                config_path.display()
            );
            Self::default()
        });
        config.config_path = config_path;
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(config))
    }
}

fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = UserDirs::new()
        .map(|u| u.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHome)?;
    Ok(home.join(".chatbridge").join("config.toml"))
}
