use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use marlin_util::errors::{MarlinError, MarlinResult};

use crate::overrides::VersionOverrides;
use crate::properties;

/// Name of the secrets file read next to `marlin.toml`.
pub const ENV_FILE_NAME: &str = ".marlin.env";

/// Resolver configuration loaded from `marlin.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Local Maven repository consulted before any remote one.
    #[serde(default, rename = "local-repository")]
    pub local_repository: Option<String>,

    /// Directory for the on-disk content cache.
    #[serde(default, rename = "cache-dir")]
    pub cache_dir: Option<PathBuf>,

    /// Version override declarations (`group:artifact:version`, comma-separated).
    #[serde(default)]
    pub overrides: Vec<String>,

    /// Remote repositories, searched in declaration order.
    #[serde(default)]
    pub repositories: Vec<RepositoryConfig>,
}

/// One `[[repositories]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl ResolverConfig {
    /// Parse a config from TOML text, interpolating `${env:VAR}` references
    /// from the process environment.
    pub fn parse_toml(content: &str) -> MarlinResult<Self> {
        Self::parse_toml_with_env(content, &BTreeMap::new())
    }

    /// Parse a config, resolving `${env:VAR}` from `env` before the process environment.
    pub fn parse_toml_with_env(
        content: &str,
        env: &BTreeMap<String, String>,
    ) -> MarlinResult<Self> {
        let mut config: Self = toml::from_str(content).map_err(|e| MarlinError::Config {
            message: format!("Failed to parse resolver config: {e}"),
        })?;
        config.interpolate_env(env);
        Ok(config)
    }

    /// Load `path`, or return defaults if the file doesn't exist.
    ///
    /// A `.marlin.env` file next to the config supplies `${env:VAR}` values.
    pub fn load(path: &Path) -> MarlinResult<Self> {
        if !path.is_file() {
            tracing::debug!("No resolver config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| MarlinError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        let env_file = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(ENV_FILE_NAME);
        let env = properties::load_env_file(&env_file)?;
        Self::parse_toml_with_env(&content, &env)
    }

    fn interpolate_env(&mut self, env: &BTreeMap<String, String>) {
        for repo in &mut self.repositories {
            repo.url = properties::interpolate(&repo.url, env);
            if let Some(user) = repo.username.as_mut() {
                *user = properties::interpolate(user, env);
            }
            if let Some(pass) = repo.password.as_mut() {
                *pass = properties::interpolate(pass, env);
            }
        }
        if let Some(local) = self.local_repository.as_mut() {
            *local = properties::interpolate(local, env);
        }
    }

    /// Build the version override table from `overrides`.
    pub fn override_table(&self) -> MarlinResult<VersionOverrides> {
        VersionOverrides::parse(&self.overrides)
    }
}

/// The conventional local repository, `~/.m2/repository`.
pub fn default_local_repository() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    Path::new(&home).join(".m2").join("repository")
}
