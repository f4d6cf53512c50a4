//! Application configuration
//!
//! Resolved from (highest first): command-line flags, `PRESTATRACK_*`
//! environment variables, `~/.prestatrack/config.json`, built-in defaults.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::types::{PrestaError, Result};

/// Default HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const ENV_ENDPOINT: &str = "PRESTATRACK_ENDPOINT";
const ENV_STATS_ENDPOINT: &str = "PRESTATRACK_STATS_ENDPOINT";
const ENV_AUTH_MODE: &str = "PRESTATRACK_AUTH_MODE";

/// How the session token reaches the backend on submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// `token` field inside the JSON body
    #[default]
    Body,
    /// `Authorization: Bearer <token>` header
    Bearer,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Body => f.write_str("body"),
            Self::Bearer => f.write_str("bearer"),
        }
    }
}

impl FromStr for AuthMode {
    type Err = PrestaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "body" => Ok(Self::Body),
            "bearer" | "header" => Ok(Self::Bearer),
            other => Err(PrestaError::Config(format!(
                "unknown auth mode '{}' (expected body or bearer)",
                other
            ))),
        }
    }
}

/// On-disk configuration file (every field optional)
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    endpoint: Option<String>,
    stats_endpoint: Option<String>,
    auth_mode: Option<AuthMode>,
    timeout_secs: Option<u64>,
}

/// Command-line overrides
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub endpoint: Option<String>,
    pub stats_endpoint: Option<String>,
    pub auth_mode: Option<AuthMode>,
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    endpoint: Option<String>,
    stats_endpoint: Option<String>,
    pub auth_mode: AuthMode,
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            stats_endpoint: None,
            auth_mode: AuthMode::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Build a config pointing at a single endpoint (tests, one-off use)
    pub fn with_endpoint(endpoint: impl Into<String>, auth_mode: AuthMode) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            auth_mode,
            ..Self::default()
        }
    }

    /// Load from the default config file, the environment and overrides
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let file = match Self::default_path() {
            Ok(path) => Self::read_file(&path)?,
            Err(_) => ConfigFile::default(),
        };
        Self::resolve(file, |key| std::env::var(key).ok(), overrides)
    }

    /// Load using an explicit config file path
    pub fn load_from(path: &Path, overrides: &ConfigOverrides) -> Result<Self> {
        let file = Self::read_file(path)?;
        Self::resolve(file, |key| std::env::var(key).ok(), overrides)
    }

    /// Default config path (~/.prestatrack/config.json)
    pub fn default_path() -> Result<PathBuf> {
        let base_dirs = BaseDirs::new()
            .ok_or_else(|| PrestaError::Config("Cannot determine home directory".into()))?;
        Ok(base_dirs.home_dir().join(".prestatrack").join("config.json"))
    }

    fn read_file(path: &Path) -> Result<ConfigFile> {
        if !path.exists() {
            return Ok(ConfigFile::default());
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            PrestaError::Config(format!("invalid config file {}: {}", path.display(), e))
        })
    }

    fn resolve<F>(file: ConfigFile, env: F, overrides: &ConfigOverrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let env_auth = match non_blank(env(ENV_AUTH_MODE)) {
            Some(raw) => Some(raw.parse::<AuthMode>()?),
            None => None,
        };

        Ok(Self {
            endpoint: non_blank(overrides.endpoint.clone())
                .or_else(|| non_blank(env(ENV_ENDPOINT)))
                .or_else(|| non_blank(file.endpoint)),
            stats_endpoint: non_blank(overrides.stats_endpoint.clone())
                .or_else(|| non_blank(env(ENV_STATS_ENDPOINT)))
                .or_else(|| non_blank(file.stats_endpoint)),
            auth_mode: overrides
                .auth_mode
                .or(env_auth)
                .or(file.auth_mode)
                .unwrap_or_default(),
            timeout_secs: file
                .timeout_secs
                .filter(|t| *t > 0)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Endpoint used for the catalog and submissions
    pub fn endpoint(&self) -> Result<&str> {
        self.endpoint.as_deref().ok_or_else(|| {
            PrestaError::Config(format!(
                "no endpoint configured (use --endpoint, {} or config.json)",
                ENV_ENDPOINT
            ))
        })
    }

    /// Endpoint used for transaction history; defaults to `endpoint`
    pub fn stats_endpoint(&self) -> Result<&str> {
        match self.stats_endpoint.as_deref() {
            Some(url) => Ok(url),
            None => self.endpoint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            AppConfig::resolve(ConfigFile::default(), env_from(&[]), &Default::default())
                .unwrap();
        assert_eq!(config.auth_mode, AuthMode::Body);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(matches!(config.endpoint(), Err(PrestaError::Config(_))));
    }

    #[test]
    fn test_precedence_flag_over_env_over_file() {
        let file = ConfigFile {
            endpoint: Some("https://file.example".into()),
            auth_mode: Some(AuthMode::Bearer),
            ..Default::default()
        };
        let env = env_from(&[(ENV_ENDPOINT, "https://env.example")]);

        let config = AppConfig::resolve(file, &env, &Default::default()).unwrap();
        assert_eq!(config.endpoint().unwrap(), "https://env.example");
        assert_eq!(config.auth_mode, AuthMode::Bearer);

        let overrides = ConfigOverrides {
            endpoint: Some("https://flag.example".into()),
            auth_mode: Some(AuthMode::Body),
            ..Default::default()
        };
        let config = AppConfig::resolve(ConfigFile::default(), &env, &overrides).unwrap();
        assert_eq!(config.endpoint().unwrap(), "https://flag.example");
        assert_eq!(config.auth_mode, AuthMode::Body);
    }

    #[test]
    fn test_stats_endpoint_falls_back() {
        let config = AppConfig::with_endpoint("https://one.example", AuthMode::Body);
        assert_eq!(config.stats_endpoint().unwrap(), "https://one.example");

        let env = env_from(&[(ENV_STATS_ENDPOINT, "https://stats.example")]);
        let file = ConfigFile {
            endpoint: Some("https://one.example".into()),
            ..Default::default()
        };
        let config = AppConfig::resolve(file, env, &Default::default()).unwrap();
        assert_eq!(config.stats_endpoint().unwrap(), "https://stats.example");
    }

    #[test]
    fn test_blank_values_ignored() {
        let env = env_from(&[(ENV_ENDPOINT, "  "), (ENV_AUTH_MODE, "")]);
        let config = AppConfig::resolve(ConfigFile::default(), env, &Default::default()).unwrap();
        assert!(config.endpoint().is_err());
        assert_eq!(config.auth_mode, AuthMode::Body);
    }

    #[test]
    fn test_invalid_env_auth_mode() {
        let env = env_from(&[(ENV_AUTH_MODE, "cookie")]);
        let err =
            AppConfig::resolve(ConfigFile::default(), env, &Default::default()).unwrap_err();
        assert!(matches!(err, PrestaError::Config(_)));
    }

    #[test]
    fn test_auth_mode_parse() {
        assert_eq!("BODY".parse::<AuthMode>().unwrap(), AuthMode::Body);
        assert_eq!("bearer".parse::<AuthMode>().unwrap(), AuthMode::Bearer);
        assert_eq!("header".parse::<AuthMode>().unwrap(), AuthMode::Bearer);
        assert_eq!(AuthMode::Bearer.to_string(), "bearer");
    }

    #[test]
    fn test_read_config_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(
            &path,
            r#"{"endpoint": "https://file.example", "auth_mode": "bearer", "timeout_secs": 3}"#,
        )
        .unwrap();

        let file = AppConfig::read_file(&path).unwrap();
        let config = AppConfig::resolve(file, env_from(&[]), &Default::default()).unwrap();
        assert_eq!(config.endpoint().unwrap(), "https://file.example");
        assert_eq!(config.auth_mode, AuthMode::Bearer);
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn test_missing_config_file_is_default() {
        let temp = TempDir::new().unwrap();
        let file = AppConfig::read_file(&temp.path().join("absent.json")).unwrap();
        assert!(file.endpoint.is_none());
    }

    #[test]
    fn test_corrupt_config_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            AppConfig::read_file(&path),
            Err(PrestaError::Config(_))
        ));
    }
}
