//! Configuration Management
//!
//! Persistent settings for dplx, stored as JSON next to the log file.

use anyhow::{Context, Result};
use dataplex_dcl::dcl::{ClientConfig, RetryConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Default project ID
    #[serde(default)]
    pub project: Option<String>,
    /// Default Dataplex location (region)
    #[serde(default)]
    pub location: Option<String>,
    /// Overrides the Dataplex endpoint
    #[serde(default)]
    pub base_path: Option<String>,
    /// sdsaas endpoint, used when `SDSAAS_URL` is unset
    #[serde(default)]
    pub sdsaas_url: Option<String>,
    /// Overall deadline for an apply or delete, in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// HTTP attempts per request, including the first
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("dplx").join("config.json"))
    }

    /// Load configuration from disk. A missing or unreadable file gives the
    /// defaults.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                tracing::warn!("Failed to read {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    fn parse(content: &str) -> Self {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed config: {}", e);
            Self::default()
        })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;

        Ok(())
    }

    /// Sets one field by its JSON name and saves. An empty value clears it.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let text = || (!value.is_empty()).then(|| value.to_string());
        match key {
            "project" => self.project = text(),
            "location" => self.location = text(),
            "base_path" => self.base_path = text(),
            "sdsaas_url" => self.sdsaas_url = text(),
            "timeout_secs" => {
                self.timeout_secs = text()
                    .map(|v| v.parse::<u64>())
                    .transpose()
                    .with_context(|| format!("timeout_secs must be a number, got {value}"))?
            }
            "max_attempts" => {
                self.max_attempts = text()
                    .map(|v| v.parse::<u32>())
                    .transpose()
                    .with_context(|| format!("max_attempts must be a number, got {value}"))?
            }
            other => anyhow::bail!("unknown config key: {other}"),
        }
        self.save()
    }

    /// Effective project (CLI > config > environment/gcloud)
    pub fn effective_project(&self, flag: Option<&str>) -> Option<String> {
        flag.map(str::to_string)
            .or_else(|| self.project.clone())
            .or_else(dataplex_dcl::gcp::auth::get_default_project)
            .filter(|p| !p.is_empty())
    }

    /// Effective location (CLI > config > environment/gcloud)
    pub fn effective_location(&self, flag: Option<&str>) -> Option<String> {
        flag.map(str::to_string)
            .or_else(|| self.location.clone())
            .or_else(dataplex_dcl::gcp::auth::get_default_location)
            .filter(|l| !l.is_empty())
    }

    /// Library client settings with the overrides from this file applied.
    /// `base_path` from the command line wins over the file.
    pub fn to_client_config(&self, base_path: Option<&str>) -> ClientConfig {
        let mut config = ClientConfig::default();
        if let Some(base) = base_path.or(self.base_path.as_deref()) {
            config = config.with_base_path(base);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(max_attempts) = self.max_attempts {
            config = config.with_retry(RetryConfig {
                max_attempts,
                ..RetryConfig::default()
            });
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_and_malformed() {
        let cfg = Config::parse(r#"{"project":"p1","timeout_secs":60}"#);
        assert_eq!(cfg.project.as_deref(), Some("p1"));
        assert_eq!(cfg.timeout_secs, Some(60));
        assert_eq!(Config::parse("not json"), Config::default());
    }

    #[test]
    fn test_flag_wins_over_file() {
        let cfg = Config {
            project: Some("from-file".into()),
            location: Some("us-central1".into()),
            ..Default::default()
        };
        assert_eq!(cfg.effective_project(Some("from-flag")).as_deref(), Some("from-flag"));
        assert_eq!(cfg.effective_project(None).as_deref(), Some("from-file"));
        assert_eq!(cfg.effective_location(None).as_deref(), Some("us-central1"));
    }

    #[test]
    fn test_to_client_config() {
        let cfg = Config {
            base_path: Some("http://file/".into()),
            timeout_secs: Some(5),
            max_attempts: Some(2),
            ..Default::default()
        };
        let client = cfg.to_client_config(None);
        assert_eq!(client.effective_base_path(), "http://file/");
        assert_eq!(client.timeout, Duration::from_secs(5));
        assert_eq!(client.retry.max_attempts, 2);

        let client = cfg.to_client_config(Some("http://flag"));
        assert_eq!(client.effective_base_path(), "http://flag/");
    }
}
