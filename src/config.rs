//! Logger configuration

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::registry::{ChannelKind, Severity, DEFAULT_FORMAT};

/// Options consumed once when the registry is configured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Output directory, created if missing
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Logical base name; files are `<path>/<name>.log.<date>` and friends
    #[serde(default = "default_name")]
    pub name: String,

    /// Enable the service channel (default: true)
    #[serde(default = "default_service")]
    pub service: bool,

    /// Enable the trace channel (default: false)
    #[serde(default)]
    pub trace: bool,

    /// Enable the audit channel (default: false)
    #[serde(default)]
    pub audit: bool,

    /// Line template for service and trace lines; audit lines are always JSON
    #[serde(default = "default_format")]
    pub format: String,

    /// Minimum severity written, applied to every enabled channel
    #[serde(default)]
    pub level: Severity,

    /// Dated files kept per channel, 0 keeps everything
    #[serde(default)]
    pub backup_count: usize,

    /// Create each file on its first write instead of at startup
    #[serde(default)]
    pub delay: bool,
}

fn default_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_name() -> String {
    "default".to_string()
}

fn default_service() -> bool {
    true
}

fn default_format() -> String {
    DEFAULT_FORMAT.to_string()
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            name: default_name(),
            service: default_service(),
            trace: false,
            audit: false,
            format: default_format(),
            level: Severity::default(),
            backup_count: 0,
            delay: false,
        }
    }
}

impl LoggerConfig {
    /// Default configuration writing `<name>` files into `path`
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content).context("Failed to parse config file")
    }

    /// Channels switched on by this configuration, in configuration order
    pub fn enabled_channels(&self) -> Vec<ChannelKind> {
        ChannelKind::ALL
            .into_iter()
            .filter(|kind| match kind {
                ChannelKind::Service => self.service,
                ChannelKind::Trace => self.trace,
                ChannelKind::Audit => self.audit,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LoggerConfig::default();
        assert_eq!(config.path, PathBuf::from("."));
        assert_eq!(config.name, "default");
        assert_eq!(config.level, Severity::Info);
        assert_eq!(config.backup_count, 0);
        assert_eq!(config.enabled_channels(), vec![ChannelKind::Service]);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: LoggerConfig = toml::from_str(
            r#"
            name = "demo"
            audit = true
            level = "warning"
            backup_count = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.name, "demo");
        assert_eq!(config.level, Severity::Warning);
        assert_eq!(config.backup_count, 7);
        assert_eq!(config.format, DEFAULT_FORMAT);
        assert_eq!(
            config.enabled_channels(),
            vec![ChannelKind::Service, ChannelKind::Audit]
        );
    }

    #[test]
    fn test_config_serialization() {
        let mut config = LoggerConfig::new("./logs", "demo");
        config.trace = true;
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: LoggerConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "path = \"/tmp/logs\"\ntrace = true").unwrap();

        let config = LoggerConfig::load(file.path()).unwrap();
        assert_eq!(config.path, PathBuf::from("/tmp/logs"));
        assert!(config.trace);
    }

    #[test]
    fn test_load_rejects_bad_level() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "level = \"loud\"").unwrap();

        assert!(LoggerConfig::load(file.path()).is_err());
    }
}
