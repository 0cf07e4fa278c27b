use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{AgentError, Result};
use crate::core::services::approval_gateway::DEFAULT_APPROVAL_TIMEOUT;
use crate::core::services::custodian::CustodianConfig;
use crate::core::services::expiry_reaper::DEFAULT_REAP_INTERVAL;
use crate::core::services::notification_bus::DEFAULT_EVENT_CAPACITY;

/// Socket file name used when none is configured.
pub const SOCKET_FILE_NAME: &str = "keyleash.sock";

/// Top-level configuration read from `config.toml`. Every section and
/// every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub agent: AgentSection,
    pub hooks: HooksSection,
    pub log: LogSection,
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// tried and a missing file means built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(AgentError::InvalidConfig {
                        detail: format!("{} not found", path.display()),
                    });
                }
                path.to_path_buf()
            }
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)?;
        Self::from_toml(&content).map_err(|e| match e {
            AgentError::InvalidConfig { detail } => AgentError::InvalidConfig {
                detail: format!("{}: {detail}", path.display()),
            },
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| AgentError::InvalidConfig {
            detail: format!("failed to parse config: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.agent.approval_timeout_secs == 0 {
            return Err(AgentError::InvalidConfig {
                detail: "agent.approval_timeout_secs must be at least 1".into(),
            });
        }
        if self.agent.reap_interval_ms == 0 {
            return Err(AgentError::InvalidConfig {
                detail: "agent.reap_interval_ms must be at least 1".into(),
            });
        }
        if self.agent.event_capacity == 0 {
            return Err(AgentError::InvalidConfig {
                detail: "agent.event_capacity must be at least 1".into(),
            });
        }
        if let Some(socket) = &self.agent.socket
            && socket.as_os_str().is_empty()
        {
            return Err(AgentError::InvalidConfig {
                detail: "agent.socket must not be empty".into(),
            });
        }
        Ok(())
    }

    pub fn custodian_config(&self) -> CustodianConfig {
        CustodianConfig {
            approval_timeout: Duration::from_secs(self.agent.approval_timeout_secs),
            reap_interval: Duration::from_millis(self.agent.reap_interval_ms),
            event_capacity: self.agent.event_capacity,
        }
    }
}

/// The `[agent]` section.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentSection {
    pub socket: Option<PathBuf>,
    pub approval_timeout_secs: u64,
    pub reap_interval_ms: u64,
    pub event_capacity: usize,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            socket: None,
            approval_timeout_secs: DEFAULT_APPROVAL_TIMEOUT.as_secs(),
            reap_interval_ms: DEFAULT_REAP_INTERVAL.as_millis() as u64,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// The `[hooks]` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct HooksSection {
    /// JSON file listing hook commands.
    pub file: Option<PathBuf>,
}

/// The `[log]` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSection {
    /// `tracing` filter directive, e.g. `info` or `keyleash=debug`.
    pub level: Option<String>,
    pub format: LogFormat,
}

/// Log line format on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// `<config_dir>/keyleash/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("keyleash").join("config.toml"))
}

/// Socket in the user runtime dir, falling back to the temp dir.
pub fn default_socket_path() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(SOCKET_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());

        let custodian = config.custodian_config();
        assert_eq!(custodian.approval_timeout, Duration::from_secs(30));
        assert_eq!(custodian.reap_interval, Duration::from_secs(1));
        assert_eq!(custodian.event_capacity, 256);
    }

    #[test]
    fn full_document_parses() {
        let config = AppConfig::from_toml(
            r#"
            [agent]
            socket = "/tmp/test.sock"
            approval_timeout_secs = 10
            reap_interval_ms = 250
            event_capacity = 32

            [hooks]
            file = "/etc/keyleash/hooks.json"

            [log]
            level = "keyleash=debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.agent.socket, Some(PathBuf::from("/tmp/test.sock")));
        assert_eq!(config.agent.approval_timeout_secs, 10);
        assert_eq!(config.hooks.file, Some(PathBuf::from("/etc/keyleash/hooks.json")));
        assert_eq!(config.log.level.as_deref(), Some("keyleash=debug"));
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(
            config.custodian_config().reap_interval,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn zero_values_are_rejected() {
        for doc in [
            "[agent]\napproval_timeout_secs = 0",
            "[agent]\nreap_interval_ms = 0",
            "[agent]\nevent_capacity = 0",
            "[agent]\nsocket = \"\"",
        ] {
            let err = AppConfig::from_toml(doc).unwrap_err();
            assert!(matches!(err, AgentError::InvalidConfig { .. }), "{doc}");
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AppConfig::from_toml("[agent]\nsockett = \"/tmp/x\"").unwrap_err();
        assert!(matches!(err, AgentError::InvalidConfig { .. }));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(matches!(err, AgentError::InvalidConfig { .. }));
    }

    #[test]
    fn explicit_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent]\nevent_capacity = 8\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.agent.event_capacity, 8);
    }

    #[test]
    fn default_socket_is_named() {
        assert!(default_socket_path().ends_with(SOCKET_FILE_NAME));
    }
}
