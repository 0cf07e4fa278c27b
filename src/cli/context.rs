use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::adapters::hooks::CommandHooks;
use crate::cli::ServeArgs;
use crate::config::app_config::{AppConfig, default_socket_path};
use crate::core::errors::{AgentError, Result};
use crate::core::services::custodian::CustodianConfig;

/// Effective settings for `serve`: CLI flags over config file over defaults.
#[derive(Debug, Clone)]
pub struct ServeSettings {
    pub socket: PathBuf,
    pub hooks_file: Option<PathBuf>,
    pub custodian: CustodianConfig,
}

impl ServeSettings {
    pub fn resolve(args: &ServeArgs, config: &AppConfig) -> Result<Self> {
        let socket = args
            .socket
            .clone()
            .or_else(|| config.agent.socket.clone())
            .unwrap_or_else(default_socket_path);

        let mut custodian = config.custodian_config();
        if let Some(secs) = args.approval_timeout {
            if secs == 0 {
                return Err(AgentError::InvalidConfig {
                    detail: "--approval-timeout must be at least 1 second".into(),
                });
            }
            custodian.approval_timeout = Duration::from_secs(secs);
        }

        Ok(Self {
            socket,
            hooks_file: hooks_file(args.hooks.as_deref(), config),
            custodian,
        })
    }
}

/// Hooks file from the flag, else from `[hooks].file`.
pub fn hooks_file(flag: Option<&Path>, config: &AppConfig) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| config.hooks.file.clone())
}

/// Load hooks, or none when no file is configured.
pub fn load_hooks(path: Option<&Path>) -> Result<CommandHooks> {
    match path {
        Some(path) => CommandHooks::load(path),
        None => Ok(CommandHooks::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let config = AppConfig::from_toml(
            "[agent]\nsocket = \"/tmp/from-config.sock\"\napproval_timeout_secs = 5\n\
             [hooks]\nfile = \"/tmp/config-hooks.json\"\n",
        )
        .unwrap();

        let from_config = ServeSettings::resolve(&ServeArgs::default(), &config).unwrap();
        assert_eq!(from_config.socket, PathBuf::from("/tmp/from-config.sock"));
        assert_eq!(from_config.custodian.approval_timeout, Duration::from_secs(5));
        assert_eq!(
            from_config.hooks_file,
            Some(PathBuf::from("/tmp/config-hooks.json"))
        );

        let args = ServeArgs {
            socket: Some("/tmp/flag.sock".into()),
            hooks: Some("/tmp/flag-hooks.json".into()),
            approval_timeout: Some(9),
        };
        let from_flags = ServeSettings::resolve(&args, &config).unwrap();
        assert_eq!(from_flags.socket, PathBuf::from("/tmp/flag.sock"));
        assert_eq!(from_flags.custodian.approval_timeout, Duration::from_secs(9));
        assert_eq!(from_flags.hooks_file, Some(PathBuf::from("/tmp/flag-hooks.json")));
    }

    #[test]
    fn zero_timeout_flag_is_rejected() {
        let args = ServeArgs {
            approval_timeout: Some(0),
            ..ServeArgs::default()
        };
        assert!(ServeSettings::resolve(&args, &AppConfig::default()).is_err());
    }

    #[test]
    fn no_hooks_file_means_no_hooks() {
        assert!(load_hooks(None).unwrap().is_empty());
    }
}
