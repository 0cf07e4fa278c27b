use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::errors::{AgentError, Result};
use crate::core::models::event::HookEvent;
use crate::core::traits::hook_runner::HookRunner;

const SUBJECT_PLACEHOLDER: &str = "{subject}";
/// printf-style placeholder accepted in older hook files.
const LEGACY_PLACEHOLDER: &str = "%s";

/// One external program bound to an agent event.
///
/// Hook files written with the older field names (`command_path`,
/// `command_args`, `exit_code`, `msg_format`) load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookCommand {
    pub event: HookEvent,
    #[serde(alias = "command_path")]
    pub command: PathBuf,
    #[serde(default, alias = "command_args")]
    pub args: Vec<String>,
    /// Non-zero exit code that still counts as success.
    #[serde(default, alias = "exit_code")]
    pub allow_exit_code: Option<i32>,
    #[serde(default = "default_message", alias = "msg_format")]
    pub message: String,
}

fn default_message() -> String {
    SUBJECT_PLACEHOLDER.to_string()
}

impl HookCommand {
    /// Arguments passed to the program for `subject`.
    ///
    /// Explicit `args` are used verbatim; otherwise the single argument is
    /// `message` with the subject filled in.
    pub fn argv(&self, subject: &str) -> Vec<String> {
        if self.args.is_empty() {
            vec![
                self.message
                    .replace(SUBJECT_PLACEHOLDER, subject)
                    .replace(LEGACY_PLACEHOLDER, subject),
            ]
        } else {
            self.args.clone()
        }
    }

    /// Run to completion. Spawn failures count as `false`.
    pub fn run(&self, subject: &str) -> bool {
        let status = Command::new(&self.command)
            .args(self.argv(subject))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status();

        match status {
            Ok(status) => {
                let code = status.code();
                let passed = status.success() || (code.is_some() && code == self.allow_exit_code);
                debug!(event = %self.event, command = %self.command.display(), ?code, passed, "hook finished");
                passed
            }
            Err(e) => {
                warn!(event = %self.event, command = %self.command.display(), error = %e, "hook failed to start");
                false
            }
        }
    }
}

/// Hooks loaded from a JSON array. The first hook for an event wins.
#[derive(Debug, Clone, Default)]
pub struct CommandHooks {
    hooks: Vec<HookCommand>,
}

impl CommandHooks {
    pub fn new(hooks: Vec<HookCommand>) -> Self {
        Self { hooks }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AgentError::HookError {
            detail: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::from_json(&content).map_err(|e| AgentError::HookError {
            detail: format!("{}: {e}", path.display()),
        })
    }

    pub fn from_json(content: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(content).map(Self::new)
    }

    pub fn get(&self, event: HookEvent) -> Option<&HookCommand> {
        self.hooks.iter().find(|hook| hook.event == event)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HookCommand> {
        self.hooks.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl HookRunner for CommandHooks {
    fn handles(&self, event: HookEvent) -> bool {
        self.get(event).is_some()
    }

    fn run(&self, event: HookEvent, subject: &str) -> bool {
        self.get(event).is_some_and(|hook| hook.run(subject))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn sh(event: HookEvent, script: &str, allow_exit_code: Option<i32>) -> HookCommand {
        HookCommand {
            event,
            command: "sh".into(),
            args: vec!["-c".into(), script.into()],
            allow_exit_code,
            message: default_message(),
        }
    }

    #[test]
    fn message_is_the_default_argument() {
        let hook: HookCommand = serde_json::from_str(
            r#"{"event": "added", "command": "notify-send", "message": "Key {subject} added"}"#,
        )
        .unwrap();
        assert_eq!(hook.argv("SHA256:abc"), vec!["Key SHA256:abc added"]);

        let bare: HookCommand =
            serde_json::from_str(r#"{"event": "removed", "command": "logger"}"#).unwrap();
        assert_eq!(bare.argv("all"), vec!["all"]);
    }

    #[test]
    fn older_field_names_still_load() {
        let hooks = CommandHooks::from_json(
            r#"[
                {"event": "sign", "command_path": "sh", "command_args": ["-c", "exit 5"], "exit_code": 5},
                {"event": "added", "command_path": "notify-send", "msg_format": "Key %s added"}
            ]"#,
        )
        .unwrap();

        let sign = hooks.get(HookEvent::Sign).unwrap();
        assert_eq!(sign.command, PathBuf::from("sh"));
        assert_eq!(sign.allow_exit_code, Some(5));
        assert!(sign.run("x"));

        let added = hooks.get(HookEvent::Added).unwrap();
        assert_eq!(added.argv("SHA256:abc"), vec!["Key SHA256:abc added"]);
    }

    #[test]
    fn explicit_args_are_verbatim() {
        let hook = sh(HookEvent::Sign, "exit 0", None);
        assert_eq!(hook.argv("ignored"), vec!["-c", "exit 0"]);
    }

    #[test]
    fn exit_status_decides() {
        assert!(sh(HookEvent::Sign, "exit 0", None).run("x"));
        assert!(!sh(HookEvent::Sign, "exit 1", None).run("x"));
        assert!(sh(HookEvent::Sign, "exit 3", Some(3)).run("x"));
        assert!(!sh(HookEvent::Sign, "exit 4", Some(3)).run("x"));
    }

    #[test]
    fn missing_program_is_false() {
        let hook = HookCommand {
            event: HookEvent::Added,
            command: "/nonexistent/keyleash-hook".into(),
            args: Vec::new(),
            allow_exit_code: None,
            message: default_message(),
        };
        assert!(!hook.run("x"));
    }

    #[test]
    fn first_matching_hook_wins() {
        let hooks = CommandHooks::new(vec![
            sh(HookEvent::Sign, "exit 1", None),
            sh(HookEvent::Sign, "exit 0", None),
        ]);
        assert!(hooks.handles(HookEvent::Sign));
        assert!(!hooks.handles(HookEvent::Added));
        assert!(!hooks.run(HookEvent::Sign, "x"));
        assert!(!hooks.run(HookEvent::Added, "x"));
    }

    #[test]
    fn load_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let err = CommandHooks::load(file.path()).unwrap_err();
        assert!(matches!(err, AgentError::HookError { .. }));
    }

    #[test]
    fn load_reads_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"[
                {"event": "sign", "command": "sh", "args": ["-c", "exit 0"]},
                {"event": "added", "command": "true", "allow_exit_code": 2}
            ]"#,
        )
        .unwrap();

        let hooks = CommandHooks::load(file.path()).unwrap();
        assert_eq!(hooks.iter().count(), 2);
        assert_eq!(hooks.get(HookEvent::Added).unwrap().allow_exit_code, Some(2));
    }
}
