use std::path::Path;

use colored::Colorize;

use crate::cli::HooksAction;
use crate::cli::context::{hooks_file, load_hooks};
use crate::cli::output;
use crate::config::app_config::AppConfig;
use crate::core::errors::{AgentError, Result};
use crate::core::models::event::HookEvent;
use crate::core::traits::hook_runner::HookRunner;

/// Execute `keyleash hooks <action>`.
pub fn execute(action: &HooksAction, flag: Option<&Path>, config: &AppConfig) -> Result<()> {
    let path = hooks_file(flag, config);
    let hooks = load_hooks(path.as_deref())?;

    match action {
        HooksAction::List => {
            let Some(path) = path else {
                output::warning("No hooks file configured");
                println!("  Pass --hooks <file> or set [hooks].file in config.toml");
                return Ok(());
            };
            output::header(&format!("Hooks in {}", path.display()));
            if hooks.is_empty() {
                println!("  (none)");
            }
            for hook in hooks.iter() {
                let allow = hook
                    .allow_exit_code
                    .map(|code| format!(" (exit {code} allowed)"))
                    .unwrap_or_default();
                println!(
                    "  {:<8} {} {}{}",
                    hook.event.to_string().cyan(),
                    hook.command.display(),
                    hook.argv("<subject>").join(" "),
                    allow
                );
            }
            Ok(())
        }
        HooksAction::Run { event, subject } => run(&hooks, *event, subject),
    }
}

fn run(hooks: &impl HookRunner, event: HookEvent, subject: &str) -> Result<()> {
    if !hooks.handles(event) {
        return Err(AgentError::HookError {
            detail: format!("no hook configured for '{event}'"),
        });
    }
    if hooks.run(event, subject) {
        output::success(&format!("Hook for '{event}' passed"));
        Ok(())
    } else {
        Err(AgentError::HookError {
            detail: format!("hook for '{event}' reported failure"),
        })
    }
}
