pub mod commands;
pub mod console;
pub mod context;
pub mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::app_config::LogFormat;
use crate::core::models::event::HookEvent;

/// An SSH agent that keeps keys on a short leash.
#[derive(Parser, Debug)]
#[command(name = "keyleash", version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Options for `serve`, which runs when no command is given
    #[command(flatten)]
    pub serve: ServeArgs,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode: only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to alternative config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the agent (the default)
    Serve(ServeArgs),

    /// Inspect and test hook commands
    Hooks {
        /// Hooks file (default: [hooks].file from the config)
        #[arg(long)]
        hooks: Option<PathBuf>,

        #[command(subcommand)]
        action: HooksAction,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Socket path to listen on
    #[arg(short, long, env = "KEYLEASH_SOCKET")]
    pub socket: Option<PathBuf>,

    /// JSON file with hook commands
    #[arg(long)]
    pub hooks: Option<PathBuf>,

    /// Seconds to wait for a signing decision
    #[arg(long, value_name = "SECS")]
    pub approval_timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum HooksAction {
    /// List configured hooks
    List,

    /// Run the hook for an event once, as the agent would
    Run {
        /// Event name: added, removed or sign
        event: HookEvent,

        /// Fingerprint (or "all") passed to the hook
        subject: String,
    },
}
