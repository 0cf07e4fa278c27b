pub mod command_hooks;

pub use self::command_hooks::{CommandHooks, HookCommand};
