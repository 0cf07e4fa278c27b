//! keyleash: an SSH agent that keeps keys on a short leash.
//!
//! Every key added to the agent expires, and every signature needs an
//! explicit approval from a decision authority (a hook program or the
//! operator at the console).

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod logging;
