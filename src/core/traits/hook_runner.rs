use crate::core::models::event::HookEvent;

/// Port for running external programs on agent events.
///
/// `subject` is a fingerprint, or `all` for bulk removal. The boolean result
/// doubles as the approval decision for `sign` events. Implementations may
/// block; callers run them off the async executor.
pub trait HookRunner: Send + Sync {
    /// Whether a hook is configured for `event`.
    fn handles(&self, event: HookEvent) -> bool;

    /// Run the hook for `event`. Returns `false` when none is configured.
    fn run(&self, event: HookEvent, subject: &str) -> bool;
}
