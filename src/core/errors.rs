/// All domain errors for keyleash.
///
/// Every variant is reported synchronously to the caller of the failing
/// operation. Nothing here is retried internally.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Agent is locked")]
    AgentLocked,

    #[error("Agent is already locked")]
    AlreadyLocked,

    #[error("Refusing to lock with an empty passphrase")]
    EmptyPassphrase,

    #[error("Key {fingerprint} not found in agent")]
    KeyNotFound { fingerprint: String },

    #[error("Signing with {fingerprint} was not approved")]
    NotApproved { fingerprint: String },

    #[error("No approval decision for {fingerprint} within {seconds}s")]
    ApprovalTimeout { fingerprint: String, seconds: u64 },

    #[error("{key_type} keys do not support algorithm-qualified signatures")]
    UnsupportedSigner { key_type: String },

    #[error("Unsupported signature flags: {flags:#x}")]
    UnsupportedFlags { flags: u32 },

    #[error("Unusable key material: {reason}")]
    ConstructionFailed { reason: String },

    #[error("Malformed agent message: {detail}")]
    Protocol { detail: String },

    #[error(
        "Invalid configuration: {detail}\n\n  \
         Check the [agent], [hooks] and [log] sections of config.toml."
    )]
    InvalidConfig { detail: String },

    #[error("Hook error: {detail}")]
    HookError { detail: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Shorthand for a wire decoding failure.
    pub fn protocol(detail: impl Into<String>) -> Self {
        Self::Protocol {
            detail: detail.into(),
        }
    }

    /// Shorthand for a signer construction failure.
    pub fn construction(reason: impl std::fmt::Display) -> Self {
        Self::ConstructionFailed {
            reason: reason.to_string(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AgentError>;
