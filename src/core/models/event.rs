use serde::{Deserialize, Serialize};

/// Why a key left the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    Expired,
    UserRequest,
}

impl std::fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expired => f.write_str("expired"),
            Self::UserRequest => f.write_str("user request"),
        }
    }
}

/// Occurrences reported to external listeners (UI, hook runner).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    KeyAdded {
        public_key_blob: Vec<u8>,
        fingerprint: String,
    },
    KeyRemoved {
        fingerprint: String,
        reason: RemovalReason,
    },
    AllKeysRemoved {
        count: usize,
    },
}

/// Events an external hook program can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookEvent {
    Added,
    Removed,
    Sign,
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => f.write_str("added"),
            Self::Removed => f.write_str("removed"),
            Self::Sign => f.write_str("sign"),
        }
    }
}

impl std::str::FromStr for HookEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "added" => Ok(Self::Added),
            "removed" => Ok(Self::Removed),
            "sign" => Ok(Self::Sign),
            other => Err(format!(
                "unknown hook event '{other}' (expected added, removed or sign)"
            )),
        }
    }
}
