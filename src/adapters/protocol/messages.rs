//! Agent protocol messages (draft-miller-ssh-agent), limited to the
//! operations the custodian supports.

use bytes::{BufMut, Bytes, BytesMut};
use zeroize::Zeroizing;

use crate::adapters::protocol::wire::{WireReader, WireWrite};
use crate::core::errors::{AgentError, Result};
use crate::core::models::key_entry::KeyListing;
use crate::core::models::key_material::PrivateKeyMaterial;
use crate::core::models::signature::{Signature, SignatureAlgorithm, SignatureFlags};

pub const SSH_AGENT_FAILURE: u8 = 5;
pub const SSH_AGENT_SUCCESS: u8 = 6;
pub const SSH_AGENTC_REQUEST_IDENTITIES: u8 = 11;
pub const SSH_AGENT_IDENTITIES_ANSWER: u8 = 12;
pub const SSH_AGENTC_SIGN_REQUEST: u8 = 13;
pub const SSH_AGENT_SIGN_RESPONSE: u8 = 14;
pub const SSH_AGENTC_ADD_IDENTITY: u8 = 17;
pub const SSH_AGENTC_REMOVE_IDENTITY: u8 = 18;
pub const SSH_AGENTC_REMOVE_ALL_IDENTITIES: u8 = 19;
pub const SSH_AGENTC_LOCK: u8 = 22;
pub const SSH_AGENTC_UNLOCK: u8 = 23;
pub const SSH_AGENTC_ADD_ID_CONSTRAINED: u8 = 25;
pub const SSH_AGENTC_EXTENSION: u8 = 27;

pub const SSH_AGENT_CONSTRAIN_LIFETIME: u8 = 1;
pub const SSH_AGENT_CONSTRAIN_CONFIRM: u8 = 2;
pub const SSH_AGENT_CONSTRAIN_EXTENSION: u8 = 255;

/// Largest message body accepted from a client.
pub const MAX_MESSAGE_LEN: usize = 256 * 1024;

/// A decoded client request.
pub enum AgentRequest {
    RequestIdentities,
    Sign {
        key_blob: Vec<u8>,
        data: Vec<u8>,
        flags: SignatureFlags,
    },
    AddIdentity {
        key: PrivateKeyMaterial,
        comment: String,
        lifetime_secs: Option<u32>,
        confirm: bool,
    },
    RemoveIdentity {
        key_blob: Vec<u8>,
    },
    RemoveAllIdentities,
    Lock {
        passphrase: Zeroizing<Vec<u8>>,
    },
    Unlock {
        passphrase: Zeroizing<Vec<u8>>,
    },
    /// Anything outside the supported set, extensions included.
    Unsupported {
        code: u8,
    },
}

impl AgentRequest {
    /// Decode a message body (type byte first, length prefix already removed).
    pub fn decode(body: impl Into<Bytes>) -> Result<Self> {
        let mut reader = WireReader::new(body);
        let code = reader.read_u8()?;

        let request = match code {
            SSH_AGENTC_REQUEST_IDENTITIES => Self::RequestIdentities,
            SSH_AGENTC_SIGN_REQUEST => Self::Sign {
                key_blob: reader.read_string()?.to_vec(),
                data: reader.read_string()?.to_vec(),
                flags: SignatureFlags::from_bits(reader.read_u32()?),
            },
            SSH_AGENTC_ADD_IDENTITY | SSH_AGENTC_ADD_ID_CONSTRAINED => {
                let key = read_key_material(&mut reader)?;
                let comment = reader.read_utf8()?;
                let (lifetime_secs, confirm) = if code == SSH_AGENTC_ADD_ID_CONSTRAINED {
                    read_constraints(&mut reader)?
                } else {
                    (None, false)
                };
                Self::AddIdentity {
                    key,
                    comment,
                    lifetime_secs,
                    confirm,
                }
            }
            SSH_AGENTC_REMOVE_IDENTITY => Self::RemoveIdentity {
                key_blob: reader.read_string()?.to_vec(),
            },
            SSH_AGENTC_REMOVE_ALL_IDENTITIES => Self::RemoveAllIdentities,
            SSH_AGENTC_LOCK => Self::Lock {
                passphrase: Zeroizing::new(reader.read_string()?.to_vec()),
            },
            SSH_AGENTC_UNLOCK => Self::Unlock {
                passphrase: Zeroizing::new(reader.read_string()?.to_vec()),
            },
            code => return Ok(Self::Unsupported { code }),
        };

        reader.finish()?;
        Ok(request)
    }

    /// Encode as a message body. Used by clients and tests.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        match self {
            Self::RequestIdentities => buf.put_u8(SSH_AGENTC_REQUEST_IDENTITIES),
            Self::Sign {
                key_blob,
                data,
                flags,
            } => {
                buf.put_u8(SSH_AGENTC_SIGN_REQUEST);
                buf.put_string(key_blob);
                buf.put_string(data);
                buf.put_u32(flags.bits());
            }
            Self::AddIdentity {
                key,
                comment,
                lifetime_secs,
                confirm,
            } => {
                let constrained = lifetime_secs.is_some() || *confirm;
                buf.put_u8(if constrained {
                    SSH_AGENTC_ADD_ID_CONSTRAINED
                } else {
                    SSH_AGENTC_ADD_IDENTITY
                });
                write_key_material(&mut buf, key);
                buf.put_string(comment.as_bytes());
                if let Some(secs) = lifetime_secs {
                    buf.put_u8(SSH_AGENT_CONSTRAIN_LIFETIME);
                    buf.put_u32(*secs);
                }
                if *confirm {
                    buf.put_u8(SSH_AGENT_CONSTRAIN_CONFIRM);
                }
            }
            Self::RemoveIdentity { key_blob } => {
                buf.put_u8(SSH_AGENTC_REMOVE_IDENTITY);
                buf.put_string(key_blob);
            }
            Self::RemoveAllIdentities => buf.put_u8(SSH_AGENTC_REMOVE_ALL_IDENTITIES),
            Self::Lock { passphrase } => {
                buf.put_u8(SSH_AGENTC_LOCK);
                buf.put_string(passphrase);
            }
            Self::Unlock { passphrase } => {
                buf.put_u8(SSH_AGENTC_UNLOCK);
                buf.put_string(passphrase);
            }
            Self::Unsupported { code } => buf.put_u8(*code),
        }
        buf.freeze()
    }

    /// Short name for logs. Never includes secrets.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RequestIdentities => "request-identities",
            Self::Sign { .. } => "sign",
            Self::AddIdentity { .. } => "add-identity",
            Self::RemoveIdentity { .. } => "remove-identity",
            Self::RemoveAllIdentities => "remove-all-identities",
            Self::Lock { .. } => "lock",
            Self::Unlock { .. } => "unlock",
            Self::Unsupported { .. } => "unsupported",
        }
    }
}

// Only the request kind: bodies carry passphrases and key material.
impl std::fmt::Debug for AgentRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRequest")
            .field("kind", &self.name())
            .finish_non_exhaustive()
    }
}

fn read_key_material(reader: &mut WireReader) -> Result<PrivateKeyMaterial> {
    let key_type = reader.read_utf8()?;
    match key_type.as_str() {
        "ssh-ed25519" => Ok(PrivateKeyMaterial::Ed25519 {
            public: reader.read_string()?.to_vec(),
            secret: Zeroizing::new(reader.read_string()?.to_vec()),
        }),
        "ssh-rsa" => Ok(PrivateKeyMaterial::Rsa {
            n: reader.read_mpint()?,
            e: reader.read_mpint()?,
            d: Zeroizing::new(reader.read_mpint()?),
            iqmp: Zeroizing::new(reader.read_mpint()?),
            p: Zeroizing::new(reader.read_mpint()?),
            q: Zeroizing::new(reader.read_mpint()?),
        }),
        other => Err(AgentError::construction(format!(
            "unsupported key type {other:?}"
        ))),
    }
}

fn write_key_material(buf: &mut BytesMut, key: &PrivateKeyMaterial) {
    buf.put_string(key.key_type().as_bytes());
    match key {
        PrivateKeyMaterial::Ed25519 { public, secret } => {
            buf.put_string(public);
            buf.put_string(secret);
        }
        PrivateKeyMaterial::Rsa {
            n,
            e,
            d,
            iqmp,
            p,
            q,
        } => {
            for part in [
                n.as_slice(),
                e.as_slice(),
                d.as_slice(),
                iqmp.as_slice(),
                p.as_slice(),
                q.as_slice(),
            ] {
                buf.put_mpint(part);
            }
        }
    }
}

fn read_constraints(reader: &mut WireReader) -> Result<(Option<u32>, bool)> {
    let mut lifetime = None;
    let mut confirm = false;
    while !reader.is_empty() {
        match reader.read_u8()? {
            SSH_AGENT_CONSTRAIN_LIFETIME => lifetime = Some(reader.read_u32()?),
            SSH_AGENT_CONSTRAIN_CONFIRM => confirm = true,
            SSH_AGENT_CONSTRAIN_EXTENSION => {
                let name = reader.read_utf8()?;
                return Err(AgentError::protocol(format!(
                    "unsupported constraint extension {name:?}"
                )));
            }
            other => {
                return Err(AgentError::protocol(format!(
                    "unknown constraint {other}"
                )));
            }
        }
    }
    Ok((lifetime, confirm))
}

/// A reply to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentResponse {
    Success,
    Failure,
    Identities(Vec<KeyListing>),
    Signature(Signature),
}

impl AgentResponse {
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        match self {
            Self::Success => buf.put_u8(SSH_AGENT_SUCCESS),
            Self::Failure => buf.put_u8(SSH_AGENT_FAILURE),
            Self::Identities(keys) => {
                buf.put_u8(SSH_AGENT_IDENTITIES_ANSWER);
                buf.put_u32(keys.len() as u32);
                for key in keys {
                    buf.put_string(&key.public_key_blob);
                    buf.put_string(key.comment.as_bytes());
                }
            }
            Self::Signature(signature) => {
                let mut inner = BytesMut::new();
                inner.put_string(signature.algorithm.as_str().as_bytes());
                inner.put_string(&signature.blob);

                buf.put_u8(SSH_AGENT_SIGN_RESPONSE);
                buf.put_string(&inner);
            }
        }
        buf.freeze()
    }

    /// Length-prefixed frame ready for the socket.
    pub fn frame(&self) -> Bytes {
        let body = self.encode();
        let mut buf = BytesMut::with_capacity(4 + body.len());
        buf.put_u32(body.len() as u32);
        buf.put_slice(&body);
        buf.freeze()
    }

    /// Decode a reply body. Used by clients and tests.
    pub fn decode(body: impl Into<Bytes>) -> Result<Self> {
        let mut reader = WireReader::new(body);
        let response = match reader.read_u8()? {
            SSH_AGENT_SUCCESS => Self::Success,
            SSH_AGENT_FAILURE => Self::Failure,
            SSH_AGENT_IDENTITIES_ANSWER => {
                let count = reader.read_u32()?;
                let mut keys = Vec::new();
                for _ in 0..count {
                    let public_key_blob = reader.read_string()?.to_vec();
                    let comment = reader.read_utf8()?;
                    let key_type = WireReader::new(public_key_blob.clone()).read_utf8()?;
                    keys.push(KeyListing {
                        key_type,
                        public_key_blob,
                        comment,
                    });
                }
                Self::Identities(keys)
            }
            SSH_AGENT_SIGN_RESPONSE => {
                let mut inner = WireReader::new(reader.read_string()?);
                let name = inner.read_utf8()?;
                let algorithm = SignatureAlgorithm::from_name(&name).ok_or_else(|| {
                    AgentError::protocol(format!("unknown signature algorithm {name:?}"))
                })?;
                let blob = inner.read_string()?.to_vec();
                inner.finish()?;
                Self::Signature(Signature { algorithm, blob })
            }
            other => return Err(AgentError::protocol(format!("unexpected reply {other}"))),
        };
        reader.finish()?;
        Ok(response)
    }
}
