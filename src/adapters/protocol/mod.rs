//! SSH agent protocol front end: framing, message codec, per-request
//! dispatch and the Unix socket listener.

pub mod messages;
pub mod server;
pub mod session;
pub mod wire;

pub use self::messages::{AgentRequest, AgentResponse};
pub use self::server::{AgentServer, serve_connection};
pub use self::session::AgentSession;
