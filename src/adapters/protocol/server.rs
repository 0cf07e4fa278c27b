use std::future::Future;
use std::io::ErrorKind;
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::UnixListener;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::adapters::protocol::messages::{AgentRequest, AgentResponse, MAX_MESSAGE_LEN};
use crate::adapters::protocol::session::AgentSession;
use crate::core::errors::{AgentError, Result};

/// Unix-domain agent listener.
///
/// The socket file is owner-only and removed again when the server is
/// dropped.
pub struct AgentServer {
    listener: UnixListener,
    path: PathBuf,
    session: AgentSession,
}

impl AgentServer {
    /// Bind `path`. An existing file at `path` is never replaced.
    pub fn bind(path: &Path, session: AgentSession) -> Result<Self> {
        if path.exists() {
            return Err(AgentError::Io(std::io::Error::new(
                ErrorKind::AlreadyExists,
                format!("socket path {} already exists", path.display()),
            )));
        }
        let listener = bind_private(path)?;

        info!(socket = %path.display(), "agent listening");
        Ok(Self {
            listener,
            path: path.to_path_buf(),
            session,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accept connections until `shutdown` resolves. Open connections are
    /// aborted on the way out.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) {
        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        let session = self.session.clone();
                        connections.spawn(async move {
                            if let Err(e) = serve_connection(stream, session).await {
                                warn!(error = %e, "agent connection failed");
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        debug!(open = connections.len(), "closing agent connections");
        connections.shutdown().await;
    }
}

impl Drop for AgentServer {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(socket = %self.path.display(), "removed socket"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(socket = %self.path.display(), error = %e, "could not remove socket"),
        }
    }
}

/// Bind inside a fresh 0700 directory next to `path`, restrict the socket
/// to 0600, then link it into place. The socket is never reachable by other
/// users while its mode is still the umask default.
fn bind_private(path: &Path) -> Result<UnixListener> {
    let name = path.file_name().ok_or_else(|| {
        AgentError::Io(std::io::Error::new(
            ErrorKind::InvalidInput,
            format!("socket path {} has no file name", path.display()),
        ))
    })?;
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let staging = parent.join(format!(
        ".{}.{}",
        name.to_string_lossy(),
        std::process::id()
    ));
    std::fs::DirBuilder::new().mode(0o700).create(&staging)?;

    let bound = (|| -> Result<UnixListener> {
        let staged = staging.join(name);
        let listener = UnixListener::bind(&staged)?;
        std::fs::set_permissions(&staged, std::fs::Permissions::from_mode(0o600))?;
        // link(2) refuses an existing target, unlike rename(2)
        std::fs::hard_link(&staged, path)?;
        Ok(listener)
    })();

    if let Err(e) = std::fs::remove_dir_all(&staging) {
        warn!(dir = %staging.display(), error = %e, "could not remove staging directory");
    }
    bound
}

/// Request/response loop for one client. Returns when the client hangs up.
pub async fn serve_connection<S>(mut stream: S, session: AgentSession) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let len = match stream.read_u32().await {
            Ok(len) => len as usize,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        if len > MAX_MESSAGE_LEN {
            return Err(AgentError::protocol(format!(
                "message of {len} bytes exceeds the {MAX_MESSAGE_LEN} byte limit"
            )));
        }

        let mut body = vec![0u8; len];
        stream.read_exact(&mut body).await?;

        let response = match AgentRequest::decode(body) {
            Ok(request) => {
                debug!(request = request.name(), "agent request");
                session.handle(request).await
            }
            Err(e) => {
                debug!(error = %e, "undecodable request");
                AgentResponse::Failure
            }
        };

        stream.write_all(&response.frame()).await?;
        stream.flush().await?;
    }
}
