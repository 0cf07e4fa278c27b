use std::sync::Arc;
use std::time::Duration;

use ed25519_dalek::Verifier;
use keyleash::adapters::keys::Ed25519Signer;
use keyleash::adapters::protocol::messages::MAX_MESSAGE_LEN;
use keyleash::adapters::protocol::{AgentRequest, AgentResponse, AgentServer, AgentSession};
use keyleash::core::models::signature::SignatureFlags;
use keyleash::core::services::custodian::{Custodian, CustodianConfig};
use keyleash::core::traits::clock::SystemClock;
use keyleash::core::traits::signer::KeySigner;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use zeroize::Zeroizing;

/// A running agent on a socket in a temp dir. Every signing request gets
/// the same decision.
struct Agent {
    dir: tempfile::TempDir,
    path: std::path::PathBuf,
    stop: oneshot::Sender<()>,
    server: JoinHandle<()>,
}

impl Agent {
    fn start(approve: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.sock");

        let config = CustodianConfig {
            approval_timeout: Duration::from_secs(5),
            ..CustodianConfig::default()
        };
        let (custodian, mut feeds) = Custodian::new(config, Arc::new(SystemClock));
        let server = AgentServer::bind(&path, AgentSession::new(&custodian)).unwrap();

        tokio::spawn(async move {
            while let Some(request) = feeds.approvals.recv().await {
                request.decide(approve);
            }
        });

        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            server
                .run_until(async {
                    let _ = stopped.await;
                })
                .await;
            drop(custodian);
        });

        Self {
            dir,
            path,
            stop,
            server,
        }
    }

    async fn connect(&self) -> UnixStream {
        UnixStream::connect(&self.path).await.unwrap()
    }

    /// Shut down; the temp dir is handed back so the caller can inspect it.
    async fn stop(self) -> tempfile::TempDir {
        let _ = self.stop.send(());
        self.server.await.unwrap();
        self.dir
    }
}

async fn call(stream: &mut UnixStream, request: &AgentRequest) -> AgentResponse {
    let body = request.encode();
    stream.write_u32(body.len() as u32).await.unwrap();
    stream.write_all(&body).await.unwrap();
    read_response(stream).await
}

async fn read_response(stream: &mut UnixStream) -> AgentResponse {
    let len = stream.read_u32().await.unwrap() as usize;
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).await.unwrap();
    AgentResponse::decode(body).unwrap()
}

fn add_request(key: &Ed25519Signer, lifetime_secs: Option<u32>) -> AgentRequest {
    AgentRequest::AddIdentity {
        key: key.material(),
        comment: "socket test".into(),
        lifetime_secs,
        confirm: true,
    }
}

#[tokio::test]
async fn add_list_sign_over_socket() {
    let agent = Agent::start(true);
    let mut client = agent.connect().await;
    let key = Ed25519Signer::generate();

    assert_eq!(
        call(&mut client, &add_request(&key, Some(600))).await,
        AgentResponse::Success
    );

    let AgentResponse::Identities(keys) = call(&mut client, &AgentRequest::RequestIdentities).await
    else {
        panic!("expected identities");
    };
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0].key_type, "ssh-ed25519");
    assert_eq!(keys[0].public_key_blob, key.public_key_blob());
    assert!(keys[0].comment.starts_with("socket test ["));

    let sign = AgentRequest::Sign {
        key_blob: key.public_key_blob(),
        data: b"challenge".to_vec(),
        flags: SignatureFlags::default(),
    };
    let AgentResponse::Signature(signature) = call(&mut client, &sign).await else {
        panic!("expected signature");
    };
    let parsed = ed25519_dalek::Signature::from_slice(&signature.blob).unwrap();
    key.verifying_key().verify(b"challenge", &parsed).unwrap();

    drop(client);
    agent.stop().await;
}

#[tokio::test]
async fn denied_sign_is_failure_and_connection_stays_open() {
    let agent = Agent::start(false);
    let mut client = agent.connect().await;
    let key = Ed25519Signer::generate();
    call(&mut client, &add_request(&key, None)).await;

    let sign = AgentRequest::Sign {
        key_blob: key.public_key_blob(),
        data: b"challenge".to_vec(),
        flags: SignatureFlags::default(),
    };
    assert_eq!(call(&mut client, &sign).await, AgentResponse::Failure);

    // still usable afterwards
    assert!(matches!(
        call(&mut client, &AgentRequest::RequestIdentities).await,
        AgentResponse::Identities(keys) if keys.len() == 1
    ));

    drop(client);
    agent.stop().await;
}

#[tokio::test]
async fn lock_and_unlock_over_socket() {
    let agent = Agent::start(true);
    let mut client = agent.connect().await;
    call(&mut client, &add_request(&Ed25519Signer::generate(), None)).await;

    let lock = AgentRequest::Lock {
        passphrase: Zeroizing::new(b"secret".to_vec()),
    };
    assert_eq!(call(&mut client, &lock).await, AgentResponse::Success);
    assert_eq!(
        call(&mut client, &AgentRequest::RequestIdentities).await,
        AgentResponse::Identities(Vec::new())
    );
    assert_eq!(
        call(&mut client, &AgentRequest::RemoveAllIdentities).await,
        AgentResponse::Failure
    );

    let wrong = AgentRequest::Unlock {
        passphrase: Zeroizing::new(b"wrong".to_vec()),
    };
    assert_eq!(call(&mut client, &wrong).await, AgentResponse::Success);
    assert_eq!(
        call(&mut client, &AgentRequest::RequestIdentities).await,
        AgentResponse::Identities(Vec::new())
    );

    let right = AgentRequest::Unlock {
        passphrase: Zeroizing::new(b"secret".to_vec()),
    };
    assert_eq!(call(&mut client, &right).await, AgentResponse::Success);
    assert!(matches!(
        call(&mut client, &AgentRequest::RequestIdentities).await,
        AgentResponse::Identities(keys) if keys.len() == 1
    ));

    drop(client);
    agent.stop().await;
}

#[tokio::test]
async fn broken_client_does_not_affect_others() {
    let agent = Agent::start(true);
    let mut good = agent.connect().await;
    let key = Ed25519Signer::generate();
    call(&mut good, &add_request(&key, None)).await;

    let mut bad = agent.connect().await;
    bad.write_u32(MAX_MESSAGE_LEN as u32 + 1).await.unwrap();
    // the agent hangs up on the oversized frame
    let mut buf = [0u8; 1];
    assert_eq!(bad.read(&mut buf).await.unwrap(), 0);

    assert!(matches!(
        call(&mut good, &AgentRequest::RequestIdentities).await,
        AgentResponse::Identities(keys) if keys.len() == 1
    ));

    drop(good);
    agent.stop().await;
}

#[tokio::test]
async fn extension_requests_get_failure() {
    let agent = Agent::start(true);
    let mut client = agent.connect().await;

    let response = call(&mut client, &AgentRequest::Unsupported { code: 27 }).await;
    assert_eq!(response, AgentResponse::Failure);

    drop(client);
    agent.stop().await;
}

#[tokio::test]
async fn socket_file_is_removed_on_shutdown() {
    let agent = Agent::start(true);
    let path = agent.path.clone();
    assert!(path.exists());

    let dir = agent.stop().await;
    assert!(dir.path().exists());
    assert!(!path.exists());
}
