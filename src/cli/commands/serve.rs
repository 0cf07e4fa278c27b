use std::sync::Arc;
use std::time::Duration;

use tokio::io::BufReader;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};

use crate::adapters::hooks::CommandHooks;
use crate::adapters::protocol::{AgentServer, AgentSession};
use crate::cli::console::ConsoleAuthority;
use crate::cli::context::{ServeSettings, load_hooks};
use crate::cli::{ServeArgs, output};
use crate::config::app_config::AppConfig;
use crate::core::errors::Result;
use crate::core::models::event::HookEvent;
use crate::core::services::custodian::Custodian;
use crate::core::traits::clock::SystemClock;
use crate::core::traits::hook_runner::HookRunner;

/// Execute `keyleash serve`.
///
/// Runs until SIGINT or SIGTERM. The socket is removed on the way out.
pub fn execute(args: &ServeArgs, config: &AppConfig) -> Result<()> {
    let settings = ServeSettings::resolve(args, config)?;
    let hooks = load_hooks(settings.hooks_file.as_deref())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(serve(settings, hooks));
    // the console may be parked on a blocking stdin read
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}

async fn serve(settings: ServeSettings, hooks: CommandHooks) -> Result<()> {
    let (custodian, feeds) = Custodian::new(settings.custodian.clone(), Arc::new(SystemClock));
    let server = AgentServer::bind(&settings.socket, AgentSession::new(&custodian))?;

    println!(
        "SSH_AUTH_SOCK={}; export SSH_AUTH_SOCK;",
        server.path().display()
    );
    if !hooks.handles(HookEvent::Sign) {
        output::notice("No sign hook configured: approve signatures at this console");
    }

    let reaper = custodian.spawn_reaper();
    let console = ConsoleAuthority::new(custodian.vault().clone(), Arc::new(hooks));
    let consumer = tokio::spawn(console.run(feeds, BufReader::new(tokio::io::stdin())));

    server.run_until(shutdown_signal()).await;

    reaper.shutdown().await;
    consumer.abort();
    output::success("Agent stopped");
    Ok(())
}

async fn shutdown_signal() {
    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => Some(stream),
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGTERM");
            None
        }
    };
    let terminated = async {
        match terminate.as_mut() {
            Some(stream) => {
                stream.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminated => {}
    }
    info!("shutting down");
}
