use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::cli::output;
use crate::core::models::event::{HookEvent, NotificationEvent};
use crate::core::services::approval_gateway::ApprovalRequest;
use crate::core::services::custodian::CustodianFeeds;
use crate::core::services::key_vault::KeyVault;
use crate::core::traits::hook_runner::HookRunner;

/// The operator's seat: reports vault events and decides sign requests.
///
/// Requests are answered one at a time, by the `sign` hook when one is
/// configured and by a console prompt otherwise.
pub struct ConsoleAuthority<H> {
    vault: Arc<KeyVault>,
    hooks: Arc<H>,
}

impl<H: HookRunner + 'static> ConsoleAuthority<H> {
    pub fn new(vault: Arc<KeyVault>, hooks: Arc<H>) -> Self {
        Self { vault, hooks }
    }

    /// Drain both feeds until they close. `input` answers prompts.
    pub async fn run<R>(self, mut feeds: CustodianFeeds, mut input: R)
    where
        R: AsyncBufRead + Unpin,
    {
        let mut events_open = true;
        let mut approvals_open = true;

        loop {
            tokio::select! {
                event = feeds.events.recv(), if events_open => match event {
                    Some(event) => self.report(event),
                    None => events_open = false,
                },
                request = feeds.approvals.recv(), if approvals_open => match request {
                    Some(request) => self.decide(request, &mut input).await,
                    None => approvals_open = false,
                },
                else => break,
            }
        }
        debug!("console feeds closed");
    }

    fn report(&self, event: NotificationEvent) {
        let (hook, subject) = match &event {
            NotificationEvent::KeyAdded { fingerprint, .. } => {
                output::notice(&format!("Key added: {fingerprint}"));
                (HookEvent::Added, fingerprint.clone())
            }
            NotificationEvent::KeyRemoved {
                fingerprint,
                reason,
            } => {
                output::notice(&format!("Key removed ({reason}): {fingerprint}"));
                (HookEvent::Removed, fingerprint.clone())
            }
            NotificationEvent::AllKeysRemoved { count } => {
                output::notice(&format!("All keys removed ({count})"));
                (HookEvent::Removed, "all".to_string())
            }
        };
        self.fire(hook, subject);
        output::key_table(&self.vault.status());
    }

    /// Run a notification hook in the background.
    fn fire(&self, event: HookEvent, subject: String) {
        if !self.hooks.handles(event) {
            return;
        }
        let hooks = Arc::clone(&self.hooks);
        tokio::task::spawn_blocking(move || {
            if !hooks.run(event, &subject) {
                warn!(%event, %subject, "hook reported failure");
            }
        });
    }

    async fn decide<R>(&self, mut request: ApprovalRequest, input: &mut R)
    where
        R: AsyncBufRead + Unpin,
    {
        let fingerprint = request.fingerprint().to_string();
        if request.is_abandoned() {
            debug!(%fingerprint, ticket = request.ticket(), "skipping stale approval request");
            return;
        }
        output::notice(&format!(
            "Signature requested with {fingerprint} (request #{})",
            request.ticket()
        ));

        let decision = if self.hooks.handles(HookEvent::Sign) {
            let hooks = Arc::clone(&self.hooks);
            let subject = fingerprint.clone();
            let verdict =
                tokio::task::spawn_blocking(move || hooks.run(HookEvent::Sign, &subject));
            tokio::select! {
                biased;
                _ = request.abandoned() => None,
                verdict = verdict => Some(verdict.unwrap_or(false)),
            }
        } else {
            output::prompt("Allow this signature? (yes/no):");
            let mut line = String::new();
            let read = tokio::select! {
                biased;
                _ = request.abandoned() => None,
                read = input.read_line(&mut line) => Some(read),
            };
            read.map(|read| matches!(read, Ok(n) if n > 0) && line.trim() == "yes")
        };

        match decision {
            Some(approved) => {
                if !request.decide(approved) {
                    output::warning("Request expired before the decision arrived");
                } else if approved {
                    output::success("Signature approved");
                } else {
                    output::warning("Signature denied");
                }
            }
            None => {
                println!();
                output::warning("Request abandoned (timed out)");
                info!(%fingerprint, "approval request abandoned while pending");
            }
        }
    }
}
