//! Single-threaded push client loop.

use std::sync::Arc;

use futures::{Stream, StreamExt};
use push_dispatch_core::{
    Dispatcher, Envelope, HandlerError, JS_CODE, PayloadLog, Routing, USER_MESSAGE,
};
use push_dispatch_executor::{ExecuteError, ExecutorConfig, RemoteExecute};
use push_dispatch_notify::{Notifier, UserNotify};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::TransportError;

/// What the client loop does when a handler or decode step fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Log the error and continue with the next message.
    #[default]
    Log,
    /// Stop the loop and return the error.
    Abort,
}

/// Counters for a client run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClientStats {
    /// Messages a handler completed.
    pub handled: u64,
    /// Messages with no registered handler.
    pub unrouted: u64,
    /// Messages whose handler returned an error.
    pub failed: u64,
    /// Lines or frames that did not decode as an envelope.
    pub decode_errors: u64,
}

/// Client error.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Handler for `{message_type}` failed: {source}")]
    Handler {
        message_type: String,
        #[source]
        source: HandlerError,
    },
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Push client owning the dispatcher.
///
/// Messages are handled one at a time, to completion, on the thread that
/// drives [`PushClient::run`].
#[derive(Debug)]
pub struct PushClient {
    dispatcher: Dispatcher,
    policy: ErrorPolicy,
    stats: ClientStats,
}

impl PushClient {
    /// Create a client around a fully registered dispatcher.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, policy: ErrorPolicy) -> Self {
        Self {
            dispatcher,
            policy,
            stats: ClientStats::default(),
        }
    }

    /// The dispatcher messages are routed through.
    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Counters so far.
    #[must_use]
    pub const fn stats(&self) -> ClientStats {
        self.stats
    }

    /// Dispatch one envelope and update the counters.
    ///
    /// # Errors
    /// Returns the handler's error unchanged.
    pub fn handle(&mut self, envelope: &Envelope) -> Result<Routing, HandlerError> {
        let id = Uuid::new_v4();
        let span = tracing::debug_span!("dispatch", %id, message_type = %envelope.message_type);
        let _enter = span.enter();

        match self.dispatcher.dispatch_envelope(envelope) {
            Ok(Routing::Handled) => {
                self.stats.handled += 1;
                Ok(Routing::Handled)
            }
            Ok(Routing::Unrouted) => {
                self.stats.unrouted += 1;
                Ok(Routing::Unrouted)
            }
            Err(e) => {
                self.stats.failed += 1;
                Err(e)
            }
        }
    }

    /// Drive the client until `source` ends.
    ///
    /// # Errors
    /// Returns error if the source fails irrecoverably, or if a step fails
    /// under [`ErrorPolicy::Abort`].
    pub async fn run<S>(&mut self, mut source: S) -> Result<ClientStats, ClientError>
    where
        S: Stream<Item = Result<Envelope, TransportError>> + Unpin,
    {
        tracing::info!(types = ?self.dispatcher.registered_types(), "Push client started");

        while let Some(next) = source.next().await {
            let envelope = match next {
                Ok(envelope) => envelope,
                Err(e) if e.is_recoverable() && self.policy == ErrorPolicy::Log => {
                    self.stats.decode_errors += 1;
                    tracing::warn!("Skipping undecodable message: {e}");
                    continue;
                }
                Err(e) => {
                    if e.is_recoverable() {
                        self.stats.decode_errors += 1;
                    }
                    tracing::error!("Push source failed: {e}");
                    return Err(e.into());
                }
            };

            if let Err(source) = self.handle(&envelope) {
                match self.policy {
                    ErrorPolicy::Log => {
                        tracing::error!(
                            message_type = %envelope.message_type,
                            "Handler failed: {source}"
                        );
                    }
                    ErrorPolicy::Abort => {
                        return Err(ClientError::Handler {
                            message_type: envelope.message_type,
                            source,
                        });
                    }
                }
            }
        }

        tracing::info!(stats = ?self.stats, "Push source ended");
        Ok(self.stats)
    }
}

/// Register the `userMessage` and `jsCode` handlers.
///
/// # Errors
/// Returns error if the script engine cannot be created.
pub fn register_default_handlers<N>(
    dispatcher: &mut Dispatcher,
    notifier: N,
    config: &ExecutorConfig,
    payload_log: Option<Arc<PayloadLog>>,
) -> Result<(), ExecuteError>
where
    N: Notifier + 'static,
{
    dispatcher.register(USER_MESSAGE, UserNotify::new(notifier));

    let mut execute = RemoteExecute::from_config(config)?;
    if let Some(log) = payload_log {
        execute = execute.with_payload_log(log);
    }
    dispatcher.register(JS_CODE, execute);
    Ok(())
}
