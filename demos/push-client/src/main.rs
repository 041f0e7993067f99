//! Example push client reading envelopes from stdin.
//!
//! Run with: cargo run -p push-client-demo < messages.jsonl
//!
//! Each line is one envelope, e.g.
//! `{"type":"userMessage","message":"hello"}` or
//! `{"type":"jsCode","message":{"code":"console.log(1+1)"}}`.
//! Pipe the envelopes in so key presses reach the notification prompt
//! through the terminal.
//!
//! Set `PUSH_DISPATCH_CONFIG` to a JSON file to change the trust mode or
//! limits, and `RUST_LOG` to change log verbosity.

use std::sync::Arc;

use anyhow::Context as _;
use push_dispatch_core::{Dispatcher, PayloadLog};
use push_dispatch_notify::TerminalNotifier;
use push_dispatch_transport::{ClientConfig, PushClient, json_lines, register_default_handlers};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = ClientConfig::from_env().context("loading client config")?;
    let payload_log = Arc::new(PayloadLog::new());

    let mut dispatcher = Dispatcher::new();
    register_default_handlers(
        &mut dispatcher,
        TerminalNotifier::new(config.notify_title.clone()),
        &config.executor,
        config.executor.record_payloads.then(|| Arc::clone(&payload_log)),
    )
    .context("registering handlers")?;

    let mut client = PushClient::new(dispatcher, config.error_policy);
    let source = json_lines(tokio::io::BufReader::new(tokio::io::stdin()));
    let stats = client.run(source).await?;

    tracing::info!(
        handled = stats.handled,
        unrouted = stats.unrouted,
        failed = stats.failed,
        decode_errors = stats.decode_errors,
        recorded = payload_log.len(),
        "Done"
    );
    Ok(())
}
