//! Connector entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: flags and environment, validated into
//!    [`config::Settings`] before any network activity.
//! 2. **Wire observability**: `tracing-subscriber` with a text or JSON
//!    formatter and, optionally, an OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: the Gerrit client (probed with
//!    `GET a/accounts/self`) and, when serving, the webhook trigger.
//! 4. **Select the mode**:
//!    - `--list` prints the checkers owned by the scheme as JSON lines.
//!    - `--register` / `--update` create or update one checker.
//!    - otherwise the poll loop and both workers run until Ctrl-C or
//!      SIGTERM.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use checks::IdentityCodec;
use clap::Parser;
use dispatch::{Connector, DispatchConfig};
use gerrit::{BasicAuth, GerritClient};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use trigger::WebhookTrigger;

mod config;
mod telemetry;

use config::{Cli, Mode, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Cli::parse().validate()?;
    let telemetry = telemetry::init(settings.log_format, settings.otlp_endpoint.as_deref())?;

    let result = run(settings).await;
    if let Err(err) = &result {
        tracing::error!(error = ?err, "connector failed");
    }
    telemetry.shutdown();
    result
}

async fn run(settings: Settings) -> Result<()> {
    let auth = BasicAuth::from_file(&settings.auth_file)?;
    let client = GerritClient::new(settings.gerrit.clone(), Some(auth))
        .context("creating Gerrit client")?;

    // A GET first completes any cookie dance and fails fast on bad
    // credentials.
    client.ping().await.context("accounts/self")?;

    let codec = IdentityCodec::new(settings.scheme.clone());
    match settings.mode.clone() {
        Mode::List => list(&client, &codec).await,
        Mode::Register {
            repository,
            prefix,
            update,
            blocking,
        } => {
            let checker =
                dispatch::register(&client, &codec, &repository, &prefix, update, blocking)
                    .await
                    .context("registering checker")?;
            info!(checker = %checker.uuid, name = %checker.name, "checker saved");
            Ok(())
        }
        Mode::Serve { event_listener } => serve(client, codec, event_listener, &settings).await,
    }
}

async fn list(client: &GerritClient, codec: &IdentityCodec) -> Result<()> {
    let checkers = dispatch::list_owned(client, codec)
        .await
        .context("listing checkers")?;

    let mut stdout = std::io::stdout().lock();
    for checker in checkers {
        serde_json::to_writer(&mut stdout, &checker)?;
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}

async fn serve(
    client: GerritClient,
    codec: IdentityCodec,
    event_listener: reqwest::Url,
    settings: &Settings,
) -> Result<()> {
    let trigger = WebhookTrigger::new(event_listener, settings.request_timeout)
        .context("creating webhook client")?;

    let config = DispatchConfig {
        repo_root: client.base_url().to_string(),
        poll_interval: settings.poll_interval,
        check_queue_capacity: settings.queue_capacity,
        submission_queue_capacity: settings.queue_capacity,
        call_timeout: settings.request_timeout,
    };
    info!(
        gerrit = %client.base_url(),
        pipeline = %trigger.endpoint(),
        scheme = %codec.scheme(),
        "serving",
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(shutdown.clone()));

    Connector::new(Arc::new(client), Arc::new(trigger), config, codec)
        .run(shutdown)
        .await;
    Ok(())
}

async fn cancel_on_signal(shutdown: CancellationToken) {
    wait_for_signal().await;
    info!("shutdown requested");
    shutdown.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(err) => {
            warn!(error = %err, "SIGTERM handler unavailable");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
