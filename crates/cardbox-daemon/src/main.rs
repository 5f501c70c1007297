//! Cardbox Daemon - Background record synchronization service
//!
//! Runs the save queue and message router for one user session. Requests
//! arrive as JSON lines on stdin (the cross-context message bus of the
//! hosting application) and every request is answered with exactly one
//! JSON line on stdout.
//!
//! # Architecture
//!
//! The daemon wires the adapters to the engine: the record API store
//! behind the `RecordStore` port, a save queue constructed once for the
//! session and injected into the router. The loop is controlled by a
//! `CancellationToken` triggered on SIGINT.

use std::sync::Arc;

use anyhow::{Context, Result};
use cardbox_core::config::Config;
use cardbox_core::domain::newtypes::RecordId;
use cardbox_core::ports::auth::StaticTokenProvider;
use cardbox_remote::{RecordApiStore, RemoteRecordClient};
use cardbox_router::{MessageRouter, Request, Response};
use cardbox_sync::{RetryPolicy, SaveDataPreparer, SaveQueue};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable naming the config file; falls back to the
/// platform default path
const CONFIG_ENV: &str = "CARDBOX_CONFIG";

/// Environment variables supplied by the hosting application's auth
/// collaborator
const TOKEN_ENV: &str = "CARDBOX_ACCESS_TOKEN";
const RECORD_ID_ENV: &str = "CARDBOX_RECORD_ID";

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .init();

    info!("cardboxd starting");

    let router = build_router(&config)?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            signal_token.cancel();
        }
    });

    serve(router, shutdown).await
}

fn load_config() -> Config {
    let path = std::env::var(CONFIG_ENV)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| Config::default_path());
    Config::load_or_default(&path)
}

/// Wires adapters to the engine: one store, one queue, one router
fn build_router(config: &Config) -> Result<MessageRouter> {
    let token =
        std::env::var(TOKEN_ENV).context("CARDBOX_ACCESS_TOKEN must be set by the host")?;
    let tokens = Arc::new(StaticTokenProvider::new(token));

    let session_record_id = match std::env::var(RECORD_ID_ENV) {
        Ok(raw) => Some(
            RecordId::new(raw).context("CARDBOX_RECORD_ID must be a non-empty record id")?,
        ),
        Err(_) => None,
    };

    let token_port: Arc<dyn cardbox_core::ports::auth::AccessTokenProvider> = tokens.clone();
    let client = Arc::new(RemoteRecordClient::new(
        config.remote.base_url.clone(),
        config.remote.app_id.clone(),
        token_port,
    ));
    let store = Arc::new(RecordApiStore::new(
        client,
        config.remote.clone(),
        config.retry.clone(),
    ));
    let store_port: Arc<dyn cardbox_core::ports::record_store::RecordStore> = store;

    let preparer = SaveDataPreparer::new(Arc::clone(&store_port), config.save.preservation);
    let queue = SaveQueue::new(
        Arc::clone(&store_port),
        preparer,
        RetryPolicy::from_config(&config.retry),
    );

    Ok(MessageRouter::new(queue, store_port, tokens, session_record_id))
}

/// Reads JSON-line requests from stdin until EOF or shutdown, answering
/// each with one JSON line on stdout
async fn serve(router: MessageRouter, shutdown: CancellationToken) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("cardboxd shutting down");
                return Ok(());
            }
            line = lines.next_line() => line.context("Failed to read request line")?,
        };

        let Some(line) = line else {
            info!("Request stream closed, exiting");
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => router.handle(request).await,
            Err(err) => {
                warn!(error = %err, "Unparseable request");
                Response::DataRefreshError {
                    error: format!("Unparseable request: {err}"),
                }
            }
        };

        let mut encoded = serde_json::to_string(&response)
            .context("Failed to encode response")?;
        encoded.push('\n');
        stdout
            .write_all(encoded.as_bytes())
            .await
            .context("Failed to write response")?;
        stdout.flush().await.context("Failed to flush response")?;
    }
}
