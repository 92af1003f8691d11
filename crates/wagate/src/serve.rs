// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wagate serve` command implementation.
//!
//! Wires storage, the Cloud API client (behind the send-logging outbox),
//! the flow engine, per-contact dispatcher, broadcast worker, and the HTTP
//! server. Failure to open the database or bind the listener is fatal and
//! exits non-zero.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use wagate_config::GatewayConfig;
use wagate_core::{GatewayError, ProviderGateway};
use wagate_engine::{BroadcastQueue, ContactRouter, Engine, EventHub, Outbox};
use wagate_gateway::{start_server, AppState};
use wagate_storage::queries::settings;
use wagate_storage::Database;
use wagate_whatsapp::CloudClient;

/// Runs the `wagate serve` command.
pub async fn run_serve(config: GatewayConfig) -> Result<(), GatewayError> {
    init_tracing(&config.server.log_level);
    info!("starting wagate serve");

    let db_path = config.storage.effective_path();
    let db = Database::open_with_options(&db_path, config.storage.wal_mode).await?;
    info!(path = db_path.as_str(), "database ready");

    // Reconcile credentials with the persisted system settings: a stored
    // value wins, a fresh environment value is stored for next time.
    let mut whatsapp = config.whatsapp.clone();
    whatsapp.verify_token =
        settings::load_or_store(&db, "VERIFY_TOKEN", &whatsapp.verify_token).await?;
    whatsapp.access_token =
        settings::load_or_store(&db, "WHATSAPP_TOKEN", &whatsapp.access_token).await?;
    whatsapp.phone_number_id =
        settings::load_or_store(&db, "PHONE_NUMBER_ID", &whatsapp.phone_number_id).await?;
    whatsapp.business_account_id =
        settings::load_or_store(&db, "WABA_ID", &whatsapp.business_account_id).await?;
    debug!("system settings synchronized");

    let client = Arc::new(CloudClient::new(
        &whatsapp.access_token,
        &whatsapp.phone_number_id,
        &whatsapp.business_account_id,
    )?);

    let hub = EventHub::default();
    let outbox: Arc<dyn ProviderGateway> =
        Arc::new(Outbox::new(client, db.clone(), hub.clone()));

    let engine = Arc::new(
        Engine::new(db.clone(), outbox.clone(), hub.clone())
            .with_test_triggers(config.engine.test_triggers),
    );

    let cancel = install_signal_handler();

    let router = Arc::new(ContactRouter::new(
        engine.clone(),
        config.engine.queue_capacity,
        cancel.clone(),
    ));
    let broadcast = BroadcastQueue::start(outbox.clone(), cancel.clone());

    let state = AppState {
        engine,
        router,
        db: db.clone(),
        provider: outbox,
        hub,
        broadcast,
        verify_token: whatsapp.verify_token.clone(),
    };

    start_server(&config.server.host, config.server.port, state, cancel).await?;

    db.close().await?;
    info!("wagate serve shutdown complete");
    Ok(())
}

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is
/// received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    tracing::error!(error = %e, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    token_clone.cancel();
                    return;
                }
            };

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
    });

    token
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wagate={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
