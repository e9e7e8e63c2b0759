// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{error::Error, sync::Arc, time::Duration};

use axum_server::{tls_rustls::RustlsConfig, Handle};
use todo_api_server::{
    api::router,
    auth::{Authenticator, IdentityResolver, TokenVerifier},
    config::{AppConfig, LogFormat, SeedTodoType},
    models::validate_todo_type_name,
    state::AppState,
    storage::TodoDatabase,
    suggestions::SuggestionClient,
    telemetry::init_tracing,
};

/// Grace period for in-flight requests on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Install the ring crypto provider for rustls (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "Failed to install rustls crypto provider")?;

    init_tracing(LogFormat::from_env());

    let config = AppConfig::from_env().inspect_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
    })?;
    tracing::info!(
        issuer = %config.auth.issuer,
        jwks_url = %config.auth.jwks_url,
        database = %config.database_path.display(),
        "Configuration loaded"
    );

    let database = Arc::new(TodoDatabase::open(&config.database_path)?);
    seed_todo_types(&database, &config.seed_todo_types);

    let authenticator = Authenticator::new(
        TokenVerifier::from_settings(&config.auth)?,
        IdentityResolver::new(Arc::clone(&database)),
    );
    let suggestions = SuggestionClient::from_settings(&config.suggest)?;
    let state = AppState::new(database, authenticator, suggestions);
    let app = router(state, &config.cors_allowed_origins);

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone()));

    let addr = config.bind_addr;
    match &config.tls {
        Some((cert_path, key_path)) => {
            let tls_config = RustlsConfig::from_pem_file(cert_path, key_path).await?;
            tracing::info!("Todo API listening on https://{addr} (docs at /docs)");
            axum_server::bind_rustls(addr, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            tracing::info!("Todo API listening on http://{addr} (docs at /docs)");
            axum_server::bind(addr)
                .handle(handle)
                .serve(app.into_make_service())
                .await?;
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

fn seed_todo_types(database: &TodoDatabase, seeds: &[SeedTodoType]) {
    let repo = database.todo_types();
    for seed in seeds {
        if let Err(reason) = validate_todo_type_name(&seed.name) {
            tracing::warn!(name = %seed.name, %reason, "Skipping invalid todo type seed");
            continue;
        }
        match repo.ensure(seed.name.trim(), &seed.description) {
            Ok(todo_type) => tracing::debug!(id = todo_type.id, name = %todo_type.name, "Todo type ready"),
            Err(e) => tracing::warn!(name = %seed.name, error = %e, "Failed to seed todo type"),
        }
    }
}

async fn shutdown_signal(handle: Handle<std::net::SocketAddr>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
