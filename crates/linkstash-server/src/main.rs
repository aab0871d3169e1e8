mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use linkstash_api::{AppState, AppStateInner, TokenKeys};
use linkstash_crypto::Hasher;
use linkstash_db::{Database, DocumentBackend, LinkPolicy, MemoryDocuments};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{Config, StoreKind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "linkstash=debug,linkstash_api=debug,linkstash_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {:#}", e);
            eprintln!("       Set LINKSTASH_* in your environment or .env file and restart.");
            std::process::exit(1);
        }
    };
    if config.is_development() && config.uses_dev_secret() {
        warn!("Using the development JWT secret; set LINKSTASH_JWT_SECRET before deploying");
    }

    let state = build_state(&config)?;

    let app = linkstash_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        "Linkstash listening on {} ({} store, {})",
        addr,
        store_name(config.store),
        config.environment
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let policy = LinkPolicy {
        reject_duplicate_urls: config.reject_duplicate_urls,
    };
    let hasher = Hasher::new();
    let ttl = chrono::TimeDelta::try_days(config.token_ttl_days)
        .context("LINKSTASH_TOKEN_TTL_DAYS out of range")?;
    let tokens = TokenKeys::new(&config.jwt_secret, ttl);
    let env = config.environment.clone();

    let state = match config.store {
        StoreKind::Sqlite => {
            let db = Database::open(&config.db_path, policy)?;
            AppStateInner::with_backend(Arc::new(db), hasher, tokens, env)
        }
        StoreKind::Document => {
            let db = Database::open(&config.db_path, policy)?;
            let backend = DocumentBackend::new(db, policy);
            AppStateInner::with_backend(Arc::new(backend), hasher, tokens, env)
        }
        StoreKind::Memory => {
            warn!("Memory store selected; nothing survives a restart");
            let backend = DocumentBackend::new(MemoryDocuments::new(), policy);
            AppStateInner::with_backend(Arc::new(backend), hasher, tokens, env)
        }
    };
    Ok(state)
}

fn store_name(kind: StoreKind) -> &'static str {
    match kind {
        StoreKind::Sqlite => "sqlite",
        StoreKind::Document => "document",
        StoreKind::Memory => "memory",
    }
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Could not install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
