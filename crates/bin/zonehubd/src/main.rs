//! # zonehubd — zonehub daemon
//!
//! Composition root that wires all adapters together and starts one control
//! loop per configuration entry.
//!
//! ## Responsibilities
//! - Parse configuration (TOML file, env var overrides) and validate it
//! - Initialise logging
//! - Seed the simulated host platform and the JSON state store
//! - Construct one coordinator per entry and spawn its runtime task
//! - Build the axum router, injecting the entry registry
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGINT), persisting entry state
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no control logic belongs here.

mod config;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use zonehub_adapter_http_axum::state::AppState;
use zonehub_adapter_storage_json::JsonStateStore;
use zonehub_adapter_virtual::VirtualHost;
use zonehub_app::coordinator::Coordinator;
use zonehub_app::runtime::{self, EntryHandle, EntryRegistry};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Simulated host platform
    let host = VirtualHost::new(256);
    for initial in &config.initial_states {
        host.set_state(&initial.entity, initial.snapshot()?);
    }

    // Persistence
    let store = JsonStateStore::new(config.storage.dir.clone());

    // One coordinator task per entry
    let mut registry = EntryRegistry::new();
    let mut tasks = Vec::new();
    for entry_config in config.entry_configs() {
        let entry_id = entry_config.id.clone();
        let coordinator = Coordinator::new(
            entry_config,
            host.clone(),
            host.clone(),
            host.clone(),
            host.clone(),
            store.clone(),
        )
        .with_context(|| format!("building coordinator for {entry_id}"))?;

        let (commands, command_rx) = mpsc::channel(64);
        registry.insert(EntryHandle::new(entry_id.clone(), commands));
        let events = host.subscribe();
        tasks.push(tokio::spawn(runtime::run_entry(
            coordinator,
            command_rx,
            events,
        )));
        info!(entry = %entry_id, "control loop started");
    }

    // HTTP
    let state = AppState::new(registry);
    let app = zonehub_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    info!("zonehubd listening on http://{bind_addr}");
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The server dropping the registry closes every command channel; each
    // entry task persists its state and exits.
    for task in tasks {
        let _ = task.await;
    }
    info!("zonehubd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
