//! # lumod — lumo daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize the `SQLite` state store and run migrations
//! - Build the zone graph and circadian schedule from configuration
//! - Construct the engine, injecting adapters via port traits
//! - Spawn the background tasks: idle sweep, circadian runner, sensor listener
//! - Build the axum router, bind to a TCP port, and serve
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use lumo_adapter_http_axum::router;
use lumo_adapter_http_axum::state::AppState;
use lumo_adapter_hue::{HueBridge, HueConfig};
use lumo_adapter_sensor_udp::SensorListener;
use lumo_adapter_storage_sqlite_sqlx::SqliteStateStore;
use lumo_app::circadian::{self, CircadianService};
use lumo_app::engine::Engine;
use lumo_app::event_bus::InProcessEventBus;
use lumo_app::memory_driver::MemoryLightDriver;
use lumo_app::ports::LightDriver;
use lumo_app::sweep;
use lumo_domain::command::LightCommand;
use lumo_domain::error::DriverError;
use lumo_domain::zone::LightId;

use config::Config;

/// Static dispatch over the two driver backends the daemon can run with.
enum AnyLightDriver {
    Hue(HueBridge),
    Memory(MemoryLightDriver),
}

impl LightDriver for AnyLightDriver {
    async fn set_command(
        &self,
        lights: &[LightId],
        command: &LightCommand,
    ) -> Result<(), DriverError> {
        match self {
            Self::Hue(bridge) => bridge.set_command(lights, command).await,
            Self::Memory(memory) => memory.set_command(lights, command).await,
        }
    }

    async fn power_state(&self, light: LightId) -> Result<bool, DriverError> {
        match self {
            Self::Hue(bridge) => bridge.power_state(light).await,
            Self::Memory(memory) => memory.power_state(light).await,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.logging.filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Static configuration, validated fail-fast.
    let graph = config.build_graph()?;
    let schedule = config.build_schedule()?;

    // Shared state store (flags, last-motion, cached forecast).
    let db = lumo_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database.url.clone(),
    }
    .build()
    .await?;
    let store = Arc::new(SqliteStateStore::new(db.pool().clone()));

    // Light driver.
    let driver = if config.bridge.virtual_enabled {
        tracing::info!("using the in-memory light driver");
        AnyLightDriver::Memory(MemoryLightDriver::new())
    } else {
        AnyLightDriver::Hue(HueBridge::new(HueConfig {
            base_url: config.bridge.base_url.clone(),
            username: config.bridge.username.clone(),
            timeout: std::time::Duration::from_millis(config.bridge.timeout_millis),
        })?)
    };

    // Engine.
    let event_bus = Arc::new(InProcessEventBus::new(256));
    let engine = Arc::new(Engine::new(
        graph,
        config.engine_settings(),
        driver,
        Arc::clone(&store),
        Arc::clone(&store),
        CircadianService::new(schedule, Arc::clone(&store)),
        Arc::clone(&event_bus),
    ));
    engine.enable_motion().await;
    engine.restore_persisted_motion().await;

    // Background tasks.
    tokio::spawn(sweep::run(Arc::clone(&engine)));
    tokio::spawn(circadian::run(Arc::clone(&engine)));
    let sensor_listener = SensorListener::bind(&config.sensors.listen).await?;
    tokio::spawn(sensor_listener.run(Arc::clone(&engine)));

    // HTTP.
    let state = AppState::new(
        Arc::clone(&engine),
        event_bus,
        config.routine_settings(),
    );
    let app = router::build(state);

    let bind_addr = config.bind_addr();
    tracing::info!(%bind_addr, "lumod listening");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
