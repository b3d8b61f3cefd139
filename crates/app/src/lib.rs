//! # lumo-app
//!
//! Application layer — the occupancy engine and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `LightDriver` — send commands to and query the light bridge
//!   - `FlagStore` — persisted operating-mode flags (guest, party, …)
//!   - `MotionStore` — persisted last-motion timestamps per zone
//!   - `WeatherProvider` — current cloud cover for schedule validity
//!   - `EventPublisher` — broadcast of zone events
//! - Define **driving/inbound ports**:
//!   - `MotionSink` — entry point for decoded sensor events
//! - Own the **Engine**: motion processing, exit corroboration, the idle
//!   sweep, and routine programs
//! - Own the **CircadianService**: weather-gated schedule queries and the
//!   event-change runner
//! - Provide **in-process infrastructure** (event bus, in-memory light
//!   driver) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `lumo-domain` only (plus `tokio::sync`/`tokio::time`).
//! Never imports adapter crates. Adapters depend on *this* crate, not the
//! reverse.

pub mod circadian;
pub mod engine;
pub mod event_bus;
pub mod memory_driver;
pub mod ports;
pub mod routines;
pub mod sweep;
