//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside
//! world. They are defined here (in `app`) so that both the engine and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod event_bus;
pub mod flag_store;
pub mod light_driver;
pub mod motion_sink;
pub mod motion_store;
pub mod weather;

pub use event_bus::EventPublisher;
pub use flag_store::{Flag, FlagStore};
pub use light_driver::LightDriver;
pub use motion_sink::MotionSink;
pub use motion_store::MotionStore;
pub use weather::WeatherProvider;
