//! # lumo-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the [`FlagStore`](lumo_app::ports::FlagStore),
//!   [`MotionStore`](lumo_app::ports::MotionStore) and
//!   [`WeatherProvider`](lumo_app::ports::WeatherProvider) ports over a
//!   single shared key-value table
//! - Manage the `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//!
//! The table doubles as inter-process state: the external forecast job and
//! sensor processes read and write the same keys.
//!
//! ## Dependency rule
//! Depends on `lumo-app` (for port traits) and `lumo-domain` (for domain
//! types). The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod pool;
pub mod state_store;

pub use error::StorageError;
pub use pool::{Config, Database};
pub use state_store::SqliteStateStore;
