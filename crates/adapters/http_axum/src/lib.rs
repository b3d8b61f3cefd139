//! # lumo-adapter-http-axum
//!
//! HTTP front end for the lumo daemon.
//!
//! ## Responsibilities
//! - Expose the status surface: zone snapshot, circadian queries, flags
//! - Trigger the arrival and wake-up routines
//! - Stream zone events over SSE for live displays
//!
//! ## Dependency rule
//! Depends on `lumo-app` (engine + ports) and `lumo-domain` only.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
