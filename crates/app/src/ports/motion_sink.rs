//! Motion sink port — the inbound entry point for decoded sensor events.
//!
//! Ingestion adapters (GPIO interrupt bridges, radio relays, datagram
//! listeners) are transport-specific; they all terminate here.

use std::future::Future;

use lumo_domain::time::Timestamp;

/// Consumes one decoded motion event, regardless of transport.
///
/// Implementations absorb their own failures: an event from an unknown
/// source is logged and discarded, never surfaced to the transport.
pub trait MotionSink: Send + Sync {
    fn handle_motion(
        &self,
        source: u32,
        is_start: bool,
        at: Timestamp,
    ) -> impl Future<Output = ()> + Send;
}

impl<T: MotionSink + Send + Sync> MotionSink for std::sync::Arc<T> {
    fn handle_motion(
        &self,
        source: u32,
        is_start: bool,
        at: Timestamp,
    ) -> impl Future<Output = ()> + Send {
        (**self).handle_motion(source, is_start, at)
    }
}
