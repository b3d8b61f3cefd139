//! Presence tracking: the occupied and exited zone sets.
//!
//! Invariant: a zone is never in both sets at once. All mutation goes
//! through the methods below, which maintain the invariant by construction.

use std::collections::HashSet;

use crate::zone::ZoneId;

/// The two occupancy sets the engine reasons over.
///
/// *Occupied*: motion happened and no corroborated exit has been seen.
/// *Exited*: vacancy has been corroborated, pending the idle sweep
/// powering the zone off.
#[derive(Debug, Default)]
pub struct Presence {
    occupied: HashSet<ZoneId>,
    exited: HashSet<ZoneId>,
}

impl Presence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a zone occupied, clearing any exited marker.
    pub fn mark_occupied(&mut self, id: ZoneId) {
        self.exited.remove(&id);
        self.occupied.insert(id);
    }

    /// Mark a zone's vacancy as corroborated, clearing its occupancy.
    pub fn mark_exited(&mut self, id: ZoneId) {
        self.occupied.remove(&id);
        self.exited.insert(id);
    }

    /// Forget a zone entirely, e.g. after powering it off.
    pub fn clear(&mut self, id: ZoneId) {
        self.occupied.remove(&id);
        self.exited.remove(&id);
    }

    #[must_use]
    pub fn is_occupied(&self, id: ZoneId) -> bool {
        self.occupied.contains(&id)
    }

    #[must_use]
    pub fn is_exited(&self, id: ZoneId) -> bool {
        self.exited.contains(&id)
    }

    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.occupied.len()
    }
}
