//! The zone graph: an arena of zones, the sensor-address lookup, and the
//! precomputed inverse exit adjacency.
//!
//! Loaded once at startup from static configuration and immutable
//! afterwards, apart from the per-zone motion fields the engine maintains.

use std::collections::HashMap;

use crate::error::{ConfigError, LumoError};
use crate::zone::{Zone, ZoneId};

/// Owns every configured zone plus the lookup structures derived from them.
#[derive(Debug)]
pub struct ZoneGraph {
    zones: Vec<Zone>,
    by_name: HashMap<String, ZoneId>,
    by_source: HashMap<u32, ZoneId>,
    /// For each zone, the zones that exit *into* it — i.e. the zones whose
    /// vacancy a motion start here may corroborate.
    exit_sources: Vec<Vec<ZoneId>>,
    min_motion_timeout: chrono::Duration,
}

impl ZoneGraph {
    /// Validate the zone set and precompute the lookup structures.
    ///
    /// # Errors
    ///
    /// Fails fast with a [`ConfigError`] on duplicate zone names or sensor
    /// addresses, exit edges to undefined zones, exit-graph participants
    /// without motion capability, or a graph with no motion-capable zone.
    pub fn new(zones: Vec<Zone>) -> Result<Self, ConfigError> {
        let mut by_name = HashMap::new();
        let mut by_source = HashMap::new();

        for (index, zone) in zones.iter().enumerate() {
            let id = ZoneId::new(index);
            if by_name.insert(zone.name.clone(), id).is_some() {
                return Err(ConfigError::DuplicateZone(zone.name.clone()));
            }
            if let crate::zone::MotionSource::Sensor(addr) = zone.motion_source {
                if let Some(previous) = by_source.insert(addr, id) {
                    return Err(ConfigError::DuplicateSource {
                        addr,
                        first: zones[previous.index()].name.clone(),
                        second: zone.name.clone(),
                    });
                }
            }
        }

        let mut exit_sources = vec![Vec::new(); zones.len()];
        for (index, zone) in zones.iter().enumerate() {
            if zone.participates_in_exit_graph() && !zone.motion_source.is_motion_capable() {
                return Err(ConfigError::NoMotionCapability {
                    zone: zone.name.clone(),
                });
            }
            for target in &zone.exits_to {
                let target_id =
                    by_name
                        .get(target)
                        .copied()
                        .ok_or_else(|| ConfigError::UndefinedZone {
                            zone: zone.name.clone(),
                            target: target.clone(),
                        })?;
                if !zones[target_id.index()].motion_source.is_motion_capable() {
                    return Err(ConfigError::NoMotionCapability {
                        zone: target.clone(),
                    });
                }
                exit_sources[target_id.index()].push(ZoneId::new(index));
            }
        }

        let min_motion_timeout = zones
            .iter()
            .filter(|zone| zone.motion_source.is_motion_capable())
            .map(|zone| zone.motion_timeout)
            .min()
            .ok_or(ConfigError::NoMotionCapableZones)?;

        Ok(Self {
            zones,
            by_name,
            by_source,
            exit_sources,
            min_motion_timeout,
        })
    }

    #[must_use]
    pub fn zone(&self, id: ZoneId) -> &Zone {
        &self.zones[id.index()]
    }

    #[must_use]
    pub fn zone_mut(&mut self, id: ZoneId) -> &mut Zone {
        &mut self.zones[id.index()]
    }

    /// Look up a zone by name.
    #[must_use]
    pub fn zone_id(&self, name: &str) -> Option<ZoneId> {
        self.by_name.get(name).copied()
    }

    /// Resolve a sensor address to the zone it reports for.
    ///
    /// # Errors
    ///
    /// Returns [`LumoError::UnknownSource`] for an unregistered address;
    /// the caller logs and discards the event.
    pub fn zone_for_source(&self, addr: u32) -> Result<ZoneId, LumoError> {
        self.by_source
            .get(&addr)
            .copied()
            .ok_or(LumoError::UnknownSource { addr })
    }

    /// The zones with an exit edge *into* `id` — the candidates a motion
    /// start in `id` may corroborate as vacated. Empty when no zone exits
    /// into it.
    #[must_use]
    pub fn exit_sources_of(&self, id: ZoneId) -> &[ZoneId] {
        &self.exit_sources[id.index()]
    }

    /// Iterate all zones with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (ZoneId, &Zone)> {
        self.zones
            .iter()
            .enumerate()
            .map(|(index, zone)| (ZoneId::new(index), zone))
    }

    /// Ids of every zone that can see motion (own sensor or external feed).
    #[must_use]
    pub fn motion_capable_zones(&self) -> Vec<ZoneId> {
        self.iter()
            .filter(|(_, zone)| zone.motion_source.is_motion_capable())
            .map(|(id, _)| id)
            .collect()
    }

    /// The smallest motion timeout across motion-capable zones, computed
    /// once at construction. The idle sweep runs at half this cadence.
    #[must_use]
    pub fn min_motion_timeout(&self) -> chrono::Duration {
        self.min_motion_timeout
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
