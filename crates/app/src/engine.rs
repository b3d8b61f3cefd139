//! The occupancy engine.
//!
//! One value owns the zone graph and the presence sets; the motion event
//! processor and the idle sweep both run their read-modify-write sequences
//! under its single lock. Light-driver dispatch happens after the lock is
//! released, fire-and-forget with a bounded timeout, so an unreachable
//! bridge never blocks motion ingestion.

use std::future::Future;
use std::sync::atomic::AtomicBool;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lumo_domain::circadian::CircadianEvent;
use lumo_domain::command::{self, LightCommand};
use lumo_domain::error::LumoError;
use lumo_domain::event::{PowerOffReason, ZoneEvent};
use lumo_domain::graph::ZoneGraph;
use lumo_domain::presence::Presence;
use lumo_domain::time::{Timestamp, now};
use lumo_domain::zone::{BehaviorMode, LightId, MotionSource, ZoneId, ZoneSnapshot};

use crate::circadian::CircadianService;
use crate::ports::{
    EventPublisher, Flag, FlagStore, LightDriver, MotionSink, MotionStore, WeatherProvider,
};

/// Fade used when the circadian runner re-colors lit zones.
const COLOR_FADE: std::time::Duration = std::time::Duration::from_secs(20);

/// Tunables for motion processing and the idle sweep.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Max gap between source-zone last motion and destination-zone motion
    /// start to count as the same transit.
    pub corroboration_window: chrono::Duration,
    /// Extended timeout that eventually powers off zones stuck "occupied".
    pub occupied_grace: chrono::Duration,
    /// Deadline for a single light-driver dispatch.
    pub dispatch_timeout: std::time::Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            corroboration_window: chrono::Duration::seconds(20),
            occupied_grace: chrono::Duration::hours(2),
            dispatch_timeout: std::time::Duration::from_secs(2),
        }
    }
}

struct EngineState {
    graph: ZoneGraph,
    presence: Presence,
}

/// The single owner of mutable zone state, generic over its ports.
pub struct Engine<L, F, M, W, P> {
    state: Mutex<EngineState>,
    driver: L,
    flags: F,
    motion_store: M,
    circadian: CircadianService<W>,
    events: P,
    settings: EngineSettings,
    pub(crate) arrival_active: AtomicBool,
}

/// Work computed under the lock, executed after it is released.
#[derive(Default)]
struct MotionOutcome {
    dispatches: Vec<(Vec<LightId>, LightCommand)>,
    events: Vec<ZoneEvent>,
    persist: Option<(String, Timestamp)>,
}

struct PlannedPowerOff {
    zone: String,
    lights: Vec<LightId>,
    reason: PowerOffReason,
}

impl<L, F, M, W, P> Engine<L, F, M, W, P>
where
    L: LightDriver,
    F: FlagStore,
    M: MotionStore,
    W: WeatherProvider,
    P: EventPublisher + Send + Sync,
{
    pub fn new(
        graph: ZoneGraph,
        settings: EngineSettings,
        driver: L,
        flags: F,
        motion_store: M,
        circadian: CircadianService<W>,
        events: P,
    ) -> Self {
        Self {
            state: Mutex::new(EngineState {
                graph,
                presence: Presence::new(),
            }),
            driver,
            flags,
            motion_store,
            circadian,
            events,
            settings,
            arrival_active: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn circadian(&self) -> &CircadianService<W> {
        &self.circadian
    }

    /// The idle sweep cadence: half the smallest configured motion timeout.
    #[must_use]
    pub fn sweep_cadence(&self) -> std::time::Duration {
        let min = self.state().graph.min_motion_timeout();
        (min / 2)
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(60))
    }

    /// Re-assert the motion master switch, as the daemon does at startup.
    pub async fn enable_motion(&self) {
        if let Err(err) = self.flags.set_flag(Flag::MotionEnabled, true).await {
            tracing::warn!(error = %err, "could not persist motion-enabled flag");
        }
    }

    /// Seed zones that never saw motion this process lifetime from the
    /// persisted timestamps.
    pub async fn restore_persisted_motion(&self) {
        let zones: Vec<(ZoneId, String)> = {
            let state = self.state();
            state
                .graph
                .motion_capable_zones()
                .into_iter()
                .map(|id| (id, state.graph.zone(id).name.clone()))
                .collect()
        };

        for (id, name) in zones {
            match self.motion_store.last_motion(&name).await {
                Ok(Some(at)) => {
                    let mut state = self.state();
                    let zone = state.graph.zone_mut(id);
                    if zone.last_motion.is_none() {
                        zone.last_motion = Some(at);
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(zone = %name, error = %err, "persisted motion unavailable");
                }
            }
        }
    }

    /// Entry point for every decoded sensor event.
    ///
    /// # Errors
    ///
    /// Returns [`LumoError::UnknownSource`] for an unregistered address;
    /// the caller logs and discards the event.
    pub async fn on_motion(
        &self,
        source: u32,
        is_start: bool,
        at: Timestamp,
    ) -> Result<(), LumoError> {
        let Some(context) = self.motion_context(at).await else {
            return Ok(());
        };

        let outcome = {
            let mut state = self.state();
            let id = state.graph.zone_for_source(source)?;
            Self::apply_motion(&mut state, id, is_start, at, &context, &self.settings)
        };
        self.finish_motion(outcome).await;
        Ok(())
    }

    /// Motion reported for an externally-sensed zone, by name.
    ///
    /// # Errors
    ///
    /// Returns [`LumoError::UnknownZone`] when no zone has that name.
    pub async fn on_external_motion(
        &self,
        zone: &str,
        is_start: bool,
        at: Timestamp,
    ) -> Result<(), LumoError> {
        let Some(context) = self.motion_context(at).await else {
            return Ok(());
        };

        let outcome = {
            let mut state = self.state();
            let id = state
                .graph
                .zone_id(zone)
                .ok_or_else(|| LumoError::UnknownZone {
                    name: zone.to_string(),
                })?;
            Self::apply_motion(&mut state, id, is_start, at, &context, &self.settings)
        };
        self.finish_motion(outcome).await;
        Ok(())
    }

    /// Gather the per-event inputs that need IO, or `None` when a global
    /// suppression flag swallows the event.
    async fn motion_context(&self, at: Timestamp) -> Option<MotionContext> {
        if !self.flag_or_false(Flag::MotionEnabled).await {
            tracing::debug!("motion disabled, ignoring event");
            return None;
        }
        if self.flag_or_false(Flag::PartyMode).await {
            tracing::debug!("party mode, ignoring event");
            return None;
        }
        let guest_mode = self.flag_or_false(Flag::GuestMode).await;
        let circadian = self.circadian.current_event(at).await;
        Some(MotionContext {
            guest_mode,
            circadian,
        })
    }

    fn apply_motion(
        state: &mut EngineState,
        id: ZoneId,
        is_start: bool,
        at: Timestamp,
        context: &MotionContext,
        settings: &EngineSettings,
    ) -> MotionOutcome {
        let mut outcome = MotionOutcome::default();

        let zone = state.graph.zone_mut(id);
        if context.guest_mode && zone.behavior_mode == BehaviorMode::GuestSuppressed {
            tracing::debug!(zone = %zone.name, "guest mode, ignoring event");
            return outcome;
        }
        // Sensors repeat stop events; a stop on an idle zone carries nothing.
        if !is_start && !zone.motion_active {
            tracing::debug!(zone = %zone.name, "spurious motion stop");
            return outcome;
        }

        zone.record_motion(at, is_start);
        let name = zone.name.clone();
        tracing::info!(
            zone = %name,
            started = is_start,
            "motion {}",
            if is_start { "started" } else { "stopped" }
        );
        outcome.persist = Some((name.clone(), at));

        if is_start {
            state.presence.mark_occupied(id);
            outcome.events.push(ZoneEvent::MotionStarted {
                zone: name.clone(),
                at,
            });

            let zone = state.graph.zone(id);
            let entry_command = if context.circadian.brightness > 0 {
                Some(command::compose(LightCommand::on(), &context.circadian))
            } else if zone.behavior_mode == BehaviorMode::LightsOnDuringDay {
                Some(command::compose(LightCommand::full_on(), &context.circadian))
            } else {
                None
            };
            if let Some(cmd) = entry_command {
                if !zone.lights.is_empty() {
                    outcome.dispatches.push((zone.lights.clone(), cmd));
                }
            }

            Self::corroborate_exits(state, id, at, settings, &mut outcome);
        } else {
            outcome.events.push(ZoneEvent::MotionStopped { zone: name, at });
        }

        outcome
    }

    /// Decide, for each zone exiting into `dst`, whether this motion start
    /// corroborates the person having left it.
    fn corroborate_exits(
        state: &mut EngineState,
        dst: ZoneId,
        at: Timestamp,
        settings: &EngineSettings,
        outcome: &mut MotionOutcome,
    ) {
        let sources = state.graph.exit_sources_of(dst).to_vec();
        if sources.is_empty() {
            return;
        }
        let dst_name = state.graph.zone(dst).name.clone();

        for src in sources {
            let occupied = state.presence.is_occupied(src);
            let zone = state.graph.zone_mut(src);
            if zone.first_subsequent_neighbor_motion.is_none() {
                zone.first_subsequent_neighbor_motion = Some(at);
            }

            let recent_motion = zone
                .last_motion
                .is_some_and(|last| at - last < settings.corroboration_window);
            if occupied && (zone.motion_active || recent_motion) {
                let src_name = zone.name.clone();
                state.presence.mark_exited(src);
                tracing::info!(from = %src_name, into = %dst_name, "motion corroborates exit");
                outcome.events.push(ZoneEvent::ExitCorroborated {
                    from: src_name,
                    into: dst_name.clone(),
                    at,
                });
            } else if occupied {
                tracing::debug!(
                    from = %zone.name,
                    into = %dst_name,
                    motion_active = zone.motion_active,
                    "motion does not corroborate exit"
                );
            }
        }
    }

    async fn finish_motion(&self, outcome: MotionOutcome) {
        if let Some((zone, at)) = outcome.persist {
            if let Err(err) = self.motion_store.set_last_motion(&zone, at).await {
                tracing::warn!(zone = %zone, error = %err, "could not persist last motion");
            }
        }
        for event in outcome.events {
            let _ = self.events.publish(event).await;
        }
        for (lights, cmd) in outcome.dispatches {
            self.dispatch(&lights, &cmd).await;
        }
    }

    /// Ask every motion-capable zone whether it has been motion-free long
    /// enough to power off, honoring corroborated exits and the occupied
    /// grace period. Invoked by the periodic sweep.
    pub async fn disable_inactive_zones(&self) {
        self.sweep_at(now()).await;
    }

    async fn sweep_at(&self, as_of: Timestamp) {
        if !self.flag_or_false(Flag::MotionEnabled).await {
            tracing::debug!("motion disabled, skipping sweep");
            return;
        }

        self.refresh_external_motion().await;

        let planned: Vec<PlannedPowerOff> = {
            let mut state = self.state();
            let mut planned = Vec::new();
            for id in state.graph.motion_capable_zones() {
                let zone = state.graph.zone(id);
                if zone.motion_active {
                    tracing::debug!(zone = %zone.name, "motion active, keeping on");
                    continue;
                }
                // A zone that never saw motion is unknown, not timed out.
                let Some(since) = zone.since_motion(as_of) else {
                    continue;
                };
                if since <= zone.motion_timeout {
                    continue;
                }

                let reason = if zone.participates_in_exit_graph() {
                    if state.presence.is_exited(id) {
                        PowerOffReason::CorroboratedExit
                    } else if since > self.settings.occupied_grace {
                        PowerOffReason::OccupiedGraceExpired
                    } else {
                        tracing::info!(
                            zone = %zone.name,
                            since_motion_mins = since.num_minutes(),
                            "timed out without a corroborated exit, keeping on"
                        );
                        continue;
                    }
                } else {
                    PowerOffReason::NoExitNeighbors
                };

                planned.push(PlannedPowerOff {
                    zone: zone.name.clone(),
                    lights: zone.lights.clone(),
                    reason,
                });
                // Never leave a powered-off zone flagged occupied.
                state.presence.clear(id);
            }
            planned
        };

        for off in planned {
            tracing::info!(zone = %off.zone, reason = %off.reason, "powering off");
            if self.already_dark(&off.lights).await {
                tracing::debug!(zone = %off.zone, "already off, skipping command");
            } else {
                self.dispatch(&off.lights, &LightCommand::off()).await;
            }
            let _ = self
                .events
                .publish(ZoneEvent::ZonePoweredOff {
                    zone: off.zone,
                    reason: off.reason,
                })
                .await;
        }
    }

    /// Externally-sensed zones keep their timestamps in the motion store;
    /// pull anything newer than what we hold before sweeping.
    async fn refresh_external_motion(&self) {
        let external: Vec<(ZoneId, String)> = {
            let state = self.state();
            state
                .graph
                .iter()
                .filter(|(_, zone)| zone.motion_source == MotionSource::External)
                .map(|(id, zone)| (id, zone.name.clone()))
                .collect()
        };

        for (id, name) in external {
            match self.motion_store.last_motion(&name).await {
                Ok(Some(at)) => {
                    let mut state = self.state();
                    let zone = state.graph.zone_mut(id);
                    if zone.last_motion.is_none_or(|held| held < at) {
                        zone.last_motion = Some(at);
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(zone = %name, error = %err, "persisted motion unavailable");
                }
            }
        }
    }

    /// Re-color every lit zone for a circadian event change.
    pub async fn apply_circadian_event(&self, event: &CircadianEvent) {
        let targets: Vec<Vec<LightId>> = {
            let state = self.state();
            state
                .graph
                .iter()
                .map(|(_, zone)| zone.lights.clone())
                .filter(|lights| !lights.is_empty())
                .collect()
        };

        let recolor = LightCommand::default()
            .with_color(event.color)
            .with_transition(COLOR_FADE);
        for lights in targets {
            if self.already_dark(&lights).await {
                continue;
            }
            self.dispatch(&lights, &recolor).await;
        }

        let _ = self
            .events
            .publish(ZoneEvent::CircadianChanged {
                event: event.name.clone(),
            })
            .await;
    }

    /// Point-in-time view of every zone for status displays.
    pub async fn zone_snapshot(&self) -> Vec<ZoneSnapshot> {
        let rows: Vec<(String, Option<LightId>, bool)> = {
            let state = self.state();
            state
                .graph
                .iter()
                .map(|(id, zone)| {
                    (
                        zone.name.clone(),
                        zone.lights.first().copied(),
                        state.presence.is_occupied(id),
                    )
                })
                .collect()
        };

        let mut snapshot = Vec::with_capacity(rows.len());
        for (name, first_light, occupied) in rows {
            let lit = match first_light {
                Some(light) => self.driver.power_state(light).await.unwrap_or(false),
                None => false,
            };
            snapshot.push(ZoneSnapshot {
                name,
                lit,
                occupied,
            });
        }
        snapshot
    }

    /// Read an operating-mode flag, degrading to `false` on storage failure.
    pub async fn flag(&self, flag: Flag) -> bool {
        self.flag_or_false(flag).await
    }

    /// Persist an operating-mode flag.
    ///
    /// # Errors
    ///
    /// Returns [`LumoError::Storage`] when the store is unreachable.
    pub async fn set_flag(&self, flag: Flag, value: bool) -> Result<(), LumoError> {
        self.flags.set_flag(flag, value).await
    }

    async fn flag_or_false(&self, flag: Flag) -> bool {
        match self.flags.flag(flag).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(flag = %flag, error = %err, "flag read failed, treating as off");
                false
            }
        }
    }

    pub(crate) async fn already_dark(&self, lights: &[LightId]) -> bool {
        match lights.first() {
            Some(&first) => matches!(self.driver.power_state(first).await, Ok(false)),
            None => true,
        }
    }

    pub(crate) async fn dispatch(&self, lights: &[LightId], cmd: &LightCommand) {
        let send = self.driver.set_command(lights, cmd);
        match tokio::time::timeout(self.settings.dispatch_timeout, send).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::warn!(error = %err, ?lights, "light command failed");
            }
            Err(_) => {
                tracing::warn!(?lights, "light command timed out");
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn zone_lights(&self, zone: &str) -> Result<Vec<LightId>, LumoError> {
        let state = self.state();
        let id = state
            .graph
            .zone_id(zone)
            .ok_or_else(|| LumoError::UnknownZone {
                name: zone.to_string(),
            })?;
        Ok(state.graph.zone(id).lights.clone())
    }

    pub(crate) fn zone_last_motion(&self, zone: &str) -> Result<Option<Timestamp>, LumoError> {
        let state = self.state();
        let id = state
            .graph
            .zone_id(zone)
            .ok_or_else(|| LumoError::UnknownZone {
                name: zone.to_string(),
            })?;
        Ok(state.graph.zone(id).last_motion)
    }

    #[cfg(test)]
    fn presence_snapshot(&self, zone: &str) -> (bool, bool) {
        let state = self.state();
        let id = state.graph.zone_id(zone).expect("zone exists");
        (
            state.presence.is_occupied(id),
            state.presence.is_exited(id),
        )
    }
}

struct MotionContext {
    guest_mode: bool,
    circadian: CircadianEvent,
}

impl<L, F, M, W, P> MotionSink for Engine<L, F, M, W, P>
where
    L: LightDriver,
    F: FlagStore,
    M: MotionStore,
    W: WeatherProvider,
    P: EventPublisher + Send + Sync,
{
    fn handle_motion(
        &self,
        source: u32,
        is_start: bool,
        at: Timestamp,
    ) -> impl Future<Output = ()> + Send {
        async move {
            if let Err(err) = self.on_motion(source, is_start, at).await {
                tracing::warn!(error = %err, source, "discarding motion event");
            }
        }
    }
}
