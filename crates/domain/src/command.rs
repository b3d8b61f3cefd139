//! Light commands and the command composer.
//!
//! A [`LightCommand`] is the single message shape sent to the light driver:
//! power, brightness, color, and an optional fade duration, each individually
//! optional so callers only state what they want changed.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::circadian::CircadianEvent;
use crate::color::ColorPoint;

/// Maximum brightness the bridge accepts.
pub const FULL_BRIGHTNESS: u8 = 254;

/// A command for one or more lights. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightCommand {
    /// Power the lights on or off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    /// Brightness, 0–254.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    /// Color point to fade to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorPoint>,
    /// Fade duration for the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<Duration>,
}

impl LightCommand {
    /// A bare power-on request.
    #[must_use]
    pub fn on() -> Self {
        Self {
            on: Some(true),
            ..Self::default()
        }
    }

    /// A power-off request.
    #[must_use]
    pub fn off() -> Self {
        Self {
            on: Some(false),
            ..Self::default()
        }
    }

    /// Power on at maximum brightness.
    #[must_use]
    pub fn full_on() -> Self {
        Self {
            on: Some(true),
            brightness: Some(FULL_BRIGHTNESS),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness);
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: ColorPoint) -> Self {
        self.color = Some(color);
        self
    }

    #[must_use]
    pub fn with_transition(mut self, transition: Duration) -> Self {
        self.transition = Some(transition);
        self
    }

    /// Whether this command explicitly powers the lights off.
    #[must_use]
    pub fn is_off(&self) -> bool {
        self.on == Some(false)
    }
}

/// Merge an explicit request with the active circadian event.
///
/// An explicit off short-circuits: color cannot be set on a powered-off
/// light, so the base command passes through untouched. Otherwise the
/// event's color and brightness fill in whatever the base request left
/// unset; explicit base values always win. An event brightness of 0 means
/// "do not force on" — unless the base explicitly requested power-on, in
/// which case the brightness falls back to [`FULL_BRIGHTNESS`].
#[must_use]
pub fn compose(base: LightCommand, event: &CircadianEvent) -> LightCommand {
    if base.is_off() {
        return base;
    }

    let mut merged = base;
    merged.color = merged.color.or(Some(event.color));

    if merged.brightness.is_none() {
        if event.brightness > 0 {
            merged.brightness = Some(event.brightness);
        } else if merged.on == Some(true) {
            merged.brightness = Some(FULL_BRIGHTNESS);
        }
    }

    merged
}
