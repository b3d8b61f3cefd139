//! Wire format for bridge light-state requests.

use serde::Serialize;

use lumo_domain::command::LightCommand;

/// Body of a `PUT .../lights/{id}/state` request. Field names and units are
/// the bridge's: brightness 0–254, color as CIE xy, transitions in
/// deciseconds.
#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct StateBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bri: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xy: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transitiontime: Option<u64>,
}

impl From<&LightCommand> for StateBody {
    fn from(command: &LightCommand) -> Self {
        Self {
            on: command.on,
            bri: command.brightness,
            xy: command.color.map(lumo_domain::color::ColorPoint::as_xy),
            transitiontime: command
                .transition
                .map(|t| u64::try_from(t.as_millis() / 100).unwrap_or(u64::MAX)),
        }
    }
}
