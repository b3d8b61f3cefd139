//! # lumo-adapter-hue
//!
//! [`LightDriver`] implementation speaking the Hue bridge's REST API:
//! `PUT /api/{username}/lights/{id}/state` to command lights and
//! `GET /api/{username}/lights/{id}` to read power state.
//!
//! ## Dependency rule
//! Depends on `lumo-app` (port traits) and `lumo-domain` only.

mod payload;

use lumo_app::ports::LightDriver;
use lumo_domain::command::LightCommand;
use lumo_domain::error::DriverError;
use lumo_domain::zone::LightId;

use payload::StateBody;

/// Connection settings for the bridge.
#[derive(Debug, Clone)]
pub struct HueConfig {
    /// Bridge base URL, e.g. `http://192.168.1.104`.
    pub base_url: String,
    /// The registered API username.
    pub username: String,
    /// Per-request deadline.
    pub timeout: std::time::Duration,
}

/// HTTP client for one Hue bridge.
pub struct HueBridge {
    http: reqwest::Client,
    base_url: String,
    username: String,
}

impl HueBridge {
    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Unreachable`] when the HTTP client cannot be
    /// constructed (bad TLS backend state).
    pub fn new(config: HueConfig) -> Result<Self, DriverError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| DriverError::Unreachable(err.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username,
        })
    }

    fn light_url(&self, light: LightId) -> String {
        format!("{}/api/{}/lights/{}", self.base_url, self.username, light)
    }

    fn state_url(&self, light: LightId) -> String {
        format!("{}/state", self.light_url(light))
    }

    fn map_transport_error(err: &reqwest::Error) -> DriverError {
        if err.is_timeout() {
            DriverError::Timeout
        } else if err.is_connect() {
            DriverError::Unreachable(err.to_string())
        } else {
            DriverError::Bridge(err.to_string())
        }
    }
}

/// Power-state subset of the bridge's light attributes.
#[derive(Debug, serde::Deserialize)]
struct LightAttributes {
    state: LightState,
}

#[derive(Debug, serde::Deserialize)]
struct LightState {
    on: bool,
}

impl LightDriver for HueBridge {
    async fn set_command(
        &self,
        lights: &[LightId],
        command: &LightCommand,
    ) -> Result<(), DriverError> {
        let body = StateBody::from(command);
        for &light in lights {
            let response = self
                .http
                .put(self.state_url(light))
                .json(&body)
                .send()
                .await
                .map_err(|err| Self::map_transport_error(&err))?;
            response
                .error_for_status()
                .map_err(|err| DriverError::Bridge(err.to_string()))?;
            tracing::debug!(%light, ?command, "light command accepted");
        }
        Ok(())
    }

    async fn power_state(&self, light: LightId) -> Result<bool, DriverError> {
        let response = self
            .http
            .get(self.light_url(light))
            .send()
            .await
            .map_err(|err| Self::map_transport_error(&err))?
            .error_for_status()
            .map_err(|err| DriverError::Bridge(err.to_string()))?;

        let attributes: LightAttributes = response
            .json()
            .await
            .map_err(|err| DriverError::Bridge(err.to_string()))?;
        Ok(attributes.state.on)
    }
}
