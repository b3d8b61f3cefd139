//! Weather port — backs the circadian validity predicates.

use std::future::Future;

use lumo_domain::error::LumoError;

/// Supplies the day-wide cloud cover fraction in `[0, 1]`.
///
/// The forecast itself is fetched by an external job; this port only reads
/// whatever that job last recorded. Readers treat a failure as clear sky.
pub trait WeatherProvider: Send + Sync {
    fn cloud_cover(&self) -> impl Future<Output = Result<f64, LumoError>> + Send;
}

impl<T: WeatherProvider + Send + Sync> WeatherProvider for std::sync::Arc<T> {
    fn cloud_cover(&self) -> impl Future<Output = Result<f64, LumoError>> + Send {
        (**self).cloud_cover()
    }
}
