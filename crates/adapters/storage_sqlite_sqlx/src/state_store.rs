//! The shared key-value state store.
//!
//! One table backs three ports: operating-mode flags, per-zone last-motion
//! timestamps, and the cloud cover the external forecast job caches. Keys
//! are plain strings so other processes can read and write the same rows.

use sqlx::SqlitePool;

use lumo_app::ports::{Flag, FlagStore, MotionStore, WeatherProvider};
use lumo_domain::error::LumoError;
use lumo_domain::time::Timestamp;

use crate::error::StorageError;

const SELECT_VALUE: &str = "SELECT value FROM key_value WHERE key = ?";
const UPSERT_VALUE: &str = r"
    INSERT INTO key_value (key, value) VALUES (?, ?)
    ON CONFLICT(key) DO UPDATE SET value = excluded.value
";

const KEY_CLOUD_COVER: &str = "cloud_cover";
const KEY_PREFIX_LAST_MOTION: &str = "last_motion_";

/// `SQLite`-backed implementation of the persisted-state ports.
pub struct SqliteStateStore {
    pool: SqlitePool,
}

impl SqliteStateStore {
    /// Create a new store using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn get_value(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value: Option<(String,)> = sqlx::query_as(SELECT_VALUE)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value.map(|row| row.0))
    }

    async fn set_value(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(UPSERT_VALUE)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Record the day-wide cloud cover, as the forecast job does.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the write fails.
    pub async fn set_cloud_cover(&self, coverage: f64) -> Result<(), StorageError> {
        self.set_value(KEY_CLOUD_COVER, &coverage.to_string()).await
    }

    /// Zone names may contain spaces; keys must not.
    fn motion_key(zone: &str) -> String {
        format!("{KEY_PREFIX_LAST_MOTION}{}", zone.replace(' ', ""))
    }
}

impl FlagStore for SqliteStateStore {
    async fn flag(&self, flag: Flag) -> Result<bool, LumoError> {
        let value = self.get_value(flag.key()).await.map_err(LumoError::from)?;
        Ok(value.as_deref() == Some("true"))
    }

    async fn set_flag(&self, flag: Flag, value: bool) -> Result<(), LumoError> {
        self.set_value(flag.key(), if value { "true" } else { "false" })
            .await
            .map_err(LumoError::from)
    }
}

impl MotionStore for SqliteStateStore {
    async fn last_motion(&self, zone: &str) -> Result<Option<Timestamp>, LumoError> {
        let value = self
            .get_value(&Self::motion_key(zone))
            .await
            .map_err(LumoError::from)?;

        let Some(raw) = value else {
            return Ok(None);
        };
        match chrono::DateTime::parse_from_rfc3339(&raw) {
            Ok(parsed) => Ok(Some(parsed.to_utc())),
            Err(err) => {
                // A corrupt row is no better than no row.
                tracing::warn!(zone, error = %err, "discarding unparseable last-motion value");
                Ok(None)
            }
        }
    }

    async fn set_last_motion(&self, zone: &str, at: Timestamp) -> Result<(), LumoError> {
        self.set_value(&Self::motion_key(zone), &at.to_rfc3339())
            .await
            .map_err(LumoError::from)
    }
}

impl WeatherProvider for SqliteStateStore {
    async fn cloud_cover(&self) -> Result<f64, LumoError> {
        let value = self
            .get_value(KEY_CLOUD_COVER)
            .await
            .map_err(LumoError::from)?;
        // No forecast recorded yet reads as clear sky.
        Ok(value
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0.0))
    }
}
