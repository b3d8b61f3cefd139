//! The circadian schedule: an ordered table of color/brightness events per
//! calendar day, each with a trigger time (wall clock or sun-relative) and a
//! validity predicate.
//!
//! For a fixed calendar date the table's trigger times are monotonically
//! non-decreasing across the day, and the schedule wraps to the next
//! calendar day after the last event. Both scan operations take the current
//! cloud cover as plain data so they stay synchronous and deterministic;
//! fetching the cloud cover is the application layer's concern.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sunrise::{Coordinates, DawnType, SolarDay, SolarEvent};

use crate::color::ColorPoint;
use crate::error::ConfigError;
use crate::time::Timestamp;

/// The site the schedule is computed for.
#[derive(Debug, Clone, Copy)]
pub struct Location {
    latitude: f64,
    longitude: f64,
    coordinates: Coordinates,
    timezone: Tz,
}

impl Location {
    /// Validate coordinates and build a location.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCoordinates`] when the latitude or
    /// longitude is out of range.
    pub fn new(latitude: f64, longitude: f64, timezone: Tz) -> Result<Self, ConfigError> {
        let coordinates = Coordinates::new(latitude, longitude).ok_or(
            ConfigError::InvalidCoordinates {
                latitude,
                longitude,
            },
        )?;
        Ok(Self {
            latitude,
            longitude,
            coordinates,
            timezone,
        })
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// The calendar date of `at` in the site's timezone.
    #[must_use]
    pub fn local_date(&self, at: Timestamp) -> NaiveDate {
        at.with_timezone(&self.timezone).date_naive()
    }

    fn to_utc(&self, naive: NaiveDateTime) -> Timestamp {
        // A DST gap leaves no local representation; treat the wall time as UTC.
        self.timezone
            .from_local_datetime(&naive)
            .earliest()
            .map_or_else(|| Utc.from_utc_datetime(&naive), |dt| dt.with_timezone(&Utc))
    }
}

/// Sun position a trigger time can anchor to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolarAnchor {
    Dawn,
    Sunrise,
    Sunset,
    Dusk,
}

impl SolarAnchor {
    fn solar_event(self) -> SolarEvent {
        match self {
            Self::Dawn => SolarEvent::Dawn(DawnType::Civil),
            Self::Sunrise => SolarEvent::Sunrise,
            Self::Sunset => SolarEvent::Sunset,
            Self::Dusk => SolarEvent::Dusk(DawnType::Civil),
        }
    }
}

/// When an event fires on a given calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerTime {
    /// A fixed local wall-clock time.
    Clock(NaiveTime),
    /// A sun-relative time, offset by a number of minutes.
    Solar {
        anchor: SolarAnchor,
        offset_minutes: i64,
    },
}

impl TriggerTime {
    /// Resolve the trigger to an instant on the given calendar date.
    #[must_use]
    pub fn trigger_at(&self, date: NaiveDate, location: &Location) -> Timestamp {
        match self {
            Self::Clock(time) => location.to_utc(date.and_time(*time)),
            Self::Solar {
                anchor,
                offset_minutes,
            } => {
                let day = SolarDay::new(location.coordinates, date);
                day.event_time(anchor.solar_event()) + chrono::Duration::minutes(*offset_minutes)
            }
        }
    }
}

/// Whether an event applies on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validity {
    /// Applies unconditionally.
    Always,
    /// Applies only while the sky is clear enough.
    MaxCloudCover(f64),
}

impl Validity {
    /// Evaluate the predicate against the current cloud cover in `[0, 1]`.
    #[must_use]
    pub fn holds(&self, cloud_cover: f64) -> bool {
        match self {
            Self::Always => true,
            Self::MaxCloudCover(max) => cloud_cover <= *max,
        }
    }

    fn always() -> Self {
        Self::Always
    }
}

/// One scheduled lighting change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircadianEvent {
    pub name: String,
    pub color: ColorPoint,
    /// Brightness applied on motion while this event is active.
    /// 0 means "do not force lights on, let the zone default".
    pub brightness: u8,
    pub trigger: TriggerTime,
    #[serde(default = "Validity::always")]
    pub validity: Validity,
}

/// The per-day event table, ordered ascending by trigger time.
#[derive(Debug, Clone)]
pub struct Schedule {
    events: Vec<CircadianEvent>,
    location: Location,
}

impl Schedule {
    /// Validate and build a schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptySchedule`] for an empty table,
    /// [`ConfigError::InvalidCloudCover`] for a predicate threshold outside
    /// `[0, 1]`, and [`ConfigError::UnorderedSchedule`] when trigger times
    /// are not monotonically non-decreasing for today's date.
    pub fn new(events: Vec<CircadianEvent>, location: Location) -> Result<Self, ConfigError> {
        if events.is_empty() {
            return Err(ConfigError::EmptySchedule);
        }
        for event in &events {
            if let Validity::MaxCloudCover(max) = event.validity {
                if !(0.0..=1.0).contains(&max) {
                    return Err(ConfigError::InvalidCloudCover(max));
                }
            }
        }

        let schedule = Self { events, location };
        let probe = location.local_date(crate::time::now());
        for i in 1..schedule.events.len() {
            if schedule.trigger_on(i - 1, probe) > schedule.trigger_on(i, probe) {
                return Err(ConfigError::UnorderedSchedule {
                    first: schedule.events[i - 1].name.clone(),
                    second: schedule.events[i].name.clone(),
                });
            }
        }
        Ok(schedule)
    }

    #[must_use]
    pub fn events(&self) -> &[CircadianEvent] {
        &self.events
    }

    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    fn trigger_on(&self, index: usize, date: NaiveDate) -> Timestamp {
        self.events[index].trigger.trigger_at(date, &self.location)
    }

    /// Latest event on `date` that has already triggered by `at` and is
    /// valid, scanning in reverse.
    fn scan_current(&self, at: Timestamp, date: NaiveDate, cloud_cover: f64) -> Option<usize> {
        (0..self.events.len())
            .rev()
            .find(|&i| self.trigger_on(i, date) < at && self.events[i].validity.holds(cloud_cover))
    }

    /// The event active at `at`.
    ///
    /// Scans today's table in reverse for the latest valid event that has
    /// already triggered; when none has (before the first event of the day),
    /// the last valid event of the previous day carries over.
    #[must_use]
    pub fn current_event(&self, at: Timestamp, cloud_cover: f64) -> &CircadianEvent {
        let today = self.location.local_date(at);
        let yesterday = today.pred_opt().unwrap_or(today);
        let index = self
            .scan_current(at, today, cloud_cover)
            .or_else(|| self.scan_current(at, yesterday, cloud_cover))
            .unwrap_or(self.events.len() - 1);
        &self.events[index]
    }

    /// The next valid event after `at` and the instant it triggers.
    ///
    /// Advances circularly from the current event, skipping events whose
    /// validity predicate fails, wrapping to the next calendar day past the
    /// end of the table.
    #[must_use]
    pub fn next_event(&self, at: Timestamp, cloud_cover: f64) -> (Timestamp, &CircadianEvent) {
        let today = self.location.local_date(at);
        let yesterday = today.pred_opt().unwrap_or(today);

        let (mut index, mut date) = match self.scan_current(at, today, cloud_cover) {
            Some(i) => (i, today),
            None => (
                self.scan_current(at, yesterday, cloud_cover)
                    .unwrap_or(self.events.len() - 1),
                yesterday,
            ),
        };

        for _ in 0..(2 * self.events.len() + 2) {
            index += 1;
            if index >= self.events.len() {
                index = 0;
                date = date.succ_opt().unwrap_or(date);
            }
            let event = &self.events[index];
            let trigger = self.trigger_on(index, date);
            if trigger > at && event.validity.holds(cloud_cover) {
                return (trigger, event);
            }
        }

        // Every event is gated out: wrap to tomorrow's first event regardless.
        let tomorrow = today.succ_opt().unwrap_or(today);
        (self.trigger_on(0, tomorrow), &self.events[0])
    }
}
