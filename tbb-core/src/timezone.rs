//! Coordinate to timezone resolution.
//!
//! The session engine only depends on [`TimezoneResolver`]. [`LookupTimezoneResolver`] finds the
//! IANA zone for a coordinate from timezone boundary data and reads offset and DST from the tz
//! database. [`NauticalTimezoneResolver`] derives the zone from longitude in 15° bands and is used
//! where the lookup finds nothing.

use std::sync::OnceLock;

use chrono::{DateTime, Offset, Utc};
use chrono_tz::{OffsetComponents, Tz};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use tzf_rs::DefaultFinder;

use crate::error::{HandlerError, Result};

/// Timezone details resolved for a coordinate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimezoneInfo {
    pub latitude: f64,
    pub longitude: f64,
    /// IANA location name, e.g. `Europe/Berlin` (or `Etc/GMT-2` for nautical zones).
    pub location: String,
    /// Abbreviated zone name, e.g. `CET` or `UTC+2`.
    pub zone_name: String,
    /// Offset from UTC in seconds.
    pub offset: i32,
    pub is_dst: bool,
}

pub trait TimezoneResolver: Send + Sync {
    fn resolve(&self, latitude: f64, longitude: f64) -> Result<TimezoneInfo>;
}

fn validate(latitude: f64, longitude: f64) -> Result<()> {
    let valid = latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude);
    if !valid {
        return Err(HandlerError::InvalidCoordinates {
            latitude,
            longitude,
        }
        .into());
    }
    Ok(())
}

/// Nautical time: offset = round(longitude / 15) hours, never DST.
#[derive(Debug, Clone, Copy, Default)]
pub struct NauticalTimezoneResolver;

impl TimezoneResolver for NauticalTimezoneResolver {
    fn resolve(&self, latitude: f64, longitude: f64) -> Result<TimezoneInfo> {
        validate(latitude, longitude)?;

        let hours = (longitude / 15.0).round() as i32;
        // Etc/GMT names use the inverted sign.
        let (location, zone_name) = match hours {
            0 => ("Etc/UTC".to_string(), "UTC".to_string()),
            h if h > 0 => (format!("Etc/GMT-{}", h), format!("UTC+{}", h)),
            h => (format!("Etc/GMT+{}", -h), format!("UTC{}", h)),
        };

        Ok(TimezoneInfo {
            latitude,
            longitude,
            location,
            zone_name,
            offset: hours * 3600,
            is_dst: false,
        })
    }
}

static FINDER: OnceLock<DefaultFinder> = OnceLock::new();

fn finder() -> &'static DefaultFinder {
    FINDER.get_or_init(|| {
        debug!("Loading timezone boundary data");
        DefaultFinder::new()
    })
}

/// Looks up the IANA zone containing a coordinate. Offset, abbreviation and DST are those in
/// effect at the resolution instant (now, unless fixed with [`LookupTimezoneResolver::at`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct LookupTimezoneResolver {
    at: Option<DateTime<Utc>>,
}

impl LookupTimezoneResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves offsets as of `instant` instead of the current time.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self { at: Some(instant) }
    }
}

impl TimezoneResolver for LookupTimezoneResolver {
    fn resolve(&self, latitude: f64, longitude: f64) -> Result<TimezoneInfo> {
        validate(latitude, longitude)?;

        let name = finder().get_tz_name(longitude, latitude);
        let tz: Tz = match name.parse() {
            Ok(tz) => tz,
            Err(_) => {
                warn!(latitude, longitude, zone = name, "No timezone found, using nautical time");
                return NauticalTimezoneResolver.resolve(latitude, longitude);
            }
        };

        let local = self.at.unwrap_or_else(Utc::now).with_timezone(&tz);
        let offset = local.offset();
        let info = TimezoneInfo {
            latitude,
            longitude,
            location: tz.name().to_string(),
            zone_name: local.format("%Z").to_string(),
            offset: offset.fix().local_minus_utc(),
            is_dst: offset.dst_offset() != chrono::Duration::zero(),
        };
        debug!(latitude, longitude, zone = %info.location, offset = info.offset, "Resolved timezone");
        Ok(info)
    }
}
