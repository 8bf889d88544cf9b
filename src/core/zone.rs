use std::fmt::{Display, Formatter};

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::{feed::RawInterval, prelude::*};

/// Time zone in which the slots are laid out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Zone {
    Named(Tz),

    /// Offset taken from the feed, no daylight saving transitions.
    Fixed(FixedOffset),
}

impl Zone {
    pub const FALLBACK: Self = Self::Named(Tz::Australia__Sydney);

    /// Use the configured zone, then the offset of the first parseable feed timestamp,
    /// then the fallback.
    #[must_use]
    pub fn resolve(configured: Option<Tz>, intervals: &[RawInterval]) -> Self {
        if let Some(tz) = configured {
            return Self::Named(tz);
        }
        if let Some(timestamp) = intervals.iter().find_map(|interval| interval.end_time().ok()) {
            let zone = Self::Fixed(*timestamp.offset());
            debug!(%zone, "detected the zone from the feed");
            return zone;
        }
        warn!(zone = %Self::FALLBACK, "no zone configured or detected, using the fallback");
        Self::FALLBACK
    }

    /// Local wall-clock time of the instant.
    #[must_use]
    pub fn localize(self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            Self::Named(tz) => instant.with_timezone(&tz).naive_local(),
            Self::Fixed(offset) => instant.with_timezone(&offset).naive_local(),
        }
    }
}

impl Display for Zone {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(tz) => write!(f, "{tz}"),
            Self::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

/// Parse the zone name, warning and ignoring it when unknown.
#[must_use]
pub fn parse_zone_name(name: &str) -> Option<Tz> {
    match name.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(error) => {
            warn!(name, "unknown time zone, falling back to detection: {error}");
            None
        }
    }
}
