//! Price feed records as served by the market data API.

use std::{collections::BTreeMap, fs, path::Path};

use chrono::{DateTime, FixedOffset, TimeDelta};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::{prelude::*, quantity::CentsPerKilowattHour};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RawInterval {
    /// Interval end with the source offset, for example `2025-11-11T16:35:00+10:00`.
    #[serde(rename = "nemTime")]
    pub nem_time: String,

    #[serde(rename = "duration", default = "RawInterval::default_duration")]
    pub duration_minutes: i64,

    #[serde(rename = "channelType")]
    pub channel: Channel,

    #[serde(rename = "type")]
    pub kind: IntervalKind,

    #[serde(rename = "perKwh", default)]
    pub per_kwh: CentsPerKilowattHour,

    #[serde(rename = "advancedPrice", default, skip_serializing_if = "Option::is_none")]
    pub advanced_price: Option<AdvancedPrice>,

    #[serde(rename = "wholesaleKWHPrice", default, skip_serializing_if = "Option::is_none")]
    pub wholesale_per_kwh: Option<CentsPerKilowattHour>,

    #[serde(rename = "spikeStatus", default)]
    pub spike_status: SpikeStatus,
}

impl RawInterval {
    const fn default_duration() -> i64 {
        30
    }

    pub fn end_time(&self) -> Result<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.nem_time)
            .with_context(|| format!("invalid interval timestamp `{}`", self.nem_time))
    }

    pub fn start_time(&self) -> Result<DateTime<FixedOffset>> {
        ensure!(self.duration_minutes > 0, "non-positive duration {}", self.duration_minutes);
        let duration = TimeDelta::try_minutes(self.duration_minutes)
            .with_context(|| format!("duration {} is out of range", self.duration_minutes))?;
        self.end_time()?
            .checked_sub_signed(duration)
            .with_context(|| format!("interval `{}` starts out of range", self.nem_time))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Channel {
    /// Grid import, the buy side.
    General,

    /// Grid export, the sell side.
    FeedIn,

    #[serde(other)]
    Other,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum IntervalKind {
    #[serde(rename = "CurrentInterval")]
    Current,

    #[serde(rename = "ActualInterval")]
    Actual,

    #[serde(rename = "ForecastInterval")]
    Forecast,

    #[serde(other)]
    Unknown,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpikeStatus {
    #[default]
    None,

    Potential,

    Spike,

    #[serde(other)]
    Unknown,
}

impl SpikeStatus {
    #[must_use]
    pub const fn is_spiking(self) -> bool {
        matches!(self, Self::Potential | Self::Spike)
    }
}

/// Forecast price variants attached to a record.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AdvancedPrice {
    Variants(BTreeMap<String, CentsPerKilowattHour>),
    Flat(CentsPerKilowattHour),

    /// Anything else, kept to report it against the record.
    Malformed(serde_json::Value),
}

impl AdvancedPrice {
    /// Empty variant maps and zero prices carry no information.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Variants(variants) => variants.is_empty(),
            Self::Flat(price) => *price == CentsPerKilowattHour::ZERO,
            Self::Malformed(value) => value.is_null(),
        }
    }
}

/// Which forecast variant to use when a record offers several.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ForecastVariant {
    #[default]
    Predicted,
    Low,
    High,
}

impl ForecastVariant {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Predicted => "predicted",
            Self::Low => "low",
            Self::High => "high",
        }
    }
}

/// Load the feed from a JSON array, skipping the records that do not deserialize.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load(path: &Path) -> Result<Vec<RawInterval>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read `{}`", path.display()))?;
    parse(&contents)
}

pub fn parse(contents: &str) -> Result<Vec<RawInterval>> {
    let records: Vec<serde_json::Value> =
        serde_json::from_str(contents).context("the feed must be a JSON array")?;
    let n_records = records.len();
    let intervals: Vec<RawInterval> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(interval) => Some(interval),
            Err(error) => {
                warn!(index, "skipped malformed record: {error:#}");
                None
            }
        })
        .collect();
    info!(n_records, n_intervals = intervals.len(), "loaded the feed");
    Ok(intervals)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn parse_ok() -> Result {
        let intervals = parse(
            r#"[
                {
                    "type": "CurrentInterval",
                    "duration": 5,
                    "nemTime": "2025-11-11T16:35:00+10:00",
                    "perKwh": 35.5,
                    "channelType": "general",
                    "spikeStatus": "potential",
                    "advancedPrice": {"low": 30.0, "predicted": 35.5, "high": 40.0}
                },
                {
                    "type": "ForecastInterval",
                    "nemTime": "2025-11-11T17:00:00+10:00",
                    "perKwh": -10.44,
                    "channelType": "feedIn",
                    "advancedPrice": null
                },
                {
                    "type": "ActualInterval",
                    "nemTime": "2025-11-11T17:00:00+10:00",
                    "perKwh": 12.0,
                    "channelType": "controlledLoad"
                }
            ]"#,
        )?;
        assert_eq!(intervals.len(), 3);

        let current = &intervals[0];
        assert_eq!(current.kind, IntervalKind::Current);
        assert_eq!(current.channel, Channel::General);
        assert_eq!(current.duration_minutes, 5);
        assert!(current.spike_status.is_spiking());
        assert!(matches!(current.advanced_price, Some(AdvancedPrice::Variants(_))));

        let forecast = &intervals[1];
        assert_eq!(forecast.channel, Channel::FeedIn);
        assert_eq!(forecast.duration_minutes, 30);
        assert_eq!(forecast.spike_status, SpikeStatus::None);
        assert!(forecast.advanced_price.is_none());
        assert_abs_diff_eq!(forecast.per_kwh.0, -10.44);

        assert_eq!(intervals[2].channel, Channel::Other);
        Ok(())
    }

    #[test]
    fn skip_malformed_records() -> Result {
        let intervals = parse(
            r#"[
                {"type": "ActualInterval", "perKwh": 12.0, "channelType": "general"},
                {"type": "ActualInterval", "nemTime": "2025-11-11T17:00:00+10:00", "perKwh": "a lot", "channelType": "general"},
                {"type": "ActualInterval", "nemTime": "2025-11-11T17:00:00+10:00", "perKwh": 12.0, "channelType": "general"}
            ]"#,
        )?;
        assert_eq!(intervals.len(), 1);
        Ok(())
    }

    #[test]
    fn missing_per_kwh_defaults_to_zero() -> Result {
        let intervals = parse(
            r#"[{"type": "ForecastInterval", "nemTime": "2025-11-11T17:00:00+10:00", "channelType": "general", "advancedPrice": {"predicted": 15.0}}]"#,
        )?;
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].per_kwh, CentsPerKilowattHour::ZERO);
        Ok(())
    }

    #[test]
    fn invalid_durations() -> Result {
        let mut interval = parse(
            r#"[{"type": "ForecastInterval", "duration": 9000000000000000, "nemTime": "2025-11-11T17:00:00+10:00", "perKwh": 1.0, "channelType": "general"}]"#,
        )?
        .remove(0);
        assert!(interval.start_time().is_err());
        interval.duration_minutes = 0;
        assert!(interval.start_time().is_err());
        interval.duration_minutes = -30;
        assert!(interval.start_time().is_err());
        Ok(())
    }

    #[test]
    fn advanced_price_shapes() -> Result {
        let flat: AdvancedPrice = serde_json::from_str("21.5")?;
        assert!(matches!(flat, AdvancedPrice::Flat(price) if price == CentsPerKilowattHour(21.5)));
        let zero: AdvancedPrice = serde_json::from_str("0")?;
        assert!(zero.is_empty());
        let malformed: AdvancedPrice = serde_json::from_str(r#""cheap""#)?;
        assert!(matches!(malformed, AdvancedPrice::Malformed(_)));
        assert!(!malformed.is_empty());
        Ok(())
    }

    #[test]
    fn start_time() -> Result {
        let interval = &parse(
            r#"[{"type": "ForecastInterval", "nemTime": "2025-11-11T17:00:00+10:00", "perKwh": 1.0, "channelType": "general"}]"#,
        )?[0];
        assert_eq!(interval.start_time()?.to_rfc3339(), "2025-11-11T16:30:00+10:00");
        Ok(())
    }
}
