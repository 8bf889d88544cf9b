use std::cmp::Reverse;

use crate::{
    feed::{Channel, IntervalKind, RawInterval},
    prelude::*,
};

const LIVE_DURATION_MINUTES: i64 = 5;

/// Most recent short-duration observation per channel.
#[derive(Copy, Clone, Debug, Default)]
pub struct LiveIntervals<'a> {
    pub general: Option<&'a RawInterval>,
    pub feed_in: Option<&'a RawInterval>,
}

impl<'a> LiveIntervals<'a> {
    fn first_per_channel(intervals: impl IntoIterator<Item = &'a RawInterval>) -> Self {
        let mut live = Self::default();
        for interval in intervals {
            match interval.channel {
                Channel::General if live.general.is_none() => live.general = Some(interval),
                Channel::FeedIn if live.feed_in.is_none() => live.feed_in = Some(interval),
                _ => {}
            }
            if live.general.is_some() && live.feed_in.is_some() {
                break;
            }
        }
        live
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.general.is_none() && self.feed_in.is_none()
    }
}

/// Pick the live observation per channel: current intervals first, then the latest actual ones.
#[instrument(skip_all, fields(n_intervals = intervals.len()))]
pub fn select_live(intervals: &[RawInterval]) -> Option<LiveIntervals<'_>> {
    let current = LiveIntervals::first_per_channel(
        intervals.iter().filter(|interval| is_live(interval, IntervalKind::Current)),
    );
    if !current.is_empty() {
        log_selected("current", current);
        return Some(current);
    }

    let actual: Result<Vec<_>> = intervals
        .iter()
        .filter(|interval| is_live(interval, IntervalKind::Actual))
        .map(|interval| Ok((interval.end_time()?, interval)))
        .collect();
    let mut actual = match actual {
        Ok(actual) => actual,
        Err(error) => {
            error!("failed to sort the actual intervals: {error:#}");
            return None;
        }
    };
    actual.sort_by_key(|(end_time, _)| Reverse(*end_time));
    let latest = LiveIntervals::first_per_channel(actual.into_iter().map(|(_, interval)| interval));
    if latest.is_empty() {
        debug!("no live intervals");
        None
    } else {
        log_selected("actual", latest);
        Some(latest)
    }
}

fn is_live(interval: &RawInterval, kind: IntervalKind) -> bool {
    interval.kind == kind && interval.duration_minutes == LIVE_DURATION_MINUTES
}

fn log_selected(kind: &str, live: LiveIntervals<'_>) {
    info!(
        kind,
        general = ?live.general.map(|interval| interval.per_kwh),
        feed_in = ?live.feed_in.map(|interval| interval.per_kwh),
        "selected live prices"
    );
}
