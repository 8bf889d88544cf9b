use bon::Builder;
use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::{
    core::{
        live::LiveIntervals,
        lookup::{BucketKey, PriceLookup},
        slot::{SlotKey, SlotMap},
        spike::SpikeProtection,
        zone::Zone,
    },
    prelude::*,
    quantity::KilowattHourPrice,
};

/// Above this many unresolved slots (buy and sell together), the cycle is aborted.
pub const MAX_UNRESOLVED_SLOTS: usize = 10;

pub type DaySchedule = SlotMap<KilowattHourPrice>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schedules {
    pub buy: DaySchedule,
    pub sell: DaySchedule,
}

#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    Complete(T),

    /// Some slots could not be resolved and were zero-filled.
    Degraded { value: T, n_zero_filled: usize },

    /// Too many slots could not be resolved, the previous tariff should be kept.
    Aborted { n_unresolved: usize },
}

impl<T> Outcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Complete(value) => Outcome::Complete(f(value)),
            Self::Degraded { value, n_zero_filled } => {
                Outcome::Degraded { value: f(value), n_zero_filled }
            }
            Self::Aborted { n_unresolved } => Outcome::Aborted { n_unresolved },
        }
    }

    /// The value, failing when the cycle was aborted.
    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Complete(value) => Ok(value),
            Self::Degraded { value, n_zero_filled } => {
                warn!(n_zero_filled, "using the schedules with zero-filled slots");
                Ok(value)
            }
            Self::Aborted { n_unresolved } => {
                bail!("{n_unresolved} slots have no price, keep the previous tariff")
            }
        }
    }
}

/// Builds the rolling 24-hour buy and sell schedules.
#[derive(Builder)]
pub struct DayScheduler<'a> {
    buy: &'a PriceLookup,
    sell: &'a PriceLookup,
    zone: Zone,
    live: Option<LiveIntervals<'a>>,

    #[builder(default)]
    spike_protection: SpikeProtection,

    now: DateTime<Utc>,
}

impl DayScheduler<'_> {
    #[instrument(skip_all, fields(zone = %self.zone))]
    pub fn schedule(self) -> Outcome<Schedules> {
        let now = self.zone.localize(self.now);
        let today = now.date();
        let tomorrow = today + Days::new(1);
        let current_slot = SlotKey::containing(&now.time());
        info!(%now, %current_slot, "building the schedules");
        if self.buy.is_empty() || self.sell.is_empty() {
            warn!(n_buy_buckets = self.buy.len(), n_sell_buckets = self.sell.len(), "missing prices");
        }

        let live_prices = self.live.and_then(Self::live_prices);
        let mut buy_resolver = ChannelResolver::new(self.buy, "buy");
        let mut sell_resolver = ChannelResolver::new(self.sell, "sell");
        let mut buy = SlotMap::<Option<KilowattHourPrice>>::default();
        let mut sell = SlotMap::<Option<KilowattHourPrice>>::default();

        for slot in SlotKey::iter() {
            if slot == current_slot
                && let Some((live_buy, live_sell)) = live_prices
            {
                buy[slot] = Some(live_buy);
                sell[slot] = Some(live_sell);
                continue;
            }
            // Slots that have already passed today are taken from tomorrow.
            let date = if slot < current_slot { tomorrow } else { today };
            let dates = [date, today, tomorrow];
            buy[slot] = buy_resolver.resolve(slot, dates);
            sell[slot] = sell_resolver.resolve(slot, dates);
        }

        let n_unresolved = buy.values().chain(sell.values()).filter(|price| price.is_none()).count();
        if n_unresolved > MAX_UNRESOLVED_SLOTS {
            error!(n_unresolved, max = MAX_UNRESOLVED_SLOTS, "too many unresolved slots, aborting");
            return Outcome::Aborted { n_unresolved };
        }

        let mut schedules = Schedules {
            buy: buy.map(|price| price.unwrap_or(KilowattHourPrice::ZERO)),
            sell: sell.map(|price| price.unwrap_or(KilowattHourPrice::ZERO)),
        };
        if let Some(live) = self.live {
            self.spike_protection.apply(&mut schedules, live, current_slot);
        }

        info!(
            n_buy_carried_forward = buy_resolver.n_carried_forward,
            n_sell_carried_forward = sell_resolver.n_carried_forward,
            n_unresolved,
            "built the schedules"
        );
        if n_unresolved == 0 {
            Outcome::Complete(schedules)
        } else {
            warn!(n_unresolved, "zero-filled the unresolved slots");
            Outcome::Degraded { value: schedules, n_zero_filled: n_unresolved }
        }
    }

    /// Buy and sell prices of the current slot, only when both sides are live.
    fn live_prices(live: LiveIntervals<'_>) -> Option<(KilowattHourPrice, KilowattHourPrice)> {
        let (Some(general), Some(feed_in)) = (live.general, live.feed_in) else {
            warn!(
                has_general = live.general.is_some(),
                has_feed_in = live.feed_in.is_some(),
                "incomplete live prices, using the forecast for the current slot"
            );
            return None;
        };
        let buy = KilowattHourPrice::from(general.per_kwh).round().floor_at_zero();
        let sell = KilowattHourPrice::from(-feed_in.per_kwh).round().floor_at_zero();
        debug!(%buy, %sell, "injecting the live prices");
        Some((buy, sell))
    }
}

/// Looks slots up in one channel's buckets, carrying the last resolved price forward.
struct ChannelResolver<'a> {
    lookup: &'a PriceLookup,
    channel: &'static str,
    last_price: Option<KilowattHourPrice>,
    n_carried_forward: usize,
}

impl<'a> ChannelResolver<'a> {
    const fn new(lookup: &'a PriceLookup, channel: &'static str) -> Self {
        Self { lookup, channel, last_price: None, n_carried_forward: 0 }
    }

    fn resolve(&mut self, slot: SlotKey, dates: [NaiveDate; 3]) -> Option<KilowattHourPrice> {
        let found = dates
            .into_iter()
            .find_map(|date| self.lookup.average(&BucketKey::new(date, slot)))
            .map(KilowattHourPrice::floor_at_zero);
        if let Some(price) = found {
            self.last_price = Some(price);
            return Some(price);
        }
        match self.last_price {
            Some(price) => {
                debug!(channel = self.channel, %slot, %price, "carried forward");
                self.n_carried_forward += 1;
                Some(price)
            }
            None => {
                warn!(channel = self.channel, %slot, "no price");
                None
            }
        }
    }
}
