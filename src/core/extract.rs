use chrono_tz::Tz;
use itertools::Itertools;

use crate::{
    core::{
        lookup::{BucketKey, PriceLookup},
        slot::{SlotKey, SlotMap},
        zone::Zone,
    },
    feed::{AdvancedPrice, Channel, ForecastVariant, IntervalKind, RawInterval},
    prelude::*,
    quantity::{CentsPerKilowattHour, KilowattHourPrice},
};

/// Channel-separated bucket lookups in the resolved zone.
#[derive(Clone, Debug)]
pub struct Extraction {
    pub zone: Zone,
    pub buy: PriceLookup,
    pub sell: PriceLookup,
}

#[instrument(skip_all, fields(n_intervals = intervals.len(), ?variant))]
pub fn extract(intervals: &[RawInterval], zone: Option<Tz>, variant: ForecastVariant) -> Extraction {
    let zone = Zone::resolve(zone, intervals);
    let mut extraction =
        Extraction { zone, buy: PriceLookup::default(), sell: PriceLookup::default() };
    let mut n_skipped = 0_usize;

    for interval in intervals {
        let lookup = match interval.channel {
            Channel::General => &mut extraction.buy,
            Channel::FeedIn => &mut extraction.sell,
            Channel::Other => continue,
        };
        match extract_one(interval, zone, variant) {
            Ok((key, price)) => {
                trace!(nem_time = %interval.nem_time, ?key, %price, "bucketed");
                lookup.push(key, price);
            }
            Err(error) => {
                n_skipped += 1;
                warn!(nem_time = %interval.nem_time, "skipped the interval: {error:#}");
            }
        }
    }

    info!(
        %zone,
        n_buy_buckets = extraction.buy.len(),
        n_sell_buckets = extraction.sell.len(),
        n_skipped,
        "extracted prices"
    );
    extraction
}

fn extract_one(
    interval: &RawInterval,
    zone: Zone,
    variant: ForecastVariant,
) -> Result<(BucketKey, KilowattHourPrice)> {
    let mut price = select_price(interval, variant)?;
    if interval.channel == Channel::FeedIn {
        price = -price;
    }
    let start_time = interval.start_time()?;
    let key = BucketKey::containing(zone.localize(start_time.to_utc()));
    Ok((key, KilowattHourPrice::from(price).round()))
}

/// Price field of the record according to its kind and the requested forecast variant.
pub fn select_price(interval: &RawInterval, variant: ForecastVariant) -> Result<CentsPerKilowattHour> {
    let advanced_price = interval.advanced_price.as_ref().filter(|price| !price.is_empty());
    match (interval.kind, advanced_price) {
        (IntervalKind::Forecast, Some(AdvancedPrice::Variants(variants))) => {
            variants.get(variant.as_str()).copied().with_context(|| {
                format!(
                    "forecast variant `{}` is missing, available: {}",
                    variant.as_str(),
                    variants.keys().join(", "),
                )
            })
        }
        (IntervalKind::Current, Some(AdvancedPrice::Variants(variants))) => Ok(variants
            .get(variant.as_str())
            .or_else(|| variants.get(ForecastVariant::Predicted.as_str()))
            .copied()
            .unwrap_or(CentsPerKilowattHour::ZERO)),
        (IntervalKind::Forecast | IntervalKind::Current, Some(AdvancedPrice::Flat(price))) => {
            Ok(*price)
        }
        (IntervalKind::Forecast | IntervalKind::Current, Some(AdvancedPrice::Malformed(value))) => {
            bail!("unexpected advanced price: {value}")
        }
        _ => Ok(interval.per_kwh),
    }
}

/// Mean wholesale price of the buy side per start slot, regardless of the date.
#[instrument(skip_all, fields(n_intervals = intervals.len()))]
pub fn wholesale_lookup(intervals: &[RawInterval], zone: Zone) -> SlotMap<Option<KilowattHourPrice>> {
    let prices = intervals
        .iter()
        .filter(|interval| interval.channel == Channel::General)
        .filter_map(|interval| match interval.start_time() {
            Ok(start_time) => {
                let slot = SlotKey::containing(&zone.localize(start_time.to_utc()).time());
                let price = interval.wholesale_per_kwh.unwrap_or(interval.per_kwh);
                Some((slot, KilowattHourPrice::from(price)))
            }
            Err(error) => {
                warn!("skipped the wholesale price: {error:#}");
                None
            }
        })
        .into_group_map();
    debug!(n_slots = prices.len(), "collected wholesale prices");
    SlotMap::from_fn(|slot| prices.get(&slot).and_then(|prices| KilowattHourPrice::mean(prices)))
}
