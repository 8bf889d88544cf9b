use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::{core::slot::SlotKey, quantity::KilowattHourPrice};

/// Local date and half-hour slot an observation falls into.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BucketKey {
    pub date: NaiveDate,
    pub slot: SlotKey,
}

impl BucketKey {
    #[must_use]
    pub const fn new(date: NaiveDate, slot: SlotKey) -> Self {
        Self { date, slot }
    }

    #[must_use]
    pub fn containing(local: NaiveDateTime) -> Self {
        Self::new(local.date(), SlotKey::containing(&local.time()))
    }
}

/// Prices collected per bucket, averaged on read.
#[derive(Clone, Debug, Default)]
pub struct PriceLookup(BTreeMap<BucketKey, Vec<KilowattHourPrice>>);

impl PriceLookup {
    pub fn push(&mut self, key: BucketKey, price: KilowattHourPrice) {
        self.0.entry(key).or_default().push(price);
    }

    /// Rounded mean of the bucket prices.
    #[must_use]
    pub fn average(&self, key: &BucketKey) -> Option<KilowattHourPrice> {
        self.0.get(key).and_then(|prices| KilowattHourPrice::mean(prices)).map(KilowattHourPrice::round)
    }

    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::prelude::*;

    #[test]
    fn average_keeps_every_observation() -> Result {
        let date = NaiveDate::from_ymd_opt(2025, 11, 11).context("invalid date")?;
        let key = BucketKey::new(date, SlotKey::at(16, 0));
        let mut lookup = PriceLookup::default();
        lookup.push(key, KilowattHourPrice(0.1));
        lookup.push(key, KilowattHourPrice(0.2));
        lookup.push(key, KilowattHourPrice(0.25));
        assert_eq!(lookup.len(), 1);
        assert_abs_diff_eq!(lookup.average(&key).context("no price")?.0, 0.1833);
        assert!(lookup.average(&BucketKey::new(date, SlotKey::at(16, 30))).is_none());
        Ok(())
    }
}
