//! Retailer pricing models that replace the market-derived prices.

use std::ops::Range;

use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};

use crate::{
    core::slot::{SlotKey, SlotMap},
    prelude::*,
    quantity::{CentsPerKilowattHour, KilowattHourPrice},
    tariff::Tariff,
};

/// Market region of the National Electricity Market.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub enum Region {
    #[serde(rename = "NSW1")]
    NewSouthWales,

    #[serde(rename = "QLD1")]
    Queensland,

    #[serde(rename = "SA1")]
    SouthAustralia,

    #[serde(rename = "VIC1")]
    Victoria,
}

impl Region {
    #[must_use]
    pub const fn happy_hour_rate(self) -> KilowattHourPrice {
        match self {
            Self::Victoria => KilowattHourPrice(0.35),
            Self::NewSouthWales | Self::Queensland | Self::SouthAustralia => {
                KilowattHourPrice(0.45)
            }
        }
    }
}

/// Export pays a flat regional rate in the evening window and nothing otherwise.
#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct FlatExportWindow {
    pub region: Region,
}

impl FlatExportWindow {
    pub const HAPPY_HOUR: Range<SlotKey> = SlotKey::at(17, 30)..SlotKey::at(19, 30);

    #[instrument(skip_all, fields(region = ?self.region))]
    pub fn apply(self, tariff: &mut Tariff) {
        let rate = self.region.happy_hour_rate();
        for (slot, price) in tariff.sell.iter_mut() {
            *price = if Self::HAPPY_HOUR.contains(&slot) { rate } else { KilowattHourPrice::ZERO };
        }
        info!(%rate, "applied the flat export window");
    }
}

/// Buy price from a base rate plus a wholesale-linked adjustment.
#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct BaseRateAdjustment {
    pub base_rate: CentsPerKilowattHour,

    /// Use this instead of the wholesale-linked adjustment.
    pub custom_adjustment: Option<CentsPerKilowattHour>,
}

impl Default for BaseRateAdjustment {
    fn default() -> Self {
        Self { base_rate: CentsPerKilowattHour(34.0), custom_adjustment: None }
    }
}

impl BaseRateAdjustment {
    /// Subtracted from the wholesale price to get the adjustment.
    pub const WHOLESALE_OFFSET: CentsPerKilowattHour = CentsPerKilowattHour(9.7);

    /// Assumed when the slot has no wholesale price.
    pub const DEFAULT_WHOLESALE: CentsPerKilowattHour = CentsPerKilowattHour(8.0);

    #[instrument(skip_all)]
    pub fn apply(self, tariff: &mut Tariff, wholesale: &SlotMap<Option<KilowattHourPrice>>) {
        for (slot, price) in tariff.buy.iter_mut() {
            let adjustment = self.custom_adjustment.unwrap_or_else(|| {
                wholesale[slot].map_or(Self::DEFAULT_WHOLESALE, CentsPerKilowattHour::from)
                    - Self::WHOLESALE_OFFSET
            });
            *price = KilowattHourPrice::from(self.base_rate + adjustment).round().floor_at_zero();
        }
        if let MinMaxResult::MinMax(min, max) = tariff.buy.values().minmax() {
            info!(base_rate = %self.base_rate, %min, %max, "applied the base rate adjustment");
        }
    }
}
