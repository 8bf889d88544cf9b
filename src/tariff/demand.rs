use chrono::Weekday;
use enumset::EnumSet;
use serde::{Deserialize, Serialize};

use crate::{
    core::{slot::SlotMap, window::SlotWindow},
    prelude::*,
    quantity::{KilowattHourPrice, KilowattRate},
    tariff::{Side, Tariff},
};

/// Added to the buy price inside the demand window, to keep the battery off the grid.
pub const ARTIFICIAL_PRICE_INCREASE: KilowattHourPrice = KilowattHourPrice(2.0);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DemandCharges {
    pub rates: SlotMap<KilowattRate>,
    pub sides: EnumSet<Side>,
}

impl DemandCharges {
    /// Rate inside the window and zero elsewhere.
    #[must_use]
    pub fn build(window: SlotWindow, rate: KilowattRate) -> SlotMap<KilowattRate> {
        SlotMap::from_fn(|slot| if window.contains(slot) { rate } else { KilowattRate::ZERO })
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DemandDays {
    #[default]
    All,
    Weekdays,
    Weekends,
}

impl DemandDays {
    #[must_use]
    pub const fn includes(self, weekday: Weekday) -> bool {
        let is_weekend = matches!(weekday, Weekday::Sat | Weekday::Sun);
        match self {
            Self::All => true,
            Self::Weekdays => !is_weekend,
            Self::Weekends => is_weekend,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DemandChargeSettings {
    pub enabled: bool,
    pub rate: KilowattRate,

    /// Window start, `HH:MM`.
    pub start: String,

    /// Window end, `HH:MM`.
    pub end: String,

    pub apply_to: EnumSet<Side>,
    pub days: DemandDays,

    /// Also make grid import expensive inside the window.
    pub artificial_price: bool,
}

impl Default for DemandChargeSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            rate: KilowattRate::ZERO,
            start: "14:00".to_owned(),
            end: "20:00".to_owned(),
            apply_to: EnumSet::only(Side::Buy),
            days: DemandDays::All,
            artificial_price: false,
        }
    }
}

impl DemandChargeSettings {
    fn window(&self) -> Result<SlotWindow> {
        SlotWindow::parse(&self.start, &self.end).context("invalid demand charge window")
    }

    #[instrument(skip_all)]
    pub fn charges(&self) -> Option<DemandCharges> {
        if !self.enabled || self.rate <= KilowattRate::ZERO {
            return None;
        }
        let window = match self.window() {
            Ok(window) => window,
            Err(error) => {
                error!("skipping demand charges: {error:#}");
                return None;
            }
        };
        let rates = DemandCharges::build(window, self.rate);
        info!(%window, rate = %self.rate, sides = ?self.apply_to, "built demand charges");
        Some(DemandCharges { rates, sides: self.apply_to })
    }

    /// Raise the buy prices inside the window on the matching days.
    #[instrument(skip_all, fields(?weekday))]
    pub fn apply_artificial_price(&self, tariff: &mut Tariff, weekday: Weekday) {
        if !self.enabled || !self.artificial_price {
            return;
        }
        if !self.days.includes(weekday) {
            debug!(days = ?self.days, "not a demand charge day");
            return;
        }
        let window = match self.window() {
            Ok(window) => window,
            Err(error) => {
                error!("skipping the artificial price: {error:#}");
                return;
            }
        };
        let mut n_modified = 0;
        for slot in window.slots() {
            tariff.buy[slot] += ARTIFICIAL_PRICE_INCREASE;
            n_modified += 1;
        }
        info!(%window, increase = %ARTIFICIAL_PRICE_INCREASE, n_modified, "applied the artificial price");
    }
}
