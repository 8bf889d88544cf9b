use std::iter;

use serde::{Deserialize, Serialize};

use crate::{
    core::{live::LiveIntervals, schedule::Schedules, slot::SlotKey},
    prelude::*,
    quantity::KilowattHourPrice,
};

/// Raise the near-term buy prices while the market reports a price spike,
/// so that the battery does not import from the grid.
#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SpikeProtection {
    pub enabled: bool,

    /// Live and slot buy prices below this are left alone.
    pub low_price_threshold: KilowattHourPrice,

    /// Added on top of the highest sell price.
    pub margin: KilowattHourPrice,

    /// Number of protected slots after the current one.
    pub n_following_slots: usize,
}

impl Default for SpikeProtection {
    fn default() -> Self {
        Self {
            enabled: true,
            low_price_threshold: KilowattHourPrice(0.05),
            margin: KilowattHourPrice(1.0),
            n_following_slots: 4,
        }
    }
}

impl SpikeProtection {
    /// Returns the number of overridden slots.
    #[instrument(skip_all, fields(%current_slot))]
    pub fn apply(
        &self,
        schedules: &mut Schedules,
        live: LiveIntervals<'_>,
        current_slot: SlotKey,
    ) -> usize {
        if !self.enabled {
            return 0;
        }
        let Some(general) = live.general else {
            return 0;
        };
        if !general.spike_status.is_spiking() {
            return 0;
        }
        let live_buy = KilowattHourPrice::from(general.per_kwh);
        if live_buy < self.low_price_threshold {
            info!(%live_buy, "spike reported but the live price is low, leaving the schedule alone");
            return 0;
        }

        let max_sell = schedules.sell.values().copied().max().unwrap_or(KilowattHourPrice::ZERO);
        let override_price = (max_sell + self.margin).round();
        let slots = iter::successors(Some(current_slot), |slot| Some(slot.next()))
            .take((self.n_following_slots + 1).min(SlotKey::N_SLOTS));

        let mut n_overridden = 0;
        for slot in slots {
            let price = &mut schedules.buy[slot];
            if *price < self.low_price_threshold {
                debug!(%slot, %price, "cheap slot, not overriding");
            } else if override_price > *price {
                debug!(%slot, from = %price, to = %override_price, "overriding");
                *price = override_price;
                n_overridden += 1;
            }
        }
        warn!(
            status = ?general.spike_status,
            %live_buy,
            %max_sell,
            %override_price,
            n_overridden,
            "spike protection is active"
        );
        n_overridden
    }
}
