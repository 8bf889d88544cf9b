use serde::{Deserialize, Serialize};

use crate::{
    core::window::SlotWindow,
    prelude::*,
    quantity::{CentsPerKilowattHour, KilowattHourPrice},
    tariff::Tariff,
};

/// Makes export more attractive to the battery inside a window.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportBoost {
    pub enabled: bool,

    /// Added to the sell price.
    pub offset: CentsPerKilowattHour,

    /// Boosted sell prices are at least this.
    pub min_price: CentsPerKilowattHour,

    /// Window start, `HH:MM`.
    pub start: String,

    /// Window end, `HH:MM`.
    pub end: String,

    /// Slots priced below this are left alone, zero disables the check.
    pub activation_threshold: CentsPerKilowattHour,
}

impl Default for ExportBoost {
    fn default() -> Self {
        Self {
            enabled: false,
            offset: CentsPerKilowattHour::ZERO,
            min_price: CentsPerKilowattHour::ZERO,
            start: "17:00".to_owned(),
            end: "21:00".to_owned(),
            activation_threshold: CentsPerKilowattHour::ZERO,
        }
    }
}

impl ExportBoost {
    /// Returns the number of boosted slots.
    #[instrument(skip_all)]
    pub fn apply(&self, tariff: &mut Tariff) -> usize {
        if !self.enabled {
            return 0;
        }
        if self.offset == CentsPerKilowattHour::ZERO && self.min_price == CentsPerKilowattHour::ZERO
        {
            debug!("neither offset nor minimum price is set");
            return 0;
        }
        let window = match SlotWindow::parse(&self.start, &self.end) {
            Ok(window) => window,
            Err(error) => {
                error!("skipping the export boost: {error:#}");
                return 0;
            }
        };

        let mut n_boosted = 0;
        let mut n_below_threshold = 0;
        for slot in window.slots() {
            let original = CentsPerKilowattHour::from(tariff.sell[slot]);
            if self.activation_threshold > CentsPerKilowattHour::ZERO
                && original < self.activation_threshold
            {
                n_below_threshold += 1;
                continue;
            }
            let boosted = (original + self.offset).max(self.min_price);
            tariff.sell[slot] = KilowattHourPrice::from(boosted).round().floor_at_zero();
            n_boosted += 1;
        }
        info!(
            %window,
            offset = %self.offset,
            min_price = %self.min_price,
            n_boosted,
            n_below_threshold,
            "applied the export boost"
        );
        n_boosted
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::{
        core::{
            schedule::Schedules,
            slot::{SlotKey, SlotMap},
        },
        tariff::Provider,
    };

    fn tariff() -> Tariff {
        let sell = SlotMap::from_fn(|slot| {
            if slot.hour() < 18 { KilowattHourPrice(0.02) } else { KilowattHourPrice(0.08) }
        });
        Tariff::new(
            Schedules { buy: SlotMap::from_fn(|_| KilowattHourPrice(0.3)), sell },
            Provider::Amber,
        )
    }

    fn boost() -> ExportBoost {
        ExportBoost {
            enabled: true,
            offset: CentsPerKilowattHour(2.0),
            min_price: CentsPerKilowattHour(7.5),
            ..ExportBoost::default()
        }
    }

    #[test]
    fn offset_and_minimum() {
        let mut tariff = tariff();
        assert_eq!(boost().apply(&mut tariff), 8);
        assert_abs_diff_eq!(tariff.sell[SlotKey::at(17, 0)].0, 0.075);
        assert_abs_diff_eq!(tariff.sell[SlotKey::at(18, 0)].0, 0.1);
        assert_abs_diff_eq!(tariff.sell[SlotKey::at(21, 0)].0, 0.08);
        assert_abs_diff_eq!(tariff.sell[SlotKey::at(16, 30)].0, 0.02);
    }

    #[test]
    fn activation_threshold() {
        let mut tariff = tariff();
        let boost = ExportBoost { activation_threshold: CentsPerKilowattHour(5.0), ..boost() };
        assert_eq!(boost.apply(&mut tariff), 6);
        assert_abs_diff_eq!(tariff.sell[SlotKey::at(17, 30)].0, 0.02);
        assert_abs_diff_eq!(tariff.sell[SlotKey::at(20, 30)].0, 0.1);
    }

    #[test]
    fn no_op() {
        let mut tariff = tariff();
        let boost = ExportBoost {
            offset: CentsPerKilowattHour::ZERO,
            min_price: CentsPerKilowattHour::ZERO,
            ..boost()
        };
        assert_eq!(boost.apply(&mut tariff), 0);
        let boost = ExportBoost { end: "9pm".to_owned(), ..self::boost() };
        assert_eq!(boost.apply(&mut tariff), 0);
        assert_abs_diff_eq!(tariff.sell[SlotKey::at(18, 0)].0, 0.08);
    }
}
