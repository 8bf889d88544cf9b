use bon::Builder;
use chrono::{DateTime, Datelike, Utc};

use crate::{
    config::{BuyPricing, Config},
    core::{
        extract::{extract, wholesale_lookup},
        live::select_live,
        schedule::{DayScheduler, Outcome},
        zone::Zone,
    },
    feed::RawInterval,
    prelude::*,
    tariff::{Tariff, network::NetworkPricing},
};

/// One sync cycle from the raw feed to the adjusted tariff.
#[derive(Builder)]
pub struct SyncCycle<'a> {
    config: &'a Config,
    intervals: &'a [RawInterval],

    /// Separate short-duration feed for the live prices, the main feed is used otherwise.
    live_intervals: Option<&'a [RawInterval]>,

    network_pricing: Option<&'a dyn NetworkPricing>,
    now: DateTime<Utc>,
}

impl SyncCycle<'_> {
    #[instrument(skip_all, fields(n_intervals = self.intervals.len(), provider = ?self.config.provider))]
    pub fn run(self) -> Outcome<Tariff> {
        let live = select_live(self.live_intervals.unwrap_or(self.intervals));
        let extraction = extract(self.intervals, self.config.zone(), self.config.forecast_variant);
        let outcome = DayScheduler::builder()
            .buy(&extraction.buy)
            .sell(&extraction.sell)
            .zone(extraction.zone)
            .maybe_live(live)
            .spike_protection(self.config.spike_protection)
            .now(self.now)
            .build()
            .schedule();
        outcome.map(|schedules| {
            let mut tariff = Tariff::new(schedules, self.config.provider);
            self.adjust(&mut tariff, extraction.zone);
            tariff
        })
    }

    /// Apply the configured adjustments in order: demand, buy pricing, export.
    fn adjust(&self, tariff: &mut Tariff, zone: Zone) {
        let config = self.config;
        let today = zone.localize(self.now).date();

        tariff.demand_charges = config.demand_charge.charges();
        config.demand_charge.apply_artificial_price(tariff, today.weekday());

        match &config.buy_pricing {
            Some(BuyPricing::Network(network_tariff)) => {
                network_tariff.apply(tariff, self.network_pricing, today);
            }
            Some(BuyPricing::BaseRate(model)) => {
                model.apply(tariff, &wholesale_lookup(self.intervals, zone));
            }
            None => {}
        }

        if let Some(flat_export) = config.flat_export {
            flat_export.apply(tariff);
        }
        config.export_boost.apply(tariff);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{FixedOffset, NaiveDate, TimeDelta};

    use super::*;
    use crate::{
        core::slot::SlotKey,
        feed,
        quantity::{CentsPerKilowattHour, KilowattHourPrice, KilowattRate, MegawattHourPrice},
        tariff::{
            demand::DemandChargeSettings,
            document::TariffDocument,
            export::{BaseRateAdjustment, FlatExportWindow, Region},
            network::NetworkTariff,
        },
    };

    fn now() -> Result<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339("2025-11-11T16:37:00+10:00")?.to_utc())
    }

    fn feed() -> Result<Vec<RawInterval>> {
        let mut records = Vec::new();
        for day in [11, 12] {
            for slot in SlotKey::iter() {
                let end = NaiveDate::from_ymd_opt(2025, 11, day)
                    .context("invalid date")?
                    .and_time(slot.start_time())
                    + TimeDelta::minutes(30);
                let nem_time = format!("{}+10:00", end.format("%Y-%m-%dT%H:%M:%S"));
                records.push(serde_json::json!({
                    "type": "ForecastInterval", "nemTime": nem_time, "perKwh": 25.0,
                    "wholesaleKWHPrice": 9.7, "channelType": "general"
                }));
                records.push(serde_json::json!({
                    "type": "ForecastInterval", "nemTime": nem_time, "perKwh": -8.0, "channelType": "feedIn"
                }));
            }
        }
        feed::parse(&serde_json::to_string(&records)?)
    }

    fn run(config: &Config, intervals: &[RawInterval]) -> Result<Tariff> {
        SyncCycle::builder()
            .config(config)
            .intervals(intervals)
            .now(now()?)
            .build()
            .run()
            .into_result()
    }

    #[test]
    fn plain() -> Result {
        let config = Config { timezone: Some("Australia/Brisbane".to_owned()), ..Config::default() };
        let tariff = run(&config, &feed()?)?;
        assert!(tariff.buy.values().all(|price| *price == KilowattHourPrice(0.25)));
        assert!(tariff.sell.values().all(|price| *price == KilowattHourPrice(0.08)));
        assert!(tariff.demand_charges.is_none());
        let document = serde_json::to_value(TariffDocument::from(&tariff))?;
        assert_eq!(document["energy_charges"]["Summer"]["rates"]["PERIOD_23_30"], 0.25);
        Ok(())
    }

    #[test]
    fn flow_power() -> Result {
        let config = Config {
            provider: crate::tariff::Provider::FlowPower,
            buy_pricing: Some(BuyPricing::BaseRate(BaseRateAdjustment::default())),
            flat_export: Some(FlatExportWindow { region: Region::NewSouthWales }),
            demand_charge: DemandChargeSettings {
                enabled: true,
                rate: KilowattRate(10.0),
                artificial_price: true,
                ..DemandChargeSettings::default()
            },
            ..Config::default()
        };
        let tariff = run(&config, &feed()?)?;
        // 34 + (9.7 - 9.7) cents, the model replaces the artificial price too.
        assert_abs_diff_eq!(tariff.buy[SlotKey::at(15, 0)].0, 0.34);
        assert_abs_diff_eq!(tariff.buy[SlotKey::at(3, 0)].0, 0.34);
        assert_abs_diff_eq!(tariff.sell[SlotKey::at(18, 0)].0, 0.45);
        assert_eq!(tariff.sell[SlotKey::at(20, 0)], KilowattHourPrice::ZERO);
        let demand_charges = tariff.demand_charges.context("no demand charges")?;
        assert_eq!(demand_charges.rates[SlotKey::at(15, 0)], KilowattRate(10.0));
        Ok(())
    }

    struct Flat;

    impl NetworkPricing for Flat {
        fn retail_price(
            &self,
            _network: &str,
            _tariff_code: &str,
            _interval_time: DateTime<FixedOffset>,
            wholesale: MegawattHourPrice,
        ) -> Result<CentsPerKilowattHour> {
            Ok(CentsPerKilowattHour(wholesale.0 / 10.0 + 10.0))
        }
    }

    #[test]
    fn network_tariff_with_calculator() -> Result {
        let config = Config {
            buy_pricing: Some(BuyPricing::Network(NetworkTariff {
                distributor: Some("energex".to_owned()),
                tariff_code: Some("6900".to_owned()),
                ..NetworkTariff::default()
            })),
            ..Config::default()
        };
        let intervals = feed()?;
        let tariff = SyncCycle::builder()
            .config(&config)
            .intervals(&intervals)
            .network_pricing(&Flat)
            .now(now()?)
            .build()
            .run()
            .into_result()?;
        assert_abs_diff_eq!(tariff.buy[SlotKey::at(12, 0)].0, 0.35);
        Ok(())
    }

    #[test]
    fn aborted() -> Result {
        let outcome = SyncCycle::builder()
            .config(&Config::default())
            .intervals(&[])
            .now(now()?)
            .build()
            .run();
        assert!(matches!(outcome, Outcome::Aborted { .. }));
        Ok(())
    }
}
