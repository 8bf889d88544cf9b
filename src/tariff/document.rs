//! Destination tariff document, serialized as JSON.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    core::slot::{SlotKey, SlotMap},
    quantity::{KilowattHourPrice, KilowattRate},
    tariff::{Side, Tariff},
};

#[derive(Debug, Serialize)]
pub struct TariffDocument {
    pub version: u32,
    pub code: String,
    pub name: String,
    pub utility: String,
    pub currency: &'static str,
    pub daily_charges: Vec<DailyCharge>,
    pub demand_charges: SeasonalCharges<KilowattRate>,
    pub energy_charges: SeasonalCharges<KilowattHourPrice>,
    pub seasons: Seasons,
    pub sell_tariff: SellTariff,
}

#[derive(Debug, Serialize)]
pub struct SellTariff {
    pub name: String,
    pub utility: String,
    pub daily_charges: Vec<DailyCharge>,
    pub demand_charges: SeasonalCharges<KilowattRate>,
    pub energy_charges: SeasonalCharges<KilowattHourPrice>,
    pub seasons: Seasons,
}

#[derive(Debug, Serialize)]
pub struct DailyCharge {
    pub name: &'static str,
}

impl Default for DailyCharge {
    fn default() -> Self {
        Self { name: "Charge" }
    }
}

/// Charges per season, only the summer season spans the year.
#[derive(Debug, Serialize)]
pub struct SeasonalCharges<V> {
    #[serde(rename = "ALL")]
    pub all: Rates<AllPeriods>,

    #[serde(rename = "Summer")]
    pub summer: Rates<BTreeMap<SlotKey, V>>,

    #[serde(rename = "Winter")]
    pub winter: Rates<BTreeMap<SlotKey, V>>,
}

impl<V: Copy> SeasonalCharges<V> {
    fn new(rates: Option<&SlotMap<V>>) -> Self {
        Self {
            all: Rates { rates: Some(AllPeriods { all: 0 }) },
            summer: Rates { rates: rates.map(|rates| rates.iter().map(|(slot, rate)| (slot, *rate)).collect()) },
            winter: Rates { rates: None },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Rates<R> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rates: Option<R>,
}

#[derive(Debug, Serialize)]
pub struct AllPeriods {
    #[serde(rename = "ALL")]
    pub all: u32,
}

#[derive(Debug, Serialize)]
pub struct Seasons {
    #[serde(rename = "Summer")]
    pub summer: Season,

    #[serde(rename = "Winter")]
    pub winter: Season,
}

impl Seasons {
    fn year_round() -> Self {
        Self {
            summer: Season {
                from_month: 1,
                to_month: 12,
                from_day: 1,
                to_day: 31,
                tou_periods: SlotKey::iter().map(|slot| (slot, TouPeriods::from(slot))).collect(),
            },
            winter: Season {
                from_month: 0,
                to_month: 0,
                from_day: 0,
                to_day: 0,
                tou_periods: BTreeMap::new(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Season {
    #[serde(rename = "fromMonth")]
    pub from_month: u32,

    #[serde(rename = "toMonth")]
    pub to_month: u32,

    #[serde(rename = "fromDay")]
    pub from_day: u32,

    #[serde(rename = "toDay")]
    pub to_day: u32,

    pub tou_periods: BTreeMap<SlotKey, TouPeriods>,
}

#[derive(Debug, Serialize)]
pub struct TouPeriods {
    pub periods: Vec<TouPeriod>,
}

impl From<SlotKey> for TouPeriods {
    fn from(slot: SlotKey) -> Self {
        Self { periods: vec![TouPeriod::from(slot)] }
    }
}

/// Every day of the week, zero fields are omitted.
#[derive(Debug, Eq, PartialEq, Serialize)]
pub struct TouPeriod {
    #[serde(rename = "toDayOfWeek")]
    pub to_day_of_week: u32,

    #[serde(rename = "fromHour", skip_serializing_if = "Option::is_none")]
    pub from_hour: Option<u32>,

    #[serde(rename = "fromMinute", skip_serializing_if = "Option::is_none")]
    pub from_minute: Option<u32>,

    #[serde(rename = "toHour", skip_serializing_if = "Option::is_none")]
    pub to_hour: Option<u32>,

    #[serde(rename = "toMinute", skip_serializing_if = "Option::is_none")]
    pub to_minute: Option<u32>,
}

impl From<SlotKey> for TouPeriod {
    fn from(slot: SlotKey) -> Self {
        let (from_hour, from_minute) = (slot.hour(), slot.minute());
        let (to_hour, to_minute) =
            if from_minute == 0 { (from_hour, 30) } else { (from_hour + 1, 0) };
        Self {
            to_day_of_week: 6,
            from_hour: Some(from_hour).filter(|hour| *hour > 0),
            from_minute: Some(from_minute).filter(|minute| *minute > 0),
            to_hour: Some(to_hour).filter(|hour| *hour > 0),
            to_minute: Some(to_minute).filter(|minute| *minute > 0),
        }
    }
}

impl From<&Tariff> for TariffDocument {
    fn from(tariff: &Tariff) -> Self {
        let provider_name = tariff.provider.display_name();
        let demand_rates = |side: Side| {
            tariff
                .demand_charges
                .as_ref()
                .filter(|charges| charges.sides.contains(side))
                .map(|charges| &charges.rates)
        };
        Self {
            version: 1,
            code: format!("POWER_SYNC:{}", tariff.provider.code()),
            name: format!("{provider_name} (Power Sync)"),
            utility: provider_name.to_owned(),
            currency: "AUD",
            daily_charges: vec![DailyCharge::default()],
            demand_charges: SeasonalCharges::new(demand_rates(Side::Buy)),
            energy_charges: SeasonalCharges::new(Some(&tariff.buy)),
            seasons: Seasons::year_round(),
            sell_tariff: SellTariff {
                name: format!("{provider_name} (managed by Power Sync)"),
                utility: provider_name.to_owned(),
                daily_charges: vec![DailyCharge::default()],
                demand_charges: SeasonalCharges::new(demand_rates(Side::Sell)),
                energy_charges: SeasonalCharges::new(Some(&tariff.sell)),
                seasons: Seasons::year_round(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use enumset::EnumSet;
    use serde_json::json;

    use super::*;
    use crate::{
        core::schedule::Schedules,
        prelude::*,
        tariff::{Provider, demand::DemandCharges},
    };

    fn tariff() -> Tariff {
        Tariff::new(
            Schedules {
                buy: SlotMap::from_fn(|_| KilowattHourPrice(0.2014)),
                sell: SlotMap::from_fn(|_| KilowattHourPrice(0.1044)),
            },
            Provider::Amber,
        )
    }

    #[test]
    fn render() -> Result {
        let document = serde_json::to_value(TariffDocument::from(&tariff()))?;
        assert_eq!(document["code"], "POWER_SYNC:AMBER");
        assert_eq!(document["name"], "Amber Electric (Power Sync)");
        assert_eq!(document["currency"], "AUD");
        assert_eq!(document["daily_charges"], json!([{"name": "Charge"}]));
        assert_eq!(
            document["demand_charges"],
            json!({"ALL": {"rates": {"ALL": 0}}, "Summer": {}, "Winter": {}}),
        );
        assert_eq!(document["energy_charges"]["Summer"]["rates"]["PERIOD_16_30"], 0.2014);
        assert_eq!(document["energy_charges"]["Summer"]["rates"].as_object().map(|rates| rates.len()), Some(48));
        assert_eq!(document["sell_tariff"]["energy_charges"]["Summer"]["rates"]["PERIOD_00_00"], 0.1044);
        assert_eq!(document["sell_tariff"]["name"], "Amber Electric (managed by Power Sync)");
        assert_eq!(
            document["seasons"]["Winter"],
            json!({"fromMonth": 0, "toMonth": 0, "fromDay": 0, "toDay": 0, "tou_periods": {}}),
        );
        Ok(())
    }

    #[test]
    fn demand_charges_on_the_sell_side() -> Result {
        let mut tariff = tariff();
        tariff.demand_charges = Some(DemandCharges {
            rates: SlotMap::from_fn(|slot| if slot.hour() == 18 { KilowattRate(10.0) } else { KilowattRate::ZERO }),
            sides: EnumSet::only(Side::Sell),
        });
        tariff.provider = Provider::FlowPower;
        let document = serde_json::to_value(TariffDocument::from(&tariff))?;
        assert_eq!(document["code"], "POWER_SYNC:FLOW_POWER");
        assert_eq!(document["demand_charges"]["Summer"], json!({}));
        assert_eq!(document["sell_tariff"]["demand_charges"]["Summer"]["rates"]["PERIOD_18_30"], 10.0);
        assert_eq!(document["sell_tariff"]["demand_charges"]["Summer"]["rates"]["PERIOD_19_00"], 0.0);
        Ok(())
    }

    #[test]
    fn tou_periods() -> Result {
        let render = |slot| serde_json::to_value(TouPeriod::from(slot));
        assert_eq!(render(SlotKey::MIDNIGHT)?, json!({"toDayOfWeek": 6, "toMinute": 30}));
        assert_eq!(render(SlotKey::at(0, 30))?, json!({"toDayOfWeek": 6, "fromMinute": 30, "toHour": 1}));
        assert_eq!(
            render(SlotKey::at(16, 0))?,
            json!({"toDayOfWeek": 6, "fromHour": 16, "toHour": 16, "toMinute": 30}),
        );
        assert_eq!(
            render(SlotKey::at(23, 30))?,
            json!({"toDayOfWeek": 6, "fromHour": 23, "fromMinute": 30, "toHour": 24}),
        );
        Ok(())
    }
}
