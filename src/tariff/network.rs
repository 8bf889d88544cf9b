use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        schedule::DaySchedule,
        slot::{SlotKey, SlotMap},
        window::SlotWindow,
    },
    prelude::*,
    quantity::{CentsPerKilowattHour, KilowattHourPrice, MegawattHourPrice},
    tariff::Tariff,
};

/// Network tariff calculators expect the market time of the NEM, which is AEST all year.
const MARKET_OFFSET_SECONDS: i32 = 10 * 3600;

const GST: f64 = 1.1;

/// External retail price calculator that knows the distributor tariffs.
pub trait NetworkPricing {
    /// Retail price for the wholesale price at the given interval.
    fn retail_price(
        &self,
        network: &str,
        tariff_code: &str,
        interval_time: DateTime<FixedOffset>,
        wholesale: MegawattHourPrice,
    ) -> Result<CentsPerKilowattHour>;
}

/// Adds the distributor's network charges on top of the wholesale buy price.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkTariff {
    pub distributor: Option<String>,
    pub tariff_code: Option<String>,

    /// Skip the calculator even when it is available.
    pub use_manual_rates: bool,

    pub manual: ManualNetworkRates,
}

impl NetworkTariff {
    #[instrument(skip_all, fields(distributor = ?self.distributor, tariff_code = ?self.tariff_code))]
    pub fn apply(&self, tariff: &mut Tariff, calculator: Option<&dyn NetworkPricing>, date: NaiveDate) {
        match (calculator, &self.distributor, &self.tariff_code) {
            (Some(calculator), Some(distributor), Some(tariff_code)) if !self.use_manual_rates => {
                match calculate(calculator, distributor, tariff_code, &tariff.buy, date) {
                    Ok(buy) => {
                        tariff.buy = buy;
                        info!("applied the network tariff from the calculator");
                        return;
                    }
                    Err(error) => {
                        warn!("network calculator failed, falling back to manual rates: {error:#}");
                    }
                }
            }
            _ => debug!(has_calculator = calculator.is_some(), "using manual network rates"),
        }
        self.manual.apply(tariff);
    }
}

/// Distributor name as understood by the calculator.
fn calculator_network(distributor: &str) -> &str {
    match distributor {
        "citipower" | "united" => "victoria",
        distributor => distributor,
    }
}

fn calculate(
    calculator: &dyn NetworkPricing,
    distributor: &str,
    tariff_code: &str,
    wholesale: &DaySchedule,
    date: NaiveDate,
) -> Result<DaySchedule> {
    let offset = FixedOffset::east_opt(MARKET_OFFSET_SECONDS).context("invalid market offset")?;
    let network = calculator_network(distributor);
    SlotMap::try_from_fn(|slot| {
        let interval_time = date
            .and_time(slot.start_time())
            .and_local_timezone(offset)
            .single()
            .with_context(|| format!("no market time for {slot}"))?;
        let retail = calculator
            .retail_price(network, tariff_code, interval_time, MegawattHourPrice::from(wholesale[slot]))
            .with_context(|| format!("failed to price {slot}"))?;
        Ok(KilowattHourPrice::from(retail).round().floor_at_zero())
    })
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManualTariffKind {
    #[default]
    Flat,
    TimeOfUse,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ManualNetworkRates {
    pub kind: ManualTariffKind,
    pub flat_rate: CentsPerKilowattHour,
    pub peak_rate: CentsPerKilowattHour,
    pub shoulder_rate: CentsPerKilowattHour,
    pub offpeak_rate: CentsPerKilowattHour,
    pub peak_start: String,
    pub peak_end: String,
    pub offpeak_start: String,
    pub offpeak_end: String,

    /// Environmental levies and the like, charged on every kilowatt-hour.
    pub other_fees: CentsPerKilowattHour,

    pub include_gst: bool,
}

impl Default for ManualNetworkRates {
    fn default() -> Self {
        Self {
            kind: ManualTariffKind::Flat,
            flat_rate: CentsPerKilowattHour(8.0),
            peak_rate: CentsPerKilowattHour(15.0),
            shoulder_rate: CentsPerKilowattHour(5.0),
            offpeak_rate: CentsPerKilowattHour(2.0),
            peak_start: "16:00".to_owned(),
            peak_end: "21:00".to_owned(),
            offpeak_start: "10:00".to_owned(),
            offpeak_end: "15:00".to_owned(),
            other_fees: CentsPerKilowattHour(1.5),
            include_gst: true,
        }
    }
}

impl ManualNetworkRates {
    pub fn apply(&self, tariff: &mut Tariff) {
        let charges = match self.charges() {
            Ok(charges) => charges,
            Err(error) => {
                error!("skipping the network tariff: {error:#}");
                return;
            }
        };
        for (slot, price) in tariff.buy.iter_mut() {
            let retail = CentsPerKilowattHour::from(*price) + charges[slot];
            *price = KilowattHourPrice::from(retail).round().floor_at_zero();
        }
        info!(kind = ?self.kind, include_gst = self.include_gst, "applied manual network rates");
    }

    /// Network charge per slot including the fees and tax.
    fn charges(&self) -> Result<SlotMap<CentsPerKilowattHour>> {
        let rates = match self.kind {
            ManualTariffKind::Flat => SlotMap::from_fn(|_| self.flat_rate),
            ManualTariffKind::TimeOfUse => {
                let peak = SlotWindow::parse(&self.peak_start, &self.peak_end)
                    .context("invalid peak window")?;
                let offpeak = SlotWindow::parse(&self.offpeak_start, &self.offpeak_end)
                    .context("invalid off-peak window")?;
                SlotMap::from_fn(|slot| self.time_of_use_rate(slot, peak, offpeak))
            }
        };
        let tax = if self.include_gst { GST } else { 1.0 };
        Ok(rates.map(|rate| (rate + self.other_fees) * tax))
    }

    fn time_of_use_rate(
        &self,
        slot: SlotKey,
        peak: SlotWindow,
        offpeak: SlotWindow,
    ) -> CentsPerKilowattHour {
        if peak.contains(slot) {
            self.peak_rate
        } else if offpeak.contains(slot) {
            self.offpeak_rate
        } else {
            self.shoulder_rate
        }
    }
}
