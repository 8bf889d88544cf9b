use std::{fs, path::Path};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{
    core::{spike::SpikeProtection, zone::parse_zone_name},
    feed::ForecastVariant,
    prelude::*,
    tariff::{
        Provider,
        boost::ExportBoost,
        demand::DemandChargeSettings,
        export::{BaseRateAdjustment, FlatExportWindow},
        network::NetworkTariff,
    },
};

/// Settings of one sync cycle.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub provider: Provider,
    pub forecast_variant: ForecastVariant,

    /// IANA zone name of the battery site, detected from the feed when unset.
    pub timezone: Option<String>,

    pub spike_protection: SpikeProtection,
    pub demand_charge: DemandChargeSettings,
    pub buy_pricing: Option<BuyPricing>,
    pub flat_export: Option<FlatExportWindow>,
    pub export_boost: ExportBoost,
}

/// Replaces the market-derived buy prices, one model at a time.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "model", rename_all = "kebab-case")]
pub enum BuyPricing {
    Network(NetworkTariff),
    BaseRate(BaseRateAdjustment),
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse `{}`", path.display()))?;
        info!(path = %path.display(), provider = ?config.provider, "loaded the configuration");
        Ok(config)
    }

    /// Configured zone, unknown names are ignored with a warning.
    #[must_use]
    pub fn zone(&self) -> Option<Tz> {
        self.timezone.as_deref().and_then(parse_zone_name)
    }
}
