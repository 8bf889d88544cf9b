pub mod boost;
pub mod demand;
pub mod document;
pub mod export;
pub mod network;

use clap::ValueEnum;
use enumset::EnumSetType;
use serde::{Deserialize, Serialize};

use crate::{
    core::schedule::{DaySchedule, Schedules},
    tariff::demand::DemandCharges,
};

#[derive(Debug, Deserialize, Serialize, EnumSetType)]
#[serde(rename_all = "lowercase")]
#[enumset(serialize_repr = "list")]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    #[default]
    Amber,
    FlowPower,
    Globird,
}

impl Provider {
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Amber => "Amber Electric",
            Self::FlowPower => "Flow Power",
            Self::Globird => "GloBird",
        }
    }

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Amber => "AMBER",
            Self::FlowPower => "FLOW_POWER",
            Self::Globird => "GLOBIRD",
        }
    }
}

/// Typed tariff before rendering.
#[derive(Clone, Debug)]
pub struct Tariff {
    pub provider: Provider,
    pub buy: DaySchedule,
    pub sell: DaySchedule,
    pub demand_charges: Option<DemandCharges>,
}

impl Tariff {
    #[must_use]
    pub fn new(schedules: Schedules, provider: Provider) -> Self {
        Self { provider, buy: schedules.buy, sell: schedules.sell, demand_charges: None }
    }
}
