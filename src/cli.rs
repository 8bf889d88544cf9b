use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, Utc};
use clap::{Parser, Subcommand};

use crate::{
    config::Config,
    core::schedule::Outcome,
    feed::{self, ForecastVariant},
    pipeline::SyncCycle,
    prelude::*,
    tariff::{Provider, Tariff},
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: build the rolling tariff and write the tariff document.
    #[clap(name = "render")]
    Render(Box<RenderArgs>),

    /// Print the rolling schedules without writing anything.
    #[clap(name = "preview")]
    Preview(Box<SyncArgs>),
}

#[derive(Parser)]
pub struct SyncArgs {
    /// Price feed: JSON array of forecast, current, and actual intervals.
    #[clap(long, env = "PRICE_FEED_PATH")]
    pub feed: PathBuf,

    /// Separate feed of 5-minute intervals for the live prices.
    #[clap(long, env = "LIVE_PRICE_FEED_PATH")]
    pub live_feed: Option<PathBuf>,

    /// TOML configuration, the defaults apply when omitted.
    #[clap(long, env = "TARIFF_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Overrides the configured provider.
    #[clap(long, value_enum, env = "PROVIDER")]
    pub provider: Option<Provider>,

    /// Overrides the configured forecast variant.
    #[clap(long, value_enum, env = "FORECAST_VARIANT")]
    pub forecast_variant: Option<ForecastVariant>,

    /// IANA zone name, overrides the configured one.
    #[clap(long, env = "TARIFF_SYNC_TIMEZONE")]
    pub timezone: Option<String>,

    /// Pretend that it is this moment, for example `2025-11-11T16:37:00+10:00`.
    #[clap(long)]
    pub now: Option<DateTime<FixedOffset>>,
}

impl SyncArgs {
    pub fn run(&self) -> Result<Tariff> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(provider) = self.provider {
            config.provider = provider;
        }
        if let Some(forecast_variant) = self.forecast_variant {
            config.forecast_variant = forecast_variant;
        }
        if let Some(timezone) = &self.timezone {
            config.timezone = Some(timezone.clone());
        }
        let intervals = feed::load(&self.feed)?;
        let live_intervals = self.live_feed.as_deref().map(feed::load).transpose()?;
        let now = self.now.map_or_else(Utc::now, |now| now.to_utc());

        let outcome: Outcome<Tariff> = SyncCycle::builder()
            .config(&config)
            .intervals(&intervals)
            .maybe_live_intervals(live_intervals.as_deref())
            .now(now)
            .build()
            .run();
        outcome.into_result()
    }
}

#[derive(Parser)]
pub struct RenderArgs {
    #[clap(flatten)]
    pub sync: SyncArgs,

    /// Write the document to this file instead of the standard output.
    #[clap(long, env = "TARIFF_DOCUMENT_PATH")]
    pub output: Option<PathBuf>,
}
