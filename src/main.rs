#![doc = include_str!("../README.md")]

mod cli;
mod config;
mod core;
mod feed;
mod pipeline;
mod prelude;
mod quantity;
mod tables;
mod tariff;

use std::fs;

use clap::{Parser, crate_version};

use crate::{
    cli::{Args, Command},
    prelude::*,
    tables::build_tariff_table,
    tariff::document::TariffDocument,
};

fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().with_writer(std::io::stderr).init();
    info!(version = crate_version!(), "starting…");

    match Args::parse().command {
        Command::Render(args) => {
            let tariff = args.sync.run()?;
            let document = serde_json::to_string_pretty(&TariffDocument::from(&tariff))?;
            match &args.output {
                Some(path) => {
                    fs::write(path, document)
                        .with_context(|| format!("failed to write `{}`", path.display()))?;
                    info!(path = %path.display(), "written the tariff document");
                }
                None => println!("{document}"),
            }
        }
        Command::Preview(args) => {
            let tariff = args.run()?;
            println!("{}", build_tariff_table(&tariff));
        }
    }

    info!("done!");
    Ok(())
}
