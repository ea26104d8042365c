//! Command-line host for the Cocoro Air sensors.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cocoro_air_core::config::{defaults, env_vars};
use cocoro_air_core::CocoroAirSettings;
use cocoro_air_devices::{platform, HttpCocoroAirApi, PollingFieldSensor};
use serde::Serialize;
use tracing::info;

/// Read a Cocoro Air purifier/humidifier as sensor entities.
#[derive(Parser, Debug)]
#[command(name = "cocoro-air")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Configuration file.
    #[arg(short, long, global = true, default_value = defaults::CONFIG_FILE)]
    config: PathBuf,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// List the entities of the configured device.
    Entities,
    /// Refresh every entity once and print the states.
    Read {
        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Serialize)]
struct EntityDescription<'a> {
    unique_id: &'a str,
    name: &'a str,
    platform: &'static str,
    device_class: Option<&'static str>,
    unit_of_measurement: Option<&'static str>,
    icon: &'static str,
}

impl<'a> From<&'a PollingFieldSensor> for EntityDescription<'a> {
    fn from(sensor: &'a PollingFieldSensor) -> Self {
        Self {
            unique_id: sensor.unique_id(),
            name: sensor.name(),
            platform: sensor.platform().as_str(),
            device_class: sensor.device_class().map(|c| c.as_str()),
            unit_of_measurement: sensor.unit(),
            icon: sensor.icon(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let settings = CocoroAirSettings::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let sensors = setup(&settings)?;

    match args.command {
        Command::Entities => list_entities(&sensors),
        Command::Read { pretty } => read(sensors, pretty).await,
    }
}

fn init_logging(verbose: bool) {
    // JSON output for production/container environments
    let json_logging = std::env::var(env_vars::LOG_JSON)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    let default_level = if verbose { "cocoro_air=debug" } else { "cocoro_air=info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // stdout carries the command output
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}

/// Build the client and register the entities.
fn setup(settings: &CocoroAirSettings) -> Result<Vec<PollingFieldSensor>> {
    let api = HttpCocoroAirApi::from_settings(settings).context("creating Cocoro Air client")?;

    let mut sensors = Vec::new();
    platform::setup_entry(Arc::new(api), |entities| sensors = entities);
    Ok(sensors)
}

fn list_entities(sensors: &[PollingFieldSensor]) -> Result<()> {
    let entities: Vec<EntityDescription> = sensors.iter().map(EntityDescription::from).collect();
    println!("{}", serde_json::to_string_pretty(&entities)?);
    Ok(())
}

async fn read(mut sensors: Vec<PollingFieldSensor>, pretty: bool) -> Result<()> {
    let outcomes = platform::refresh_all(&mut sensors).await;
    let updated = outcomes.iter().filter(|o| o.is_updated()).count();
    info!(updated, total = sensors.len(), "Refresh cycle finished");

    let states: Vec<_> = sensors.iter().map(PollingFieldSensor::state).collect();
    let output = if pretty {
        serde_json::to_string_pretty(&states)?
    } else {
        serde_json::to_string(&states)?
    };
    println!("{}", output);
    Ok(())
}
