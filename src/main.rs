use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wmbus_dv::config::{Config, MeterInfo, OutputUnits};
use wmbus_dv::logging::{init_logger, log_analysis, log_error, log_info};
use wmbus_dv::meters::{create_meter, lookup_driver, registered_drivers};
use wmbus_dv::units::{Quantity, Unit};
use wmbus_dv::util::hex::decode_hex;
use wmbus_dv::Telegram;

#[derive(Parser)]
#[command(name = "wmbus-dv")]
#[command(about = "Decode wM-Bus data records into meter readings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode one decrypted telegram and print the reading as JSON.
    Decode {
        /// Telegram bytes as hex.
        hex: String,
        #[arg(short, long, default_value = "sharky775")]
        driver: String,
        #[arg(short, long, default_value = "meter")]
        name: String,
        #[arg(long, default_value = "00000000")]
        id: String,
        /// JSON configuration; the meter named by --name is taken from it.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Offset of the first data record.
        #[arg(short, long, default_value_t = 0)]
        offset: usize,
        /// Output unit, either `mj` or `energy=mj`. May be repeated.
        #[arg(short, long = "unit")]
        units: Vec<String>,
        /// Also print the annotated telegram.
        #[arg(short, long)]
        explain: bool,
    },
    /// List the registered drivers.
    Drivers,
}

fn parse_unit(arg: &str) -> Result<Unit> {
    match arg.split_once('=') {
        Some((quantity, unit)) => {
            let quantity: Quantity = quantity.parse()?;
            let unit: Unit = unit.parse()?;
            if unit.quantity() != quantity {
                bail!("unit {unit} is not a unit of {quantity:?}");
            }
            Ok(unit)
        }
        None => Ok(arg.parse()?),
    }
}

fn main() -> Result<()> {
    init_logger();

    let cli = Cli::parse();
    run(cli).map_err(|e| {
        log_error(&format!("{e:#}"));
        e
    })
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Decode {
            hex,
            driver,
            name,
            id,
            config,
            offset,
            units,
            explain,
        } => {
            let (info, mut output_units) = match config {
                Some(path) => {
                    let config = Config::load(&path)?;
                    let info = config
                        .meter(&name)
                        .cloned()
                        .with_context(|| format!("meter '{name}' not in {}", path.display()))?;
                    (info, config.output_units())
                }
                None => (MeterInfo::new(name, driver, id), OutputUnits::new()),
            };
            for arg in &units {
                output_units.prefer(parse_unit(arg)?);
            }

            let bytes = decode_hex(&hex)?;
            let mut telegram = Telegram::parse_at(bytes, offset)?;
            log_info(&format!(
                "scanned {} records for meter '{}'",
                telegram.records().len(),
                info.name
            ));

            let mut meter = create_meter(info)?;
            meter.handle_telegram(&mut telegram);
            log_analysis(&meter.info().name, &telegram.analyse());

            if explain {
                print!("{}", telegram.analyse());
            }
            let reading = meter.render(&output_units)?;
            println!("{}", serde_json::to_string_pretty(&reading.to_json())?);
        }
        Commands::Drivers => {
            for name in registered_drivers() {
                if let Some(driver) = lookup_driver(name) {
                    println!(
                        "{name}\t{}\t{:?}\t{:?}",
                        driver.meter_type.media(),
                        driver.link_modes,
                        driver.security_mode
                    );
                }
            }
        }
    }

    Ok(())
}
