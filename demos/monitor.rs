// Live meter monitor
//
// Finds an N56FU meter (or uses the given port) and keeps printing its reading
// on one line until interrupted.

use clap::Parser;
use n56fu_rs::{MeterConnector, MeterConnectorError};
use std::io::{self, Write};

#[derive(Parser)]
#[command(name = "monitor")]
#[command(version = "1.0")]
#[command(about = "Show live readings from an N56FU multimeter")]
struct Args {
    /// Serial port of the meter, found automatically when left out
    #[arg(short, long)]
    port: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, help = "Show debug information and detailed logs")]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    let connector = MeterConnector::new();
    let mut meter = match connector.connect(args.port.as_deref()) {
        Ok(meter) => meter,
        Err(MeterConnectorError::DeviceNotFound) => {
            println!("No meter found\n");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    println!("Reading {} on {}. Press Ctrl+C to stop\n", meter.id(), meter.port());

    loop {
        print!("  {}\r", meter.get_reading(true));
        io::stdout().flush()?;
    }
}
