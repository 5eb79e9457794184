use anyhow::bail;
use parking_shared::telemetry;

use crate::cli::Cli;

const APP_NAME: &str = "parking_app_client";

pub fn init(cli: &Cli) -> anyhow::Result<()> {
    if !cli.is_to_std_out {
        match init_to_file(cli) {
            Ok(()) => return Ok(()),
            Err(e) => {
                // Print error and fall though to logging to stdout
                eprintln!("Failed to start logging to file: {e}");
            }
        }
    }

    match tracing_subscriber::fmt().try_init() {
        Ok(()) => Ok(()),
        Err(e) => {
            bail!("Failed to start tracing. Error: {e}");
        }
    }
}

fn init_to_file(cli: &Cli) -> anyhow::Result<()> {
    let (file, filename) = telemetry::create_trace_file(&cli.log_folder, APP_NAME)?;
    let subscriber = telemetry::get_subscriber(APP_NAME.into(), "zbus=warn,info", file);
    match telemetry::init_subscriber(subscriber) {
        Ok(()) => {
            println!("Tracing started to file {filename:?}");
            Ok(())
        }
        Err(e) => {
            bail!("Failed to start tracing to file. Error: {e}");
        }
    }
}
