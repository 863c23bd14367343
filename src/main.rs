mod cli;

use clap::Parser;
use log::{error, info, LevelFilter};
use std::process::ExitCode;

/*-------------------------------------------------------------------------------------------------
  Main CLI Function
-------------------------------------------------------------------------------------------------*/

fn main() -> ExitCode {
    let args = cli::Args::parse();

    let config = match cli::build_config(&args) {
        Ok(config) => config,
        Err(error) => {
            // Logging is not configured yet
            if cli::log::init_stderr(LevelFilter::Info).is_err() {
                eprintln!("Error: {error}");
            }
            error!("{error}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(error) = cli::log::init(&config) {
        eprintln!("Error: {error}");
        return ExitCode::FAILURE;
    }

    info!("Starting Google API IPs sync");

    match googleapiips::sync(&config) {
        Ok(report) => {
            cli::log::sync_report(&config, &report);

            if report.ips_file.is_none() && report.alias_outcome.is_none() {
                cli::output::ranges_in_cidr_format(&report.ranges);
            }

            if args.summary {
                cli::output::summary(&report);
            }

            ExitCode::SUCCESS
        }
        Err(error) => {
            error!("{error}");
            if !cli::log::errors_reach_stderr(&config) {
                eprintln!("Error: {error}");
            }
            ExitCode::FAILURE
        }
    }
}
