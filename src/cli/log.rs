use googleapiips::{Config, Error, Result, SyncReport};
use log::{info, LevelFilter};
use std::path::Path;

/*-------------------------------------------------------------------------------------------------
  Logger Setup
-------------------------------------------------------------------------------------------------*/

/// Timestamp format of log file lines.
const LOG_FILE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Send log records to the configured log file, or to stderr when no log file is set.
pub fn init(config: &Config) -> Result<()> {
    match config.log_file() {
        Some(log_file) => init_log_file(log_file, config.log_level()),
        None => init_stderr(config.log_level()),
    }
}

/// True when error records are written to stderr by the logger.
pub fn errors_reach_stderr(config: &Config) -> bool {
    config.log_file().is_none() && config.log_level() >= LevelFilter::Error
}

/// Log records from this crate to stderr.
pub fn init_stderr(level: LevelFilter) -> Result<()> {
    let verbosity: usize = match level {
        LevelFilter::Off | LevelFilter::Error => 0,
        LevelFilter::Warn => 1,
        LevelFilter::Info => 2,
        LevelFilter::Debug => 3,
        LevelFilter::Trace => 4,
    };

    stderrlog::new()
        .module(env!("CARGO_CRATE_NAME"))
        .quiet(level == LevelFilter::Off)
        .verbosity(verbosity)
        .init()
        .map_err(|error| Error::Configuration(format!("unable to initialize logging: {error}")))
}

/// Append timestamped log records to `log_file`.
fn init_log_file(log_file: &Path, level: LevelFilter) -> Result<()> {
    let file = fern::log_file(log_file).map_err(|error| {
        Error::Configuration(format!("unable to open log file {log_file:?}: {error}"))
    })?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {} - {}",
                chrono::Local::now().format(LOG_FILE_DATETIME_FORMAT),
                record.level(),
                message
            ))
        })
        .level(LevelFilter::Warn)
        .level_for(env!("CARGO_CRATE_NAME"), level)
        .chain(file)
        .apply()
        .map_err(|error| Error::Configuration(format!("unable to initialize logging: {error}")))
}

/*-------------------------------------------------------------------------------------------------
  Logging Functions
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  Sync Report
--------------------------------------------------------------------------------------*/

pub fn sync_report(config: &Config, report: &SyncReport) {
    if let Some(ips_file) = &report.ips_file {
        info!("Saved {} CIDR blocks to {:?}", report.ranges.len(), ips_file);
    }

    if let Some(outcome) = report.alias_outcome {
        info!("Alias '{}' {}", config.alias_name(), outcome);
    }
}
