use clap::Parser;
use std::path::PathBuf;

/*-------------------------------------------------------------------------------------------------
  Command Line Interface (CLI) Arguments
-------------------------------------------------------------------------------------------------*/

/// Settings not given on the command line come from the `GOOGLEAPIIPS_*` environment variables,
/// then the config file, then the built-in defaults.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Sync the IP ranges used by Google APIs and services into an OPNsense firewall alias.",
    long_about = None
)]
pub struct Args {
    /// Read settings from this JSON config file
    #[arg(short = 'c', long = "config")]
    pub config_file: Option<PathBuf>,

    /// URL of the feed listing every Google IP range
    #[arg(long)]
    pub all_ranges_url: Option<String>,

    /// URL of the feed listing the Google Cloud customer ranges to exclude
    #[arg(long)]
    pub excluded_ranges_url: Option<String>,

    /// Write the API ranges to this file, one CIDR block per line
    #[arg(short = 'o', long)]
    pub output_file: Option<PathBuf>,

    /// Do not create or update the firewall alias
    #[arg(long)]
    pub no_update_alias: bool,

    /// Base URL of the OPNsense firewall (e.g. https://192.168.1.1)
    #[arg(long)]
    pub fw_url: Option<String>,

    /// Firewall API key
    #[arg(long)]
    pub api_key: Option<String>,

    /// Firewall API secret
    #[arg(long)]
    pub api_secret: Option<String>,

    /// Name of the firewall alias holding the API ranges
    #[arg(short = 'a', long)]
    pub alias_name: Option<String>,

    /// Do not verify the firewall's TLS certificate
    #[arg(short = 'k', long)]
    pub insecure: bool,

    /// Append log messages to this file instead of writing them to stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Logging level: DEBUG, INFO, WARNING, ERROR, or CRITICAL
    #[arg(short = 'l', long)]
    pub log_level: Option<String>,

    /// Print a summary table of the computed ranges
    #[arg(long)]
    pub summary: bool,
}
