use crate::core::config::Config;
use crate::core::errors::{Error, Result};
use crate::core::feed::{FeedSource, HttpFeedSource};
use crate::core::ranges::get_api_ranges;
use crate::firewall::api::{AliasApi, FirewallClient};
use crate::firewall::reconcile::{reconcile, Outcome};
use ipnetwork::IpNetwork;
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};

/*-------------------------------------------------------------------------------------------------
  Simple Interface
-------------------------------------------------------------------------------------------------*/

/// _**Simple library interface**_ runs the whole pipeline with the HTTP feed source and, when
/// alias updates are enabled, the firewall API client built from the [Config].
///
/// ```no_run
/// let config = googleapiips::ConfigBuilder::new()
///     .fw_url("https://192.168.1.1/")
///     .fw_api_key("key")
///     .fw_api_secret("secret")
///     .build()?;
///
/// let report = googleapiips::sync(&config)?;
/// println!("Alias {:?}: {} CIDR blocks", report.alias_outcome, report.ranges.len());
/// # Ok::<(), googleapiips::Error>(())
/// ```
pub fn sync(config: &Config) -> Result<SyncReport> {
    let feeds = HttpFeedSource::new();
    let client = match config.update_fw_alias() {
        true => Some(FirewallClient::new(config)?),
        false => None,
    };
    sync_with(config, &feeds, client.as_ref().map(|client| client as &dyn AliasApi))
}

/*-------------------------------------------------------------------------------------------------
  Sync Report
-------------------------------------------------------------------------------------------------*/

/// What a pipeline run produced.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyncReport {
    /// The computed API ranges, minimal and in ascending order.
    pub ranges: Vec<IpNetwork>,

    /// File the ranges were written to, when file output is enabled.
    pub ips_file: Option<PathBuf>,

    /// Reconciliation outcome, when alias updates are enabled.
    pub alias_outcome: Option<Outcome>,
}

/*-------------------------------------------------------------------------------------------------
  Sync
-------------------------------------------------------------------------------------------------*/

/// Fetch the feeds, compute the API ranges, then write them to the configured file and reconcile
/// the firewall alias as configured. Stops at the first error; the alias is only touched after
/// both feeds were retrieved and the ranges computed.
pub fn sync_with<S: FeedSource + ?Sized>(
    config: &Config,
    feeds: &S,
    api: Option<&dyn AliasApi>,
) -> Result<SyncReport> {
    let ranges = get_api_ranges(config, feeds)?;

    let ips_file = match config.create_ips_file() {
        true => {
            write_ips_file(config.ips_file_name(), &ranges)?;
            Some(config.ips_file_name().to_path_buf())
        }
        false => None,
    };

    let alias_outcome = match (config.update_fw_alias(), api) {
        (true, Some(api)) => Some(reconcile(api, config.alias_name(), &ranges)?),
        (true, None) => {
            return Err(Error::Configuration(
                "update_fw_alias is enabled but no firewall API client is available".to_string(),
            ))
        }
        (false, _) => None,
    };

    Ok(SyncReport {
        ranges,
        ips_file,
        alias_outcome,
    })
}

/*-------------------------------------------------------------------------------------------------
  IPs File
-------------------------------------------------------------------------------------------------*/

/// Write one CIDR block per line, replacing any existing file.
pub fn write_ips_file(path: &Path, ranges: &[IpNetwork]) -> Result<()> {
    let mut contents = String::new();
    for range in ranges {
        contents.push_str(&range.to_string());
        contents.push('\n');
    }

    fs::write(path, contents)
        .inspect(|_| info!("Wrote API IPs to file {:?}", path))
        .map_err(Error::from)
        .inspect_err(|error| error!("Failed to write API IPs to {:?}: {}", path, error))
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
