use crate::cli;
use googleapiips::{Config, ConfigBuilder, Result};
use log::debug;
use std::path::PathBuf;

/*-------------------------------------------------------------------------------------------------
  Core functions
-------------------------------------------------------------------------------------------------*/

/// Config file read when `--config` is not given: the first of `config.json`, `config.yaml`, and
/// `config.yml` that exists in the per-user config directory.
pub fn default_config_file() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?.join("googleapiips");
    ["config.json", "config.yaml", "config.yml"]
        .iter()
        .map(|file_name| config_dir.join(file_name))
        .find(|path| path.is_file())
}

/*--------------------------------------------------------------------------------------
  Build the run configuration from CLI arguments
--------------------------------------------------------------------------------------*/

/// Layer the config file, the environment, and the command line arguments over the defaults.
pub fn build_config(args: &cli::Args) -> Result<Config> {
    let mut builder = ConfigBuilder::default();

    if let Some(config_file) = args.config_file.clone().or_else(default_config_file) {
        debug!("Reading config file {:?}", config_file);
        builder.config_file(config_file)?;
    }

    builder.apply_environment();

    if let Some(url) = &args.all_ranges_url {
        builder.all_ranges_url(url);
    }
    if let Some(url) = &args.excluded_ranges_url {
        builder.excluded_ranges_url(url);
    }
    if let Some(output_file) = &args.output_file {
        builder.create_ips_file(true).ips_file_name(output_file);
    }
    if args.no_update_alias {
        builder.update_fw_alias(false);
    }
    if let Some(fw_url) = &args.fw_url {
        builder.fw_url(fw_url);
    }
    if let Some(api_key) = &args.api_key {
        builder.fw_api_key(api_key);
    }
    if let Some(api_secret) = &args.api_secret {
        builder.fw_api_secret(api_secret);
    }
    if let Some(alias_name) = &args.alias_name {
        builder.alias_name(alias_name);
    }
    if args.insecure {
        builder.fw_check_cert(false);
    }
    if let Some(log_file) = &args.log_file {
        builder.log_file(log_file);
    }
    if let Some(log_level) = &args.log_level {
        builder.log_level(log_level);
    }

    builder.build()
}
