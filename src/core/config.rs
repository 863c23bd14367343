use crate::core::errors::{Error, Result};
use log::{info, warn, LevelFilter};
use reqwest::Url;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/*-------------------------------------------------------------------------------------------------
  Defaults
-------------------------------------------------------------------------------------------------*/

pub const DEFAULT_ALL_RANGES_URL: &str = "https://www.gstatic.com/ipranges/goog.json";
pub const DEFAULT_EXCLUDED_RANGES_URL: &str = "https://www.gstatic.com/ipranges/cloud.json";
pub const DEFAULT_IPS_FILE_NAME: &str = "api-ips.txt";
pub const DEFAULT_ALIAS_NAME: &str = "Google_API_Alias";
pub const DEFAULT_LOG_LEVEL: &str = "INFO";

/// Longest alias name the firewall accepts.
const MAX_ALIAS_NAME_LENGTH: usize = 32;

/*-------------------------------------------------------------------------------------------------
  Config Builder
-------------------------------------------------------------------------------------------------*/

/// A builder for the run-wide [Config]. Values are layered: documented defaults, then an optional
/// JSON or YAML config file ([ConfigBuilder::config_file]), then `GOOGLEAPIIPS_*` environment
/// variables ([ConfigBuilder::new]), then any setter calls (command line arguments).
///
/// ```
/// let config = googleapiips::ConfigBuilder::default()
///     .update_fw_alias(false)
///     .create_ips_file(true)
///     .ips_file_name("/tmp/api-ips.txt")
///     .build()
///     .unwrap();
///
/// assert!(config.create_ips_file());
/// assert_eq!(config.alias_name(), "Google_API_Alias");
/// ```
#[derive(Clone)]
pub struct ConfigBuilder {
    all_ranges_url: String,
    excluded_ranges_url: String,
    create_ips_file: bool,
    ips_file_name: PathBuf,
    update_fw_alias: bool,
    fw_check_cert: bool,
    fw_url: Option<String>,
    fw_api_key: Option<String>,
    fw_api_secret: Option<String>,
    alias_name: String,
    log_file: Option<PathBuf>,
    log_level: String,
    /// Environment variables whose values could not be parsed; reported by `build()`.
    invalid: Vec<String>,
}

/*--------------------------------------------------------------------------------------
  Config Builder Implementation
--------------------------------------------------------------------------------------*/

impl Default for ConfigBuilder {
    /// Create a new [ConfigBuilder] with default configuration values.
    ///
    /// ```
    /// let builder = googleapiips::ConfigBuilder::default();
    /// let config = builder.clone().update_fw_alias(false).build().unwrap();
    ///
    /// assert_eq!(config.all_ranges_url(), "https://www.gstatic.com/ipranges/goog.json");
    /// assert_eq!(config.excluded_ranges_url(), "https://www.gstatic.com/ipranges/cloud.json");
    /// assert!(config.fw_check_cert());
    /// ```
    fn default() -> Self {
        Self {
            all_ranges_url: DEFAULT_ALL_RANGES_URL.to_string(),
            excluded_ranges_url: DEFAULT_EXCLUDED_RANGES_URL.to_string(),
            create_ips_file: false,
            ips_file_name: PathBuf::from(DEFAULT_IPS_FILE_NAME),
            update_fw_alias: true,
            fw_check_cert: true,
            fw_url: None,
            fw_api_key: None,
            fw_api_secret: None,
            alias_name: DEFAULT_ALIAS_NAME.to_string(),
            log_file: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            invalid: Vec::new(),
        }
    }
}

impl ConfigBuilder {
    /// Create a new [ConfigBuilder] reading initial configuration values from environment
    /// variables when set and default values when the environment variables are not set.
    ///
    /// The environment variables used to set the initial configuration values are:
    /// - `GOOGLEAPIIPS_ALL_RANGES_URL`
    /// - `GOOGLEAPIIPS_EXCLUDED_RANGES_URL`
    /// - `GOOGLEAPIIPS_CREATE_IPS_FILE`
    /// - `GOOGLEAPIIPS_IPS_FILE_NAME`
    /// - `GOOGLEAPIIPS_UPDATE_FW_ALIAS`
    /// - `GOOGLEAPIIPS_FW_CHECK_CERT`
    /// - `GOOGLEAPIIPS_FW_URL`
    /// - `GOOGLEAPIIPS_FW_API_KEY`
    /// - `GOOGLEAPIIPS_FW_API_SECRET`
    /// - `GOOGLEAPIIPS_ALIAS_NAME`
    /// - `GOOGLEAPIIPS_LOG_FILE`
    /// - `GOOGLEAPIIPS_LOG_LEVEL`
    pub fn new() -> Self {
        let mut builder = ConfigBuilder::default();
        builder.apply_environment();
        builder
    }

    /// Overlay the `GOOGLEAPIIPS_*` environment variables onto the current values. Flags accept
    /// `true`/`false`, `yes`/`no`, `on`/`off`, and `1`/`0`; any other value makes
    /// [ConfigBuilder::build] fail.
    pub fn apply_environment(&mut self) -> &mut Self {
        self.all_ranges_url = get_env_var("GOOGLEAPIIPS_ALL_RANGES_URL", self.all_ranges_url.clone());
        self.excluded_ranges_url = get_env_var(
            "GOOGLEAPIIPS_EXCLUDED_RANGES_URL",
            self.excluded_ranges_url.clone(),
        );
        self.create_ips_file = self.get_env_flag("GOOGLEAPIIPS_CREATE_IPS_FILE", self.create_ips_file);
        self.ips_file_name = get_optional_env_var("GOOGLEAPIIPS_IPS_FILE_NAME")
            .map(PathBuf::from)
            .unwrap_or_else(|| self.ips_file_name.clone());
        self.update_fw_alias = self.get_env_flag("GOOGLEAPIIPS_UPDATE_FW_ALIAS", self.update_fw_alias);
        self.fw_check_cert = self.get_env_flag("GOOGLEAPIIPS_FW_CHECK_CERT", self.fw_check_cert);
        self.fw_url = get_optional_env_var("GOOGLEAPIIPS_FW_URL").or(self.fw_url.take());
        self.fw_api_key = get_optional_env_var("GOOGLEAPIIPS_FW_API_KEY").or(self.fw_api_key.take());
        self.fw_api_secret =
            get_optional_env_var("GOOGLEAPIIPS_FW_API_SECRET").or(self.fw_api_secret.take());
        self.alias_name = get_env_var("GOOGLEAPIIPS_ALIAS_NAME", self.alias_name.clone());
        self.log_file = get_optional_env_var("GOOGLEAPIIPS_LOG_FILE")
            .map(PathBuf::from)
            .or(self.log_file.take());
        self.log_level = get_env_var("GOOGLEAPIIPS_LOG_LEVEL", self.log_level.clone());
        self
    }

    /// Get and parse a flag environment variable, recording unparsable values.
    fn get_env_flag(&mut self, env_var: &str, default: bool) -> bool {
        match get_optional_env_var(env_var) {
            None => default,
            Some(value) => parse_flag(&value).unwrap_or_else(|| {
                warn!("Invalid {}: {}", env_var, value);
                self.invalid.push(format!(
                    "invalid {env_var} {value:?}: expected true/false, yes/no, on/off, or 1/0"
                ));
                default
            }),
        }
    }

    /// Overlay the values present in a config file onto the current values. Keys missing from
    /// the file keep their current values; unknown keys are rejected. Files ending in `.json` are
    /// read as JSON, anything else (`config`, `config.yaml`, `config.yml`) as YAML.
    ///
    /// ```yaml
    /// fw_url: https://192.168.1.1/
    /// fw_api_key: key
    /// fw_api_secret: secret
    /// update_fw_alias: yes
    /// ```
    ///
    /// ```json
    /// {
    ///   "fw_url": "https://192.168.1.1/",
    ///   "fw_api_key": "key",
    ///   "fw_api_secret": "secret",
    ///   "alias_name": "Google_API_Alias"
    /// }
    /// ```
    pub fn config_file<P: AsRef<Path>>(&mut self, path: P) -> Result<&mut Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|error| {
            Error::Configuration(format!("unable to read config file {path:?}: {error}"))
        })?;
        let invalid = |error: String| Error::Configuration(format!("invalid config file {path:?}: {error}"));
        let file: ConfigFile = match path.extension().and_then(|extension| extension.to_str()) {
            Some("json") => serde_json::from_str(&contents).map_err(|error| invalid(error.to_string()))?,
            _ => serde_yaml::from_str(&contents).map_err(|error| invalid(error.to_string()))?,
        };
        info!("Loaded configuration from {:?}", path);

        if let Some(value) = file.all_ranges_url {
            self.all_ranges_url = value;
        }
        if let Some(value) = file.excluded_ranges_url {
            self.excluded_ranges_url = value;
        }
        if let Some(value) = file.create_ips_file {
            self.create_ips_file = value.parse("create_ips_file").map_err(invalid)?;
        }
        if let Some(value) = file.ips_file_name {
            self.ips_file_name = value;
        }
        if let Some(value) = file.update_fw_alias {
            self.update_fw_alias = value.parse("update_fw_alias").map_err(invalid)?;
        }
        if let Some(value) = file.fw_check_cert {
            self.fw_check_cert = value.parse("fw_check_cert").map_err(invalid)?;
        }
        if file.fw_url.is_some() {
            self.fw_url = file.fw_url;
        }
        if file.fw_api_key.is_some() {
            self.fw_api_key = file.fw_api_key;
        }
        if file.fw_api_secret.is_some() {
            self.fw_api_secret = file.fw_api_secret;
        }
        if let Some(value) = file.alias_name {
            self.alias_name = value;
        }
        if file.log_file.is_some() {
            self.log_file = file.log_file;
        }
        if let Some(value) = file.log_level {
            self.log_level = value;
        }

        Ok(self)
    }

    /*-------------------------------------------------------------------------
      Setters
    -------------------------------------------------------------------------*/

    /// Set the URL of the feed listing every Google IP range; defaults to
    /// `https://www.gstatic.com/ipranges/goog.json`.
    pub fn all_ranges_url(&mut self, url: &str) -> &mut Self {
        self.all_ranges_url = url.to_string();
        self
    }

    /// Set the URL of the feed listing the ranges assigned to Google Cloud customers; defaults to
    /// `https://www.gstatic.com/ipranges/cloud.json`.
    pub fn excluded_ranges_url(&mut self, url: &str) -> &mut Self {
        self.excluded_ranges_url = url.to_string();
        self
    }

    /// Write the computed ranges to [ConfigBuilder::ips_file_name]; defaults to `false`.
    pub fn create_ips_file(&mut self, create_ips_file: bool) -> &mut Self {
        self.create_ips_file = create_ips_file;
        self
    }

    /// Set the file the computed ranges are written to; defaults to `api-ips.txt`.
    pub fn ips_file_name<P: AsRef<Path>>(&mut self, ips_file_name: P) -> &mut Self {
        self.ips_file_name = ips_file_name.as_ref().to_path_buf();
        self
    }

    /// Create or update the firewall alias; defaults to `true`.
    pub fn update_fw_alias(&mut self, update_fw_alias: bool) -> &mut Self {
        self.update_fw_alias = update_fw_alias;
        self
    }

    /// Verify the firewall's TLS certificate; defaults to `true`.
    pub fn fw_check_cert(&mut self, fw_check_cert: bool) -> &mut Self {
        self.fw_check_cert = fw_check_cert;
        self
    }

    /// Set the firewall's root URL, e.g. `https://192.168.1.1/`.
    pub fn fw_url(&mut self, fw_url: &str) -> &mut Self {
        self.fw_url = Some(fw_url.to_string());
        self
    }

    pub fn fw_api_key(&mut self, fw_api_key: &str) -> &mut Self {
        self.fw_api_key = Some(fw_api_key.to_string());
        self
    }

    pub fn fw_api_secret(&mut self, fw_api_secret: &str) -> &mut Self {
        self.fw_api_secret = Some(fw_api_secret.to_string());
        self
    }

    /// Set the name of the firewall alias to maintain; defaults to `Google_API_Alias`.
    pub fn alias_name(&mut self, alias_name: &str) -> &mut Self {
        self.alias_name = alias_name.to_string();
        self
    }

    /// Append log records to this file instead of writing them to stderr.
    pub fn log_file<P: AsRef<Path>>(&mut self, log_file: P) -> &mut Self {
        self.log_file = Some(log_file.as_ref().to_path_buf());
        self
    }

    /// Set the log level (`OFF`, `ERROR`, `WARN`, `INFO`, `DEBUG`, or `TRACE`); defaults to `INFO`.
    pub fn log_level(&mut self, log_level: &str) -> &mut Self {
        self.log_level = log_level.to_string();
        self
    }

    /*-------------------------------------------------------------------------
      Build Method
    -------------------------------------------------------------------------*/

    /// Validate the configuration values and build an immutable [Config].
    pub fn build(&self) -> Result<Config> {
        if let Some(invalid) = self.invalid.first() {
            return Err(Error::Configuration(invalid.clone()));
        }

        let log_level = parse_log_level(&self.log_level)?;

        validate_url("all_ranges_url", &self.all_ranges_url)?;
        validate_url("excluded_ranges_url", &self.excluded_ranges_url)?;

        if self.create_ips_file && self.ips_file_name.as_os_str().is_empty() {
            return Err(Error::Configuration(
                "ips_file_name must be set when create_ips_file is enabled".to_string(),
            ));
        }

        if self.update_fw_alias {
            let fw_url = required("fw_url", &self.fw_url)?;
            validate_url("fw_url", fw_url)?;
            required("fw_api_key", &self.fw_api_key)?;
            required("fw_api_secret", &self.fw_api_secret)?;
            validate_alias_name(&self.alias_name)?;
        }

        Ok(Config {
            all_ranges_url: self.all_ranges_url.clone(),
            excluded_ranges_url: self.excluded_ranges_url.clone(),
            create_ips_file: self.create_ips_file,
            ips_file_name: self.ips_file_name.clone(),
            update_fw_alias: self.update_fw_alias,
            fw_check_cert: self.fw_check_cert,
            fw_url: self.fw_url.clone(),
            fw_api_key: self.fw_api_key.clone(),
            fw_api_secret: self.fw_api_secret.clone(),
            alias_name: self.alias_name.clone(),
            log_file: self.log_file.clone(),
            log_level,
        })
    }
}

/*-------------------------------------------------------------------------------------------------
  Config
-------------------------------------------------------------------------------------------------*/

/// Validated configuration for a single run. Built once at startup by [ConfigBuilder] and passed
/// by reference to every stage of the pipeline.
#[derive(Clone)]
pub struct Config {
    all_ranges_url: String,
    excluded_ranges_url: String,
    create_ips_file: bool,
    ips_file_name: PathBuf,
    update_fw_alias: bool,
    fw_check_cert: bool,
    fw_url: Option<String>,
    fw_api_key: Option<String>,
    fw_api_secret: Option<String>,
    alias_name: String,
    log_file: Option<PathBuf>,
    log_level: LevelFilter,
}

/*--------------------------------------------------------------------------------------
  Config Implementation
--------------------------------------------------------------------------------------*/

impl Config {
    /*-------------------------------------------------------------------------
      Getters
    -------------------------------------------------------------------------*/

    pub fn all_ranges_url(&self) -> &str {
        &self.all_ranges_url
    }

    pub fn excluded_ranges_url(&self) -> &str {
        &self.excluded_ranges_url
    }

    pub fn create_ips_file(&self) -> bool {
        self.create_ips_file
    }

    pub fn ips_file_name(&self) -> &Path {
        &self.ips_file_name
    }

    pub fn update_fw_alias(&self) -> bool {
        self.update_fw_alias
    }

    pub fn fw_check_cert(&self) -> bool {
        self.fw_check_cert
    }

    pub fn fw_url(&self) -> Option<&str> {
        self.fw_url.as_deref()
    }

    pub fn fw_api_key(&self) -> Option<&str> {
        self.fw_api_key.as_deref()
    }

    pub fn fw_api_secret(&self) -> Option<&str> {
        self.fw_api_secret.as_deref()
    }

    pub fn alias_name(&self) -> &str {
        &self.alias_name
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    /// Base URL of the firewall alias API, `<fw_url>/api/firewall`.
    ///
    /// ```
    /// let config = googleapiips::ConfigBuilder::default()
    ///     .fw_url("https://192.168.1.1/")
    ///     .fw_api_key("key")
    ///     .fw_api_secret("secret")
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(config.api_base_url().as_deref(), Some("https://192.168.1.1/api/firewall"));
    /// ```
    pub fn api_base_url(&self) -> Option<String> {
        self.fw_url
            .as_deref()
            .map(|fw_url| format!("{}/api/firewall", fw_url.trim_end_matches('/')))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("all_ranges_url", &self.all_ranges_url)
            .field("excluded_ranges_url", &self.excluded_ranges_url)
            .field("create_ips_file", &self.create_ips_file)
            .field("ips_file_name", &self.ips_file_name)
            .field("update_fw_alias", &self.update_fw_alias)
            .field("fw_check_cert", &self.fw_check_cert)
            .field("fw_url", &self.fw_url)
            .field("fw_api_key", &self.fw_api_key.as_ref().map(|_| "<redacted>"))
            .field("fw_api_secret", &self.fw_api_secret.as_ref().map(|_| "<redacted>"))
            .field("alias_name", &self.alias_name)
            .field("log_file", &self.log_file)
            .field("log_level", &self.log_level)
            .finish()
    }
}

/*-------------------------------------------------------------------------------------------------
  Config File
-------------------------------------------------------------------------------------------------*/

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(alias = "all_google_ips_url")]
    all_ranges_url: Option<String>,
    #[serde(alias = "google_cloud_ips_url")]
    excluded_ranges_url: Option<String>,
    create_ips_file: Option<FileFlag>,
    ips_file_name: Option<PathBuf>,
    update_fw_alias: Option<FileFlag>,
    fw_check_cert: Option<FileFlag>,
    fw_url: Option<String>,
    fw_api_key: Option<String>,
    fw_api_secret: Option<String>,
    alias_name: Option<String>,
    log_file: Option<PathBuf>,
    log_level: Option<String>,
}

/// A flag written as a boolean, a number, or a word such as `yes`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileFlag {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl FileFlag {
    fn parse(&self, name: &str) -> std::result::Result<bool, String> {
        match self {
            FileFlag::Bool(flag) => Ok(*flag),
            FileFlag::Int(0) => Ok(false),
            FileFlag::Int(1) => Ok(true),
            FileFlag::Int(flag) => Err(format!("invalid {name} {flag}")),
            FileFlag::Str(flag) => parse_flag(flag).ok_or_else(|| format!("invalid {name} {flag:?}")),
        }
    }
}

/*-------------------------------------------------------------------------------------------------
  Helper Functions
-------------------------------------------------------------------------------------------------*/

/// Get an environment variable value or return a default value.
fn get_env_var(env_var: &str, default: String) -> String {
    get_optional_env_var(env_var).unwrap_or(default)
}

/// Get a non-empty environment variable value.
fn get_optional_env_var(env_var: &str) -> Option<String> {
    env::var(env_var)
        .ok()
        .filter(|value| !value.is_empty())
        .inspect(|_| info!("Using {}", env_var))
}

/// Parse a flag spelled `true`/`false`, `yes`/`no`, `on`/`off`, or `1`/`0` (any case).
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Parse a log level name. Besides the `log` crate names, `WARNING` means warn and `CRITICAL`
/// or `FATAL` mean error.
fn parse_log_level(value: &str) -> Result<LevelFilter> {
    match value.trim().to_uppercase().as_str() {
        "WARNING" => Ok(LevelFilter::Warn),
        "CRITICAL" | "FATAL" => Ok(LevelFilter::Error),
        other => other
            .parse::<LevelFilter>()
            .map_err(|_| Error::Configuration(format!("invalid log level: {value:?}"))),
    }
}

fn required<'v>(name: &str, value: &'v Option<String>) -> Result<&'v str> {
    value
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            Error::Configuration(format!(
                "{name} must be set when update_fw_alias is enabled"
            ))
        })
}

fn validate_url(name: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|error| Error::Configuration(format!("invalid {name} {value:?}: {error}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(Error::Configuration(format!(
            "invalid {name} {value:?}: unsupported scheme `{scheme}`"
        ))),
    }
}

fn validate_alias_name(alias_name: &str) -> Result<()> {
    let valid = !alias_name.is_empty()
        && alias_name.len() <= MAX_ALIAS_NAME_LENGTH
        && alias_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(Error::Configuration(format!(
            "invalid alias_name {alias_name:?}: use 1 to {MAX_ALIAS_NAME_LENGTH} letters, digits, or underscores"
        )))
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
