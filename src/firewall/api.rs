use crate::core::config::Config;
use crate::core::errors::{summarize, Error, Result};
use crate::firewall::json::{
    JsonAlias, JsonAliasItem, JsonAliasRequest, JsonAliasUuid, JsonReconfigureResponse,
    JsonWriteResponse,
};
use log::{debug, error};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

/*-------------------------------------------------------------------------------------------------
  Alias Records
-------------------------------------------------------------------------------------------------*/

/// Result of resolving an alias name to the firewall's internal identifier.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AliasLookup {
    Found(String),
    NotFound,
}

/// Desired state of a network alias.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AliasDefinition {
    pub name: String,
    /// Member values in the order they are sent to the firewall.
    pub content: Vec<String>,
}

/// Outcome of an `addItem` or `setItem` call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WriteResult {
    pub ok: bool,
    pub message: String,
}

/// Outcome of a `reconfigure` call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApplyResult {
    pub ok: bool,
    pub message: String,
}

/*-------------------------------------------------------------------------------------------------
  Alias API
-------------------------------------------------------------------------------------------------*/

/// The firewall alias management operations used to reconcile an alias.
pub trait AliasApi {
    /// `GET alias/getAliasUUID/<name>`
    fn lookup(&self, name: &str) -> Result<AliasLookup>;

    /// `GET alias/getItem/<uuid>`; the values currently selected as alias members.
    fn get_content(&self, uuid: &str) -> Result<Vec<String>>;

    /// `POST alias/addItem/`
    fn add(&self, alias: &AliasDefinition) -> Result<WriteResult>;

    /// `POST alias/setItem/<uuid>`
    fn set(&self, uuid: &str, alias: &AliasDefinition) -> Result<WriteResult>;

    /// `POST alias/reconfigure`; applies pending alias changes to the running configuration.
    fn reconfigure(&self) -> Result<ApplyResult>;
}

/*-------------------------------------------------------------------------------------------------
  Firewall Client
-------------------------------------------------------------------------------------------------*/

/// Blocking client for the firewall alias API. Every request carries the configured API key and
/// secret as HTTP basic credentials.
#[derive(Debug, Clone)]
pub struct FirewallClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl FirewallClient {
    /// Build a client from the firewall settings in the [Config].
    pub fn new(config: &Config) -> Result<Self> {
        let missing = |name: &str| Error::Configuration(format!("{name} is not set"));

        let base_url = config.api_base_url().ok_or_else(|| missing("fw_url"))?;
        let api_key = config.fw_api_key().ok_or_else(|| missing("fw_api_key"))?;
        let api_secret = config.fw_api_secret().ok_or_else(|| missing("fw_api_secret"))?;

        if !config.fw_check_cert() {
            debug!("TLS certificate verification disabled for {}", base_url);
        }

        let client = Client::builder()
            .danger_accept_invalid_certs(!config.fw_check_cert())
            .build()
            .map_err(|error| Error::Configuration(format!("unable to build HTTP client: {error}")))?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
        })
    }

    /*-------------------------------------------------------------------------
      Private Methods
    -------------------------------------------------------------------------*/

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url, endpoint))
            .basic_auth(&self.api_key, Some(&self.api_secret))
    }

    /// Send a request and decode the JSON response. Transport failures and non-success statuses
    /// are [Error::Fetch]; an undecodable body is [Error::Parse].
    fn call<B, T>(&self, method: Method, endpoint: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        debug!("{} {}", method, endpoint);

        let mut request = self.request(method.clone(), endpoint);
        if let Some(body) = body {
            request = request.json(body);
        }

        let payload = || {
            body.and_then(|body| serde_json::to_string(body).ok())
                .map(|json| format!(" with data '{}'", summarize(&json)))
                .unwrap_or_default()
        };

        let response = request.send().map_err(|error| {
            error!("Failed to make {} API call to endpoint '{}'{}: {}", method, endpoint, payload(), error);
            Error::Fetch {
                url: endpoint.to_string(),
                reason: error.to_string(),
            }
        })?;

        let status = response.status();
        let text = response.text().map_err(|error| Error::Fetch {
            url: endpoint.to_string(),
            reason: error.to_string(),
        })?;

        if !status.is_success() {
            error!(
                "Failed to make {} API call to endpoint '{}'{}. HTTP Status Code: {}. API Response: '{}'",
                method,
                endpoint,
                payload(),
                status.as_u16(),
                summarize(&text)
            );
            return Err(Error::Fetch {
                url: endpoint.to_string(),
                reason: format!("HTTP status {}: {}", status, summarize(&text)),
            });
        }

        debug!("{} {}: {}", status.as_u16(), endpoint, summarize(&text));
        serde_json::from_str(&text).map_err(|error| {
            error!("Unexpected response from endpoint '{}': '{}'", endpoint, summarize(&text));
            Error::Parse {
                url: endpoint.to_string(),
                reason: format!("{error}: {}", summarize(&text)),
            }
        })
    }

    fn write(&self, endpoint: &str, alias: &AliasDefinition) -> Result<WriteResult> {
        let request = alias_request(alias);
        let response: JsonWriteResponse = self.call(Method::POST, endpoint, Some(&request))?;
        Ok(write_result(response))
    }
}

impl AliasApi for FirewallClient {
    fn lookup(&self, name: &str) -> Result<AliasLookup> {
        let endpoint = format!("alias/getAliasUUID/{name}");
        let response: JsonAliasUuid = self.call(Method::GET, &endpoint, None::<&()>)?;
        Ok(match response {
            JsonAliasUuid::Found { uuid } if !uuid.trim().is_empty() => AliasLookup::Found(uuid),
            _ => AliasLookup::NotFound,
        })
    }

    fn get_content(&self, uuid: &str) -> Result<Vec<String>> {
        let endpoint = format!("alias/getItem/{uuid}");
        let response: JsonAliasItem = self.call(Method::GET, &endpoint, None::<&()>)?;
        Ok(response
            .alias
            .selected_values()
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    fn add(&self, alias: &AliasDefinition) -> Result<WriteResult> {
        self.write("alias/addItem/", alias)
    }

    fn set(&self, uuid: &str, alias: &AliasDefinition) -> Result<WriteResult> {
        self.write(&format!("alias/setItem/{uuid}"), alias)
    }

    fn reconfigure(&self) -> Result<ApplyResult> {
        let response: JsonReconfigureResponse =
            self.call(Method::POST, "alias/reconfigure", None::<&()>)?;
        Ok(apply_result(response))
    }
}

/*-------------------------------------------------------------------------------------------------
  Helper Functions
-------------------------------------------------------------------------------------------------*/

pub(crate) fn alias_request(alias: &AliasDefinition) -> JsonAliasRequest<'_> {
    JsonAliasRequest {
        alias: JsonAlias {
            name: &alias.name,
            alias_type: "network",
            enabled: "1",
            content: alias.content.join("\n"),
        },
    }
}

fn write_result(response: JsonWriteResponse) -> WriteResult {
    let ok = response.result == "saved";
    let message = match (&response.uuid, &response.validations) {
        (_, Some(validations)) => format!("result `{}`, validations: {}", response.result, validations),
        (Some(uuid), None) => format!("result `{}`, uuid {}", response.result, uuid),
        (None, None) => format!("result `{}`", response.result),
    };
    WriteResult { ok, message }
}

fn apply_result(response: JsonReconfigureResponse) -> ApplyResult {
    ApplyResult {
        ok: response.status.trim().eq_ignore_ascii_case("ok"),
        message: format!("status `{}`", response.status.trim()),
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
