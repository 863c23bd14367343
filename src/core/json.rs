use crate::core::errors::{Error, Result};
use ipnetwork::IpNetwork;
use serde::Deserialize;
use serde_json::{Map, Value};

/*-------------------------------------------------------------------------------------------------
  Parse JSON
-------------------------------------------------------------------------------------------------*/

/// Decode an IP ranges feed document. The `url` is only used to give errors some context.
pub fn parse(url: &str, json: &str) -> Result<Feed> {
    let json_feed: JsonFeed = serde_json::from_str(json).map_err(|error| Error::Parse {
        url: url.to_string(),
        reason: error.to_string(),
    })?;

    let prefixes = json_feed
        .prefixes
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_entry(url, index, entry))
        .collect::<Result<Vec<IpNetwork>>>()?;

    if prefixes.is_empty() {
        return Err(Error::Parse {
            url: url.to_string(),
            reason: "feed contains no prefixes".to_string(),
        });
    }

    Ok(Feed {
        sync_token: json_feed.sync_token,
        creation_time: json_feed.creation_time,
        prefixes,
    })
}

/// Extract the CIDR value from a single `prefixes` entry.
///
/// Entries in the published feeds look like `{"ipv4Prefix": "8.8.4.0/24"}`, optionally tagged with
/// more keys (`"service"`, `"scope"`). The CIDR comes from the key naming a prefix; an entry with a
/// single string value uses that value whatever its key.
fn parse_entry(url: &str, index: usize, entry: &Map<String, Value>) -> Result<IpNetwork> {
    let parse_error = |reason: String| Error::Parse {
        url: url.to_string(),
        reason: format!("prefixes[{index}]: {reason}"),
    };

    let value = entry
        .iter()
        .find(|(key, _)| key.ends_with("Prefix") || key.ends_with("prefix"))
        .map(|(_, value)| value)
        .or_else(|| match entry.len() {
            1 => entry.values().next(),
            _ => None,
        })
        .ok_or_else(|| parse_error(format!("no prefix value in {}", Value::Object(entry.clone()))))?;

    let cidr = value
        .as_str()
        .ok_or_else(|| parse_error(format!("prefix value {value} is not a string")))?;

    cidr.trim()
        .parse::<IpNetwork>()
        .map_err(|error| parse_error(format!("invalid CIDR {cidr:?}: {error}")))
}

/*-------------------------------------------------------------------------------------------------
  Feed
-------------------------------------------------------------------------------------------------*/

/// A decoded IP ranges feed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Feed {
    /// Publication token, when the feed provides one.
    pub sync_token: Option<String>,

    /// Publication time, when the feed provides one.
    pub creation_time: Option<String>,

    /// Every prefix listed in the feed, in document order.
    pub prefixes: Vec<IpNetwork>,
}

/*-------------------------------------------------------------------------------------------------
  JSON Data Structures
-------------------------------------------------------------------------------------------------*/

#[derive(Debug, Deserialize)]
struct JsonFeed {
    #[serde(rename = "syncToken", default)]
    sync_token: Option<String>,

    #[serde(rename = "creationTime", default)]
    creation_time: Option<String>,

    prefixes: Vec<Map<String, Value>>,
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const URL: &str = "https://www.gstatic.com/ipranges/goog.json";

    pub(crate) fn feed_json(cidrs: &[&str]) -> String {
        let prefixes: Vec<Value> = cidrs
            .iter()
            .map(|cidr| {
                let key = if cidr.contains(':') {
                    "ipv6Prefix"
                } else {
                    "ipv4Prefix"
                };
                let mut entry = Map::new();
                entry.insert(key.to_string(), Value::from(*cidr));
                Value::Object(entry)
            })
            .collect();

        serde_json::json!({
            "syncToken": "1729123456789",
            "creationTime": "2024-10-17T00:00:00.000000",
            "prefixes": prefixes,
        })
        .to_string()
    }

    #[test]
    fn test_parse_all_ranges_feed() {
        let json = r#"{
          "syncToken": "1729123456789",
          "creationTime": "2024-10-17T00:00:00.000000",
          "prefixes": [
            {"ipv4Prefix": "8.8.4.0/24"},
            {"ipv4Prefix": "8.8.8.0/24"},
            {"ipv6Prefix": "2001:4860::/32"}
          ]
        }"#;

        let feed = parse(URL, json).unwrap();
        assert_eq!(feed.sync_token.as_deref(), Some("1729123456789"));
        assert_eq!(
            feed.creation_time.as_deref(),
            Some("2024-10-17T00:00:00.000000")
        );
        assert_eq!(
            feed.prefixes,
            vec![
                "8.8.4.0/24".parse::<IpNetwork>().unwrap(),
                "8.8.8.0/24".parse().unwrap(),
                "2001:4860::/32".parse().unwrap(),
            ]
        );
    }

    #[test]
    fn test_parse_tagged_entries() {
        let json = r#"{
          "prefixes": [
            {"ipv4Prefix": "34.1.208.0/20", "service": "Google Cloud", "scope": "africa-south1"},
            {"scope": "us-east1", "service": "Google Cloud", "ipv6Prefix": "2600:1900:4010::/44"}
          ]
        }"#;

        let feed = parse(URL, json).unwrap();
        assert_eq!(feed.sync_token, None);
        assert_eq!(
            feed.prefixes,
            vec![
                "34.1.208.0/20".parse::<IpNetwork>().unwrap(),
                "2600:1900:4010::/44".parse().unwrap(),
            ]
        );
    }

    #[test]
    fn test_parse_single_key_entry_with_any_key_name() {
        let feed = parse(URL, r#"{"prefixes": [{"cidr": "10.0.0.0/8"}]}"#).unwrap();
        assert_eq!(feed.prefixes, vec!["10.0.0.0/8".parse::<IpNetwork>().unwrap()]);
    }

    #[test]
    fn test_parse_missing_prefixes_key() {
        let error = parse(URL, r#"{"syncToken": "1"}"#).unwrap_err();
        assert!(matches!(error, Error::Parse { .. }));
        assert!(error.to_string().contains("prefixes"));
    }

    #[test]
    fn test_parse_entry_without_prefix_value() {
        let json = r#"{"prefixes": [{"service": "Google Cloud", "scope": "us-east1"}]}"#;
        let error = parse(URL, json).unwrap_err();
        assert!(matches!(error, Error::Parse { .. }));
        assert!(error.to_string().contains("prefixes[0]"));
    }

    #[test]
    fn test_parse_entry_with_non_string_value() {
        let error = parse(URL, r#"{"prefixes": [{"ipv4Prefix": 42}]}"#).unwrap_err();
        assert!(matches!(error, Error::Parse { .. }));
    }

    #[test]
    fn test_parse_invalid_cidr() {
        let json = r#"{"prefixes": [{"ipv4Prefix": "8.8.8.0/24"}, {"ipv4Prefix": "8.8.8.300/24"}]}"#;
        let error = parse(URL, json).unwrap_err();
        assert!(matches!(error, Error::Parse { .. }));
        assert!(error.to_string().contains("prefixes[1]"));
    }

    #[test]
    fn test_parse_empty_feed() {
        let error = parse(URL, r#"{"prefixes": []}"#).unwrap_err();
        assert!(matches!(error, Error::Parse { .. }));
    }

    #[test]
    fn test_feed_json_helper() {
        let feed = parse(URL, &feed_json(&["10.0.0.0/8", "2001:db8::/32"])).unwrap();
        assert_eq!(feed.prefixes.len(), 2);
    }
}
