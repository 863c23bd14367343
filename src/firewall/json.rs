use serde::de::{self, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/*-------------------------------------------------------------------------------------------------
  Alias API Request Bodies
-------------------------------------------------------------------------------------------------*/

/// Body of the `addItem` and `setItem` requests.
#[derive(Debug, Eq, PartialEq, Serialize)]
pub struct JsonAliasRequest<'a> {
    pub alias: JsonAlias<'a>,
}

#[derive(Debug, Eq, PartialEq, Serialize)]
pub struct JsonAlias<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub alias_type: &'a str,
    pub enabled: &'a str,
    /// Newline-separated member list.
    pub content: String,
}

/*-------------------------------------------------------------------------------------------------
  Alias API Responses
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  getAliasUUID
--------------------------------------------------------------------------------------*/

/// The firewall answers `{"uuid": "..."}` for a known alias and an empty list (or object) for an
/// unknown one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum JsonAliasUuid {
    Found { uuid: String },
    NotFound(IgnoredAny),
}

/*--------------------------------------------------------------------------------------
  getItem
--------------------------------------------------------------------------------------*/

#[derive(Debug, Deserialize)]
pub struct JsonAliasItem {
    pub alias: JsonAliasItemBody,
}

#[derive(Debug, Deserialize)]
pub struct JsonAliasItemBody {
    /// Alias members keyed by value.
    #[serde(default, deserialize_with = "deserialize_content")]
    pub content: BTreeMap<String, JsonAliasContentEntry>,
}

impl JsonAliasItemBody {
    /// Values of the entries currently selected as alias members.
    pub fn selected_values(&self) -> Vec<&str> {
        self.content
            .values()
            .filter(|entry| entry.selected)
            .map(|entry| entry.value.as_str())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct JsonAliasContentEntry {
    pub value: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub selected: bool,
}

/*--------------------------------------------------------------------------------------
  addItem / setItem
--------------------------------------------------------------------------------------*/

#[derive(Debug, Deserialize)]
pub struct JsonWriteResponse {
    pub result: String,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub validations: Option<serde_json::Value>,
}

/*--------------------------------------------------------------------------------------
  reconfigure
--------------------------------------------------------------------------------------*/

#[derive(Debug, Deserialize)]
pub struct JsonReconfigureResponse {
    pub status: String,
}

/*-------------------------------------------------------------------------------------------------
  Field Formats
-------------------------------------------------------------------------------------------------*/

/// An alias without members reports its content as an empty list instead of an empty object.
fn deserialize_content<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, JsonAliasContentEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Content {
        Entries(BTreeMap<String, JsonAliasContentEntry>),
        List(Vec<IgnoredAny>),
    }

    match Content::deserialize(deserializer)? {
        Content::Entries(entries) => Ok(entries),
        Content::List(values) if values.is_empty() => Ok(BTreeMap::new()),
        Content::List(values) => Err(de::Error::invalid_length(
            values.len(),
            &"an object of alias entries or an empty list",
        )),
    }
}

/// Accept `1`/`0`, `true`/`false`, and `"1"`/`"0"` flags.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Str(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(flag) => flag,
        Flag::Int(flag) => flag != 0,
        Flag::Str(flag) => matches!(flag.trim(), "1" | "true" | "yes"),
    })
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_str, to_value};

    #[test]
    fn test_alias_request_body() {
        let request = JsonAliasRequest {
            alias: JsonAlias {
                name: "Google_API_Alias",
                alias_type: "network",
                enabled: "1",
                content: "8.8.4.0/24\n8.8.8.0/24".to_string(),
            },
        };

        assert_eq!(
            to_value(&request).unwrap(),
            serde_json::json!({
                "alias": {
                    "name": "Google_API_Alias",
                    "type": "network",
                    "enabled": "1",
                    "content": "8.8.4.0/24\n8.8.8.0/24"
                }
            })
        );
    }

    #[test]
    fn test_alias_uuid_found() {
        let lookup: JsonAliasUuid =
            from_str(r#"{"uuid": "0d4b1e2c-1111-2222-3333-444455556666"}"#).unwrap();
        assert!(
            matches!(lookup, JsonAliasUuid::Found { uuid } if uuid == "0d4b1e2c-1111-2222-3333-444455556666")
        );
    }

    #[test]
    fn test_alias_uuid_not_found() {
        assert!(matches!(
            from_str::<JsonAliasUuid>("[]").unwrap(),
            JsonAliasUuid::NotFound(_)
        ));
        assert!(matches!(
            from_str::<JsonAliasUuid>("{}").unwrap(),
            JsonAliasUuid::NotFound(_)
        ));
    }

    #[test]
    fn test_alias_item_content() {
        let item: JsonAliasItem = from_str(
            r#"{
              "alias": {
                "enabled": "1",
                "name": "Google_API_Alias",
                "content": {
                  "8.8.4.0/24": {"value": "8.8.4.0/24", "selected": 1},
                  "8.8.8.0/24": {"value": "8.8.8.0/24", "selected": true},
                  "__other": {"value": "192.0.2.0/24", "selected": 0}
                }
              }
            }"#,
        )
        .unwrap();

        assert_eq!(
            item.alias.selected_values(),
            vec!["8.8.4.0/24", "8.8.8.0/24"]
        );
    }

    #[test]
    fn test_alias_item_empty_content() {
        let item: JsonAliasItem = from_str(r#"{"alias": {"content": []}}"#).unwrap();
        assert!(item.alias.selected_values().is_empty());

        let item: JsonAliasItem = from_str(r#"{"alias": {}}"#).unwrap();
        assert!(item.alias.selected_values().is_empty());
    }

    #[test]
    fn test_alias_item_content_list_must_be_empty() {
        assert!(from_str::<JsonAliasItem>(r#"{"alias": {"content": ["8.8.8.0/24"]}}"#).is_err());
    }

    #[test]
    fn test_flag_formats() {
        for (json, expected) in [
            (r#"{"value": "a", "selected": 1}"#, true),
            (r#"{"value": "a", "selected": 0}"#, false),
            (r#"{"value": "a", "selected": "1"}"#, true),
            (r#"{"value": "a", "selected": "0"}"#, false),
            (r#"{"value": "a", "selected": false}"#, false),
            (r#"{"value": "a"}"#, false),
        ] {
            let entry: JsonAliasContentEntry = from_str(json).unwrap();
            assert_eq!(entry.selected, expected, "{json}");
        }
    }

    #[test]
    fn test_write_responses() {
        let saved: JsonWriteResponse =
            from_str(r#"{"result": "saved", "uuid": "0d4b1e2c"}"#).unwrap();
        assert_eq!(saved.result, "saved");
        assert_eq!(saved.uuid.as_deref(), Some("0d4b1e2c"));

        let failed: JsonWriteResponse = from_str(
            r#"{"result": "failed", "validations": {"alias.name": "An alias with this name already exists."}}"#,
        )
        .unwrap();
        assert_eq!(failed.result, "failed");
        assert!(failed.validations.is_some());
    }
}
