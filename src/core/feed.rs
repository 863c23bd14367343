use crate::core::errors::{summarize, Error, Result};
use crate::core::json::{self, Feed};
use log::{debug, error, info};

/*-------------------------------------------------------------------------------------------------
  Feed Source
-------------------------------------------------------------------------------------------------*/

/// Retrieves the raw JSON text of an IP ranges feed.
pub trait FeedSource {
    /// Get the document at `url`. Implementations return [Error::Fetch] when the document cannot
    /// be retrieved or is not JSON.
    fn get_json(&self, url: &str) -> Result<String>;
}

/*-------------------------------------------------------------------------------------------------
  HTTP Feed Source
-------------------------------------------------------------------------------------------------*/

/// Retrieves feeds over HTTP(S) with a blocking `reqwest` client. Requests are not retried.
#[derive(Debug, Clone, Default)]
pub struct HttpFeedSource {
    client: reqwest::blocking::Client,
}

impl HttpFeedSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FeedSource for HttpFeedSource {
    fn get_json(&self, url: &str) -> Result<String> {
        info!("Get IP ranges feed: GET {}", url);

        let fetch_error = |reason: String| Error::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|error| fetch_error(error.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|error| fetch_error(error.to_string()))?;

        if !status.is_success() {
            return Err(fetch_error(format!(
                "HTTP status {}: {}",
                status,
                summarize(&body)
            )));
        }

        debug!("Received {} bytes from {}", body.len(), url);
        validate_json(body).map_err(fetch_error)
    }
}

/*-------------------------------------------------------------------------------------------------
  Fetch Feed
-------------------------------------------------------------------------------------------------*/

/// Retrieve and decode the feed at `url`.
///
/// A transport failure or a body that is not JSON is an [Error::Fetch]; JSON that lacks the
/// `prefixes` list, or whose entries do not carry a CIDR value, is an [Error::Parse].
pub fn fetch_feed<S: FeedSource + ?Sized>(source: &S, url: &str) -> Result<Feed> {
    let feed = source
        .get_json(url)
        .and_then(|json| json::parse(url, &json))
        .inspect_err(|error| match error {
            Error::Parse { .. } => error!("IP ranges feed has an unexpected format: {}", error),
            _ => error!("Unable to retrieve IP ranges feed: {}", error),
        })?;

    info!(
        "Feed {}: {} prefixes (syncToken: {}, creationTime: {})",
        url,
        feed.prefixes.len(),
        feed.sync_token.as_deref().unwrap_or("-"),
        feed.creation_time.as_deref().unwrap_or("-"),
    );

    Ok(feed)
}

/*-------------------------------------------------------------------------------------------------
  Helper Functions
-------------------------------------------------------------------------------------------------*/

/// Validate a string contains parsable JSON.
fn validate_json(json: String) -> std::result::Result<String, String> {
    serde_json::from_str::<serde::de::IgnoredAny>(&json)
        .map(|_| json)
        .map_err(|error| format!("invalid JSON: {error}"))
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::json::tests::feed_json;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use test_log::test;

    /*----------------------------------------------------------------------------------
      Test Feed Source
    ----------------------------------------------------------------------------------*/

    /// In-memory feed source serving canned documents and recording requested URLs.
    #[derive(Default)]
    pub(crate) struct StaticFeedSource {
        documents: HashMap<String, String>,
        pub(crate) requests: RefCell<Vec<String>>,
    }

    impl StaticFeedSource {
        pub(crate) fn with(mut self, url: &str, json: &str) -> Self {
            self.documents.insert(url.to_string(), json.to_string());
            self
        }

        pub(crate) fn with_prefixes(self, url: &str, cidrs: &[&str]) -> Self {
            self.with(url, &feed_json(cidrs))
        }
    }

    impl FeedSource for StaticFeedSource {
        fn get_json(&self, url: &str) -> Result<String> {
            self.requests.borrow_mut().push(url.to_string());
            let json = self.documents.get(url).cloned().ok_or_else(|| Error::Fetch {
                url: url.to_string(),
                reason: "HTTP status 404 Not Found".to_string(),
            })?;
            validate_json(json).map_err(|reason| Error::Fetch {
                url: url.to_string(),
                reason,
            })
        }
    }

    /*----------------------------------------------------------------------------------
      Fetch Feed
    ----------------------------------------------------------------------------------*/

    const URL: &str = "https://www.gstatic.com/ipranges/goog.json";

    #[test]
    fn test_fetch_feed() {
        let source = StaticFeedSource::default().with_prefixes(URL, &["8.8.8.0/24"]);
        let feed = fetch_feed(&source, URL).unwrap();
        assert_eq!(feed.prefixes, vec!["8.8.8.0/24".parse::<ipnetwork::IpNetwork>().unwrap()]);
        assert_eq!(source.requests.borrow().as_slice(), [URL.to_string()]);
    }

    #[test]
    fn test_fetch_feed_not_found() {
        let source = StaticFeedSource::default();
        let error = fetch_feed(&source, URL).unwrap_err();
        assert!(matches!(error, Error::Fetch { .. }));
    }

    #[test]
    fn test_fetch_feed_invalid_json_is_a_fetch_error() {
        let source = StaticFeedSource::default().with(URL, "<html>Service Unavailable</html>");
        let error = fetch_feed(&source, URL).unwrap_err();
        assert!(matches!(error, Error::Fetch { .. }));
        assert!(error.to_string().contains("invalid JSON"));
    }

    #[test]
    fn test_fetch_feed_wrong_shape_is_a_parse_error() {
        let source = StaticFeedSource::default().with(URL, r#"{"ranges": []}"#);
        let error = fetch_feed(&source, URL).unwrap_err();
        assert!(matches!(error, Error::Parse { .. }));
    }

    #[test]
    fn test_validate_json() {
        assert!(validate_json("{}".to_string()).is_ok());
        assert!(validate_json("{".to_string()).is_err());
    }

    /// Unreachable endpoints surface as fetch errors (nothing listens on the discard port).
    #[test]
    fn test_http_feed_source_connection_refused() {
        let source = HttpFeedSource::new();
        let error = source.get_json("http://127.0.0.1:9/goog.json").unwrap_err();
        assert!(matches!(error, Error::Fetch { .. }));
    }
}
