/*-------------------------------------------------------------------------------------------------
  Errors and Results
-------------------------------------------------------------------------------------------------*/

/// Maximum number of characters of a response body carried in an error message.
const SUMMARY_LENGTH: usize = 200;

/// Error type used throughout the crate. Every variant is fatal to a run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport failure, non-success HTTP status, or a body that is not JSON.
    #[error("failed to fetch `{url}`: {reason}")]
    Fetch { url: String, reason: String },

    /// The response was JSON, but not in the expected shape.
    #[error("unexpected content from `{url}`: {reason}")]
    Parse { url: String, reason: String },

    /// The management API completed the request but reported a logical failure.
    #[error("API call to `{endpoint}` failed: {message}")]
    ApiResponse { endpoint: String, message: String },

    /// The alias object was written, but the device did not apply the change.
    #[error("alias `{alias}` was saved but not applied: {source}")]
    Apply {
        alias: String,
        #[source]
        source: Box<Error>,
    },

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("invalid API range calculation: {0}")]
    Ranges(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/*--------------------------------------------------------------------------------------
  Payload Summary
--------------------------------------------------------------------------------------*/

/// Shorten a response body for inclusion in logs and error messages.
pub(crate) fn summarize(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= SUMMARY_LENGTH {
        body.to_string()
    } else {
        let mut summary: String = body.chars().take(SUMMARY_LENGTH).collect();
        summary.push_str("...");
        summary
    }
}

/*--------------------------------------------------------------------------------------
  Log Error Function
--------------------------------------------------------------------------------------*/

#[cfg(test)]
pub(crate) fn log_error(error: &Error) {
    log::error!("{}", error);
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_short_body() {
        assert_eq!(summarize("  {\"result\":\"failed\"}\n"), "{\"result\":\"failed\"}");
    }

    #[test]
    fn test_summarize_long_body() {
        let body = "x".repeat(500);
        let summary = summarize(&body);
        assert_eq!(summary.len(), SUMMARY_LENGTH + 3);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_apply_error_keeps_source() {
        let error = Error::Apply {
            alias: "Google_API_Alias".to_string(),
            source: Box::new(Error::ApiResponse {
                endpoint: "alias/reconfigure".to_string(),
                message: "status `failed`".to_string(),
            }),
        };
        let message = error.to_string();
        assert!(message.contains("Google_API_Alias"));
        assert!(message.contains("alias/reconfigure"));
        assert!(std::error::Error::source(&error).is_some());
    }
}
