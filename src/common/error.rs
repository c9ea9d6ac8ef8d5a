//! Error types for the Embedly client and scenario runner
//!
//! Error messages are meant to be read in scenario output, so they say
//! what went wrong and, where possible, how to fix it.

use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Embedly client and scenario runner
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Please set env variable ${var}, an API key is required for this host")]
    MissingApiKey { var: String },

    #[error("You must specify a user agent when constructing an Api client")]
    MissingUserAgent,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Dispatch Errors ===
    #[error("Unknown API method '{name}'. Available: {available}")]
    UnknownMethod { name: String, available: String },

    #[error("No Embedly client configured. Start the scenario with 'Given an embedly host'")]
    NoClient,

    // === HTTP Errors ===
    #[error("HTTP call failed: {0}")]
    Http(String),

    #[error("HTTP call to {url} returned status {status}")]
    HttpStatus { status: u16, url: String },

    // === Response Errors ===
    #[error("Failed to parse JSON in response: {0}")]
    ResponseParse(String),

    #[error("Pro doesn't support services")]
    ServicesUnsupported,

    #[error("Unexpected issue with services response: {0}")]
    ServicePattern(String),

    #[error("Response has {received} entries but {expected} were expected")]
    ResponseMismatch { expected: usize, received: usize },

    // === Scenario Errors ===
    #[error("Undefined step: '{0}'")]
    UndefinedStep(String),

    #[error("Invalid scenario file '{path}': {message}")]
    ScenarioParse { path: String, message: String },

    #[error("Test assertion failed: {0}")]
    TestAssertion(String),

    /// A failure captured by a previous method invocation, raised again
    #[error(transparent)]
    Invocation(Arc<Error>),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an unknown method error listing the available names
    pub fn unknown_method<S: AsRef<str>>(name: &str, available: &[S]) -> Self {
        Self::UnknownMethod {
            name: name.to_string(),
            available: available
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Create a scenario parse error for a file
    pub fn scenario_parse(path: &std::path::Path, message: impl Into<String>) -> Self {
        Self::ScenarioParse {
            path: path.display().to_string(),
            message: message.into(),
        }
    }

    /// Short, stable name for the kind of failure.
    ///
    /// Scenario sentences such as "an http error should get thrown" are
    /// checked against this name.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MissingApiKey { .. }
            | Error::MissingUserAgent
            | Error::Config(_)
            | Error::ConfigParse(_)
            | Error::FileRead { .. } => "configuration",
            Error::UnknownMethod { .. } => "unknown_method",
            Error::NoClient => "session",
            Error::Http(_) | Error::HttpStatus { .. } => "http",
            Error::ResponseParse(_) | Error::Json(_) => "parse",
            Error::ServicesUnsupported => "unsupported",
            Error::ServicePattern(_) => "services",
            Error::ResponseMismatch { .. } => "response",
            Error::UndefinedStep(_) => "undefined_step",
            Error::ScenarioParse { .. } => "scenario",
            Error::TestAssertion(_) => "assertion",
            Error::Invocation(inner) => inner.kind(),
            Error::Io(_) => "io",
            Error::Internal(_) => "internal",
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        let url = e.url().map(redact_key);
        match e.status() {
            Some(status) => Error::HttpStatus {
                status: status.as_u16(),
                url: url.unwrap_or_default(),
            },
            None => {
                let e = e.without_url();
                Error::Http(match url {
                    Some(url) => format!("{} for {}", e, url),
                    None => e.to_string(),
                })
            }
        }
    }
}

/// Render a request URL with the value of its `key` parameter hidden
pub fn redact_key(url: &reqwest::Url) -> String {
    if !url.query_pairs().any(|(name, _)| name == "key") {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| {
            let value = if name == "key" {
                "redacted".to_string()
            } else {
                value.into_owned()
            };
            (name.into_owned(), value)
        })
        .collect();

    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(
            Error::MissingApiKey {
                var: "EMBEDLY_KEY".into()
            }
            .kind(),
            "configuration"
        );
        assert_eq!(Error::Http("refused".into()).kind(), "http");
        assert_eq!(Error::ServicesUnsupported.kind(), "unsupported");
        assert_eq!(Error::unknown_method("nope", &["oembed"]).kind(), "unknown_method");
    }

    #[test]
    fn test_invocation_is_transparent() {
        let inner = Arc::new(Error::HttpStatus {
            status: 401,
            url: "http://api.embed.ly/1/oembed".into(),
        });
        let raised = Error::Invocation(inner.clone());
        assert_eq!(raised.to_string(), inner.to_string());
        assert_eq!(raised.kind(), "http");
    }

    #[test]
    fn test_unknown_method_lists_available() {
        let e = Error::unknown_method("embed", &["oembed", "preview"]);
        assert_eq!(
            e.to_string(),
            "Unknown API method 'embed'. Available: oembed, preview"
        );
    }

    #[test]
    fn test_redact_key_hides_only_the_key() {
        let url = reqwest::Url::parse(
            "http://pro.embed.ly/1/oembed?urls=http%3A%2F%2Fexample.com&key=s3cret",
        )
        .unwrap();
        let shown = redact_key(&url);
        assert!(!shown.contains("s3cret"));
        assert!(shown.contains("key=redacted"));
        assert!(shown.contains("urls=http%3A%2F%2Fexample.com"));

        let plain = reqwest::Url::parse("http://api.embed.ly/1/oembed?urls=x").unwrap();
        assert_eq!(redact_key(&plain), plain.to_string());
    }
}
