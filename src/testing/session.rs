//! Per-scenario session state
//!
//! A session owns the scenario's client and the outcome of the most
//! recent call. After any call exactly one of `last_result` and
//! `last_error` is set; both are cleared when the client is set up.

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;

use crate::api::{Api, ApiMethod, Options};
use crate::common::config::Config;
use crate::common::{Error, Result};

use super::path::{lookup, to_text, walk};
use super::steps::Step;

/// How sessions build their client
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// User agent sent with every request
    pub user_agent: String,
    /// Environment variable holding the API key
    pub key_env: String,
    /// Default host without a key
    pub api_host: String,
    /// Default host with a key
    pub pro_host: String,
    /// Per-request timeout
    pub timeout: Option<Duration>,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            user_agent: config.api.user_agent.clone(),
            key_env: config.api.key_env.clone(),
            api_host: config.api.host.clone(),
            pro_host: config.api.pro_host.clone(),
            timeout: config.timeouts.request(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// State for a single scenario
#[derive(Debug)]
pub struct Session {
    settings: SessionSettings,
    api: Option<Api>,
    last_result: Option<Value>,
    last_error: Option<Arc<Error>>,
}

impl Session {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            api: None,
            last_result: None,
            last_error: None,
        }
    }

    pub fn api(&self) -> Option<&Api> {
        self.api.as_ref()
    }

    pub fn last_result(&self) -> Option<&Value> {
        self.last_result.as_ref()
    }

    pub fn last_error(&self) -> Option<&Error> {
        self.last_error.as_deref()
    }

    /// Run one parsed step
    pub async fn execute(&mut self, step: &Step) -> Result<()> {
        match step {
            Step::SetupClient { host, with_key } => self.setup_client(host.as_deref(), *with_key),
            Step::InvokeMethod { method, urls, flag } => {
                self.invoke_method(method, urls, flag.as_deref()).await;
                Ok(())
            }
            Step::AssertErrorKind { kind } => self.assert_error_kind(kind),
            Step::AssertField { key, expected } => self.assert_field(key, expected),
            Step::AssertFieldPrefix { path, expected } => self.assert_field_prefix(path, expected),
        }
    }

    /// Build the client for this scenario.
    ///
    /// With `with_key`, the key is read from the configured environment
    /// variable; if it is unset, empty or only whitespace the scenario
    /// fails before any client is created.
    pub fn setup_client(&mut self, host: Option<&str>, with_key: bool) -> Result<()> {
        self.api = None;
        self.last_result = None;
        self.last_error = None;

        let key = if with_key {
            let key = std::env::var(&self.settings.key_env)
                .ok()
                .filter(|k| !k.trim().is_empty());
            match key {
                Some(key) => Some(key),
                None => {
                    return Err(Error::MissingApiKey {
                        var: self.settings.key_env.clone(),
                    })
                }
            }
        } else {
            None
        };

        let span = tracing::info_span!(
            "embedly_api",
            host = host.unwrap_or("default"),
            with_key
        );

        let api = Api::builder(self.settings.user_agent.clone())
            .key(key)
            .host(host.map(str::to_string))
            .default_hosts(&self.settings.api_host, &self.settings.pro_host)
            .timeout(self.settings.timeout)
            .span(span)
            .build()?;

        tracing::debug!(?api, "client configured");
        self.api = Some(api);
        Ok(())
    }

    /// Call `method` with the comma-separated `urls` and an optional flag.
    ///
    /// Never fails: the outcome is stored as the last result or the last
    /// error for later assertions.
    pub async fn invoke_method(&mut self, method: &str, urls: &str, flag: Option<&str>) {
        self.last_result = None;
        self.last_error = None;

        let options = build_options(urls, flag);
        tracing::debug!(method, options = ?options, "invoking");

        match self.dispatch(method, &options).await {
            Ok(value) => self.last_result = Some(value),
            Err(e) => {
                tracing::debug!(method, error = %e, "invocation failed");
                self.last_error = Some(Arc::new(e));
            }
        }
    }

    async fn dispatch(&self, method: &str, options: &Options) -> Result<Value> {
        let method: ApiMethod = method.parse()?;
        let api = self.api.as_ref().ok_or(Error::NoClient)?;
        api.call(method, options).await
    }

    /// The previous call must have failed with an error of `kind`.
    ///
    /// `kind` is compared with [`Error::kind`], so `a parse error` only
    /// passes for a parse failure, not for any stored error.
    pub fn assert_error_kind(&self, kind: &str) -> Result<()> {
        match &self.last_error {
            None => Err(Error::TestAssertion(format!(
                "Expected {} error, but no error was raised",
                kind
            ))),
            Some(e) if e.kind() == kind => Ok(()),
            Some(e) => Err(Error::TestAssertion(format!(
                "Expected {} error, got {} error: {}",
                kind,
                e.kind(),
                e
            ))),
        }
    }

    /// `key` of every result entry, as text and joined with `,`, must
    /// equal `expected`
    pub fn assert_field(&self, key: &str, expected: &str) -> Result<()> {
        let actual = self
            .result_entries()?
            .iter()
            .map(|entry| to_text(lookup(entry, key)))
            .collect::<Vec<_>>()
            .join(",");

        if actual != expected {
            return Err(Error::TestAssertion(format!(
                "{}: expected '{}', got '{}'",
                key, expected, actual
            )));
        }
        Ok(())
    }

    /// Dotted `path` in the first result entry must match `^expected`
    pub fn assert_field_prefix(&self, path: &str, expected: &str) -> Result<()> {
        let entries = self.result_entries()?;
        let actual = to_text(entries.first().and_then(|first| walk(first, path)));

        let pattern = Regex::new(&format!("^(?:{})", expected)).map_err(|e| {
            Error::TestAssertion(format!("Invalid pattern '{}': {}", expected, e))
        })?;

        if !pattern.is_match(&actual) {
            return Err(Error::TestAssertion(format!(
                "{}: expected to start with '{}', got '{}'",
                path, expected, actual
            )));
        }
        Ok(())
    }

    /// The last result as a sequence, raising a stored error instead
    fn result_entries(&self) -> Result<&[Value]> {
        if let Some(e) = &self.last_error {
            return Err(Error::Invocation(e.clone()));
        }
        match &self.last_result {
            Some(Value::Array(entries)) => Ok(entries.as_slice()),
            Some(other) => Ok(std::slice::from_ref(other)),
            None => Err(Error::TestAssertion(
                "No result to check. Call a method first".to_string(),
            )),
        }
    }
}

/// Options for a comma-separated URL list and an optional flag
pub fn build_options(urls: &str, flag: Option<&str>) -> Options {
    let urls: Vec<&str> = urls
        .split(',')
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .collect();

    let mut options = Options::for_urls(&urls);
    if let Some(flag) = flag {
        options.set_flag(flag);
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::OptionValue;
    use serde_json::json;

    fn session_with(result: Option<Value>, error: Option<Error>) -> Session {
        let mut session = Session::new(SessionSettings::default());
        session.last_result = result;
        session.last_error = error.map(Arc::new);
        session
    }

    #[test]
    fn test_build_options_single_url() {
        let options = build_options("http://example.com", None);
        assert_eq!(
            options.get("url"),
            Some(&OptionValue::Text("http://example.com".to_string()))
        );
        assert!(!options.contains("urls"));
    }

    #[test]
    fn test_build_options_multiple_urls_and_flag() {
        let options = build_options("http://a.com,http://b.com", Some("force"));
        assert_eq!(
            options.get("urls"),
            Some(&OptionValue::List(vec![
                "http://a.com".to_string(),
                "http://b.com".to_string()
            ]))
        );
        assert!(!options.contains("url"));
        assert_eq!(options.get("force"), Some(&OptionValue::Flag(true)));
    }

    #[test]
    fn test_setup_resets_state() {
        let mut session = session_with(Some(json!([{}])), None);
        session.setup_client(Some("http://api.embed.ly"), false).unwrap();
        assert!(session.last_result().is_none());
        assert!(session.last_error().is_none());
        assert_eq!(session.api().unwrap().host(), "http://api.embed.ly");
    }

    #[test]
    fn test_setup_without_key_fails_before_client() {
        let settings = SessionSettings {
            key_env: "EMBEDLY_SESSION_TEST_UNSET_KEY".to_string(),
            ..SessionSettings::default()
        };
        let mut session = Session::new(settings);
        let err = session.setup_client(None, true).unwrap_err();
        assert!(matches!(err, Error::MissingApiKey { .. }));
        assert_eq!(err.kind(), "configuration");
        assert!(session.api().is_none());
    }

    #[test]
    fn test_setup_with_blank_key_fails() {
        std::env::set_var("EMBEDLY_SESSION_TEST_BLANK_KEY", "   ");
        let settings = SessionSettings {
            key_env: "EMBEDLY_SESSION_TEST_BLANK_KEY".to_string(),
            ..SessionSettings::default()
        };
        let mut session = Session::new(settings);
        let err = session.setup_client(None, true).unwrap_err();
        assert!(matches!(err, Error::MissingApiKey { .. }));
        assert!(session.api().is_none());
    }

    #[test]
    fn test_error_kind_must_match_captured_kind() {
        let session = session_with(None, Some(Error::ResponseParse("eof".to_string())));
        session.assert_error_kind("parse").unwrap();
        let err = session.assert_error_kind("error").unwrap_err();
        assert!(err.to_string().contains("got parse error"));
    }

    #[test]
    fn test_setup_with_key_uses_pro_host() {
        std::env::set_var("EMBEDLY_SESSION_TEST_SET_KEY", "abc123");
        let settings = SessionSettings {
            key_env: "EMBEDLY_SESSION_TEST_SET_KEY".to_string(),
            ..SessionSettings::default()
        };
        let mut session = Session::new(settings);
        session.setup_client(None, true).unwrap();
        let api = session.api().unwrap();
        assert!(api.has_key());
        assert_eq!(api.host(), "http://pro.embed.ly");
    }

    #[tokio::test]
    async fn test_invoke_without_client_stores_error() {
        let mut session = Session::new(SessionSettings::default());
        session.invoke_method("oembed", "http://example.com", None).await;
        assert!(session.last_result().is_none());
        assert_eq!(session.last_error().unwrap().kind(), "session");
    }

    #[tokio::test]
    async fn test_invoke_unknown_method_stores_error() {
        let mut session = Session::new(SessionSettings::default());
        session.setup_client(None, false).unwrap();
        session.invoke_method("embed", "http://example.com", None).await;
        assert!(session.last_result().is_none());
        assert_eq!(session.last_error().unwrap().kind(), "unknown_method");
    }

    #[test]
    fn test_assert_field_joins_entries() {
        let session = session_with(Some(json!([{"type": "html"}, {"type": "error"}, {}])), None);
        session.assert_field("type", "html,error,").unwrap();
        let err = session.assert_field("type", "html").unwrap_err();
        assert_eq!(err.kind(), "assertion");
    }

    #[test]
    fn test_assert_field_empty_result() {
        let session = session_with(Some(json!([])), None);
        session.assert_field("type", "").unwrap();
        assert!(session.assert_field("type", "html").is_err());
    }

    #[test]
    fn test_assert_field_prefix() {
        let session = session_with(
            Some(json!([{"provider_url": "http://www.youtube.com/", "meta": {"title": "Hi"}}])),
            None,
        );
        session.assert_field_prefix("provider_url", "http").unwrap();
        session.assert_field_prefix("meta.title", "H").unwrap();
        assert!(session.assert_field_prefix("provider_url", "https").is_err());
        assert!(session.assert_field_prefix("meta.missing", "x").is_err());
    }

    #[test]
    fn test_assertions_reraise_stored_error() {
        let session = session_with(None, Some(Error::Http("connection refused".to_string())));
        let err = session.assert_field("type", "html").unwrap_err();
        assert!(matches!(err, Error::Invocation(_)));
        assert_eq!(err.to_string(), "HTTP call failed: connection refused");
        assert!(session.assert_field_prefix("type", "h").is_err());
    }

    #[test]
    fn test_assert_error_kind() {
        let session = session_with(
            None,
            Some(Error::HttpStatus {
                status: 401,
                url: "http://pro.embed.ly/1/oembed".to_string(),
            }),
        );
        session.assert_error_kind("http").unwrap();
        assert!(session.assert_error_kind("parse").is_err());

        let session = session_with(Some(json!([])), None);
        assert!(session.assert_error_kind("http").is_err());
    }
}
