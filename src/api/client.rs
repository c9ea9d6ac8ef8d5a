//! Embedly HTTP client

use std::fmt;
use std::time::Duration;

use regex::Regex;
use reqwest::Url;
use serde_json::Value;
use tracing::Instrument;

use crate::common::{Error, Result};

use super::methods::ApiMethod;
use super::params::{ApiParameters, Options};
use super::response::ResponseMaker;
use super::{API_HOST, PRO_HOST};

/// Client for the Embedly API
pub struct Api {
    user_agent: String,
    key: Option<String>,
    host: String,
    http: reqwest::Client,
    span: tracing::Span,
}

/// Builder for [`Api`]
pub struct ApiBuilder {
    user_agent: String,
    key: Option<String>,
    host: Option<String>,
    api_host: String,
    pro_host: String,
    timeout: Option<Duration>,
    span: Option<tracing::Span>,
}

impl ApiBuilder {
    /// API key; switches the default host to the Pro API
    pub fn key(mut self, key: Option<String>) -> Self {
        self.key = key.filter(|k| !k.is_empty());
        self
    }

    /// Explicit host, overriding both defaults
    pub fn host(mut self, host: Option<String>) -> Self {
        self.host = host.filter(|h| !h.trim().is_empty());
        self
    }

    /// Default hosts used when no explicit host is given
    pub fn default_hosts(mut self, api_host: impl Into<String>, pro_host: impl Into<String>) -> Self {
        self.api_host = api_host.into();
        self.pro_host = pro_host.into();
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Span that all of the client's requests are logged under
    pub fn span(mut self, span: tracing::Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn build(self) -> Result<Api> {
        if self.user_agent.trim().is_empty() {
            return Err(Error::MissingUserAgent);
        }

        let host = match (&self.host, &self.key) {
            (Some(host), _) => host.clone(),
            (None, None) => self.api_host,
            (None, Some(_)) => self.pro_host,
        };

        let mut http = reqwest::Client::builder().user_agent(self.user_agent.clone());
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }
        let http = http
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        let span = self
            .span
            .unwrap_or_else(|| tracing::debug_span!("embedly_api"));

        Ok(Api {
            user_agent: self.user_agent,
            key: self.key,
            host: normalize_host(&host),
            http,
            span,
        })
    }
}

impl Api {
    pub fn builder(user_agent: impl Into<String>) -> ApiBuilder {
        ApiBuilder {
            user_agent: user_agent.into(),
            key: None,
            host: None,
            api_host: API_HOST.to_string(),
            pro_host: PRO_HOST.to_string(),
            timeout: None,
            span: None,
        }
    }

    /// Create a client with the default hosts
    ///
    /// Without a key and host, `http://api.embed.ly` is used; with a key
    /// and no host, `http://pro.embed.ly`.
    pub fn new(user_agent: &str, key: Option<String>, host: Option<String>) -> Result<Self> {
        Self::builder(user_agent).key(key).host(host).build()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn has_key(&self) -> bool {
        self.key.is_some()
    }

    /// Call an operation by its dispatch entry
    pub async fn call(&self, method: ApiMethod, options: &Options) -> Result<Value> {
        match method.endpoint() {
            Some((version, action)) => self.apicall(version, action, options).await,
            None => self.services().await,
        }
    }

    pub async fn oembed(&self, options: &Options) -> Result<Value> {
        self.call(ApiMethod::Oembed, options).await
    }

    pub async fn objectify(&self, options: &Options) -> Result<Value> {
        self.call(ApiMethod::Objectify, options).await
    }

    pub async fn preview(&self, options: &Options) -> Result<Value> {
        self.call(ApiMethod::Preview, options).await
    }

    /// Call `{host}/{version}/{action}` for the URLs in `options`.
    ///
    /// The result is a JSON array with one entry per requested URL, in
    /// request order. Without a key, URLs that no supported service
    /// matches are answered locally with a 401 error entry and are not
    /// sent.
    pub async fn apicall(&self, version: &str, action: &str, options: &Options) -> Result<Value> {
        self.apicall_inner(version, action, options)
            .instrument(self.span.clone())
            .await
    }

    async fn apicall_inner(&self, version: &str, action: &str, options: &Options) -> Result<Value> {
        let mut params = ApiParameters::from_options(options);
        let urls = params.get("urls").to_vec();

        let mut maker = ResponseMaker::new();
        let accepted = if self.key.is_some() {
            maker.accept_all(&urls)
        } else {
            let pattern = self.services_pattern_inner().await?;
            maker.prepare(&urls, &pattern)?
        };

        if !accepted.is_empty() {
            params.set("urls", accepted);
            let mut url = self.endpoint(&format!("{}/{}", version, action))?;
            params.apply_to(&mut url);
            tracing::debug!("calling  >> {}", url);
            if let Some(key) = &self.key {
                url.query_pairs_mut().append_pair("key", key);
            }

            match self.get_json(url).await? {
                Value::Array(entries) => maker.fill(entries)?,
                other => {
                    return Err(Error::ResponseParse(format!(
                        "expected a JSON array, got {}",
                        json_type(&other)
                    )))
                }
            }
        }

        Ok(maker.into_response())
    }

    /// List of services the keyless API supports
    pub async fn services(&self) -> Result<Value> {
        self.services_inner().instrument(self.span.clone()).await
    }

    async fn services_inner(&self) -> Result<Value> {
        if self.key.is_some() {
            tracing::error!("Pro doesn't support services");
            return Err(Error::ServicesUnsupported);
        }

        let url = self.endpoint("1/services/javascript")?;
        tracing::debug!("calling  >> {}", url);
        match self.get_json(url).await? {
            services @ Value::Array(_) => Ok(services),
            other => Err(Error::ResponseParse(format!(
                "expected a JSON array of services, got {}",
                json_type(&other)
            ))),
        }
    }

    /// One pattern matching every URL a supported service handles
    pub async fn services_pattern(&self) -> Result<Regex> {
        self.services_pattern_inner()
            .instrument(self.span.clone())
            .await
    }

    async fn services_pattern_inner(&self) -> Result<Regex> {
        let services = self.services_inner().await?;
        let pattern = services_regex_source(&services)?;
        Regex::new(&pattern).map_err(|e| {
            tracing::error!("Unexpected issue with services response: {}", e);
            Error::ServicePattern(e.to_string())
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let raw = format!("{}/{}", self.host, path);
        Url::parse(&raw).map_err(|e| Error::Config(format!("Invalid API URL '{}': {}", raw, e)))
    }

    async fn get_json(&self, url: Url) -> Result<Value> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        tracing::debug!("response << {}", body);
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse JSON in response: {}", e);
            Error::ResponseParse(e.to_string())
        })
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("user_agent", &self.user_agent)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("host", &self.host)
            .finish()
    }
}

/// Join every service's `regex` list into one whole-URL pattern
fn services_regex_source(services: &Value) -> Result<String> {
    let entries = services
        .as_array()
        .ok_or_else(|| Error::ServicePattern("services list is not an array".to_string()))?;

    let mut regexes = Vec::new();
    for entry in entries {
        let list = entry
            .get("regex")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::ServicePattern("service entry has no regex list".to_string()))?;
        for regex in list {
            let regex = regex
                .as_str()
                .ok_or_else(|| Error::ServicePattern("service regex is not a string".to_string()))?;
            regexes.push(regex);
        }
    }

    Ok(format!("^(?:{})$", regexes.join("|")))
}

/// Add a scheme if missing and drop trailing slashes
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
