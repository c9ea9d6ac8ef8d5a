//! Call options and query parameters
//!
//! `Options` is what callers hand to an API method: `url` or `urls` plus
//! any boolean flags. `ApiParameters` is the multimap the client turns
//! into a query string. Every value is form-encoded and a name with
//! several values is repeated, e.g.
//!
//! ```text
//! urls=http%3A%2F%2Fwww.google.com%2F&urls=http%3A%2F%2Fwww.bing.com%2F
//! ```

use std::collections::BTreeMap;

use reqwest::Url;
use serde::Serialize;

/// A single option value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Text(String),
    List(Vec<String>),
    Flag(bool),
}

/// Options passed to an API method
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Options(BTreeMap<String, OptionValue>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for one or more URLs.
    ///
    /// A single URL is stored under `url`, several under `urls`.
    pub fn for_urls<S: AsRef<str>>(urls: &[S]) -> Self {
        let mut options = Self::new();
        match urls {
            [single] => options.insert("url", OptionValue::Text(single.as_ref().to_string())),
            many => options.insert(
                "urls",
                OptionValue::List(many.iter().map(|u| u.as_ref().to_string()).collect()),
            ),
        }
        options
    }

    pub fn insert(&mut self, name: impl Into<String>, value: OptionValue) {
        self.0.insert(name.into(), value);
    }

    /// Set a boolean flag to true
    pub fn set_flag(&mut self, name: impl Into<String>) {
        self.insert(name, OptionValue::Flag(true));
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.0.iter()
    }
}

/// Query parameters for an API call
#[derive(Debug, Clone, Default)]
pub struct ApiParameters {
    params: BTreeMap<String, Vec<String>>,
}

impl ApiParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build parameters from call options
    pub fn from_options(options: &Options) -> Self {
        let mut params = Self::new();
        for (name, value) in options.iter() {
            match value {
                OptionValue::Text(text) => params.push(name, text.clone()),
                OptionValue::List(values) => params.push_all(name, values.iter().cloned()),
                OptionValue::Flag(flag) => params.push(name, flag.to_string()),
            }
        }
        params
    }

    /// Add a parameter value
    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        self.param_mut(name).push(value.into());
    }

    /// Add several values for one parameter
    pub fn push_all(&mut self, name: &str, values: impl IntoIterator<Item = String>) {
        self.param_mut(name).extend(values);
    }

    /// Values for a parameter, empty if it is not set
    pub fn get(&self, name: &str) -> &[String] {
        self.params
            .get(filter_name(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Replace all values of a parameter
    pub fn set(&mut self, name: &str, values: Vec<String>) {
        self.params.insert(filter_name(name).to_string(), values);
    }

    fn param_mut(&mut self, name: &str) -> &mut Vec<String> {
        self.params.entry(filter_name(name).to_string()).or_default()
    }

    /// Append the parameters to a URL's query string
    pub fn apply_to(&self, url: &mut Url) {
        let mut pairs = url.query_pairs_mut();
        for (name, values) in &self.params {
            for value in values {
                pairs.append_pair(name, value);
            }
        }
    }
}

/// `url` is always sent as `urls` so responses have one shape
fn filter_name(name: &str) -> &str {
    if name == "url" {
        "urls"
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_url_option() {
        let options = Options::for_urls(&["http://example.com"]);
        assert_eq!(
            options.get("url"),
            Some(&OptionValue::Text("http://example.com".to_string()))
        );
        assert!(!options.contains("urls"));
    }

    #[test]
    fn test_multiple_url_option() {
        let options = Options::for_urls(&["http://a.com", "http://b.com"]);
        assert_eq!(
            options.get("urls"),
            Some(&OptionValue::List(vec![
                "http://a.com".to_string(),
                "http://b.com".to_string()
            ]))
        );
        assert!(!options.contains("url"));
    }

    #[test]
    fn test_url_is_folded_into_urls() {
        let mut options = Options::for_urls(&["http://a.com"]);
        options.set_flag("force");
        let params = ApiParameters::from_options(&options);
        assert_eq!(params.get("urls"), ["http://a.com".to_string()]);
        assert_eq!(params.get("url"), ["http://a.com".to_string()]);
        assert_eq!(params.get("force"), ["true".to_string()]);
    }

    #[test]
    fn test_query_repeats_names_and_encodes() {
        let mut params = ApiParameters::new();
        params.push("urls", "http://www.google.com/");
        params.push("urls", "http://www.bing.com/");
        let mut url = Url::parse("http://api.embed.ly/1/oembed").unwrap();
        params.apply_to(&mut url);
        assert_eq!(
            url.query(),
            Some("urls=http%3A%2F%2Fwww.google.com%2F&urls=http%3A%2F%2Fwww.bing.com%2F")
        );
    }

    #[test]
    fn test_options_serialize_as_map() {
        let mut options = Options::for_urls(&["http://a.com", "http://b.com"]);
        options.set_flag("force");
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"force": true, "urls": ["http://a.com", "http://b.com"]})
        );
    }
}
