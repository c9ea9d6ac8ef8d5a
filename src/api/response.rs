//! Response assembly
//!
//! Before calling the API, each requested URL gets a slot. URLs that the
//! keyless API won't serve are answered locally with a 401 error object;
//! the rest stay pending and are filled, in order, from the array the
//! server returns. The assembled array lines up one-to-one with the
//! requested URLs.

use regex::Regex;
use serde_json::{json, Value};

use crate::common::{Error, Result};

/// Message used for URLs rejected by the services check
pub const PRO_REQUIRED_MESSAGE: &str = "This service requires an Embedly Pro account";

#[derive(Debug)]
enum Slot {
    Pending,
    Ready(Value),
}

/// Builds a response array that preserves request order
#[derive(Debug, Default)]
pub struct ResponseMaker {
    slots: Vec<Slot>,
}

impl ResponseMaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check URLs against a services pattern.
    ///
    /// Matching URLs become pending slots, the others get a 401 error
    /// object. `pattern` must match the whole URL; it is anchored here, so
    /// an alternation like `a|ab` accepts `ab`. Returns the URLs that
    /// still need to be sent to the API.
    pub fn prepare(&mut self, urls: &[String], pattern: &Regex) -> Result<Vec<String>> {
        let whole = Regex::new(&format!("^(?:{})$", pattern.as_str()))
            .map_err(|e| Error::ServicePattern(e.to_string()))?;

        tracing::debug!("checking urls against services");
        let mut accepted = Vec::with_capacity(urls.len());
        for url in urls {
            if whole.is_match(url) {
                tracing::debug!("url: {} is valid", url);
                self.slots.push(Slot::Pending);
                accepted.push(url.clone());
            } else {
                tracing::debug!("url: {} isn't valid", url);
                self.slots.push(Slot::Ready(pro_required(url)));
            }
        }
        Ok(accepted)
    }

    /// Accept every URL; used when calling with a key
    pub fn accept_all(&mut self, urls: &[String]) -> Vec<String> {
        self.slots.extend(urls.iter().map(|_| Slot::Pending));
        urls.to_vec()
    }

    /// Number of slots waiting for a server response
    pub fn pending(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Slot::Pending))
            .count()
    }

    /// Fill pending slots, in order, with the server's entries
    pub fn fill(&mut self, filler: Vec<Value>) -> Result<()> {
        let expected = self.pending();
        if filler.len() < expected {
            tracing::error!(
                "expected {} responses but the API returned {}",
                expected,
                filler.len()
            );
            return Err(Error::ResponseMismatch {
                expected,
                received: filler.len(),
            });
        }

        let mut filler = filler.into_iter();
        for slot in self.slots.iter_mut() {
            if matches!(slot, Slot::Pending) {
                if let Some(value) = filler.next() {
                    *slot = Slot::Ready(value);
                }
            }
        }
        Ok(())
    }

    /// The assembled response array
    pub fn into_response(self) -> Value {
        Value::Array(
            self.slots
                .into_iter()
                .map(|slot| match slot {
                    Slot::Ready(value) => value,
                    Slot::Pending => Value::Null,
                })
                .collect(),
        )
    }
}

fn pro_required(url: &str) -> Value {
    json!({
        "url": url,
        "error_code": "401",
        "error_message": PRO_REQUIRED_MESSAGE,
        "type": "error",
        "version": "1.0",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prepare_marks_unsupported_urls() {
        let pattern = Regex::new(r"^(?:http://.*youtube\.com/watch.*)$").unwrap();
        let mut maker = ResponseMaker::new();
        let accepted = maker
            .prepare(
                &urls(&["http://www.youtube.com/watch?v=1", "http://example.com/page"]),
                &pattern,
            )
            .unwrap();

        assert_eq!(accepted, urls(&["http://www.youtube.com/watch?v=1"]));
        assert_eq!(maker.pending(), 1);

        maker
            .fill(vec![json!({"type": "video", "provider_name": "YouTube"})])
            .unwrap();
        let response = maker.into_response();
        assert_eq!(response[0]["type"], "video");
        assert_eq!(response[1]["type"], "error");
        assert_eq!(response[1]["error_code"], "401");
        assert_eq!(response[1]["url"], "http://example.com/page");
    }

    #[test]
    fn test_fill_keeps_request_order() {
        let pattern = Regex::new(r"^(?:http://a\.com/.*|http://c\.com/.*)$").unwrap();
        let mut maker = ResponseMaker::new();
        maker
            .prepare(
                &urls(&["http://a.com/1", "http://b.com/2", "http://c.com/3"]),
                &pattern,
            )
            .unwrap();
        maker
            .fill(vec![json!({"url": "http://a.com/1"}), json!({"url": "http://c.com/3"})])
            .unwrap();

        let response = maker.into_response();
        let order: Vec<&str> = response
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["url"].as_str().unwrap())
            .collect();
        assert_eq!(order, ["http://a.com/1", "http://b.com/2", "http://c.com/3"]);
    }

    #[test]
    fn test_fill_short_response_is_an_error() {
        let pattern = Regex::new(".*").unwrap();
        let mut maker = ResponseMaker::new();
        maker
            .prepare(&urls(&["http://a.com", "http://b.com"]), &pattern)
            .unwrap();
        let err = maker.fill(vec![json!({})]).unwrap_err();
        assert!(matches!(
            err,
            Error::ResponseMismatch {
                expected: 2,
                received: 1
            }
        ));
    }

    #[test]
    fn test_partial_match_is_rejected() {
        let pattern = Regex::new("http://a\\.com").unwrap();
        let mut maker = ResponseMaker::new();
        let accepted = maker
            .prepare(&urls(&["http://a.com", "http://a.com/longer"]), &pattern)
            .unwrap();
        assert_eq!(accepted, urls(&["http://a.com"]));
    }

    #[test]
    fn test_unanchored_alternation_matches_whole_url() {
        let pattern = Regex::new("a|ab").unwrap();
        let mut maker = ResponseMaker::new();
        let accepted = maker.prepare(&urls(&["ab", "abc"]), &pattern).unwrap();
        assert_eq!(accepted, urls(&["ab"]));
        assert_eq!(maker.pending(), 1);
    }
}
