//! Step sentence grammar
//!
//! Maps a scenario sentence to one of the session operations:
//!
//! ```text
//! an embedly host[ <host>][ with key]
//! <method> is called with the <urls> URL[s][ and <flag> flag]
//! a[n] <kind> error should get thrown
//! <key> should start with <value>
//! <key> should be <value>
//! ```

use regex::Regex;

use crate::common::{Error, Result};

/// Keywords that may start a step line
pub const STEP_KEYWORDS: &[&str] = &["Given", "When", "Then", "And", "But", "*"];

/// A parsed step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Build the scenario's client
    SetupClient { host: Option<String>, with_key: bool },
    /// Call an API method with comma-separated URLs and an optional flag
    InvokeMethod {
        method: String,
        urls: String,
        flag: Option<String>,
    },
    /// The previous call must have failed with this kind of error
    AssertErrorKind { kind: String },
    /// `key` of every result entry, joined with `,`, must equal `expected`
    AssertField { key: String, expected: String },
    /// Dotted `path` in the first result entry must start with `expected`
    AssertFieldPrefix { path: String, expected: String },
}

/// Compiled step patterns
pub struct StepGrammar {
    setup: Regex,
    invoke: Regex,
    error_kind: Regex,
    prefix: Regex,
    field: Regex,
}

impl StepGrammar {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| Error::Internal(format!("invalid step pattern '{}': {}", pattern, e)))
        };

        Ok(Self {
            setup: compile(r"^an embedly host(?: (\S+?))??( with key)?$")?,
            invoke: compile(r"^(\w+) is called with the (.*) URLs?(?: and (\S+) flag)?$")?,
            error_kind: compile(r"^an? (\w+) error should get thrown$")?,
            prefix: compile(r"^(\S+) should start with (\S+)$")?,
            field: compile(r"^(\S+) should be (.+)$")?,
        })
    }

    /// Parse a sentence, with or without its Gherkin keyword
    pub fn parse(&self, sentence: &str) -> Result<Step> {
        let text = strip_keyword(sentence.trim());

        if let Some(caps) = self.setup.captures(text) {
            return Ok(Step::SetupClient {
                host: caps.get(1).map(|m| m.as_str().to_string()),
                with_key: caps.get(2).is_some(),
            });
        }

        if let Some(caps) = self.invoke.captures(text) {
            return Ok(Step::InvokeMethod {
                method: caps[1].to_string(),
                urls: caps[2].to_string(),
                flag: caps.get(3).map(|m| m.as_str().to_string()),
            });
        }

        if let Some(caps) = self.error_kind.captures(text) {
            return Ok(Step::AssertErrorKind {
                kind: caps[1].to_string(),
            });
        }

        if let Some(caps) = self.prefix.captures(text) {
            return Ok(Step::AssertFieldPrefix {
                path: caps[1].to_string(),
                expected: caps[2].to_string(),
            });
        }

        if let Some(caps) = self.field.captures(text) {
            return Ok(Step::AssertField {
                key: caps[1].to_string(),
                expected: caps[2].to_string(),
            });
        }

        Err(Error::UndefinedStep(text.to_string()))
    }
}

/// Drop a leading Given/When/Then/And/But/* keyword
pub fn strip_keyword(sentence: &str) -> &str {
    for keyword in STEP_KEYWORDS {
        if let Some(rest) = sentence.strip_prefix(keyword) {
            if rest.starts_with(' ') {
                return rest.trim_start();
            }
        }
    }
    sentence
}
