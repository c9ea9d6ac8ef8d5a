//! Named API operations
//!
//! Scenarios and the CLI pick an operation by name. The set is closed, so
//! names resolve through this table instead of anything dynamic.

use std::fmt;
use std::str::FromStr;

use crate::common::Error;

/// An Embedly API operation callable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    Oembed,
    Objectify,
    Preview,
    Services,
}

impl ApiMethod {
    pub const ALL: [ApiMethod; 4] = [
        ApiMethod::Oembed,
        ApiMethod::Objectify,
        ApiMethod::Preview,
        ApiMethod::Services,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ApiMethod::Oembed => "oembed",
            ApiMethod::Objectify => "objectify",
            ApiMethod::Preview => "preview",
            ApiMethod::Services => "services",
        }
    }

    /// API version and action for URL endpoints, `None` for services
    pub fn endpoint(self) -> Option<(&'static str, &'static str)> {
        match self {
            ApiMethod::Oembed => Some(("1", "oembed")),
            ApiMethod::Objectify => Some(("2", "objectify")),
            ApiMethod::Preview => Some(("1", "preview")),
            ApiMethod::Services => None,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ApiMethod::Oembed => "oEmbed data for each URL",
            ApiMethod::Objectify => "Everything Embedly knows about each URL",
            ApiMethod::Preview => "Preview data with images and embeds",
            ApiMethod::Services => "Services supported without a key",
        }
    }
}

impl fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ApiMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApiMethod::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = ApiMethod::ALL.iter().map(|m| m.name()).collect();
                Error::unknown_method(s, &names)
            })
    }
}
