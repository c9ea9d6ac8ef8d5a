//! Embedly API client
//!
//! Async client for the oEmbed, objectify, preview and services
//! endpoints. Responses are returned as loosely typed JSON arrays with one
//! entry per requested URL.

mod client;
mod methods;
mod params;
mod response;

pub use client::{Api, ApiBuilder};
pub use methods::ApiMethod;
pub use params::{ApiParameters, OptionValue, Options};
pub use response::{ResponseMaker, PRO_REQUIRED_MESSAGE};

/// Host used when no key is given
pub const API_HOST: &str = "http://api.embed.ly";

/// Host used when a key is given
pub const PRO_HOST: &str = "http://pro.embed.ly";

/// User agent for scenario runs
pub const USER_AGENT: &str = "embedly-rust-scenarios";
