//! CLI command definitions
//!
//! Defines the clap commands for the embedly CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Call an API method for one or more URLs and print the JSON result
    Call {
        /// Method name (oembed, objectify, preview, services)
        method: String,

        /// URLs to look up
        #[arg(required = true)]
        urls: Vec<String>,

        /// API host (default: api.embed.ly, or pro.embed.ly with a key)
        #[arg(long)]
        host: Option<String>,

        /// Send the API key from the configured environment variable
        #[arg(long)]
        with_key: bool,

        /// Boolean option to send as true, can be given multiple times
        #[arg(long = "flag", short = 'f')]
        flags: Vec<String>,
    },

    /// List the services supported without a key
    Services {
        /// API host
        #[arg(long)]
        host: Option<String>,
    },

    /// List the API methods that can be called by name
    Methods,

    /// Run feature files
    Test {
        /// Feature files or directories containing them
        #[arg(default_value = "features")]
        paths: Vec<PathBuf>,

        /// Print each call's result
        #[arg(long, short)]
        verbose: bool,

        /// Only run scenarios whose name contains this text
        #[arg(long)]
        name: Option<String>,

        /// Write a detailed log to this file
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}
