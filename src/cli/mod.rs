//! CLI command handling
//!
//! Dispatches CLI commands to the client or the scenario runner and
//! formats output.

use colored::Colorize;

use crate::api::{Api, ApiMethod, Options};
use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{logging, paths, Error, Result};
use crate::testing::{self, RunOptions, SessionSettings};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Call {
            method,
            urls,
            host,
            with_key,
            flags,
        } => {
            logging::init_cli();
            let config = Config::load()?;
            let api = build_api(&config, host, with_key)?;
            let method: ApiMethod = method.parse()?;

            let mut options = Options::for_urls(&urls);
            for flag in flags {
                options.set_flag(flag);
            }

            let result = api.call(method, &options).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }

        Commands::Services { host } => {
            logging::init_cli();
            let config = Config::load()?;
            let api = build_api(&config, host, false)?;
            let services = api.services().await?;

            for service in services.as_array().map(Vec::as_slice).unwrap_or(&[]) {
                let name = service["name"].as_str().unwrap_or("?");
                let regexes = service["regex"].as_array().map(Vec::len).unwrap_or(0);
                println!("{:<24} {} patterns", name, regexes);
            }
            Ok(())
        }

        Commands::Methods => {
            for method in ApiMethod::ALL {
                let endpoint = match method.endpoint() {
                    Some((version, action)) => format!("/{}/{}", version, action),
                    None => "/1/services/javascript".to_string(),
                };
                println!(
                    "{:<10} {:<24} {}",
                    method.name().bold(),
                    endpoint.dimmed(),
                    method.description()
                );
            }
            Ok(())
        }

        Commands::Test {
            paths: feature_paths,
            verbose,
            name,
            log_file,
        } => {
            let log_file = log_file.or_else(paths::default_log_file);
            if let Some(path) = logging::init_runner(log_file.as_deref()) {
                println!("{} {}", "Log:".dimmed(), path.display().to_string().dimmed());
            }

            let config = Config::load()?;
            let settings = SessionSettings::from_config(&config);
            let options = RunOptions {
                verbose,
                name_filter: name,
            };

            let files = testing::collect_feature_files(&feature_paths)?;
            if files.is_empty() {
                return Err(Error::Config("No feature files found".to_string()));
            }

            let results = testing::run_features(&files, &settings, &options).await;
            testing::print_summary(&results);

            let failed: usize = results.iter().map(|r| r.failed()).sum();
            if failed > 0 {
                return Err(Error::TestAssertion(format!("{} scenarios failed", failed)));
            }
            Ok(())
        }

        Commands::Config { init } => {
            let config = Config::load()?;
            match paths::config_path() {
                Some(path) if init && !path.exists() => {
                    paths::ensure_config_dir()?;
                    std::fs::write(&path, Config::default().to_toml()?)?;
                    println!("Wrote {}", path.display());
                }
                Some(path) => println!("# {}", path.display()),
                None => println!("# no config directory on this platform"),
            }
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

/// Build a client from configuration and CLI flags
fn build_api(config: &Config, host: Option<String>, with_key: bool) -> Result<Api> {
    let key = if with_key {
        let key = std::env::var(&config.api.key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::MissingApiKey {
                var: config.api.key_env.clone(),
            })?;
        Some(key)
    } else {
        None
    };

    Api::builder(config.api.user_agent.clone())
        .key(key)
        .host(host)
        .default_hosts(&config.api.host, &config.api.pro_host)
        .timeout(config.timeouts.request())
        .build()
}
