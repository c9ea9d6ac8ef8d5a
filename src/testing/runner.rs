//! Test runner implementation
//!
//! Executes feature files scenario by scenario. Each scenario gets a
//! fresh session, runs its steps in order and stops at the first failing
//! step.

use std::path::{Path, PathBuf};

use colored::Colorize;
use tracing::Instrument;

use crate::common::{Error, Result};

use super::config::{is_feature_file, load_feature, Scenario};
use super::session::{Session, SessionSettings};
use super::steps::{Step, StepGrammar};

/// Options for a run
#[derive(Debug, Default, Clone)]
pub struct RunOptions {
    /// Print call results after each invocation
    pub verbose: bool,
    /// Only run scenarios whose name contains this text
    pub name_filter: Option<String>,
}

/// Result of a scenario run
#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    pub error: Option<String>,
}

/// Result of running every scenario in a feature file
#[derive(Debug)]
pub struct FeatureResult {
    pub name: String,
    pub path: PathBuf,
    pub scenarios: Vec<TestResult>,
}

impl FeatureResult {
    /// A feature file that failed to load, counted as one failed scenario
    pub fn load_failure(path: &Path, error: &Error) -> Self {
        Self {
            name: path.display().to_string(),
            path: path.to_path_buf(),
            scenarios: vec![TestResult {
                name: "load feature file".to_string(),
                passed: false,
                steps_run: 0,
                steps_total: 0,
                error: Some(error.to_string()),
            }],
        }
    }

    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|s| s.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.scenarios.len() - self.passed()
    }
}

/// Run every scenario in a feature file
pub async fn run_feature(
    path: &Path,
    settings: &SessionSettings,
    options: &RunOptions,
) -> Result<FeatureResult> {
    let feature = load_feature(path)?;
    let grammar = StepGrammar::new()?;

    println!(
        "\n{} {}",
        "Feature:".blue().bold(),
        feature.name.white().bold()
    );
    if let Some(desc) = &feature.description {
        for line in desc.lines() {
            println!("  {}", line.dimmed());
        }
    }

    let mut results = Vec::new();
    for scenario in feature.scenarios() {
        if let Some(filter) = &options.name_filter {
            if !scenario.name.contains(filter.as_str()) {
                tracing::debug!("skipping scenario '{}'", scenario.name);
                continue;
            }
        }
        results.push(run_scenario(&scenario, &grammar, settings, options.verbose).await);
    }

    Ok(FeatureResult {
        name: feature.name,
        path: path.to_path_buf(),
        scenarios: results,
    })
}

/// Run feature files in order.
///
/// A file that can't be loaded is reported as a feature with one failed
/// entry and the remaining files still run.
pub async fn run_features(
    files: &[PathBuf],
    settings: &SessionSettings,
    options: &RunOptions,
) -> Vec<FeatureResult> {
    let mut results = Vec::with_capacity(files.len());
    for file in files {
        match run_feature(file, settings, options).await {
            Ok(result) => results.push(result),
            Err(e) => {
                println!(
                    "\n{} {}",
                    "Feature:".blue().bold(),
                    file.display().to_string().white().bold()
                );
                println!("  {} {}", "✗".red(), e.to_string().red());
                tracing::warn!("could not load {}: {}", file.display(), e);
                results.push(FeatureResult::load_failure(file, &e));
            }
        }
    }
    results
}

/// Run a single scenario with a fresh session
pub async fn run_scenario(
    scenario: &Scenario,
    grammar: &StepGrammar,
    settings: &SessionSettings,
    verbose: bool,
) -> TestResult {
    let steps_total = scenario.steps.len();
    let mut session = Session::new(settings.clone());

    println!("\n  {} {}", "Scenario:".cyan(), scenario.name.white().bold());
    let span = tracing::info_span!("scenario", name = %scenario.name);

    for (i, sentence) in scenario.steps.iter().enumerate() {
        let step_num = i + 1;

        match execute_step(&mut session, grammar, sentence, verbose)
            .instrument(span.clone())
            .await
        {
            Ok(()) => {
                println!("    {} {}", "✓".green(), sentence.dimmed());
            }
            Err(e) => {
                println!("    {} {}", "✗".red(), sentence);
                println!("      {}", e.to_string().red());
                for skipped in &scenario.steps[step_num..] {
                    println!("    {} {}", "-".dimmed(), skipped.dimmed());
                }
                tracing::info!("scenario '{}' failed at step {}: {}", scenario.name, step_num, e);

                return TestResult {
                    name: scenario.name.clone(),
                    passed: false,
                    steps_run: step_num,
                    steps_total,
                    error: Some(e.to_string()),
                };
            }
        }
    }

    TestResult {
        name: scenario.name.clone(),
        passed: true,
        steps_run: steps_total,
        steps_total,
        error: None,
    }
}

/// Execute a single step sentence
async fn execute_step(
    session: &mut Session,
    grammar: &StepGrammar,
    sentence: &str,
    verbose: bool,
) -> Result<()> {
    let step = grammar.parse(sentence)?;
    tracing::debug!(?step, "executing step");
    session.execute(&step).await?;

    if verbose {
        if let Step::InvokeMethod { method, .. } = &step {
            print_outcome(session, method);
        }
    }
    Ok(())
}

fn print_outcome(session: &Session, method: &str) {
    if let Some(error) = session.last_error() {
        println!(
            "      {} {} raised {} error: {}",
            "→".dimmed(),
            method,
            error.kind(),
            error
        );
    } else if let Some(result) = session.last_result() {
        let rendered = serde_json::to_string(result).unwrap_or_default();
        let rendered = if rendered.chars().count() > 200 {
            format!("{}...", rendered.chars().take(200).collect::<String>())
        } else {
            rendered
        };
        println!("      {} {}", "→".dimmed(), rendered.dimmed());
    }
}

/// Expand directories into the feature files they contain, sorted
pub fn collect_feature_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            collect_from_dir(path, &mut files)?;
        } else if path.exists() {
            files.push(path.clone());
        } else {
            return Err(Error::Config(format!(
                "Feature path not found: {}",
                path.display()
            )));
        }
    }
    Ok(files)
}

fn collect_from_dir(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    for entry in entries {
        if entry.is_dir() {
            collect_from_dir(&entry, files)?;
        } else if is_feature_file(&entry) {
            files.push(entry);
        }
    }
    Ok(())
}

/// Print the summary line for a run
pub fn print_summary(results: &[FeatureResult]) {
    let total: usize = results.iter().map(|r| r.scenarios.len()).sum();
    let failed: usize = results.iter().map(FeatureResult::failed).sum();

    println!();
    if failed == 0 {
        println!(
            "{} {}",
            "✓".green().bold(),
            format!("{} scenarios passed", total).green().bold()
        );
    } else {
        println!(
            "{} {}",
            "✗".red().bold(),
            format!("{} of {} scenarios failed", failed, total).red().bold()
        );
        for feature in results {
            for scenario in feature.scenarios.iter().filter(|s| !s.passed) {
                println!(
                    "  {} {} ({}, step {}/{})",
                    "✗".red(),
                    scenario.name,
                    feature.path.display(),
                    scenario.steps_run,
                    scenario.steps_total
                );
            }
        }
    }
}
