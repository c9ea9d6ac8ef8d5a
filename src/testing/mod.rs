//! Scenario runner
//!
//! Reads feature files of plain-English steps, drives the Embedly client
//! through a per-scenario session and checks fields of the JSON results.
//! Assertions run against structured data, not printed output.

mod config;
mod gherkin;
mod path;
mod runner;
mod session;
mod steps;

pub use config::{is_feature_file, load_feature, Feature, Scenario, ScenarioDef};
pub use gherkin::parse_feature;
pub use path::{lookup, to_text, walk};
pub use runner::{
    collect_feature_files, print_summary, run_feature, run_features, run_scenario, FeatureResult,
    RunOptions, TestResult,
};
pub use session::{build_options, Session, SessionSettings};
pub use steps::{strip_keyword, Step, StepGrammar, STEP_KEYWORDS};
