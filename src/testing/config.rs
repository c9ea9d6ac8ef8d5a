//! Scenario file types
//!
//! Features can be written as Gherkin `.feature` files or as YAML
//! documents with the same shape:
//!
//! ```yaml
//! name: oEmbed
//! background:
//!   - Given an embedly host
//! scenarios:
//!   - name: Get the type
//!     steps:
//!       - When oembed is called with the <url> URL
//!       - Then type should be <type>
//!     examples:
//!       - { url: "http://www.youtube.com/watch?v=1", type: video }
//! ```

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::Path;

use crate::common::{Error, Result};

use super::gherkin;

/// A feature file: shared background steps plus scenarios
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Feature {
    /// Name of the feature
    pub name: String,
    /// Optional free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Steps run before every scenario
    #[serde(default)]
    pub background: Vec<String>,
    /// Scenarios, possibly outlines with examples
    #[serde(default)]
    pub scenarios: Vec<ScenarioDef>,
}

/// A scenario as written; outlines carry example rows
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ScenarioDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Step sentences, keyword included ("When oembed is called ...")
    pub steps: Vec<String>,
    /// Example rows for a scenario outline
    #[serde(default, deserialize_with = "deserialize_examples")]
    pub examples: Vec<BTreeMap<String, String>>,
}

/// A concrete scenario ready to run
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<String>,
}

impl ScenarioDef {
    /// Expand an outline into one scenario per example row.
    ///
    /// `<column>` placeholders in the name and steps are replaced with
    /// the row's values. A scenario without examples expands to itself.
    pub fn expand(&self) -> Vec<Scenario> {
        if self.examples.is_empty() {
            return vec![Scenario {
                name: self.name.clone(),
                steps: self.steps.clone(),
            }];
        }

        self.examples
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let name = substitute(&self.name, row);
                let name = if name == self.name {
                    format!("{} (example {})", self.name, i + 1)
                } else {
                    name
                };
                Scenario {
                    name,
                    steps: self.steps.iter().map(|s| substitute(s, row)).collect(),
                }
            })
            .collect()
    }
}

impl Feature {
    /// Every concrete scenario, background steps first
    pub fn scenarios(&self) -> Vec<Scenario> {
        self.scenarios
            .iter()
            .flat_map(ScenarioDef::expand)
            .map(|mut scenario| {
                let mut steps = self.background.clone();
                steps.append(&mut scenario.steps);
                scenario.steps = steps;
                scenario
            })
            .collect()
    }
}

/// Load a feature from a `.feature`, `.yaml` or `.yml` file
pub fn load_feature(path: &Path) -> Result<Feature> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read feature file '{}': {}",
            path.display(),
            e
        ))
    })?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("feature") => {
            gherkin::parse_feature(&content).map_err(|msg| Error::scenario_parse(path, msg))
        }
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .map_err(|e| Error::scenario_parse(path, e.to_string())),
        _ => Err(Error::scenario_parse(
            path,
            "unsupported file type, expected .feature, .yaml or .yml",
        )),
    }
}

/// Whether a path looks like a feature file
pub fn is_feature_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("feature") | Some("yaml") | Some("yml")
    )
}

fn substitute(text: &str, row: &BTreeMap<String, String>) -> String {
    row.iter().fold(text.to_string(), |acc, (column, value)| {
        acc.replace(&format!("<{}>", column), value)
    })
}

/// YAML example cells may be numbers or booleans; keep them as text
fn deserialize_examples<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows: Vec<BTreeMap<String, serde_yaml::Value>> = Vec::deserialize(deserializer)?;
    Ok(rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(column, cell)| {
                    let text = match cell {
                        serde_yaml::Value::Null => String::new(),
                        serde_yaml::Value::Bool(b) => b.to_string(),
                        serde_yaml::Value::Number(n) => n.to_string(),
                        serde_yaml::Value::String(s) => s,
                        other => serde_yaml::to_string(&other)
                            .map(|s| s.trim_end().to_string())
                            .unwrap_or_default(),
                    };
                    (column, text)
                })
                .collect()
        })
        .collect())
}
