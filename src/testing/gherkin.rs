//! Minimal Gherkin reader
//!
//! Supports `Feature`, `Background`, `Scenario`, `Scenario Outline` with
//! `Examples` tables, and the `Given`/`When`/`Then`/`And`/`But`/`*` step
//! keywords. Tags, comments and blank lines are skipped. Doc strings and
//! step data tables are not supported.

use std::collections::BTreeMap;

use super::config::{Feature, ScenarioDef};
use super::steps::STEP_KEYWORDS;

enum Section {
    Start,
    Description,
    Background,
    Scenario,
    Examples { headers: Option<Vec<String>> },
}

const SCENARIO_KEYWORDS: &[&str] = &[
    "Scenario Outline:",
    "Scenario Template:",
    "Scenario:",
    "Example:",
];

const EXAMPLES_KEYWORDS: &[&str] = &["Examples:", "Scenarios:"];

/// Parse the text of a `.feature` file
pub fn parse_feature(text: &str) -> Result<Feature, String> {
    let mut feature = Feature::default();
    let mut seen_feature = false;
    let mut description: Vec<&str> = Vec::new();
    let mut section = Section::Start;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with('@') {
            continue;
        }

        if let Some(name) = line.strip_prefix("Feature:") {
            if seen_feature {
                return Err(format!("line {}: only one Feature per file", line_no));
            }
            seen_feature = true;
            feature.name = name.trim().to_string();
            section = Section::Description;
            continue;
        }

        if !seen_feature {
            return Err(format!("line {}: expected 'Feature:' first", line_no));
        }

        if line.starts_with("Background:") {
            section = Section::Background;
            continue;
        }

        if let Some(name) = strip_any(line, SCENARIO_KEYWORDS) {
            feature.scenarios.push(ScenarioDef {
                name: name.trim().to_string(),
                ..ScenarioDef::default()
            });
            section = Section::Scenario;
            continue;
        }

        if strip_any(line, EXAMPLES_KEYWORDS).is_some() {
            if feature.scenarios.is_empty() {
                return Err(format!("line {}: Examples outside of a scenario", line_no));
            }
            section = Section::Examples { headers: None };
            continue;
        }

        if line.starts_with('|') {
            let Section::Examples { headers } = &mut section else {
                return Err(format!(
                    "line {}: tables are only supported under Examples",
                    line_no
                ));
            };
            let cells = parse_row(line).map_err(|e| format!("line {}: {}", line_no, e))?;
            match headers {
                None => *headers = Some(cells),
                Some(names) => {
                    if cells.len() != names.len() {
                        return Err(format!(
                            "line {}: expected {} cells, found {}",
                            line_no,
                            names.len(),
                            cells.len()
                        ));
                    }
                    let row: BTreeMap<String, String> =
                        names.iter().cloned().zip(cells).collect();
                    if let Some(current) = feature.scenarios.last_mut() {
                        current.examples.push(row);
                    }
                }
            }
            continue;
        }

        if is_step(line) {
            match section {
                Section::Background => feature.background.push(line.to_string()),
                Section::Scenario => {
                    if let Some(current) = feature.scenarios.last_mut() {
                        current.steps.push(line.to_string());
                    }
                }
                Section::Examples { .. } => {
                    return Err(format!("line {}: step after Examples table", line_no))
                }
                Section::Start | Section::Description => {
                    return Err(format!("line {}: step outside of a scenario", line_no))
                }
            }
            continue;
        }

        // Free text: feature or scenario description
        match section {
            Section::Description => description.push(line),
            Section::Scenario => {
                if let Some(current) = feature.scenarios.last_mut() {
                    if !current.steps.is_empty() {
                        return Err(format!("line {}: unexpected text '{}'", line_no, line));
                    }
                    let desc = current.description.get_or_insert_with(String::new);
                    if !desc.is_empty() {
                        desc.push('\n');
                    }
                    desc.push_str(line);
                }
            }
            _ => return Err(format!("line {}: unexpected text '{}'", line_no, line)),
        }
    }

    if !seen_feature {
        return Err("missing 'Feature:' line".to_string());
    }

    if !description.is_empty() {
        feature.description = Some(description.join("\n"));
    }

    Ok(feature)
}

fn strip_any<'a>(line: &'a str, keywords: &[&str]) -> Option<&'a str> {
    keywords.iter().find_map(|k| line.strip_prefix(k))
}

fn is_step(line: &str) -> bool {
    STEP_KEYWORDS.iter().any(|k| {
        line.strip_prefix(k)
            .map(|rest| rest.starts_with(' '))
            .unwrap_or(false)
    })
}

fn parse_row(line: &str) -> Result<Vec<String>, String> {
    let inner = line
        .strip_prefix('|')
        .and_then(|l| l.strip_suffix('|'))
        .ok_or_else(|| "table row must start and end with '|'".to_string())?;
    Ok(inner.split('|').map(|cell| cell.trim().to_string()).collect())
}
