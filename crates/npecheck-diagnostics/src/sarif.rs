//! SARIF v2.1.0 output formatter for CI/CD integration.
//!
//! Produces SARIF JSON compatible with GitHub code scanning and other
//! SARIF consumers.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::diagnostic::{Diagnostic, Severity};
use crate::rules::get_rule;

// ---------------------------------------------------------------------------
// SARIF v2.1.0 data model
// ---------------------------------------------------------------------------

/// SARIF v2.1.0 root object.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLog {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub version: String,
    pub runs: Vec<SarifRun>,
}

/// A single SARIF run (one tool execution).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRun {
    pub tool: SarifTool,
    pub results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifTool {
    pub driver: SarifDriver,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifDriver {
    pub name: String,
    pub version: String,
    pub rules: Vec<SarifRule>,
}

/// A SARIF rule definition.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRule {
    pub id: String,
    pub short_description: SarifMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_description: Option<SarifMessage>,
    pub default_configuration: SarifRuleConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRuleConfig {
    pub level: String,
}

/// A SARIF result (one diagnostic finding).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResult {
    pub rule_id: String,
    pub level: String,
    pub message: SarifMessage,
    pub locations: Vec<SarifLocation>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifMessage {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLocation {
    pub physical_location: SarifPhysicalLocation,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub logical_locations: Vec<SarifLogicalLocation>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifPhysicalLocation {
    pub artifact_location: SarifArtifactLocation,
    pub region: SarifRegion,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifArtifactLocation {
    pub uri: String,
}

/// A region within a file (1-based).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRegion {
    pub start_line: u32,
    pub start_column: u32,
}

/// The enclosing function of a result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLogicalLocation {
    pub name: String,
    pub kind: String,
}

// ---------------------------------------------------------------------------
// Conversion functions
// ---------------------------------------------------------------------------

/// Convert diagnostics to a pretty-printed SARIF JSON string.
pub fn to_sarif(diagnostics: &[Diagnostic], version: &str) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&to_sarif_log(diagnostics, version))
}

/// Convert diagnostics to a [`SarifLog`] struct.
pub fn to_sarif_log(diagnostics: &[Diagnostic], version: &str) -> SarifLog {
    let rules = collect_rules(diagnostics);
    let results: Vec<SarifResult> = diagnostics.iter().map(diagnostic_to_sarif_result).collect();

    SarifLog {
        schema: "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/main/sarif-2.1/schema/sarif-schema-2.1.0.json".into(),
        version: "2.1.0".into(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: "npecheck".into(),
                    version: version.into(),
                    rules,
                },
            },
            results,
        }],
    }
}

fn severity_to_sarif_level(severity: Severity) -> String {
    match severity {
        Severity::Error => "error".into(),
        Severity::Warning => "warning".into(),
        Severity::Info => "note".into(),
    }
}

fn diagnostic_to_sarif_result(diag: &Diagnostic) -> SarifResult {
    let logical_locations = if diag.function.is_empty() {
        vec![]
    } else {
        vec![SarifLogicalLocation {
            name: diag.function.clone(),
            kind: "function".into(),
        }]
    };

    let message_text = if diag.explanation.is_empty() {
        diag.title.clone()
    } else {
        diag.explanation.clone()
    };

    SarifResult {
        rule_id: diag.rule.clone(),
        level: severity_to_sarif_level(diag.severity),
        message: SarifMessage { text: message_text },
        locations: vec![SarifLocation {
            physical_location: SarifPhysicalLocation {
                artifact_location: SarifArtifactLocation {
                    uri: diag.location.file.clone(),
                },
                region: SarifRegion {
                    start_line: diag.location.line,
                    start_column: diag.location.column,
                },
            },
            logical_locations,
        }],
    }
}

/// Unique rule definitions, one per rule code. Descriptions come from the
/// rule catalog when the code is known.
fn collect_rules(diagnostics: &[Diagnostic]) -> Vec<SarifRule> {
    let mut seen: BTreeMap<String, SarifRule> = BTreeMap::new();

    for diag in diagnostics {
        seen.entry(diag.rule.clone()).or_insert_with(|| SarifRule {
            id: diag.rule.clone(),
            short_description: SarifMessage {
                text: diag.title.clone(),
            },
            full_description: get_rule(&diag.rule).map(|r| SarifMessage {
                text: r.description,
            }),
            default_configuration: SarifRuleConfig {
                level: severity_to_sarif_level(diag.severity),
            },
        });
    }

    seen.into_values().collect()
}
