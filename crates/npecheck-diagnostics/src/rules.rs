//! Rule catalog - the rules npecheck can report.
//!
//! This module is the single source of truth for rule metadata; the
//! `explain` subcommand and the SARIF formatter both read from here.

use serde::Serialize;

/// Message attached to every nil-chain finding.
pub const NPE_MESSAGE: &str = "potential nil pointer reference";

/// Information about a single analysis rule.
#[derive(Debug, Clone, Serialize)]
pub struct RuleInfo {
    pub code: String,
    pub name: String,
    pub description: String,
    pub severity: String,
    pub category: String,
    /// Example Go code that triggers this rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_bad: Option<String>,
    /// Example Go code that is safe (does not trigger this rule).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_good: Option<String>,
    /// Go idiom for avoiding this issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub go_idiom: Option<String>,
}

/// Look up a single rule by code (case-insensitive, e.g. "npe001").
pub fn get_rule(code: &str) -> Option<RuleInfo> {
    get_all_rules()
        .into_iter()
        .find(|r| r.code.eq_ignore_ascii_case(code))
}

/// Return all available analysis rules.
pub fn get_all_rules() -> Vec<RuleInfo> {
    vec![RuleInfo {
        code: "NPE001".into(),
        name: "Potential nil pointer reference".into(),
        description: "A pointer link of an access chain rooted at a parameter (or a value \
                      derived from one) is dereferenced with no earlier `!= nil` / `== nil` \
                      comparison covering it."
            .into(),
        severity: "warning".into(),
        category: "nil".into(),
        example_bad: Some(
            "func Print(u *User) {\n    fmt.Println(u.Name) // u may be nil\n}".into(),
        ),
        example_good: Some(
            "func Print(u *User) {\n    if u == nil {\n        return\n    }\n    fmt.Println(u.Name)\n}"
                .into(),
        ),
        go_idiom: Some("Compare pointers received from callers against nil before use".into()),
    }]
}
