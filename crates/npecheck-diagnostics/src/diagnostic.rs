//! Core diagnostic types for npecheck.
//!
//! The analysis produces `Diagnostic` values, and all formatters
//! (human, JSON, SARIF) consume them.

use serde::{Deserialize, Serialize};

/// A diagnostic produced by the nil-chain analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Unique ID: RULE_CODE-file:line:column (e.g., "NPE001-a.go:18:5").
    pub id: String,
    /// Rule code (e.g., "NPE001").
    pub rule: String,
    pub severity: Severity,
    /// One-line message. Fixed per rule.
    #[serde(rename = "message")]
    pub title: String,
    /// Which link of which chain may be nil.
    pub explanation: String,
    /// The dereferenced identifier.
    pub location: Location,
    /// Enclosing function, `Recv.Method` for methods.
    pub function: String,
}

impl std::fmt::Display for Diagnostic {
    /// `message: file:line:col`, the plain-text rendering used by `go vet`
    /// style tooling.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.location)
    }
}

/// Severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source code location.
///
/// Lines and columns are 1-based (matching Go's `token.Position`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Builder for creating diagnostics conveniently.
pub struct DiagnosticBuilder {
    rule: String,
    severity: Severity,
    title: String,
    file: String,
    line: u32,
    column: u32,
    explanation: String,
    function: String,
}

impl DiagnosticBuilder {
    pub fn new(rule: impl Into<String>, severity: Severity, title: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            severity,
            title: title.into(),
            file: String::new(),
            line: 0,
            column: 0,
            explanation: String::new(),
            function: String::new(),
        }
    }

    pub fn location(mut self, file: impl Into<String>, line: u32, column: u32) -> Self {
        self.file = file.into();
        self.line = line;
        self.column = column;
        self
    }

    pub fn explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    pub fn build(self) -> Diagnostic {
        let id = format!("{}-{}:{}:{}", self.rule, self.file, self.line, self.column);
        Diagnostic {
            id,
            rule: self.rule,
            severity: self.severity,
            title: self.title,
            explanation: self.explanation,
            location: Location {
                file: self.file,
                line: self.line,
                column: self.column,
            },
            function: self.function,
        }
    }
}

/// Summary of analysis results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
    pub files: usize,
    pub functions: usize,
}

impl AnalysisSummary {
    pub fn from_diagnostics(diagnostics: &[Diagnostic], files: usize, functions: usize) -> Self {
        let mut summary = Self {
            files,
            functions,
            ..Self::default()
        };
        for diag in diagnostics {
            match diag.severity {
                Severity::Error => summary.error += 1,
                Severity::Warning => summary.warning += 1,
                Severity::Info => summary.info += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.error + self.warning + self.info
    }
}
