//! Analysis orchestrator: loads bridge output, runs the nil-chain analysis
//! per function and applies configured post-processing.

use crate::config::Config;
use npecheck_ast::ast::{AnalysisInput, SourceFile};
use npecheck_ast::types::TypeTable;
use npecheck_ast::LoadError;
use npecheck_diagnostics::diagnostic::{AnalysisSummary, Diagnostic};
use npecheck_nil::analysis::NpeAnalyzer;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

/// Complete output from an analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOutput {
    /// Diagnostics in traversal order.
    pub diagnostics: Vec<Diagnostic>,
    pub summary: AnalysisSummary,
    /// Display names of functions whose analysis panicked.
    pub failed_functions: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("failed to load analysis input: {0}")]
    Load(#[from] LoadError),
}

/// Load a bridge JSON file and analyze it.
pub fn analyze_path(path: &Path, config: &Config) -> Result<AnalysisOutput, OrchestratorError> {
    let input = npecheck_ast::load_json_file(path)?;
    tracing::info!(
        path = %path.display(),
        files = input.files.len(),
        functions = input.function_count(),
        "loaded bridge output"
    );
    Ok(analyze_input(&input, config))
}

/// Run the analysis over already-loaded input.
/// Used by both the CLI and tests (from fixtures).
pub fn analyze_input(input: &AnalysisInput, config: &Config) -> AnalysisOutput {
    let mut diagnostics = Vec::new();
    let mut failed_functions = Vec::new();
    let mut files = 0;
    let mut functions = 0;

    if config.rules.npe.enabled {
        for file in input.files.iter().filter(|f| !skip_file(f, config)) {
            files += 1;
            functions += analyze_file(file, config, &mut diagnostics, &mut failed_functions);
        }
    }

    postprocess_diagnostics(diagnostics, failed_functions, config, files, functions)
}

fn skip_file(file: &SourceFile, config: &Config) -> bool {
    let skip = (config.npecheck.skip_generated && file.is_generated)
        || (config.npecheck.skip_tests && file.is_test);
    if skip {
        tracing::debug!(file = %file.path, "skipping file");
    }
    skip
}

/// Analyze every non-ignored function of one file, isolating each run so a
/// panic in one function does not stop the rest. Returns the number of
/// functions analyzed.
fn analyze_file(
    file: &SourceFile,
    config: &Config,
    diagnostics: &mut Vec<Diagnostic>,
    failed: &mut Vec<String>,
) -> usize {
    let table = TypeTable::from_file(file);
    let mut analyzed = 0;
    for func in &file.functions {
        let name = NpeAnalyzer::display_name(func, &table);
        if config.rules.npe.is_ignored(&name) {
            tracing::debug!(function = %name, "ignored by config");
            continue;
        }
        analyzed += 1;
        let run = panic::catch_unwind(AssertUnwindSafe(|| {
            NpeAnalyzer::analyze_function(func, &table, &name)
        }));
        match run {
            Ok(diags) => diagnostics.extend(diags),
            Err(payload) => {
                tracing::warn!(
                    file = %file.path,
                    function = %name,
                    reason = panic_message(payload.as_ref()),
                    "analysis failed, skipping function"
                );
                failed.push(name);
            }
        }
    }
    analyzed
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}

/// Truncate to `max_diagnostics` and build the summary. Order is kept.
fn postprocess_diagnostics(
    mut diags: Vec<Diagnostic>,
    failed_functions: Vec<String>,
    config: &Config,
    files: usize,
    functions: usize,
) -> AnalysisOutput {
    let max = config.npecheck.max_diagnostics;
    if max > 0 && diags.len() > max {
        tracing::debug!(found = diags.len(), max, "truncating diagnostics");
        diags.truncate(max);
    }
    let summary = AnalysisSummary::from_diagnostics(&diags, files, functions);
    AnalysisOutput {
        diagnostics: diags,
        summary,
        failed_functions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use npecheck_ast::ast::Stmt;
    use npecheck_ast::fixture::*;

    /// One file with an unguarded `PrintField(p *T)` and a guarded twin.
    fn input() -> AnalysisInput {
        let mut fb = FixtureBuilder::new("a/a.go");
        let t = fb.pointer("a.T");
        let int = fb.value("int");
        let print = fb.func(&[]);
        let access = |line: u32| {
            expr_stmt(call(
                sel(id("fmt", 0, line, 2), "Println", print, line, 6),
                vec![sel(id("p", t, line, 14), "Field", int, line, 16)],
                line,
                21,
            ))
        };
        let bare = func("PrintField", vec![param("p", t, 5, 17)], vec![access(6)]);
        let guarded = func(
            "PrintGuarded",
            vec![param("p", t, 9, 19)],
            vec![
                if_stmt(eq_nil(id("p", t, 10, 5), 10, 10), vec![Stmt::Unsupported]),
                access(13),
            ],
        );
        AnalysisInput {
            files: vec![fb.finish(vec![bare, guarded])],
            ..Default::default()
        }
    }

    #[test]
    fn test_analyze_input() {
        let output = analyze_input(&input(), &Config::default());
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].function, "PrintField");
        assert_eq!(output.summary.warning, 1);
        assert_eq!(output.summary.files, 1);
        assert_eq!(output.summary.functions, 2);
        assert!(output.failed_functions.is_empty());
    }

    #[test]
    fn test_analyze_fixture() {
        let input = npecheck_ast::load_bridge_fixture("param_deref");
        let output = analyze_input(&input, &Config::default());
        assert_eq!(output.summary.total(), 1);
        assert_eq!(output.diagnostics[0].location.line, 6);
    }

    #[test]
    fn test_disabled_rule_reports_nothing() {
        let mut config = Config::default();
        config.rules.npe.enabled = false;
        let output = analyze_input(&input(), &config);
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.summary.functions, 0);
    }

    #[test]
    fn test_ignored_functions_are_not_analyzed() {
        let mut config = Config::default();
        config.rules.npe.ignore_functions = vec!["Print*".into()];
        let output = analyze_input(&input(), &config);
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.summary.functions, 0);
    }

    #[test]
    fn test_skip_generated_and_test_files() {
        let mut generated = input();
        generated.files[0].is_generated = true;
        assert!(analyze_input(&generated, &Config::default()).diagnostics.is_empty());

        let mut config = Config::default();
        config.npecheck.skip_generated = false;
        assert_eq!(analyze_input(&generated, &config).diagnostics.len(), 1);

        let mut tests = input();
        tests.files[0].is_test = true;
        assert_eq!(analyze_input(&tests, &Config::default()).diagnostics.len(), 1);
        config.npecheck.skip_tests = true;
        assert!(analyze_input(&tests, &config).diagnostics.is_empty());
    }

    #[test]
    fn test_max_diagnostics_keeps_traversal_order() {
        let mut input = input();
        let file = input.files[0].clone();
        let mut second = file.clone();
        second.path = "a/b.go".into();
        input.files = vec![file, second];

        let mut config = Config::default();
        config.npecheck.max_diagnostics = 1;
        let output = analyze_input(&input, &config);
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].location.file, "a/a.go");
    }

    #[test]
    fn test_analyze_path_missing_file() {
        let err = analyze_path(Path::new("/nonexistent/bridge.json"), &Config::default())
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Load(LoadError::Read { .. })));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
