//! Nil-chain analysis engine.
//!
//! Per function, a recording pass builds a check registry from parameter
//! types, assignments and nil comparisons, then a detection pass checks
//! every access chain against it. Reachability is approximated by source
//! position order; there is no CFG.

use npecheck_ast::ast::{AnalysisInput, FuncDecl, SourceFile};
use npecheck_ast::types::{TypeOracle, TypeTable};
use npecheck_diagnostics::diagnostic::Diagnostic;

use crate::detection::Detector;
use crate::recording::Recorder;
use crate::registry::CheckRegistry;

/// Two-pass nil-chain analyzer.
pub struct NpeAnalyzer;

impl NpeAnalyzer {
    /// Analyze every function of every file, in input order.
    pub fn analyze(input: &AnalysisInput) -> Vec<Diagnostic> {
        input.files.iter().flat_map(Self::analyze_file).collect()
    }

    pub fn analyze_file(file: &SourceFile) -> Vec<Diagnostic> {
        let table = TypeTable::from_file(file);
        file.functions
            .iter()
            .flat_map(|func| Self::analyze_function(func, &table, &Self::display_name(func, &table)))
            .collect()
    }

    /// Analyze one function with a fresh registry.
    pub fn analyze_function(
        func: &FuncDecl,
        oracle: &dyn TypeOracle,
        display_name: &str,
    ) -> Vec<Diagnostic> {
        let registry = Self::record(func, oracle);
        let diags = Self::detect(func, oracle, &registry, display_name);
        tracing::debug!(
            function = display_name,
            tracked = registry.len(),
            diagnostics = diags.len(),
            "nil-chain analysis done"
        );
        diags
    }

    /// Recording pass only. The returned registry can be inspected or fed
    /// to [`NpeAnalyzer::detect`] any number of times.
    pub fn record(func: &FuncDecl, oracle: &dyn TypeOracle) -> CheckRegistry {
        Recorder::new(oracle).record_function(func)
    }

    /// Detection pass only. Does not modify the registry.
    pub fn detect(
        func: &FuncDecl,
        oracle: &dyn TypeOracle,
        registry: &CheckRegistry,
        display_name: &str,
    ) -> Vec<Diagnostic> {
        Detector::new(oracle, registry, display_name).detect_function(func)
    }

    /// `Name` for functions, `Recv.Name` for methods (pointer and package
    /// qualifier stripped from the receiver type).
    pub fn display_name(func: &FuncDecl, table: &TypeTable) -> String {
        let recv = func
            .recv
            .as_ref()
            .and_then(|r| table.get(r.type_id))
            .map(|t| {
                let name = t.name.trim_start_matches('*');
                name.rsplit('.').next().unwrap_or(name).to_string()
            });
        match recv {
            Some(recv) if !recv.is_empty() => format!("{recv}.{}", func.name.name),
            _ => func.name.name.clone(),
        }
    }
}
