//! Nil-chain rule (NPE001).

use npecheck_ast::types::Position;
use npecheck_diagnostics::diagnostic::*;
use npecheck_diagnostics::rules::NPE_MESSAGE;

/// NPE001: a pointer link is dereferenced with no covering guard.
///
/// `nilable` is the chain prefix that may be nil, `accessed` the segment
/// read through it.
pub fn build_npe001(at: &Position, func_name: &str, nilable: &str, accessed: &str) -> Diagnostic {
    DiagnosticBuilder::new("NPE001", Severity::Warning, NPE_MESSAGE)
        .location(&at.file, at.line, at.column)
        .function(func_name)
        .explanation(format!(
            "In function `{func_name}`, `{nilable}` may be nil when `{nilable}.{accessed}` is accessed"
        ))
        .build()
}
