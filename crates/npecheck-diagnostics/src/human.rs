//! Human-readable diagnostic output formatter.
//!
//! Uses ariadne for rich terminal output with source context.

use crate::diagnostic::{Diagnostic, Severity};
use ariadne::{Color, Config, IndexType, Label, Report, ReportKind, Source};
use std::collections::HashMap;
use std::path::Path;

/// Format diagnostics for human-readable terminal output.
///
/// Diagnostic file paths are resolved against `source_root` when given.
/// Diagnostics whose source cannot be read fall back to one plain
/// `file:line:col: message` line.
pub fn format_human(diags: &[Diagnostic], source_root: Option<&Path>, use_color: bool) -> String {
    if diags.is_empty() {
        return "No issues found\n".to_string();
    }

    let mut output = Vec::new();
    let mut source_cache: HashMap<String, String> = HashMap::new();

    // Go columns are byte offsets.
    let config = Config::default()
        .with_color(use_color)
        .with_index_type(IndexType::Byte);

    for diag in diags {
        let file = &diag.location.file;

        let source_text = source_cache.entry(file.clone()).or_insert_with(|| {
            let path = match source_root {
                Some(root) => root.join(file),
                None => Path::new(file).to_path_buf(),
            };
            std::fs::read_to_string(path).unwrap_or_default()
        });

        if source_text.is_empty() {
            output.push(format_fallback(diag));
            continue;
        }

        let (kind, color) = match diag.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
            Severity::Info => (ReportKind::Advice, Color::Cyan),
        };

        let offset = line_col_to_offset(source_text, diag.location.line, diag.location.column);
        let label_end = source_text[offset..]
            .chars()
            .next()
            .map_or(offset, |c| offset + c.len_utf8());

        let report = Report::build(kind, (file.as_str(), offset..label_end))
            .with_config(config)
            .with_code(&diag.rule)
            .with_message(&diag.title)
            .with_label(
                Label::new((file.as_str(), offset..label_end))
                    .with_message(&diag.explanation)
                    .with_color(color),
            )
            .with_note(format!("in function `{}`", diag.function));

        let mut buf = Vec::new();
        report
            .finish()
            .write(
                (file.as_str(), Source::from(source_text.as_str())),
                &mut buf,
            )
            .ok();

        output.push(String::from_utf8_lossy(&buf).to_string());
    }

    output.push(format!("\nFound {} issue(s)\n", diags.len()));

    output.join("\n")
}

/// Convert 1-based line:column to byte offset in source text.
fn line_col_to_offset(source: &str, line: u32, col: u32) -> usize {
    let line = line.saturating_sub(1) as usize;
    let col = col.saturating_sub(1) as usize;

    let offset: usize = source.split_inclusive('\n').take(line).map(str::len).sum();

    let mut offset = (offset + col).min(source.len().saturating_sub(1));
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Fallback format when the source file is not available.
fn format_fallback(diag: &Diagnostic) -> String {
    format!(
        "{}: {} [{}] {}\n",
        diag.location, diag.severity, diag.rule, diag.title
    )
}
