//! Source-annotated errors for catalog files

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// A catalog file that failed to parse, pointing at the offending line
#[derive(Debug, Error, Diagnostic)]
#[error("catalog parse error: {message}")]
#[diagnostic(code(semiproc::catalog::syntax))]
pub struct CatalogSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    message: String,
}

impl CatalogSyntaxError {
    pub fn from_yaml_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let (line, column) = err
            .location()
            .map(|loc| (loc.line(), loc.column()))
            .unwrap_or((1, 1));
        let offset = offset_of(source, line, column);
        let message = err.to_string();

        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset.saturating_add(1)),
            help: hint_for(&message),
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Byte offset of a 1-based line/column, clamped to the source length
fn offset_of(source: &str, line: usize, column: usize) -> usize {
    let line_start = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum::<usize>();
    let rest = &source[line_start.min(source.len())..];
    let col_offset = rest
        .char_indices()
        .take_while(|(_, c)| *c != '\n')
        .nth(column.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    (line_start + col_offset).min(source.len().saturating_sub(1))
}

fn hint_for(message: &str) -> Option<String> {
    let msg = message.to_lowercase();
    if msg.contains("tab") {
        Some("YAML indentation must use spaces, not tabs".to_string())
    } else if msg.contains("duplicate") {
        Some("each defect code, process and layer may appear only once".to_string())
    } else if msg.contains("missing field") {
        Some("recipe parameters need a `setting`; defects need a `description`".to_string())
    } else if msg.contains("invalid type") {
        Some("check that lists use `- item` and windows use numeric min/max".to_string())
    } else if msg.contains("mapping values are not allowed") {
        Some("quote values that contain ':'".to_string())
    } else {
        None
    }
}
