//! Table formatting for CLI list commands
//!
//! # Text Wrapping
//!
//! Long text columns are word-wrapped onto continuation lines when a wrap
//! width is configured. CSV output stays single-line for pipability.

use console::style;

use crate::cli::helpers::{escape_csv, truncate_str};
use crate::cli::OutputFormat;

/// Configuration for table output
#[derive(Debug, Clone)]
pub struct TableConfig {
    /// Maximum width for text columns before wrapping (None = truncate instead)
    pub wrap_width: Option<usize>,
    /// Show summary line after table (e.g., "16 tool(s) available")
    pub show_summary: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            wrap_width: None,
            show_summary: true,
        }
    }
}

impl TableConfig {
    /// Create config with text wrapping enabled at the specified width
    pub fn with_wrap(width: usize) -> Self {
        Self {
            wrap_width: Some(width),
            show_summary: true,
        }
    }

    /// Create config optimized for piping (no wrapping, no summary)
    pub fn for_pipe() -> Self {
        Self {
            wrap_width: None,
            show_summary: false,
        }
    }
}

/// Wrap text to fit within a maximum width, breaking at word boundaries
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if text.chars().count() <= max_width || max_width < 5 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let line_len = current_line.chars().count();
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if line_len + 1 + word_len <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(std::mem::replace(&mut current_line, word.to_string()));
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Tool or key name (cyan)
    Name(String),
    /// Plain text, wrapped or truncated
    Text(String),
    /// Identifier list, comma-separated
    List(Vec<String>),
    /// Right-aligned count
    Number(usize),
    /// Empty/placeholder
    Empty,
}

impl CellValue {
    /// Format for terminal output
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Name(name) => format!("{:<width$}", style(name).cyan(), width = width),
            CellValue::Text(_) | CellValue::List(_) => {
                let truncated = truncate_str(&self.raw(), width.saturating_sub(2));
                format!("{:<width$}", truncated, width = width)
            }
            CellValue::Number(n) => format!("{:>width$}", n, width = width),
            CellValue::Empty => format!("{:<width$}", style("-").dim(), width = width),
        }
    }

    /// Format for CSV output (RFC 4180, no colors)
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            other => escape_csv(&other.raw()),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Name(name) => format!("`{}`", name),
            CellValue::Empty => "-".to_string(),
            other => other.raw(),
        };
        raw.replace('|', "\\|")
    }

    /// Get raw string value
    pub fn raw(&self) -> String {
        match self {
            CellValue::Name(s) | CellValue::Text(s) => s.clone(),
            CellValue::List(items) => items.join(", "),
            CellValue::Number(n) => n.to_string(),
            CellValue::Empty => String::new(),
        }
    }

    /// Display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Empty => 1,
            other => other.raw().chars().count(),
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
#[derive(Debug, Default)]
pub struct TableRow {
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    item_name: &'static str,
    config: TableConfig,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], item_name: &'static str) -> Self {
        Self {
            columns,
            item_name,
            config: TableConfig::default(),
        }
    }

    /// Configure the formatter with custom settings
    pub fn with_config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    /// Render rows in the specified format
    pub fn render(&self, rows: &[TableRow], format: OutputFormat) -> String {
        match format {
            OutputFormat::Csv => self.render_csv(rows),
            OutputFormat::Md => self.render_md(rows),
            _ => self.render_tsv(rows),
        }
    }

    /// Print rows in the specified format
    pub fn output(&self, rows: &[TableRow], format: OutputFormat) {
        print!("{}", self.render(rows, format));
    }

    /// Column widths from content, capped at each column's maximum
    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        self.columns
            .iter()
            .map(|col| {
                let max_content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(CellValue::display_width)
                    .max()
                    .unwrap_or(0);
                col.header
                    .len()
                    .max(max_content.saturating_add(2))
                    .min(col.width)
            })
            .collect()
    }

    fn render_tsv(&self, rows: &[TableRow]) -> String {
        let widths = self.calculate_widths(rows);
        let mut out = String::new();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<width$}", style(col.header).bold(), width = *w))
            .collect();
        out.push_str(header.join(" ").trim_end());
        out.push('\n');

        let total_width: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(total_width));
        out.push('\n');

        for row in rows {
            match self.config.wrap_width {
                Some(wrap) => self.render_row_wrapped(&mut out, row, &widths, wrap),
                None => {
                    let parts: Vec<String> = self
                        .columns
                        .iter()
                        .zip(&widths)
                        .map(|(col, w)| match row.get(col.key) {
                            Some(v) => v.format_tsv(*w),
                            None => CellValue::Empty.format_tsv(*w),
                        })
                        .collect();
                    out.push_str(parts.join(" ").trim_end());
                    out.push('\n');
                }
            }
        }

        if self.config.show_summary {
            out.push('\n');
            out.push_str(&format!(
                "{} {}(s) available.\n",
                style(rows.len()).cyan(),
                self.item_name
            ));
        }
        out
    }

    /// The last column wraps; the others stay on the first line
    fn render_row_wrapped(&self, out: &mut String, row: &TableRow, widths: &[usize], wrap: usize) {
        let last = self.columns.len().saturating_sub(1);
        let mut continuation = Vec::new();
        let mut parts = Vec::new();
        for (idx, (col, w)) in self.columns.iter().zip(widths).enumerate() {
            let value = row.get(col.key).cloned().unwrap_or(CellValue::Empty);
            match (&value, idx == last) {
                (CellValue::Text(text), true) => {
                    let mut lines = wrap_text(text, wrap).into_iter();
                    parts.push(lines.next().unwrap_or_default());
                    continuation.extend(lines);
                }
                _ => parts.push(value.format_tsv(*w)),
            }
        }
        out.push_str(parts.join(" ").trim_end());
        out.push('\n');

        let indent: usize = widths[..last].iter().sum::<usize>() + last;
        for line in continuation {
            out.push_str(&" ".repeat(indent));
            out.push_str(&line);
            out.push('\n');
        }
    }

    fn render_csv(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let header: Vec<&str> = self.columns.iter().map(|c| c.key).collect();
        out.push_str(&header.join(","));
        out.push('\n');
        for row in rows {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|col| row.get(col.key).map(CellValue::format_csv).unwrap_or_default())
                .collect();
            out.push_str(&cells.join(","));
            out.push('\n');
        }
        out
    }

    fn render_md(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let header: Vec<&str> = self.columns.iter().map(|c| c.header).collect();
        out.push_str(&format!("| {} |\n", header.join(" | ")));
        out.push_str(&format!(
            "|{}|\n",
            self.columns.iter().map(|_| "---").collect::<Vec<_>>().join("|")
        ));
        for row in rows {
            let cells: Vec<String> = self
                .columns
                .iter()
                .map(|col| {
                    row.get(col.key)
                        .map(CellValue::format_md)
                        .unwrap_or_else(|| "-".to_string())
                })
                .collect();
            out.push_str(&format!("| {} |\n", cells.join(" | ")));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("name", "NAME", 30),
        ColumnDef::new("required", "REQUIRED", 40),
        ColumnDef::new("description", "DESCRIPTION", 60),
    ];

    fn rows() -> Vec<TableRow> {
        vec![TableRow::new()
            .cell("name", CellValue::Name("analyze_trend".into()))
            .cell(
                "required",
                CellValue::List(vec!["time_series_data".into(), "parameter_name".into()]),
            )
            .cell("description", CellValue::Text("Trend analysis, with a | pipe".into()))]
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("short", 10), vec!["short"]);
        assert_eq!(
            wrap_text("one two three four", 9),
            vec!["one two", "three", "four"]
        );
    }

    #[test]
    fn test_csv_escapes_commas() {
        let text = TableFormatter::new(COLUMNS, "tool").render(&rows(), OutputFormat::Csv);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "name,required,description");
        assert_eq!(
            lines[1],
            "analyze_trend,\"time_series_data, parameter_name\",\"Trend analysis, with a | pipe\""
        );
    }

    #[test]
    fn test_md_escapes_pipes() {
        let text = TableFormatter::new(COLUMNS, "tool").render(&rows(), OutputFormat::Md);
        assert!(text.starts_with("| NAME | REQUIRED | DESCRIPTION |\n|---|---|---|\n"));
        assert!(text.contains("| `analyze_trend` |"));
        assert!(text.contains("with a \\| pipe"));
    }

    #[test]
    fn test_tsv_summary_toggle() {
        let formatter = TableFormatter::new(COLUMNS, "tool");
        assert!(formatter
            .render(&rows(), OutputFormat::Tsv)
            .contains("tool(s) available"));
        let piped = TableFormatter::new(COLUMNS, "tool").with_config(TableConfig::for_pipe());
        assert!(!piped
            .render(&rows(), OutputFormat::Tsv)
            .contains("available"));
    }
}
