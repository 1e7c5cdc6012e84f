//! Markdown rendering of analysis results
//!
//! Analyzers return typed results; everything a client reads is produced
//! here. Undefined values render as "N/A" with their reason, tables use
//! `tabled`'s markdown style, and the user-data disclaimer is prepended
//! when enabled.

pub mod defect;
pub mod equipment;
pub mod process;
pub mod recipe;
pub mod shift;

use std::fmt::Display;
use tabled::{builder::Builder, settings::Style};

use crate::analysis::Metric;

/// Prepended to every report unless disabled
pub const DISCLAIMER: &str = "> **Note:** this analysis is generated from the data you supplied. \
Confirm it against on-site conditions and expert review before acting on it.";

/// Placeholder for an absent optional value
pub const NOT_GIVEN: &str = "not provided";

/// Incrementally built Markdown document
#[derive(Debug, Clone, Default)]
pub struct Report {
    out: String,
}

impl Report {
    /// Start a report with a level-2 title
    pub fn new(title: &str) -> Self {
        Self {
            out: format!("## {}\n", title),
        }
    }

    pub fn section(&mut self, title: &str) -> &mut Self {
        self.out.push_str(&format!("\n### {}\n", title));
        self
    }

    /// `- **label**: value`
    pub fn field(&mut self, label: &str, value: impl Display) -> &mut Self {
        self.out.push_str(&format!("- **{}**: {}\n", label, value));
        self
    }

    pub fn bullet(&mut self, text: impl Display) -> &mut Self {
        self.out.push_str(&format!("- {}\n", text));
        self
    }

    /// Bullets, or a single fallback bullet when there are none
    pub fn bullets<I, T>(&mut self, items: I, empty: &str) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Display,
    {
        let mut any = false;
        for item in items {
            any = true;
            self.bullet(item);
        }
        if !any {
            self.bullet(empty);
        }
        self
    }

    pub fn numbered<I, T>(&mut self, items: I) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: Display,
    {
        for (idx, item) in items.into_iter().enumerate() {
            self.out.push_str(&format!("{}. {}\n", idx + 1, item));
        }
        self
    }

    /// Checklist item, unchecked
    pub fn check(&mut self, text: impl Display) -> &mut Self {
        self.out.push_str(&format!("- [ ] {}\n", text));
        self
    }

    pub fn text(&mut self, line: impl Display) -> &mut Self {
        self.out.push_str(&format!("{}\n", line));
        self
    }

    /// Markdown table; an empty body renders one row of dashes
    pub fn table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> &mut Self {
        let mut builder = Builder::default();
        builder.push_record(headers.iter().map(|h| cell(h)));
        if rows.is_empty() {
            builder.push_record(headers.iter().map(|_| "-".to_string()));
        }
        for row in rows {
            builder.push_record(row.iter().map(|c| cell(c)));
        }
        self.out.push('\n');
        self.out
            .push_str(&builder.build().with(Style::markdown()).to_string());
        self.out.push('\n');
        self
    }

    pub fn finish(&self, disclaimer: bool) -> String {
        if disclaimer {
            format!("{}\n\n{}", DISCLAIMER, self.out)
        } else {
            self.out.clone()
        }
    }
}

/// Table cell text with pipes and line breaks neutralized
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(|c: char| c == '\r' || c == '\n', " ")
}

/// Fixed-precision number
pub fn num(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

/// Signed fixed-precision number, e.g. "+1.25"
pub fn signed(value: f64, decimals: usize) -> String {
    format!("{:+.*}", decimals, value)
}

/// A value as the user wrote it: no trailing zeros
pub fn plain(value: f64) -> String {
    format!("{}", value)
}

pub fn opt_plain(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), plain)
}

pub fn opt_num(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| num(v, decimals))
}

pub fn with_unit(value: impl Display, unit: Option<&str>) -> String {
    match unit {
        Some(u) if !u.is_empty() => format!("{} {}", value, u),
        _ => value.to_string(),
    }
}

/// "N/A (reason)" for undefined metrics
pub fn metric(value: &Metric, decimals: usize) -> String {
    match value {
        Metric::Value(v) => num(*v, decimals),
        Metric::NotApplicable(reason) => format!("N/A ({})", reason),
    }
}

/// "min – max" with open ends shown as "-"
pub fn range(min: Option<f64>, max: Option<f64>) -> String {
    format!("{} – {}", opt_plain(min), opt_plain(max))
}

/// Report shown instead of a result when the input cannot be analyzed
pub fn input_error(summary: &str, missing: &[String], disclaimer: bool) -> String {
    let mut report = Report::new("⚠️ Input error");
    report.text(summary);
    if !missing.is_empty() {
        report.section("Missing fields");
        for m in missing {
            report.bullet(format!("`{}`", m));
        }
    }
    report.finish(disclaimer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::NotApplicable;

    #[test]
    fn test_table_renders_markdown() {
        let mut report = Report::new("Table");
        report.table(
            &["Parameter", "Value"],
            vec![vec!["rf_power".into(), "600".into()], vec!["a|b".into(), "1".into()]],
        );
        let text = report.finish(false);
        assert!(text.starts_with("## Table\n"));
        assert!(text.contains("| Parameter | Value |"));
        assert!(text.contains("| rf_power  | 600   |"));
        assert!(text.contains("a\\|b"));
    }

    #[test]
    fn test_empty_table_has_placeholder_row() {
        let mut report = Report::new("Empty");
        report.table(&["A", "B"], Vec::new());
        assert!(report.finish(false).contains("| - | - |"));
    }

    #[test]
    fn test_disclaimer_toggle() {
        let report = Report::new("X");
        assert!(report.finish(true).starts_with(DISCLAIMER));
        assert!(!report.finish(false).contains(DISCLAIMER));
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(num(4.0632, 2), "4.06");
        assert_eq!(signed(1.5, 2), "+1.50");
        assert_eq!(plain(600.0), "600");
        assert_eq!(plain(0.25), "0.25");
        assert_eq!(opt_plain(None), "-");
        assert_eq!(range(Some(8.0), None), "8 – -");
        assert_eq!(
            metric(&Metric::NotApplicable(NotApplicable::DegenerateSigma), 2),
            "N/A (zero standard deviation)"
        );
        assert_eq!(with_unit("600", Some("W")), "600 W");
    }

    #[test]
    fn test_input_error_lists_fields() {
        let text = input_error(
            "Required input is missing.",
            &["data_points".to_string()],
            false,
        );
        assert!(text.contains("Input error"));
        assert!(text.contains("- `data_points`"));
    }
}
