//! Defect history aggregation

use chrono::{Duration, NaiveDate};

/// Number of equipment listed in the concentration summary
pub const TOP_EQUIPMENT: usize = 3;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefectRecord {
    pub date: Option<String>,
    pub defect_type: Option<String>,
    pub equipment_id: Option<String>,
    pub wafer_count: Option<f64>,
    pub action_taken: Option<String>,
    pub result: Option<String>,
}

impl DefectRecord {
    /// Leading `YYYY-MM-DD` of the date field, if it parses
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?.trim();
        let day = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }
}

/// Look-back window counted from the newest dated record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateRange {
    Days(u32),
    #[default]
    All,
}

impl std::str::FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "all" || s.is_empty() {
            return Ok(DateRange::All);
        }
        let (digits, scale) = if let Some(d) = s.strip_suffix('d') {
            (d, 1)
        } else if let Some(w) = s.strip_suffix('w') {
            (w, 7)
        } else {
            (s.as_str(), 1)
        };
        digits
            .parse::<u32>()
            .ok()
            .and_then(|n| n.checked_mul(scale))
            .map(DateRange::Days)
            .ok_or_else(|| format!("invalid date range '{}', expected e.g. 7d, 30d, 90d or all", s))
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateRange::Days(n) => write!(f, "last {} days", n),
            DateRange::All => write!(f, "all records"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    /// Records after the date filter, in input order
    pub records: Vec<DefectRecord>,
    pub total: usize,
    pub wafer_sum: f64,
    /// Distinct actions in first-seen order
    pub actions: Vec<String>,
    /// Most frequent equipment, ties by first appearance
    pub top_equipment: Vec<(String, usize)>,
    /// Most frequent defect types
    pub defect_types: Vec<(String, usize)>,
    /// Records dropped by the date filter because their date did not parse
    pub undated: usize,
    pub newest: Option<NaiveDate>,
}

fn count_by<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for v in values {
        match counts.iter_mut().find(|(k, _)| k == v) {
            Some((_, n)) => *n += 1,
            None => counts.push((v.to_string(), 1)),
        }
    }
    // stable: equal counts keep first appearance
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

pub fn summarize(records: &[DefectRecord], range: DateRange) -> HistorySummary {
    let newest = records.iter().filter_map(DefectRecord::parsed_date).max();
    let mut undated = 0;

    // a cutoff before the earliest representable date keeps everything
    let cutoff = match (range, newest) {
        (DateRange::Days(days), Some(newest)) => {
            newest.checked_sub_signed(Duration::days(i64::from(days)))
        }
        _ => None,
    };

    let kept: Vec<DefectRecord> = match cutoff {
        Some(cutoff) => {
            records
                .iter()
                .filter(|r| match r.parsed_date() {
                    Some(d) => d > cutoff,
                    None => {
                        undated += 1;
                        false
                    }
                })
                .cloned()
                .collect()
        }
        _ => records.to_vec(),
    };

    let mut actions: Vec<String> = Vec::new();
    for a in kept.iter().filter_map(|r| r.action_taken.as_deref()) {
        let a = a.trim();
        if !a.is_empty() && !actions.iter().any(|x| x == a) {
            actions.push(a.to_string());
        }
    }
    let mut top_equipment = count_by(
        kept.iter()
            .map(|r| r.equipment_id.as_deref().unwrap_or("unknown")),
    );
    top_equipment.truncate(TOP_EQUIPMENT);
    let defect_types = count_by(
        kept.iter()
            .map(|r| r.defect_type.as_deref().unwrap_or("unknown")),
    );

    HistorySummary {
        total: kept.len(),
        wafer_sum: kept.iter().filter_map(|r| r.wafer_count).sum(),
        records: kept,
        actions,
        top_equipment,
        defect_types,
        undated,
        newest,
    }
}
