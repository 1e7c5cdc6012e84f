//! Defect analysis, defect history and corrective action reports

use super::{plain, Report, NOT_GIVEN};
use crate::analysis::history::{DateRange, HistorySummary};
use crate::catalog::DefectInfo;

const GENERAL_CHECKS: &[&str] = &[
    "Equipment state and alarm log",
    "Recent PM and calibration history",
    "Recipe change history and version",
    "Material and chemical lot changes",
    "SPC and lot-to-lot deviation",
];

/// A defect as reported by the caller
#[derive(Debug, Clone, Default)]
pub struct DefectCase<'a> {
    pub code: &'a str,
    pub description: &'a str,
    pub process_step: &'a str,
    pub equipment_id: Option<&'a str>,
    pub wafer_id: Option<&'a str>,
    pub known_causes: &'a [String],
    pub recent_changes: &'a [String],
}

pub fn analyze(case: &DefectCase<'_>, reference: Option<(&str, &DefectInfo)>) -> Report {
    let mut r = Report::new("🔍 Defect analysis");
    r.field("Defect code", case.code)
        .field("Description", case.description)
        .field("Process step", case.process_step)
        .field("Equipment", case.equipment_id.unwrap_or(NOT_GIVEN))
        .field("Wafer", case.wafer_id.unwrap_or(NOT_GIVEN));

    let mut rows: Vec<Vec<String>> = case
        .known_causes
        .iter()
        .map(|c| vec!["Reported cause".to_string(), c.clone()])
        .collect();
    if rows.is_empty() {
        rows.push(vec!["Reported cause".to_string(), "-".to_string()]);
    }
    if let Some((_, info)) = reference {
        rows.extend(
            info.likely_causes
                .iter()
                .map(|c| vec!["Known cause".to_string(), c.clone()]),
        );
    }
    rows.extend(
        GENERAL_CHECKS
            .iter()
            .map(|c| vec!["General check".to_string(), c.to_string()]),
    );
    r.section("Cause matrix").table(&["Source", "Item"], rows);

    r.section("Reference catalog");
    match reference {
        Some((code, info)) => {
            r.field("Entry", format!("{}: {}", code, info.description));
            match info.impacts_for(case.process_step) {
                Some(impacts) => {
                    r.text(format!("\nImpact on {}:", case.process_step));
                    for i in impacts {
                        r.bullet(i);
                    }
                }
                None => {
                    r.bullet(format!("No recorded impact for step {}", case.process_step));
                }
            }
            if !info.recommended_actions.is_empty() {
                r.text("\nRecommended actions:");
                r.numbered(info.recommended_actions.iter());
            }
        }
        None => {
            r.bullet(format!("No catalog entry for {}", case.code));
        }
    }

    r.section("Recent changes")
        .bullets(case.recent_changes.iter(), "No recent changes reported");

    r.section("Investigation priorities").numbered([
        "Trace back recent changes and interventions",
        "Check equipment alarms and sensor logs",
        "Compare the same lot with adjacent lots",
        "Verify recipe parameter deviations",
    ]);

    r.section("Checklist")
        .check("Review the defect location map for patterns")
        .check("Confirm pressure, temperature and flow are in their normal ranges")
        .check("Check consumable replacement intervals")
        .check("Review cleanroom environment and particle monitoring records");
    r
}

pub fn history(summary: &HistorySummary, analysis_type: &str, range: DateRange) -> Report {
    let mut r = Report::new(&format!("📊 Defect history analysis ({})", analysis_type));
    r.section("Overview")
        .field("Records", summary.total)
        .field("Defective wafers", plain(summary.wafer_sum))
        .field("Range", range)
        .field(
            "Newest record",
            summary
                .newest
                .map_or_else(|| "-".to_string(), |d| d.to_string()),
        )
        .field(
            "Actions used",
            if summary.actions.is_empty() {
                "no action information".to_string()
            } else {
                summary.actions.join(", ")
            },
        );
    if summary.undated > 0 {
        r.bullet(format!(
            "{} record(s) without a readable date left out of the range",
            summary.undated
        ));
    }

    let dash = |v: Option<&str>| v.unwrap_or("-").to_string();
    r.section("Occurrences").table(
        &["Date", "Defect type", "Equipment", "Wafers", "Action", "Result"],
        summary
            .records
            .iter()
            .map(|rec| {
                vec![
                    dash(rec.date.as_deref()),
                    dash(rec.defect_type.as_deref()),
                    dash(rec.equipment_id.as_deref()),
                    rec.wafer_count.map_or_else(|| "-".to_string(), plain),
                    dash(rec.action_taken.as_deref()),
                    dash(rec.result.as_deref()),
                ]
            })
            .collect(),
    );

    r.section("Patterns");
    r.text("Equipment concentration:");
    r.bullets(
        summary
            .top_equipment
            .iter()
            .map(|(eq, n)| format!("{}: {} time(s)", eq, n)),
        "not enough data",
    );
    if summary.defect_types.len() > 1 {
        r.text("Defect types:");
        for (t, n) in &summary.defect_types {
            r.bullet(format!("{}: {}", t, n));
        }
    }

    r.section("Recommendations")
        .bullet("Re-check process conditions on repeat equipment")
        .bullet("Verify action effectiveness by comparing before and after metrics")
        .bullet("Review the preventive maintenance interval");
    r
}

/// A corrective action request
#[derive(Debug, Clone, Default)]
pub struct CorrectiveRequest<'a> {
    pub problem: &'a str,
    pub equipment: &'a str,
    pub severity: &'a str,
    pub status: &'a str,
    pub resources: &'a [String],
    pub time_constraint: Option<&'a str>,
}

pub fn corrective_action(
    request: &CorrectiveRequest<'_>,
    playbook: Option<&[String]>,
    reference: Option<(&str, &DefectInfo)>,
) -> Report {
    let mut r = Report::new("🔧 Corrective action plan");
    r.field("Problem", request.problem)
        .field("Affected equipment", request.equipment)
        .field("Severity", request.severity)
        .field("Current status", request.status)
        .field("Time constraint", request.time_constraint.unwrap_or(NOT_GIVEN));

    r.section("Immediate actions (priority order)");
    match playbook {
        Some(steps) if !steps.is_empty() => {
            r.numbered(steps.iter());
        }
        _ => {
            r.numbered(["Assess the situation before deciding on action"]);
        }
    }

    if let Some((code, info)) = reference {
        if !info.recommended_actions.is_empty() {
            r.section(&format!("Known remedies for {}", code))
                .bullets(info.recommended_actions.iter(), "none");
        }
    }

    r.section("Step-by-step guide").numbered([
        "Confirm the symptom reproduces and secure the logs",
        "Check process and equipment parameters, set point against actual",
        "Review recent changes and interventions",
        "Scope the impact across wafers, lots and steps",
        "Plan verification after the fix",
    ]);

    r.section("Resource checklist");
    if request.resources.is_empty() {
        r.check("No resources listed");
    } else {
        for res in request.resources {
            r.check(res);
        }
    }

    r.section("Escalation")
        .bullet("Notify the senior engineer if unresolved within the time limit")
        .bullet("Report to the line manager at once if output is at risk");

    r.section("Recurrence prevention")
        .bullet("Update the work instruction or recipe once the cause is fixed")
        .bullet("Re-tune monitoring alarm limits and brief the team");
    r
}
