use serde_json::{Map, Value};

use super::{ToolContext, ToolError};
use crate::analysis::history::{summarize, DateRange, DefectRecord};
use crate::analysis::AnalysisError;
use crate::input::{parse, Arguments, InputError};
use crate::report::defect::{CorrectiveRequest, DefectCase};
use crate::report::{self, Report};

const SEVERITIES: &[&str] = &["critical", "major", "minor"];

fn opt_text(obj: &Map<String, Value>, key: &str, field: &str) -> Result<Option<String>, InputError> {
    Ok(parse::get_ci(obj, key)
        .map(|v| parse::text(v, &format!("{}.{}", field, key)))
        .transpose()?
        .filter(|s| !s.is_empty()))
}

fn defect_records(args: &Arguments<'_>) -> Result<Vec<DefectRecord>, InputError> {
    let mut records = Vec::new();
    for (i, item) in args.array("defect_records")?.iter().enumerate() {
        let field = format!("defect_records[{}]", i);
        let obj = parse::object(item, &field)?;
        records.push(DefectRecord {
            date: opt_text(obj, "date", &field)?,
            defect_type: opt_text(obj, "defect_type", &field)?,
            equipment_id: opt_text(obj, "equipment_id", &field)?,
            wafer_count: parse::optional_number(
                parse::get_ci(obj, "wafer_count"),
                &format!("{}.wafer_count", field),
            )?,
            action_taken: match opt_text(obj, "action_taken", &field)? {
                Some(a) => Some(a),
                None => opt_text(obj, "action", &field)?,
            },
            result: opt_text(obj, "result", &field)?,
        });
    }
    Ok(records)
}

pub(super) fn get_defect_history(args: &Arguments<'_>, _ctx: &ToolContext) -> Result<Report, ToolError> {
    let records = defect_records(args)?;
    if records.is_empty() {
        return Err(AnalysisError::InsufficientData {
            analysis: "defect history",
            required: 1,
            supplied: 0,
        }
        .into());
    }
    let range = match args.text("date_range")? {
        Some(raw) => raw
            .parse::<DateRange>()
            .map_err(|reason| InputError::InvalidArguments {
                field: "date_range".to_string(),
                reason,
            })?,
        None => DateRange::All,
    };
    let analysis_type = args
        .text("analysis_type")?
        .unwrap_or_else(|| "trend".to_string());

    let summary = summarize(&records, range);
    tracing::debug!(
        records = records.len(),
        kept = summary.total,
        undated = summary.undated,
        "defect history"
    );
    Ok(report::defect::history(&summary, &analysis_type, range))
}

pub(super) fn analyze_defect(args: &Arguments<'_>, ctx: &ToolContext) -> Result<Report, ToolError> {
    let code = args.require_text("defect_code")?;
    let description = args.require_text("defect_description")?;
    let step = args.require_text("process_step")?;
    let equipment = args.text("equipment_id")?;
    let wafer = args.text("wafer_id")?;
    let known_causes = args.string_list("known_causes")?;
    let recent_changes = args.string_list("recent_changes")?;

    let case = DefectCase {
        code: &code,
        description: &description,
        process_step: &step,
        equipment_id: equipment.as_deref(),
        wafer_id: wafer.as_deref(),
        known_causes: &known_causes,
        recent_changes: &recent_changes,
    };
    Ok(report::defect::analyze(&case, ctx.catalog.defect(&code)))
}

pub(super) fn suggest_corrective_action(
    args: &Arguments<'_>,
    ctx: &ToolContext,
) -> Result<Report, ToolError> {
    let problem = args.require_text("problem_description")?;
    let equipment = args.require_text("affected_equipment")?;
    let severity = args.require_text("severity")?.to_ascii_lowercase();
    let status = args.require_text("current_status")?;
    if !SEVERITIES.contains(&severity.as_str()) {
        return Err(InputError::InvalidArguments {
            field: "severity".to_string(),
            reason: format!("must be one of {}, got '{}'", SEVERITIES.join(", "), severity),
        }
        .into());
    }
    let resources = args.string_list("available_resources")?;
    let time_constraint = args.text("time_constraint")?;
    let defect_code = args.text("defect_code")?;

    let request = CorrectiveRequest {
        problem: &problem,
        equipment: &equipment,
        severity: &severity,
        status: &status,
        resources: &resources,
        time_constraint: time_constraint.as_deref(),
    };
    let reference = defect_code
        .as_deref()
        .and_then(|code| ctx.catalog.defect(code));
    Ok(report::defect::corrective_action(
        &request,
        ctx.catalog.playbook(&severity),
        reference,
    ))
}

#[cfg(test)]
mod tests {
    use super::super::{Registry, ToolContext, ToolError};
    use crate::catalog::Catalog;
    use crate::input::InputError;
    use serde_json::{json, Value};

    fn call(name: &str, args: Value) -> Result<(String, bool), ToolError> {
        let registry = Registry::new().unwrap();
        let ctx = ToolContext::new(Catalog::embedded().unwrap(), false);
        registry
            .call(name, args.as_object().unwrap(), &ctx)
            .map(|out| (out.text, out.is_error))
    }

    #[test]
    fn test_history_with_date_range() {
        let (text, is_error) = call(
            "get_defect_history",
            json!({
                "defect_records": [
                    {"date": "2024-01-02", "defect_type": "SCRATCH", "equipment_id": "CMP-01", "wafer_count": 2},
                    {"date": "2024-03-08", "defect_type": "PARTICLE", "equipment_id": "ETCH-02", "wafer_count": 4, "action_taken": "chamber clean"},
                    {"date": "2024-03-10", "defect_type": "PARTICLE", "equipment_id": "ETCH-02", "wafer_count": 1}
                ],
                "date_range": "7d"
            }),
        )
        .unwrap();
        assert!(!is_error);
        assert!(text.contains("- **Records**: 2"));
        assert!(text.contains("- **Range**: last 7 days"));
        assert!(!text.contains("CMP-01"));
    }

    #[test]
    fn test_history_needs_records() {
        let (text, is_error) = call("get_defect_history", json!({"defect_records": []})).unwrap();
        assert!(is_error);
        assert!(text.contains("Insufficient data for defect history"));
    }

    #[test]
    fn test_history_rejects_bad_range() {
        let err = call(
            "get_defect_history",
            json!({"defect_records": [{"date": "2024-01-01"}], "date_range": "last month"}),
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::Input(InputError::InvalidArguments { .. })));
    }

    #[test]
    fn test_analyze_defect_missing_fields() {
        let (text, is_error) = call("analyze_defect", json!({"defect_code": "PARTICLE"})).unwrap();
        assert!(is_error);
        assert!(text.contains("- `defect_description`"));
        assert!(text.contains("- `process_step`"));
    }

    #[test]
    fn test_corrective_action_with_known_remedy() {
        let (text, is_error) = call(
            "suggest_corrective_action",
            json!({
                "problem_description": "Scratches after CMP",
                "affected_equipment": "CMP-02",
                "severity": "Major",
                "current_status": "running with hold",
                "available_resources": "spare pad, brush kit",
                "defect_code": "scratch"
            }),
        )
        .unwrap();
        assert!(!is_error);
        assert!(text.contains("1. Pause the process and check conditions"));
        assert!(text.contains("Known remedies for SCRATCH"));
        assert!(text.contains("- [ ] brush kit"));
    }

    #[test]
    fn test_corrective_action_rejects_unknown_severity() {
        let err = call(
            "suggest_corrective_action",
            json!({
                "problem_description": "x",
                "affected_equipment": "y",
                "severity": "urgent",
                "current_status": "z"
            }),
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::Input(InputError::InvalidArguments { ref field, .. }) if field == "severity"));
    }
}
