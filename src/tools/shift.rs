use serde_json::{Map, Value};

use super::{ToolContext, ToolError};
use crate::analysis::shift::{
    EquipmentState, KeyEvent, ProductionSummary, QualitySummary, ShiftHandover, ShiftInfo,
};
use crate::input::{parse, Arguments, InputError};
use crate::report::{self, Report};

fn field_text(obj: &Map<String, Value>, key: &str, field: &str) -> Result<Option<String>, InputError> {
    Ok(parse::get_ci(obj, key)
        .map(|v| parse::text(v, &format!("{}.{}", field, key)))
        .transpose()?
        .filter(|s| !s.is_empty()))
}

fn field_number(obj: &Map<String, Value>, key: &str, field: &str) -> Result<Option<f64>, InputError> {
    parse::optional_number(parse::get_ci(obj, key), &format!("{}.{}", field, key))
}

fn production(obj: &Map<String, Value>) -> Result<ProductionSummary, InputError> {
    let field = "production_summary";
    Ok(ProductionSummary {
        wafer_in: field_number(obj, "wafer_in", field)?,
        wafer_out: field_number(obj, "wafer_out", field)?,
        target: field_number(obj, "target", field)?,
        yield_pct: field_number(obj, "yield", field)?,
    })
}

fn quality(obj: &Map<String, Value>) -> Result<QualitySummary, InputError> {
    let field = "quality_summary";
    Ok(QualitySummary {
        defect_count: field_number(obj, "defect_count", field)?,
        major_defects: parse::get_ci(obj, "major_defects")
            .map(|v| parse::string_list(v, "quality_summary.major_defects"))
            .transpose()?
            .unwrap_or_default(),
        spc_alerts: field_number(obj, "spc_alerts", field)?,
    })
}

fn equipment(args: &Arguments<'_>) -> Result<Vec<EquipmentState>, InputError> {
    let mut out = Vec::new();
    for (i, item) in args.array("equipment_status")?.iter().enumerate() {
        let field = format!("equipment_status[{}]", i);
        let obj = parse::object(item, &field)?;
        out.push(EquipmentState {
            equipment_id: field_text(obj, "equipment_id", &field)?
                .unwrap_or_else(|| report::NOT_GIVEN.to_string()),
            status: field_text(obj, "status", &field)?.unwrap_or_else(|| "unknown".to_string()),
            issues: field_text(obj, "issues", &field)?,
        });
    }
    Ok(out)
}

fn events(args: &Arguments<'_>) -> Result<Vec<KeyEvent>, InputError> {
    let mut out = Vec::new();
    for (i, item) in args.array("key_events")?.iter().enumerate() {
        let field = format!("key_events[{}]", i);
        let obj = parse::object(item, &field)?;
        out.push(KeyEvent {
            time: field_text(obj, "time", &field)?,
            event: field_text(obj, "event", &field)?.unwrap_or_else(|| "-".to_string()),
            action: field_text(obj, "action", &field)?,
            status: field_text(obj, "status", &field)?,
        });
    }
    Ok(out)
}

pub(super) fn generate_shift_report(
    args: &Arguments<'_>,
    _ctx: &ToolContext,
) -> Result<Report, ToolError> {
    let production_raw = parse::object(args.require("production_summary")?, "production_summary")?;
    let quality_raw = parse::object(args.require("quality_summary")?, "quality_summary")?;
    let info = match args.object("shift_info")? {
        Some(obj) => ShiftInfo {
            shift: field_text(obj, "shift", "shift_info")?,
            date: field_text(obj, "date", "shift_info")?,
        },
        None => ShiftInfo::default(),
    };

    let handover = ShiftHandover {
        info,
        production: production(production_raw)?,
        equipment: equipment(args)?,
        quality: quality(quality_raw)?,
        events: events(args)?,
        pending: args.string_list("pending_actions")?,
    };
    Ok(report::shift::shift_report(&handover))
}
