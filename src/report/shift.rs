//! Shift hand-over report

use super::{num, opt_plain, Report, NOT_GIVEN};
use crate::analysis::shift::{down_count, ShiftHandover};

pub fn shift_report(h: &ShiftHandover) -> Report {
    let mut r = Report::new("📝 Shift report");
    r.field(
        "Shift",
        format!(
            "{} / {}",
            h.info.shift.as_deref().unwrap_or(NOT_GIVEN),
            h.info.date.as_deref().unwrap_or(NOT_GIVEN)
        ),
    );

    let p = &h.production;
    r.section("Production summary")
        .field("Wafers in", opt_plain(p.wafer_in))
        .field("Wafers out", opt_plain(p.wafer_out))
        .field("Target", opt_plain(p.target))
        .field(
            "Yield",
            p.yield_pct
                .map_or_else(|| "-".to_string(), |y| format!("{}%", y)),
        )
        .field(
            "Attainment",
            p.attainment_pct()
                .map_or_else(|| "N/A (no target)".to_string(), |a| format!("{}%", num(a, 1))),
        );
    if let Some(wip) = p.work_in_progress() {
        r.field("Work in progress", num(wip, 0));
    }

    r.section("Equipment status").table(
        &["Equipment", "Status", "Issues"],
        h.equipment
            .iter()
            .map(|e| {
                vec![
                    e.equipment_id.clone(),
                    e.status.clone(),
                    e.issues.clone().unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect(),
    );
    let down = down_count(&h.equipment);
    if down > 0 {
        r.bullet(format!("{} of {} unit(s) not running", down, h.equipment.len()));
    }

    let q = &h.quality;
    r.section("Quality summary")
        .field("Defects", opt_plain(q.defect_count))
        .field(
            "Major defects",
            if q.major_defects.is_empty() {
                "-".to_string()
            } else {
                q.major_defects.join(", ")
            },
        )
        .field("SPC alerts", opt_plain(q.spc_alerts));

    let dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    r.section("Key events").table(
        &["Time", "Event", "Action", "Status"],
        h.events
            .iter()
            .map(|e| vec![dash(&e.time), e.event.clone(), dash(&e.action), dash(&e.status)])
            .collect(),
    );

    r.section("Hand-over items")
        .bullets(h.pending.iter(), "No open items");
    r
}
