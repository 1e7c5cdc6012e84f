use super::{ToolContext, ToolError};
use crate::analysis::equipment::{compare_equipment, ComparisonInput, EquipmentRecord};
use crate::analysis::metrics::evaluate_kpis;
use crate::input::{parse, Arguments, InputError};
use crate::report::{self, Report};

fn equipment_records(args: &Arguments<'_>) -> Result<Vec<EquipmentRecord>, InputError> {
    args.array("equipment_data")?
        .iter()
        .enumerate()
        .filter(|(_, item)| !item.is_null())
        .map(|(i, item)| {
            let field = format!("equipment_data[{}]", i);
            let entry = Arguments::new(parse::object(item, &field)?);
            let metrics = match entry.get("metrics") {
                Some(m) => parse::number_map(m, &format!("{}.metrics", field))?,
                None => Default::default(),
            };
            Ok(EquipmentRecord {
                equipment_id: entry
                    .text("equipment_id")?
                    .unwrap_or_else(|| report::NOT_GIVEN.to_string()),
                metrics,
            })
        })
        .collect()
}

pub(super) fn analyze_equipment_comparison(
    args: &Arguments<'_>,
    _ctx: &ToolContext,
) -> Result<Report, ToolError> {
    let input = ComparisonInput {
        equipment: equipment_records(args)?,
        weights: args
            .get("weights")
            .map(|v| parse::number_map(v, "weights"))
            .transpose()?,
        benchmark: args
            .get("benchmark")
            .map(|v| parse::number_map(v, "benchmark"))
            .transpose()?,
    };
    let result = compare_equipment(&input)?;
    Ok(report::equipment::comparison(&result))
}

pub(super) fn analyze_metrics(args: &Arguments<'_>, _ctx: &ToolContext) -> Result<Report, ToolError> {
    let current = args.require_number_map("metrics_data")?;
    let targets = args.require_number_map("targets")?;
    let rows = evaluate_kpis(&current, &targets);
    let period = args.text("period")?;
    let equipment = args.text("equipment_id")?;
    Ok(report::equipment::kpis(
        &rows,
        period.as_deref(),
        equipment.as_deref(),
    ))
}

#[cfg(test)]
mod tests {
    use super::super::{Registry, ToolContext};
    use crate::catalog::Catalog;
    use serde_json::{json, Value};

    fn run(name: &str, args: Value) -> (String, bool) {
        let registry = Registry::new().unwrap();
        let ctx = ToolContext::new(Catalog::embedded().unwrap(), false);
        let out = registry.call(name, args.as_object().unwrap(), &ctx).unwrap();
        (out.text, out.is_error)
    }

    #[test]
    fn test_comparison_ranks_units() {
        let (text, is_error) = run(
            "analyze_equipment_comparison",
            json!({
                "equipment_data": [
                    {"equipment_id": "ETCH-01", "metrics": {"uptime": 92, "defect_rate": 0.8}},
                    {"equipment_id": "ETCH-02", "metrics": {"uptime": 96, "defect_rate": 0.4}}
                ],
                "weights": {"uptime": 0.5, "defect_rate": 0.5},
                "benchmark": {"uptime": 95}
            }),
        );
        assert!(!is_error);
        assert!(text.contains("| 1    | ETCH-02"));
        assert!(text.contains("| ETCH-01   | uptime | 92    | 95     | FAIL"));
    }

    #[test]
    fn test_empty_equipment_list_is_insufficient() {
        let (text, is_error) = run("analyze_equipment_comparison", json!({"equipment_data": []}));
        assert!(is_error);
        assert!(text.contains("Insufficient data for equipment comparison"));
    }

    #[test]
    fn test_negative_weight_is_rejected() {
        let (text, is_error) = run(
            "analyze_equipment_comparison",
            json!({
                "equipment_data": [{"equipment_id": "A", "metrics": {"uptime": 90}}],
                "weights": {"uptime": -1}
            }),
        );
        assert!(is_error);
        assert!(text.contains("must not be negative"));
    }

    #[test]
    fn test_metrics_from_text_pairs() {
        let (text, _) = run(
            "analyze_metrics",
            json!({"metrics_data": "yield=97.5, mttr=2.5", "targets": {"yield": 98, "mttr": 4}}),
        );
        assert!(text.contains("1 / 2 measured (2 targets)"));
    }
}
