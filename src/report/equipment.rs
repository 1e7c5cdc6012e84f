//! Equipment comparison and KPI reports

use super::{num, opt_plain, plain, signed, Report, NOT_GIVEN};
use crate::analysis::equipment::{ComparisonResult, WeightSource};
use crate::analysis::metrics::{KpiRow, KpiStatus};

fn weight_note(source: WeightSource) -> &'static str {
    match source {
        WeightSource::Equal => "equal weights (none supplied)",
        WeightSource::Supplied => "supplied weights",
        WeightSource::Renormalized => "supplied weights, renormalized to sum to 1",
        WeightSource::FallbackEqual => "supplied weights summed to zero; equal weights used",
    }
}

pub fn comparison(result: &ComparisonResult) -> Report {
    let mut r = Report::new("🏭 Equipment performance comparison");
    r.field("Units compared", result.ranking.len())
        .field("Metrics", result.metrics.len())
        .field("Weighting", weight_note(result.weight_source));

    r.section("Metrics").table(
        &["Metric", "Direction", "Weight", "Min", "Max"],
        result
            .metrics
            .iter()
            .map(|m| {
                vec![
                    m.name.clone(),
                    m.direction.to_string(),
                    num(m.weight, 3),
                    opt_plain(m.min),
                    opt_plain(m.max),
                ]
            })
            .collect(),
    );

    let mut headers = vec!["Rank", "Equipment", "Score"];
    headers.extend(result.metrics.iter().map(|m| m.name.as_str()));
    let rows = result
        .ranking
        .iter()
        .map(|e| {
            let mut row = vec![e.rank.to_string(), e.equipment_id.clone(), num(e.score, 1)];
            row.extend(result.metrics.iter().map(|m| {
                e.normalized
                    .get(&m.name)
                    .map_or_else(|| "missing".to_string(), |v| num(*v, 3))
            }));
            row
        })
        .collect();
    r.section("Ranking").table(&headers, rows);

    let gaps: Vec<String> = result
        .ranking
        .iter()
        .filter(|e| !e.missing.is_empty())
        .map(|e| format!("{} did not report: {}", e.equipment_id, e.missing.join(", ")))
        .collect();
    if !gaps.is_empty() || !result.unused_weights.is_empty() {
        r.section("Data notes");
        for g in &gaps {
            r.bullet(g);
        }
        if !result.unused_weights.is_empty() {
            r.bullet(format!(
                "Weights ignored for unknown metrics: {}",
                result.unused_weights.join(", ")
            ));
        }
    }

    if !result.benchmark.is_empty() {
        r.section("Benchmark").table(
            &["Equipment", "Metric", "Value", "Target", "Result"],
            result
                .benchmark
                .iter()
                .map(|b| {
                    vec![
                        b.equipment_id.clone(),
                        b.metric.clone(),
                        opt_plain(b.value),
                        plain(b.target),
                        b.outcome.to_string(),
                    ]
                })
                .collect(),
        );
    }

    r.section("Summary");
    if let (Some(best), Some(worst)) = (result.ranking.first(), result.ranking.last()) {
        r.field("Best", format!("{} ({})", best.equipment_id, num(best.score, 1)));
        if result.ranking.len() > 1 {
            r.field("Worst", format!("{} ({})", worst.equipment_id, num(worst.score, 1)))
                .field("Spread", num(best.score - worst.score, 1));
        }
    }
    r.bullet("Scores are min-max normalized per metric and weighted to 0-100")
        .bullet("Review maintenance and recipe history on the lowest ranked unit");
    r
}

pub fn kpis(rows: &[KpiRow], period: Option<&str>, equipment_id: Option<&str>) -> Report {
    let mut r = Report::new("📋 Metrics analysis");
    r.field("Period", period.unwrap_or(NOT_GIVEN))
        .field("Equipment", equipment_id.unwrap_or(NOT_GIVEN));

    r.table(
        &["Metric", "Current", "Target", "Gap", "Direction", "Status"],
        rows.iter()
            .map(|k| {
                vec![
                    k.name.clone(),
                    opt_plain(k.current),
                    plain(k.target),
                    k.gap.map_or_else(|| "-".to_string(), |g| signed(g, 2)),
                    k.direction.to_string(),
                    k.status.to_string(),
                ]
            })
            .collect(),
    );

    let achieved = rows.iter().filter(|k| k.status == KpiStatus::Achieved).count();
    let measured = rows.iter().filter(|k| k.status != KpiStatus::NoData).count();
    r.section("Summary").field(
        "Achieved",
        format!("{} / {} measured ({} targets)", achieved, measured, rows.len()),
    );
    let missed: Vec<String> = rows
        .iter()
        .filter(|k| k.status == KpiStatus::Missed)
        .map(|k| k.name.clone())
        .collect();
    r.section("Improvement needed")
        .bullets(missed, "All measured metrics meet their targets");
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::equipment::{compare_equipment, ComparisonInput, EquipmentRecord};
    use crate::analysis::metrics::evaluate_kpis;
    use std::collections::BTreeMap;

    fn record(id: &str, metrics: &[(&str, f64)]) -> EquipmentRecord {
        EquipmentRecord {
            equipment_id: id.to_string(),
            metrics: metrics.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn test_comparison_report_ranks_and_notes_gaps() {
        let result = compare_equipment(&ComparisonInput {
            equipment: vec![
                record("ETCH-01", &[("uptime", 95.0), ("defect_rate", 0.5)]),
                record("ETCH-02", &[("uptime", 90.0)]),
            ],
            weights: Some(BTreeMap::from([("ghost".to_string(), 1.0)])),
            benchmark: None,
        })
        .unwrap();
        let text = comparison(&result).finish(false);
        assert!(text.contains("| 1    | ETCH-01"));
        assert!(text.contains("ETCH-02 did not report: defect_rate"));
        assert!(text.contains("- **Best**: ETCH-01"));
    }

    #[test]
    fn test_kpi_report() {
        let current = BTreeMap::from([("yield".to_string(), 97.5)]);
        let targets = BTreeMap::from([("yield".to_string(), 98.0), ("mttr".to_string(), 4.0)]);
        let text = kpis(&evaluate_kpis(&current, &targets), Some("2024-W12"), None).finish(false);
        assert!(text.contains("- **Period**: 2024-W12"));
        assert!(text.contains("-0.50"));
        assert!(text.contains("no data"));
        assert!(text.contains("0 / 1 measured (2 targets)"));
        assert!(text.contains("- yield\n"));
    }
}
