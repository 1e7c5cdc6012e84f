//! Recipe reports: baseline and pairwise comparison, standard recipes,
//! optimization direction, change simulation and yield impact

use super::{num, opt_plain, plain, range, signed, with_unit, Report, NOT_GIVEN};
use crate::analysis::optimize::OptimizePlan;
use crate::analysis::recipe::{BaselineRow, BaselineStatus, RecipeDiff, RecipeDiffStatus};
use crate::analysis::simulate::{SimulationResult, Transition};
use crate::analysis::yield_impact::YieldImpact;
use crate::catalog::StandardRecipe;

fn opt_signed(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| signed(v, decimals))
}

pub fn baseline(rows: &[BaselineRow], extras: &[&str], recipe_name: Option<&str>) -> Report {
    let mut r = Report::new("📐 Baseline comparison");
    r.field("Recipe", recipe_name.unwrap_or(NOT_GIVEN));

    r.table(
        &["Parameter", "Baseline", "Current", "Deviation", "Allowed range", "Status"],
        rows.iter()
            .map(|row| {
                let unit = row.baseline.unit.as_deref();
                vec![
                    row.parameter.clone(),
                    with_unit(opt_plain(row.baseline.value), unit),
                    with_unit(opt_plain(row.current), unit),
                    opt_signed(row.deviation, 2),
                    range(row.baseline.min, row.baseline.max),
                    row.status.to_string(),
                ]
            })
            .collect(),
    );

    let out_of_range: Vec<String> = rows
        .iter()
        .filter(|row| matches!(row.status, BaselineStatus::BelowMin | BaselineStatus::AboveMax))
        .map(|row| format!("{}: {}", row.parameter, row.status))
        .collect();
    let in_range = rows
        .iter()
        .filter(|row| row.status == BaselineStatus::InRange)
        .count();
    r.section("Summary")
        .field("In range", format!("{} / {}", in_range, rows.len()));
    r.bullets(out_of_range, "No parameter outside its allowed range");

    let missing: Vec<&str> = rows
        .iter()
        .filter(|row| row.status == BaselineStatus::Missing)
        .map(|row| row.parameter.as_str())
        .collect();
    if !missing.is_empty() {
        r.bullet(format!("Not in the current recipe: {}", missing.join(", ")));
    }
    if !extras.is_empty() {
        r.bullet(format!("Not in the baseline: {}", extras.join(", ")));
    }
    r
}

pub fn two_recipes(diffs: &[RecipeDiff], a_name: &str, b_name: &str) -> Report {
    let mut r = Report::new(&format!("⚖️ Recipe comparison: {} vs {}", a_name, b_name));
    r.table(
        &["Parameter", a_name, b_name, "Difference", "Change %", "Tolerance %", "Status"],
        diffs
            .iter()
            .map(|d| {
                vec![
                    d.parameter.clone(),
                    opt_plain(d.a),
                    opt_plain(d.b),
                    opt_signed(d.diff, 2),
                    opt_signed(d.pct, 1),
                    opt_plain(d.tolerance_pct),
                    d.status.to_string(),
                ]
            })
            .collect(),
    );

    let exceeding: Vec<String> = diffs
        .iter()
        .filter(|d| d.status == RecipeDiffStatus::Exceeds)
        .map(|d| {
            format!(
                "{}: {}% (tolerance {}%)",
                d.parameter,
                opt_signed(d.pct, 1),
                opt_plain(d.tolerance_pct)
            )
        })
        .collect();
    r.section("Beyond tolerance")
        .bullets(exceeding, "All compared parameters are within tolerance");

    let incomplete: Vec<&str> = diffs
        .iter()
        .filter(|d| d.status == RecipeDiffStatus::Incomplete)
        .map(|d| d.parameter.as_str())
        .collect();
    if !incomplete.is_empty() {
        r.section("Present in one recipe only")
            .bullet(incomplete.join(", "));
    }
    r.section("Notes")
        .bullet(format!("Change % is relative to {}", a_name));
    r
}

pub fn standard_recipe(recipe: &StandardRecipe<'_>) -> Report {
    let mut r = Report::new(&format!(
        "📖 Standard recipe: {} / {}",
        recipe.process, recipe.layer
    ));
    r.table(
        &["Parameter", "Setting", "Min", "Max", "Unit"],
        recipe
            .parameters
            .iter()
            .map(|(name, s)| {
                vec![
                    name.clone(),
                    s.setting.clone(),
                    opt_plain(s.min),
                    opt_plain(s.max),
                    s.unit.clone().unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect(),
    );
    r.field(
        "Windowed parameters",
        format!("{} of {}", recipe.window().len(), recipe.parameters.len()),
    );
    r.section("Notes")
        .bullet("Operate within ±5% of the standard setting")
        .bullet("Leaving the min/max window triggers an SPC alarm")
        .bullet("Recipe changes require ECN approval");
    r
}

/// Shown when the catalog has no recipe for the requested process/layer
pub fn recipe_not_found(process: &str, layer: &str, processes: &[&str], layers: &[&str]) -> Report {
    let mut r = Report::new("📖 Standard recipe not found");
    r.field("Process", process).field("Layer", layer);
    r.section("Available process types")
        .bullets(processes.iter(), "none");
    if !layers.is_empty() {
        r.section(&format!("Available layers for {}", process))
            .bullets(layers.iter(), "none");
    }
    r
}

pub fn optimize(plan: &OptimizePlan) -> Report {
    let mut r = Report::new("🎯 Recipe optimization direction");
    r.section("Performance gaps").table(
        &["Metric", "Current", "Target", "Gap"],
        plan.gaps
            .iter()
            .map(|g| {
                vec![
                    g.metric.clone(),
                    plain(g.current),
                    plain(g.target),
                    signed(g.gap, 2),
                ]
            })
            .collect(),
    );

    r.section("Adjustment priority").table(
        &["Priority", "Parameter", "Current", "Sensitivity", "Direction", "Constraint"],
        plan.adjustments
            .iter()
            .enumerate()
            .map(|(i, a)| {
                vec![
                    (i + 1).to_string(),
                    a.parameter.clone(),
                    plain(a.value),
                    a.sensitivity.to_string(),
                    a.direction.to_string(),
                    range(a.constraint.min, a.constraint.max),
                ]
            })
            .collect(),
    );

    r.section("Approach")
        .numbered([
            "Start with HIGH sensitivity parameters",
            "Change one parameter at a time in small steps",
            "Verify each step on test wafers before the next",
            "Stay inside the listed constraints",
        ]);
    r
}

pub fn simulation(result: &SimulationResult) -> Report {
    let mut r = Report::new("🧪 Parameter change simulation");
    let transition_rows = |items: &[Transition]| -> Vec<Vec<String>> {
        items
            .iter()
            .map(|t| {
                let delta = t.before.zip(t.after).map(|(b, a)| a - b);
                vec![
                    t.name.clone(),
                    opt_plain(t.before),
                    opt_plain(t.after),
                    opt_signed(delta, 2),
                ]
            })
            .collect()
    };

    r.section("Recipe")
        .table(&["Parameter", "Before", "After", "Change"], transition_rows(&result.recipe));
    r.section("Predicted performance").table(
        &["Metric", "Before", "Predicted", "Change"],
        transition_rows(&result.performance),
    );

    r.section("Process window");
    r.bullets(
        result.breaches.iter().map(|b| {
            format!(
                "{} = {} is outside {}",
                b.parameter,
                plain(b.value),
                range(b.min, b.max)
            )
        }),
        "No proposed value leaves the window",
    );
    r.section("Notes")
        .bullet("Impacts are summed linearly from the supplied rules")
        .bullet("Confirm with a DOE or test run before release");
    r
}

pub fn yield_report(result: &YieldImpact) -> Report {
    let mut r = Report::new("📉 Yield impact estimate");
    r.field("Baseline yield", format!("{}%", num(result.baseline, 2)))
        .field("Predicted yield", format!("{}%", num(result.predicted, 2)))
        .field("Total change", format!("{} pt", signed(result.total_delta, 2)));

    r.section("Parameter changes").table(
        &["Parameter", "From", "To", "Change %", "Sensitivity", "Yield impact"],
        result
            .changes
            .iter()
            .map(|c| {
                vec![
                    c.change.parameter.clone(),
                    opt_plain(c.change.from),
                    opt_plain(c.change.to),
                    if c.undefined {
                        "N/A".to_string()
                    } else {
                        signed(c.delta_pct, 2)
                    },
                    plain(c.change.sensitivity),
                    signed(c.impact, 3),
                ]
            })
            .collect(),
    );
    if result.interaction_total != 0.0 {
        r.field("Interaction effects", signed(result.interaction_total, 3));
    }

    let undefined: Vec<&str> = result
        .changes
        .iter()
        .filter(|c| c.undefined)
        .map(|c| c.change.parameter.as_str())
        .collect();
    if !undefined.is_empty() {
        r.section("Not evaluated").bullet(format!(
            "Missing or zero starting value, counted as no change: {}",
            undefined.join(", ")
        ));
    }
    r.section("Notes")
        .bullet("Linear sensitivity model; large changes need experimental confirmation");
    r
}
