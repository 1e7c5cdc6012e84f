use std::collections::BTreeMap;

use serde_json::Value;

use super::{ToolContext, ToolError};
use crate::analysis::optimize::{plan_direction, Constraint, OptimizeInput, Sensitivity};
use crate::analysis::recipe::{
    compare_recipes, compare_to_baseline as baseline_rows, extra_parameters, BaselineParam,
};
use crate::analysis::simulate::{simulate, ImpactRule, SimulationInput};
use crate::analysis::yield_impact::{yield_impact, InteractionEffect, ParameterChange};
use crate::input::{parse, Arguments, InputError};
use crate::report::{self, Report};

/// `{name: {value, min, max, unit}}`, or `{name: value}` for a bare reference
fn baseline_params(value: &Value, field: &str) -> Result<BTreeMap<String, BaselineParam>, InputError> {
    let mut out = BTreeMap::new();
    for (name, raw) in parse::object(value, field)?.iter().filter(|(_, v)| !v.is_null()) {
        let label = format!("{}.{}", field, name);
        let param = match raw {
            Value::Object(obj) => BaselineParam {
                value: parse::optional_number(parse::get_ci(obj, "value"), &format!("{}.value", label))?,
                min: parse::optional_number(parse::get_ci(obj, "min"), &format!("{}.min", label))?,
                max: parse::optional_number(parse::get_ci(obj, "max"), &format!("{}.max", label))?,
                unit: parse::get_ci(obj, "unit")
                    .map(|u| parse::text(u, &format!("{}.unit", label)))
                    .transpose()?
                    .filter(|u| !u.is_empty()),
            },
            other => BaselineParam {
                value: Some(parse::number(other, &label)?),
                ..Default::default()
            },
        };
        out.insert(name.clone(), param);
    }
    Ok(out)
}

pub(super) fn compare_to_baseline(args: &Arguments<'_>, _ctx: &ToolContext) -> Result<Report, ToolError> {
    let baseline = baseline_params(args.require("baseline_recipe")?, "baseline_recipe")?;
    let current = args.require_number_map("current_recipe")?;
    let rows = baseline_rows(&baseline, &current);
    let extras = extra_parameters(&baseline, &current);
    let name = args.text("recipe_name")?;
    Ok(report::recipe::baseline(&rows, &extras, name.as_deref()))
}

pub(super) fn compare_two_recipes(args: &Arguments<'_>, _ctx: &ToolContext) -> Result<Report, ToolError> {
    let a = args.require_number_map("recipe_a")?;
    let b = args.require_number_map("recipe_b")?;
    let tolerance = args.number_map("tolerance")?;
    let a_name = args.text("recipe_a_name")?.unwrap_or_else(|| "Recipe A".to_string());
    let b_name = args.text("recipe_b_name")?.unwrap_or_else(|| "Recipe B".to_string());
    let diffs = compare_recipes(&a, &b, &tolerance);
    Ok(report::recipe::two_recipes(&diffs, &a_name, &b_name))
}

fn parameter_changes(args: &Arguments<'_>) -> Result<Vec<ParameterChange>, InputError> {
    let mut changes = Vec::new();
    for (i, item) in args.array("parameter_changes")?.iter().enumerate() {
        let field = format!("parameter_changes[{}]", i);
        let obj = parse::object(item, &field)?;
        let at = |key: &str| format!("{}.{}", field, key);
        let name = parse::get_ci(obj, "param")
            .or_else(|| parse::get_ci(obj, "parameter"))
            .map(|v| parse::text(v, &at("param")))
            .transpose()?
            .unwrap_or_else(|| "-".to_string());
        changes.push(ParameterChange {
            parameter: name,
            from: parse::optional_number(parse::get_ci(obj, "from"), &at("from"))?,
            to: parse::optional_number(parse::get_ci(obj, "to"), &at("to"))?,
            sensitivity: parse::optional_number(
                parse::get_ci(obj, "yield_sensitivity"),
                &at("yield_sensitivity"),
            )?
            .unwrap_or(0.0),
        });
    }
    Ok(changes)
}

fn interaction_effects(args: &Arguments<'_>) -> Result<Vec<InteractionEffect>, InputError> {
    let mut effects = Vec::new();
    for (i, item) in args.array("interaction_effects")?.iter().enumerate() {
        let field = format!("interaction_effects[{}]", i);
        let obj = parse::object(item, &field)?;
        effects.push(InteractionEffect {
            parameters: parse::get_ci(obj, "params")
                .map(|v| parse::string_list(v, &format!("{}.params", field)))
                .transpose()?
                .unwrap_or_default(),
            effect: parse::optional_number(parse::get_ci(obj, "effect"), &format!("{}.effect", field))?
                .unwrap_or(0.0),
        });
    }
    Ok(effects)
}

pub(super) fn calculate_yield_impact(
    args: &Arguments<'_>,
    _ctx: &ToolContext,
) -> Result<Report, ToolError> {
    let baseline = args.require_number("baseline_yield")?;
    let changes = parameter_changes(args)?;
    let interactions = interaction_effects(args)?;
    let result = yield_impact(baseline, &changes, &interactions);
    Ok(report::recipe::yield_report(&result))
}

fn impact_rules(args: &Arguments<'_>) -> Result<Vec<ImpactRule>, InputError> {
    let mut rules = Vec::new();
    for (i, item) in args.array("impact_rules")?.iter().enumerate() {
        let field = format!("impact_rules[{}]", i);
        let obj = parse::object(item, &field)?;
        rules.push(ImpactRule {
            description: parse::get_ci(obj, "description")
                .map(|v| parse::text(v, &format!("{}.description", field)))
                .transpose()?,
            impact: parse::get_ci(obj, "impact")
                .map(|v| parse::number_map(v, &format!("{}.impact", field)))
                .transpose()?
                .unwrap_or_default(),
        });
    }
    Ok(rules)
}

pub(super) fn simulate_parameter_change(
    args: &Arguments<'_>,
    _ctx: &ToolContext,
) -> Result<Report, ToolError> {
    let state = parse::object(args.require("current_state")?, "current_state")?;
    let section = |key: &str| -> Result<BTreeMap<String, f64>, InputError> {
        parse::get_ci(state, key)
            .map(|v| parse::number_map(v, &format!("current_state.{}", key)))
            .transpose()
            .map(Option::unwrap_or_default)
    };
    let input = SimulationInput {
        recipe: section("recipe")?,
        performance: section("performance")?,
        proposed: args.require_number_map("proposed_changes")?,
        rules: impact_rules(args)?,
        window: args.window("process_window")?,
    };
    Ok(report::recipe::simulation(&simulate(&input)))
}

pub(super) fn optimize_recipe_direction(
    args: &Arguments<'_>,
    _ctx: &ToolContext,
) -> Result<Report, ToolError> {
    let mut sensitivity = BTreeMap::new();
    for (parameter, label) in args.label_map("param_sensitivity")? {
        let level = label
            .parse::<Sensitivity>()
            .map_err(|reason| InputError::InvalidArguments {
                field: format!("param_sensitivity.{}", parameter),
                reason,
            })?;
        sensitivity.insert(parameter, level);
    }
    let constraints = args
        .window("constraints")?
        .unwrap_or_default()
        .into_iter()
        .map(|(k, b)| {
            (
                k,
                Constraint {
                    min: b.min,
                    max: b.max,
                },
            )
        })
        .collect();

    let input = OptimizeInput {
        recipe: args.require_number_map("current_recipe")?,
        current: args.require_number_map("current_performance")?,
        target: args.require_number_map("target_performance")?,
        sensitivity,
        constraints,
    };
    Ok(report::recipe::optimize(&plan_direction(&input)))
}

pub(super) fn get_standard_recipe(args: &Arguments<'_>, ctx: &ToolContext) -> Result<Report, ToolError> {
    let process = args.require_text("process_type")?;
    let layer = args.require_text("layer")?;
    match ctx.catalog.recipe(&process, &layer) {
        Some(recipe) => Ok(report::recipe::standard_recipe(&recipe)),
        None => {
            let processes: Vec<&str> = ctx.catalog.process_types().collect();
            let layers = ctx.catalog.layers(&process);
            Ok(report::recipe::recipe_not_found(&process, &layer, &processes, &layers))
        }
    }
}
