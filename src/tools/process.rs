use std::collections::BTreeMap;

use super::{ToolContext, ToolError};
use crate::analysis::fmea::{assess_risk, Correlation, RiskInput};
use crate::analysis::spc::SpcInput;
use crate::analysis::trend::{
    analyze_trend as run_trend, TrendInput, TrendOptions, MAX_FORECAST_POINTS,
};
use crate::analysis::window::validate_window;
use crate::input::{parse, Arguments, InputError};
use crate::report::process::{self as render, SpcContext};
use crate::report::Report;

pub(super) fn analyze_spc_data(args: &Arguments<'_>, ctx: &ToolContext) -> Result<Report, ToolError> {
    let data = args.series("data_points")?;
    let spec = parse::spec_limits(args.require("spec_limits")?, "spec_limits")?;

    let mut input = SpcInput::new(data, spec);
    input.control_limits = args.control_limits("control_limits")?;
    if let Some(size) = args.get("subgroup_size") {
        input.subgroup_size = parse::count(size, "subgroup_size")?.max(1);
    }
    tracing::debug!(
        n = input.data.len(),
        subgroup_size = input.subgroup_size,
        "analyze_spc_data"
    );

    let result = ctx.analyzer.analyze(&input)?;
    let parameter = args.text("parameter_name")?;
    let equipment = args.text("equipment_id")?;
    Ok(render::spc(
        &result,
        &SpcContext {
            parameter: parameter.as_deref(),
            equipment: equipment.as_deref(),
            spec: &spec,
        },
    ))
}

fn trend_options(args: &Arguments<'_>) -> Result<TrendOptions, InputError> {
    let mut options = TrendOptions::default();
    let Some(raw) = args.object("analysis_options")? else {
        return Ok(options);
    };
    let opts = Arguments::new(raw);
    if let Some(v) = opts.get("detect_shift") {
        options.detect_shift = parse::flag(v, "analysis_options.detect_shift")?;
    }
    if let Some(v) = opts.get("detect_trend") {
        options.detect_trend = parse::flag(v, "analysis_options.detect_trend")?;
    }
    if let Some(v) = opts.get("forecast_points") {
        let points = parse::count(v, "analysis_options.forecast_points")?;
        if points > MAX_FORECAST_POINTS {
            return Err(InputError::InvalidArguments {
                field: "analysis_options.forecast_points".to_string(),
                reason: format!("at most {} points can be forecast, got {}", MAX_FORECAST_POINTS, points),
            });
        }
        options.forecast_points = points;
    }
    Ok(options)
}

pub(super) fn analyze_trend(args: &Arguments<'_>, _ctx: &ToolContext) -> Result<Report, ToolError> {
    let values = args.time_series("time_series_data")?;
    let parameter = args.require_text("parameter_name")?;
    let input = TrendInput {
        values,
        spec: args.spec_limits("spec_limits")?.filter(|s| !s.is_empty()),
        options: trend_options(args)?,
    };
    let result = run_trend(&input)?;
    Ok(render::trend(&result, &parameter))
}

fn correlations(args: &Arguments<'_>) -> Result<BTreeMap<String, Correlation>, InputError> {
    let mut out = BTreeMap::new();
    for (parameter, label) in args.label_map("historical_defect_correlation")? {
        let level = label
            .parse::<Correlation>()
            .map_err(|reason| InputError::InvalidArguments {
                field: format!("historical_defect_correlation.{}", parameter),
                reason,
            })?;
        out.insert(parameter, level);
    }
    Ok(out)
}

pub(super) fn predict_defect_risk(args: &Arguments<'_>, _ctx: &ToolContext) -> Result<Report, ToolError> {
    let input = RiskInput {
        window: args.require_window("process_window")?,
        conditions: args.require_number_map("current_conditions")?,
        severity: args.rating_map("severity")?,
        occurrence: args.rating_map("occurrence")?,
        detection: args.rating_map("detection")?,
        critical: args.string_set("critical_params")?,
        correlation: correlations(args)?,
    };
    let assessment = assess_risk(&input)?;
    Ok(render::risk(&assessment))
}

pub(super) fn validate_process_window(
    args: &Arguments<'_>,
    _ctx: &ToolContext,
) -> Result<Report, ToolError> {
    let window = args.require_window("process_window")?;
    let conditions = args.require_number_map("test_conditions")?;
    let critical = args.string_set("critical_params")?;
    Ok(render::window(&validate_window(&window, &conditions, &critical)))
}
