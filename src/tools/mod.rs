//! Tool registry
//!
//! Each MCP tool is a name, a description, an embedded JSON input schema and
//! a handler. Handlers decode their arguments through [`crate::input`], run
//! an analyzer and hand the typed result to [`crate::report`].

mod defect;
mod equipment;
mod process;
mod recipe;
mod shift;

use miette::Diagnostic;
use rust_embed::Embed;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::analysis::spc::SpcAnalyzer;
use crate::analysis::AnalysisError;
use crate::catalog::Catalog;
use crate::input::{Arguments, ArgumentValidator, InputError};
use crate::report::{self, Report};

#[derive(Embed)]
#[folder = "schemas/tools/"]
struct ToolSchemas;

#[derive(Debug, Error, Diagnostic)]
pub enum ToolError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("unknown tool '{0}'")]
    #[diagnostic(
        code(semiproc::tools::unknown),
        help("run `semiproc tools list` to see the available tools")
    )]
    UnknownTool(String),

    #[error("no input schema embedded for tool '{0}'")]
    #[diagnostic(code(semiproc::tools::schema_missing))]
    SchemaMissing(String),
}

/// Shared, read-only state handed to every tool call
#[derive(Debug)]
pub struct ToolContext {
    pub catalog: Catalog,
    pub analyzer: SpcAnalyzer,
    pub disclaimer: bool,
}

impl ToolContext {
    pub fn new(catalog: Catalog, disclaimer: bool) -> Self {
        Self {
            catalog,
            analyzer: SpcAnalyzer::default(),
            disclaimer,
        }
    }
}

/// Rendered result of a tool call
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

type Handler = fn(&Arguments<'_>, &ToolContext) -> Result<Report, ToolError>;

struct ToolDef {
    name: &'static str,
    description: &'static str,
    handler: Handler,
}

const TOOLS: &[ToolDef] = &[
    ToolDef {
        name: "analyze_spc_data",
        description: "SPC capability analysis: control limits (I-MR, X-bar/R or supplied), Cp/Cpk/Pp/Ppk, out-of-control points and normality check",
        handler: process::analyze_spc_data,
    },
    ToolDef {
        name: "analyze_trend",
        description: "Trend analysis of a time series: linear regression t-test, Mann-Kendall test, mean shift detection and forecast",
        handler: process::analyze_trend,
    },
    ToolDef {
        name: "predict_defect_risk",
        description: "FMEA-style defect risk: RPN and action priority per parameter from its margin inside the process window",
        handler: process::predict_defect_risk,
    },
    ToolDef {
        name: "analyze_equipment_comparison",
        description: "Rank equipment by weighted, direction-aware normalized metrics, with optional benchmark checks",
        handler: equipment::analyze_equipment_comparison,
    },
    ToolDef {
        name: "validate_process_window",
        description: "Check test conditions against a process window and flag critical parameters",
        handler: process::validate_process_window,
    },
    ToolDef {
        name: "compare_to_baseline",
        description: "Compare a current recipe with a baseline recipe and its allowed ranges",
        handler: recipe::compare_to_baseline,
    },
    ToolDef {
        name: "compare_two_recipes",
        description: "Percent difference between two recipes with per-parameter tolerances",
        handler: recipe::compare_two_recipes,
    },
    ToolDef {
        name: "analyze_metrics",
        description: "KPI attainment against targets, aware of lower-is-better metrics",
        handler: equipment::analyze_metrics,
    },
    ToolDef {
        name: "calculate_yield_impact",
        description: "Estimate yield change from parameter changes with a linear sensitivity model",
        handler: recipe::calculate_yield_impact,
    },
    ToolDef {
        name: "simulate_parameter_change",
        description: "Apply proposed parameter changes and additive impact rules; report predicted performance and window breaches",
        handler: recipe::simulate_parameter_change,
    },
    ToolDef {
        name: "optimize_recipe_direction",
        description: "Performance gaps and recipe parameters ordered by sensitivity, with adjustment direction",
        handler: recipe::optimize_recipe_direction,
    },
    ToolDef {
        name: "get_defect_history",
        description: "Summarize defect records: totals, actions, equipment concentration, optional date range",
        handler: defect::get_defect_history,
    },
    ToolDef {
        name: "analyze_defect",
        description: "Structure a defect investigation: cause matrix, catalog reference, priorities and checklist",
        handler: defect::analyze_defect,
    },
    ToolDef {
        name: "suggest_corrective_action",
        description: "Corrective action plan by severity with escalation and recurrence prevention",
        handler: defect::suggest_corrective_action,
    },
    ToolDef {
        name: "generate_shift_report",
        description: "Shift hand-over report: production, equipment, quality, events and open items",
        handler: shift::generate_shift_report,
    },
    ToolDef {
        name: "get_standard_recipe",
        description: "Look up the standard recipe and process window for a process type and layer",
        handler: recipe::get_standard_recipe,
    },
];

/// A registered tool with its compiled schema
pub struct Tool {
    def: &'static ToolDef,
    schema: Value,
    validator: ArgumentValidator,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        self.def.name
    }

    pub fn description(&self) -> &'static str {
        self.def.description
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Names in the schema's `required` list
    pub fn required(&self) -> Vec<&str> {
        self.schema
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// The `tools/list` entry for this tool
    pub fn descriptor(&self) -> Value {
        serde_json::json!({
            "name": self.def.name,
            "description": self.def.description,
            "inputSchema": self.schema,
        })
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool").field("name", &self.def.name).finish()
    }
}

fn load_schema(name: &str) -> Result<Value, ToolError> {
    let file = ToolSchemas::get(&format!("{}.json", name))
        .ok_or_else(|| ToolError::SchemaMissing(name.to_string()))?;
    serde_json::from_slice(&file.data)
        .map_err(|e| ToolError::Input(InputError::Schema(format!("{}: {}", name, e))))
}

/// All tools, in listing order
#[derive(Debug)]
pub struct Registry {
    tools: Vec<Tool>,
}

impl Registry {
    pub fn new() -> Result<Self, ToolError> {
        let tools = TOOLS
            .iter()
            .map(|def| {
                let schema = load_schema(def.name)?;
                let validator = ArgumentValidator::new(&schema)?;
                Ok(Tool {
                    def,
                    schema,
                    validator,
                })
            })
            .collect::<Result<Vec<_>, ToolError>>()?;
        tracing::debug!(count = tools.len(), "tool registry loaded");
        Ok(Self { tools })
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.def.name == name)
    }

    /// Validate, run and render one tool call
    ///
    /// Missing inputs and analysis preconditions produce an error report
    /// with `is_error` set. Malformed arguments and unknown tools are
    /// returned as errors for the caller to map onto its own channel.
    pub fn call(
        &self,
        name: &str,
        args: &Map<String, Value>,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        let outcome = tool
            .validator
            .check(args)
            .map_err(ToolError::from)
            .and_then(|()| (tool.def.handler)(&Arguments::new(args), ctx));

        match outcome {
            Ok(report) => Ok(ToolOutput {
                text: report.finish(ctx.disclaimer),
                is_error: false,
            }),
            Err(ToolError::Input(InputError::MissingFields(missing))) => {
                tracing::debug!(tool = name, ?missing, "missing required input");
                Ok(ToolOutput {
                    text: report::input_error(
                        "Required input is missing.",
                        &missing,
                        ctx.disclaimer,
                    ),
                    is_error: true,
                })
            }
            Err(ToolError::Analysis(err)) => {
                tracing::debug!(tool = name, error = %err, "analysis rejected input");
                let summary = format!("{}.", capitalize(&err.to_string()));
                Ok(ToolOutput {
                    text: report::input_error(&summary, &[], ctx.disclaimer),
                    is_error: true,
                })
            }
            Err(other) => Err(other),
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
