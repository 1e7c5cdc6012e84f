//! `semiproc tools` command - Inspect the tool registry

use clap::Subcommand;
use miette::{IntoDiagnostic, Result};

use crate::cli::table::{CellValue, ColumnDef, TableConfig, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::tools::{Registry, ToolError};

#[derive(Subcommand, Debug)]
pub enum ToolsCommands {
    /// List tools with their required arguments
    List,

    /// Print a tool's JSON input schema
    Schema(SchemaArgs),
}

#[derive(clap::Args, Debug)]
pub struct SchemaArgs {
    /// Tool name
    pub name: String,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("name", "NAME", 32),
    ColumnDef::new("required", "REQUIRED", 48),
    ColumnDef::new("description", "DESCRIPTION", 80),
];

pub fn run(cmd: ToolsCommands, global: &GlobalOpts) -> Result<()> {
    let registry = Registry::new()?;
    match cmd {
        ToolsCommands::List => run_list(&registry, global),
        ToolsCommands::Schema(args) => run_schema(&registry, args),
    }
}

fn run_list(registry: &Registry, global: &GlobalOpts) -> Result<()> {
    if global.format == OutputFormat::Json {
        let tools: Vec<serde_json::Value> =
            registry.tools().iter().map(|t| t.descriptor()).collect();
        let json = serde_json::to_string_pretty(&tools).into_diagnostic()?;
        println!("{}", json);
        return Ok(());
    }

    let rows: Vec<TableRow> = registry
        .tools()
        .iter()
        .map(|tool| {
            TableRow::new()
                .cell("name", CellValue::Name(tool.name().to_string()))
                .cell(
                    "required",
                    CellValue::List(tool.required().iter().map(|s| s.to_string()).collect()),
                )
                .cell("description", CellValue::Text(tool.description().to_string()))
        })
        .collect();

    let config = match global.format {
        OutputFormat::Auto if !global.quiet => TableConfig::with_wrap(60),
        _ => TableConfig::for_pipe(),
    };
    TableFormatter::new(COLUMNS, "tool")
        .with_config(config)
        .output(&rows, global.format);
    Ok(())
}

fn run_schema(registry: &Registry, args: SchemaArgs) -> Result<()> {
    let tool = registry
        .get(&args.name)
        .ok_or_else(|| ToolError::UnknownTool(args.name.clone()))?;
    let json = serde_json::to_string_pretty(tool.schema()).into_diagnostic()?;
    println!("{}", json);
    tracing::debug!(tool = tool.name(), "printed schema");
    Ok(())
}
