//! `semiproc call` command - Run one tool from the command line

use miette::{IntoDiagnostic, Result};
use serde_json::{Map, Value};
use std::path::PathBuf;

use crate::cli::helpers::{read_input, Session};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::mcp::protocol::CallToolResult;

#[derive(clap::Args, Debug)]
pub struct CallArgs {
    /// Tool name (see `semiproc tools list`)
    pub name: String,

    /// JSON file with the tool arguments, or `-` for stdin
    #[arg(long, value_name = "FILE", conflicts_with = "json")]
    pub args: Option<PathBuf>,

    /// Tool arguments as an inline JSON object
    #[arg(long, value_name = "JSON")]
    pub json: Option<String>,
}

fn parse_arguments(text: &str, source: &str) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| miette::miette!("Arguments from {} are not valid JSON: {}", source, e))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(miette::miette!(
            "Arguments from {} must be a JSON object",
            source
        )),
    }
}

pub fn run(args: CallArgs, global: &GlobalOpts) -> Result<()> {
    let arguments = match (&args.json, &args.args) {
        (Some(inline), _) => parse_arguments(inline, "--json")?,
        (None, Some(path)) => parse_arguments(&read_input(path)?, &path.display().to_string())?,
        (None, None) => Map::new(),
    };

    let session = Session::open(global)?;
    let output = session
        .registry
        .call(&args.name, &arguments, &session.ctx)?;

    if global.format == OutputFormat::Json {
        let result = CallToolResult::text(output.text, output.is_error);
        println!(
            "{}",
            serde_json::to_string_pretty(&result).into_diagnostic()?
        );
        if result.is_error {
            std::process::exit(1);
        }
        return Ok(());
    }

    print!("{}", output.text);
    if !output.text.ends_with('\n') {
        println!();
    }
    if output.is_error {
        std::process::exit(1);
    }
    Ok(())
}
