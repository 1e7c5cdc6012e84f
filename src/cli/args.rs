//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    call::CallArgs, completions::CompletionsArgs, config::ConfigCommands, init::InitArgs,
    serve::ServeArgs, tools::ToolsCommands,
};

#[derive(Parser)]
#[command(name = "semiproc")]
#[command(author, version, about = "SemiProcess MCP - semiconductor process analysis tools")]
#[command(long_about = "SPC capability, trend, FMEA defect risk, equipment ranking and recipe analysis, served to AI assistants over the Model Context Protocol or run directly from the command line.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output (log errors only)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose (debug) logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Do not prepend the user-data disclaimer to reports
    #[arg(long, global = true)]
    pub no_disclaimer: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the MCP server on stdin/stdout
    Serve(ServeArgs),

    /// Inspect the available tools
    #[command(subcommand)]
    Tools(ToolsCommands),

    /// Invoke one tool and print its report
    Call(CallArgs),

    /// Create a .semiproc/ workspace with config and catalog
    Init(InitArgs),

    /// View and edit configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable (tables for lists, Markdown for reports)
    #[default]
    Auto,
    /// Aligned columns without summary (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
}
