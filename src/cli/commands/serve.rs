//! `semiproc serve` command - MCP server on stdio

use miette::Result;

use crate::cli::helpers::Session;
use crate::cli::GlobalOpts;
use crate::mcp::{McpServer, StdioTransport};

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Server name reported to clients (overrides config)
    #[arg(long)]
    pub name: Option<String>,
}

pub fn run(args: ServeArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let name = args
        .name
        .unwrap_or_else(|| session.config.server_name().to_string());
    tracing::debug!(
        tools = session.registry.tools().len(),
        disclaimer = session.ctx.disclaimer,
        "starting server"
    );

    let mut server = McpServer::new(session.registry, session.ctx, name);
    let mut transport = StdioTransport::stdio();
    server.run(&mut transport)?;
    Ok(())
}
