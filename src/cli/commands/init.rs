//! `semiproc init` command - Create a workspace

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::{Workspace, WorkspaceError};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Overwrite .semiproc/config.yaml and catalog.yaml if they exist
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let workspace = if args.force {
        Workspace::init_force(&path)
    } else {
        Workspace::init(&path)
    };

    match workspace {
        Ok(workspace) => {
            println!(
                "{} Initialized semiproc workspace at {}",
                style("✓").green(),
                style(workspace.root().display()).cyan()
            );
            println!();
            println!("  📄 {}", style(".semiproc/config.yaml").dim());
            println!("  📄 {}", style(".semiproc/catalog.yaml").dim());
            println!();
            println!("Next steps:");
            println!(
                "  {} Edit defects, standard recipes and playbooks",
                style("$EDITOR .semiproc/catalog.yaml").yellow()
            );
            println!(
                "  {} List the analysis tools",
                style("semiproc tools list").yellow()
            );
            println!(
                "  {} Start the MCP server",
                style("semiproc serve").yellow()
            );
            Ok(())
        }
        Err(WorkspaceError::AlreadyExists(path)) => {
            println!(
                "{} semiproc workspace already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to reinitialize",
                style("semiproc init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}
