use clap::Parser;
use miette::Result;
use semiproc::cli::{Cli, Commands};
use semiproc::core::{logging, Config};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    let config = Config::load();
    logging::init(logging::resolve_filter(
        global.verbose,
        global.quiet,
        config.log_level(),
    ));

    match cli.command {
        Commands::Serve(args) => semiproc::cli::commands::serve::run(args, &global),
        Commands::Tools(cmd) => semiproc::cli::commands::tools::run(cmd, &global),
        Commands::Call(args) => semiproc::cli::commands::call::run(args, &global),
        Commands::Init(args) => semiproc::cli::commands::init::run(args),
        Commands::Config(cmd) => semiproc::cli::commands::config::run(cmd, &global),
        Commands::Completions(args) => semiproc::cli::commands::completions::run(args),
    }
}
