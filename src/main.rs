use clap::Parser;

use keyleash::cli::{self, Cli, Commands};
use keyleash::config::app_config::AppConfig;
use keyleash::core::errors::Result;
use keyleash::logging;

fn main() {
    let args = Cli::parse();

    if let Err(e) = run(args) {
        cli::output::error(&format!("Error: {e}"));
        std::process::exit(1);
    }
}

fn run(args: Cli) -> Result<()> {
    let config = AppConfig::load(args.config.as_deref())?;
    logging::init(
        &logging::directive(args.verbose, args.quiet, config.log.level.as_deref()),
        args.log_format.unwrap_or(config.log.format),
    );

    match args.command {
        None => cli::commands::serve::execute(&args.serve, &config),
        Some(Commands::Serve(serve)) => cli::commands::serve::execute(&serve, &config),
        Some(Commands::Hooks { hooks, action }) => {
            cli::commands::hooks::execute(&action, hooks.as_deref(), &config)
        }
    }
}
