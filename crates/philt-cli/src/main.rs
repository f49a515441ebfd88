//! philtographer - code graph & impact analysis for TypeScript monorepos.

use clap::Parser;
use miette::Result;
use philt_cli::commands::CommandContext;
use philt_cli::{cli, commands, config, error, logger};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    logger::init_logger(args.verbose, args.quiet, args.no_color);

    let result = run(args).await;
    result.map_err(error::cli_error_to_miette)
}

async fn run(args: cli::Cli) -> error::Result<()> {
    let config = config::Config::load(
        args.config.as_deref(),
        args.root.as_deref(),
        args.out.as_deref(),
    )?;
    let ctx = CommandContext::new(config)?;

    match args.command {
        cli::Command::Scan(scan_args) => commands::scan::execute(&ctx, scan_args).await,
        cli::Command::Entries(entries_args) => {
            commands::entries::execute(&ctx, entries_args).await
        }
        cli::Command::Components(components_args) => {
            commands::components::execute(&ctx, components_args, args.quiet).await
        }
        cli::Command::Isolated(isolated_args) => commands::isolated::execute(isolated_args).await,
        cli::Command::Watch(watch_args) => commands::watch::execute(&ctx, watch_args).await,
        cli::Command::Ui(ui_args) => commands::ui::execute(ui_args).await,
    }
}
