use clap::Parser;
use colored::*;
use std::process;

mod cli;

use crate::cli::{Cli, Commands};
use tempora_core::TemporaError;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);

        // Use appropriate exit codes based on error type
        let exit_code = match e.downcast_ref::<TemporaError>() {
            Some(TemporaError::Configuration(_)) => 2,
            Some(TemporaError::Io(_)) => 3,
            Some(TemporaError::Serialization(_)) => 4,
            Some(TemporaError::Database(_)) => 5,
            Some(TemporaError::InconsistentOrderingState(_)) => 6,
            Some(err) if err.is_user_error() => 7,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.global.resolve_config()?;
    tempora_core::logging::init_logging(&config.logging)?;

    if cli.global.verbose > 0 {
        eprintln!(
            "Using database {}",
            config.storage.resolved_database_path().display()
        );
    }

    match cli.command {
        Commands::Load(args) => crate::cli::commands::load::run(args, config),
        Commands::Documents => crate::cli::commands::info::documents(config),
        Commands::Info(args) => crate::cli::commands::info::run(args, config),
        Commands::Render(args) => crate::cli::commands::render::run(args, config),
        Commands::Nodes(args) => crate::cli::commands::nodes::run(args, config),
        Commands::Expired(args) => crate::cli::commands::nodes::expired(args, config),
        Commands::Insert(args) => crate::cli::commands::edit::insert(args, config),
        Commands::Delete(args) => crate::cli::commands::edit::delete(args, config),
        Commands::Move(args) => crate::cli::commands::edit::move_node(args, config),
        Commands::SetValue(args) => crate::cli::commands::edit::set_value(args, config),
    }
}
