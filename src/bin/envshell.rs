// src/bin/envshell.rs

use anyhow::Result;
use clap::Parser;
use colored::*;
use envshell::cli::{Cli, Commands, dispatcher::DispatchError, handlers};

/// The main entry point of the `envshell` application.
/// It sets up logging, parses arguments, dispatches to the correct handler,
/// and performs centralized error handling.
fn main() {
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse()) {
        // --- Centralized Error Handling ---
        // An undeterminable shell is answered with instructions, not a failure:
        // the caller is usually an `eval` that should leave the shell intact.
        if e
            .downcast_ref::<DispatchError>()
            .is_some_and(DispatchError::is_guided_exit)
        {
            eprintln!("{}", guided_message().yellow());
            std::process::exit(0);
        }

        eprintln!("\n{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn guided_message() -> String {
    format!("{}\n{}", envshell::t!("shell.guided.no_shell"), envshell::t!("shell.guided.example"))
}

fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);
    match cli.command {
        Commands::Shell(args) => handlers::shell::handle(args),
    }
}
