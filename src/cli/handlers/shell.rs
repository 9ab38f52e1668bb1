// src/cli/handlers/shell.rs

use anyhow::Result;
use colored::Colorize;
use std::io;

use crate::{
    cli::{
        ShellArgs,
        dispatcher::{self, Outcome},
    },
    core::config::Context,
    output,
};

pub fn handle(args: ShellArgs) -> Result<()> {
    // 1. Build the invocation context.
    let ctx = Context::load(&args.overrides())?;

    // 2. Validate and run the single action.
    match dispatcher::dispatch(&args.invocation(), &ctx)? {
        Outcome::Emit(emission) => {
            // 3a. Stdout is evaluated by the calling shell; nothing else goes there.
            output::write_emission(&emission, ctx.json, &mut io::stdout().lock())?;
            Ok(())
        }
        Outcome::Handoff(session) => {
            // 3b. Only returns if the shell could not be started.
            eprintln!(
                "{}",
                format!(
                    t!("subshell.info.starting"),
                    shell = session.shell_name(),
                    target = display_target(&args)
                )
                .green()
            );
            match session.exec()? {}
        }
    }
}

fn display_target(args: &ShellArgs) -> String {
    let target = args.target_spec();
    if target.is_empty() {
        crate::constants::BASE_ENV_NAME.to_string()
    } else {
        target
    }
}
