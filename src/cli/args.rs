// src/cli/args.rs

use crate::{core::config::ContextOverrides, models::ShellInvocation};
use clap::Args;

#[derive(Args, Debug, Default, Clone)]
pub struct ShellArgs {
    /// One of: init, hook, activate, reactivate, deactivate.
    pub action: Option<String>,

    /// Environment name or prefix path. Defaults to the root prefix.
    pub target: Option<String>,

    /// The shell to emit code for. Guessed from the parent process if omitted.
    #[arg(short, long, value_name = "SHELL")]
    pub shell: Option<String>,

    /// Path of the environment to use.
    #[arg(short, long, value_name = "PATH", conflicts_with_all = ["name", "target"])]
    pub prefix: Option<String>,

    /// Name of the environment to use.
    #[arg(short, long, conflicts_with = "target")]
    pub name: Option<String>,

    /// Keep the current environment's executables on PATH.
    #[arg(long)]
    pub stack: bool,

    /// Start an interactive shell with the environment active instead of
    /// printing the activation code.
    #[arg(long)]
    pub subshell: bool,

    /// Wrap the output in a JSON envelope.
    #[arg(long)]
    pub json: bool,

    /// Root prefix under which named environments live.
    #[arg(long, value_name = "PATH")]
    pub root_prefix: Option<String>,
}

impl ShellArgs {
    /// The environment selector, from whichever of `--prefix`, `--name` or
    /// the positional target was given.
    pub fn target_spec(&self) -> String {
        self.prefix
            .as_ref()
            .or(self.name.as_ref())
            .or(self.target.as_ref())
            .cloned()
            .unwrap_or_default()
    }

    pub fn invocation(&self) -> ShellInvocation {
        ShellInvocation {
            action: self.action.clone(),
            shell: self.shell.clone(),
            target: self.target_spec(),
            stack: self.stack,
            subshell: self.subshell,
        }
    }

    pub fn overrides(&self) -> ContextOverrides {
        ContextOverrides {
            root_prefix: self.root_prefix.clone(),
            json: self.json,
        }
    }
}
