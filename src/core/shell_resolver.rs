// src/core/shell_resolver.rs

use crate::activation::{ShellDialect, TargetShell};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// No `--shell` was given and the calling shell could not be guessed.
    #[error("Could not determine the shell type. Please provide one with --shell.")]
    UnknownDialect,
    /// A shell name outside the supported set.
    #[error("Not handled shell type: '{0}'")]
    UnsupportedDialect(String),
}

/// Determines the target shell: the explicit name if one was given, else
/// whatever `guess` reports about the calling process.
pub fn resolve_shell<F>(explicit: Option<&str>, guess: F) -> Result<TargetShell, ResolveError>
where
    F: FnOnce() -> Option<String>,
{
    let name = match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => name.to_string(),
        None => {
            log::debug!("No shell type provided");
            let guessed = guess().ok_or(ResolveError::UnknownDialect)?;
            log::debug!("Guessed shell: '{}'", guessed);
            guessed
        }
    };

    let dialect =
        ShellDialect::from_name(&name).ok_or_else(|| ResolveError::UnsupportedDialect(name.clone()))?;
    Ok(TargetShell { name, dialect })
}
