// src/system/detect.rs

//! Best-effort inference of the shell that invoked us.

use crate::core::env::EnvSnapshot;
use std::path::Path;

/// Maps a parent-process guess to a shell name.
///
/// query-shell reports `Xonsh` for any parent named `python*`, so that
/// answer only counts when xonsh's own `XONSH_VERSION` is in the environment.
fn from_query_shell(shell: query_shell::Shell, env: &EnvSnapshot) -> Option<&'static str> {
    match shell {
        query_shell::Shell::Bash => Some("bash"),
        query_shell::Shell::Zsh => Some("zsh"),
        query_shell::Shell::Powershell => Some(if cfg!(windows) { "powershell" } else { "pwsh" }),
        query_shell::Shell::Xonsh if env.contains("XONSH_VERSION") => Some("xonsh"),
        _ => None,
    }
}

/// Guesses the calling shell's name: first from the parent process, then
/// from the basename of `$SHELL`.
///
/// The returned name may still be one no dialect handles (`fish`); the
/// resolver reports that.
pub fn guess_shell(env: &EnvSnapshot) -> Option<String> {
    let detected = query_shell::get_shell()
        .map_err(|e| log::debug!("Parent shell detection failed: {}", e))
        .ok();
    pick_shell(detected, env)
}

fn pick_shell(detected: Option<query_shell::Shell>, env: &EnvSnapshot) -> Option<String> {
    if let Some(shell) = detected {
        if let Some(name) = from_query_shell(shell, env) {
            return Some(name.to_string());
        }
        log::debug!("Parent shell is not one envshell speaks, trying $SHELL");
    }
    shell_from_env(env)
}

/// The basename of `$SHELL`, minus any `.exe` suffix.
fn shell_from_env(env: &EnvSnapshot) -> Option<String> {
    let shell = env.get("SHELL").filter(|s| !s.is_empty())?;
    let name = Path::new(shell).file_name()?.to_string_lossy();
    let name = name.strip_suffix(".exe").unwrap_or(&name);
    Some(name.to_string())
}
