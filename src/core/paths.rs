// src/core/paths.rs

use crate::constants::CONFIG_DIR_NAME;
use crate::core::env::{EnvSnapshot, Platform};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not find the home directory.")]
    HomeDirNotFound,
    #[error("Failed to expand path '{path}': {reason}")]
    Expansion { path: String, reason: String },
}

/// Returns the path to the envshell configuration directory (`~/.config/envshell`).
///
/// The directory is not created: every file inside it is optional.
pub fn get_config_dir() -> Result<PathBuf, PathError> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME))
        .ok_or(PathError::ConfigDirNotFound)
}

/// Expands `~` and environment variables (`$VAR`, `${VAR}`) in a user-supplied path.
pub fn expand_path(template: &str) -> Result<PathBuf, PathError> {
    // `shellexpand::full` handles both home dir and env vars across platforms.
    let expanded = shellexpand::full(template).map_err(|e| PathError::Expansion {
        path: template.to_string(),
        reason: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Expands a leading `~` against `home`. Anything else is returned untouched.
pub fn expand_user(input: &str, home: Option<&Path>) -> String {
    shellexpand::tilde_with_context(input, || {
        home.map(|h| h.to_string_lossy().into_owned())
    })
    .into_owned()
}

/// Locates the interactive startup file of `shell_name` for the current user.
///
/// Returns `None` for shells without a per-user startup file (`cmd.exe`) or
/// when the home directory is unknown.
pub fn user_startup_file(
    shell_name: &str,
    home: Option<&Path>,
    env: &EnvSnapshot,
    platform: Platform,
) -> Option<PathBuf> {
    let home = home?;
    match shell_name {
        "bash" => {
            if cfg!(target_os = "macos") {
                Some(home.join(".bash_profile"))
            } else {
                Some(home.join(".bashrc"))
            }
        }
        "zsh" => Some(zsh_dir(home, env).join(".zshrc")),
        "posix" | "sh" | "dash" => Some(home.join(".profile")),
        "xonsh" => Some(home.join(".xonshrc")),
        "powershell" | "pwsh" => Some(powershell_profile(shell_name, home, env, platform)),
        _ => None,
    }
}

/// Locates the file a shell reads at every start, interactive or not, ahead
/// of its startup file. Only zsh has one (`.zshenv`).
pub fn user_env_file(shell_name: &str, home: Option<&Path>, env: &EnvSnapshot) -> Option<PathBuf> {
    match shell_name {
        "zsh" => Some(zsh_dir(home?, env).join(".zshenv")),
        _ => None,
    }
}

fn zsh_dir(home: &Path, env: &EnvSnapshot) -> PathBuf {
    env.get("ZDOTDIR")
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| home.to_path_buf())
}

fn powershell_profile(
    shell_name: &str,
    home: &Path,
    env: &EnvSnapshot,
    platform: Platform,
) -> PathBuf {
    const PROFILE: &str = "Microsoft.PowerShell_profile.ps1";
    match platform {
        Platform::Windows => {
            // Windows PowerShell 5 and PowerShell 7 keep separate profiles.
            let dir = if shell_name == "powershell" {
                "WindowsPowerShell"
            } else {
                "PowerShell"
            };
            home.join("Documents").join(dir).join(PROFILE)
        }
        Platform::Unix => {
            let config = env
                .get("XDG_CONFIG_HOME")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| home.join(".config"));
            config.join("powershell").join(PROFILE)
        }
    }
}
