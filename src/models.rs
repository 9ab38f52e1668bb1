// src/models.rs

use crate::activation::TargetShell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

// --- Invocation Models ---

/// The five things `envshell shell` can be asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellAction {
    /// Install the hook into the shell's startup file.
    Init,
    /// Print the hook definitions.
    Hook,
    /// Apply one activation layer.
    Activate,
    /// Re-apply the current layer after its prefix changed on disk.
    Reactivate,
    /// Unwind one activation layer.
    Deactivate,
}

impl ShellAction {
    /// The token users type for this action.
    pub fn name(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Hook => "hook",
            Self::Activate => "activate",
            Self::Reactivate => "reactivate",
            Self::Deactivate => "deactivate",
        }
    }

    /// The operation name reported in structured output (`shell_hook`, ...).
    pub fn operation(self) -> String {
        format!("shell_{}", self.name())
    }
}

impl fmt::Display for ShellAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The raw inputs of one `envshell shell` invocation, as handed over by the
/// argument parser. Nothing here has been validated yet.
#[derive(Debug, Clone, Default)]
pub struct ShellInvocation {
    /// Requested action token.
    pub action: Option<String>,
    /// Explicit shell name (`--shell`).
    pub shell: Option<String>,
    /// Environment name, prefix path, `base` or empty.
    pub target: String,
    /// Layer the activation on top of the current one.
    pub stack: bool,
    /// Replace this process with an activated interactive shell.
    pub subshell: bool,
}

/// A validated request. Built once by the dispatcher and never mutated.
#[derive(Debug, Clone)]
pub struct ActivationRequest {
    /// The action to perform.
    pub action: ShellAction,
    /// The shell whose syntax is emitted.
    pub shell: TargetShell,
    /// Environment name, prefix path, `base` or empty.
    pub target_spec: String,
    /// Only meaningful for [`ShellAction::Activate`].
    pub stack: bool,
    /// Only meaningful for [`ShellAction::Activate`].
    pub subshell: bool,
}

// --- Shells Configuration ---

/// How a subshell learns where its startup file is.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StartupPassing {
    /// The file path is appended after `interactive_args`.
    #[default]
    Argument,
    /// The file path is exported in the named variable (`ENV` for `sh`).
    EnvFile(String),
    /// The directory holding the file is exported in the named variable (`ZDOTDIR` for `zsh`).
    EnvDir(String),
}

/// How to start one interactive shell for a subshell session.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Executable name or path.
    pub path: PathBuf,
    /// Arguments placed before the startup file.
    pub interactive_args: Option<Vec<String>>,
    /// File name of the startup file inside the session directory.
    #[serde(default)]
    pub startup_file: Option<String>,
    /// How the startup file is handed to the shell.
    #[serde(default)]
    pub pass_via: StartupPassing,
}

/// The deserialized `shells.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellsConfig {
    /// Launch definitions keyed by shell name (`bash`, `zsh`, `cmd.exe`, ...).
    #[serde(default)]
    pub shells: HashMap<String, ShellConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names() {
        assert_eq!(ShellAction::Hook.operation(), "shell_hook");
        assert_eq!(ShellAction::Deactivate.operation(), "shell_deactivate");
    }

    #[test]
    fn test_shells_config_from_toml() {
        let content = r#"
            [shells.zsh]
            path = "/bin/zsh"
            interactive_args = ["-i"]
            startup_file = ".zshrc"
            pass_via = { env_dir = "ZDOTDIR" }

            [shells.bash]
            path = "bash"
            interactive_args = ["--rcfile"]
        "#;
        let config: ShellsConfig = toml::from_str(content).unwrap();

        let zsh = config.shells.get("zsh").unwrap();
        assert_eq!(zsh.pass_via, StartupPassing::EnvDir("ZDOTDIR".to_string()));
        assert_eq!(zsh.startup_file.as_deref(), Some(".zshrc"));

        let bash = config.shells.get("bash").unwrap();
        assert_eq!(bash.pass_via, StartupPassing::Argument);
        assert!(bash.startup_file.is_none());
    }
}
