//! # Shell Activation
//!
//! This module turns activation requests into text the calling shell can
//! evaluate. It is split along one seam:
//!
//! - **`script`**: decides *what* changes (variables, `PATH`, prompt, scripts
//!   to source) from the environment snapshot. It knows nothing about syntax.
//! - **`posix`**, **`cmd_exe`**, **`powershell`**, **`xonsh`**: decide *how*
//!   each change is spelled, and what the hook and init block look like.
//!
//! [`ShellDialect`] is the closed set of supported syntaxes; the dialect
//! registry maps user-facing shell names onto it.

pub mod cmd_exe;
pub mod posix;
pub mod powershell;
pub mod script;
pub mod xonsh;

use crate::core::config::Context;
use script::{ActivationScript, Planner, Statement};
use std::{fmt, path::Path};

/// One of the supported shell syntaxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShellDialect {
    /// bash, zsh, dash and other POSIX-compatible shells.
    Posix,
    /// The Windows command interpreter.
    CmdExe,
    /// Windows PowerShell and PowerShell 7.
    PowerShell,
    /// Xonsh.
    Xonsh,
}

/// Maps shell names onto the dialect that speaks their syntax.
struct DialectDefinition {
    dialect: ShellDialect,
    names: &'static [&'static str],
}

/// The single source of truth for every shell name `--shell` accepts.
static DIALECT_REGISTRY: &[DialectDefinition] = &[
    DialectDefinition {
        dialect: ShellDialect::Posix,
        names: &["bash", "zsh", "posix", "sh", "dash"],
    },
    DialectDefinition {
        dialect: ShellDialect::CmdExe,
        names: &["cmd.exe", "cmd"],
    },
    DialectDefinition {
        dialect: ShellDialect::PowerShell,
        names: &["powershell", "pwsh"],
    },
    DialectDefinition {
        dialect: ShellDialect::Xonsh,
        names: &["xonsh"],
    },
];

impl ShellDialect {
    /// Looks a shell name up in the registry.
    pub fn from_name(name: &str) -> Option<Self> {
        DIALECT_REGISTRY
            .iter()
            .find(|def| def.names.contains(&name))
            .map(|def| def.dialect)
    }

    /// Every shell name the registry knows, in registry order.
    pub fn known_names() -> impl Iterator<Item = &'static str> {
        DIALECT_REGISTRY.iter().flat_map(|def| def.names.iter().copied())
    }

    /// The syntax generator for this dialect.
    pub fn syntax(self) -> &'static dyn ShellSyntax {
        match self {
            Self::Posix => &posix::PosixSyntax,
            Self::CmdExe => &cmd_exe::CmdExeSyntax,
            Self::PowerShell => &powershell::PowerShellSyntax,
            Self::Xonsh => &xonsh::XonshSyntax,
        }
    }
}

impl fmt::Display for ShellDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Posix => "posix",
            Self::CmdExe => "cmd.exe",
            Self::PowerShell => "powershell",
            Self::Xonsh => "xonsh",
        };
        f.write_str(name)
    }
}

/// A resolved shell: the name the user (or the guess) gave, and its dialect.
///
/// The name is kept because `bash` and `zsh` share a syntax but not a
/// startup file or a binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetShell {
    /// Shell name as given (`bash`, `zsh`, `cmd.exe`, ...).
    pub name: String,
    /// The dialect it speaks.
    pub dialect: ShellDialect,
}

/// What every hook needs to know about this installation.
#[derive(Debug, Clone, Copy)]
pub struct HookParams<'a> {
    /// Path of the manager binary.
    pub exe: &'a Path,
    /// Root prefix.
    pub root_prefix: &'a Path,
    /// Shell name passed back as `--shell` by the hook.
    pub shell_name: &'a str,
}

/// The text generators of one dialect.
///
/// Implementations only spell things; deciding what to spell is the job of
/// [`Planner`].
pub trait ShellSyntax: Sync {
    /// Extension of the scripts this dialect sources (without the dot).
    fn extension(&self) -> &'static str;

    /// The variable holding the prompt, for dialects where activation sets it.
    fn prompt_var(&self) -> Option<&'static str> {
        None
    }

    /// Removes a variable.
    fn unset_var(&self, name: &str) -> String;

    /// Sets and exports a variable.
    fn export_var(&self, name: &str, value: &str) -> String;

    /// Replaces the prompt. Only called when [`ShellSyntax::prompt_var`] is `Some`.
    fn set_prompt(&self, value: &str) -> String {
        self.export_var(self.prompt_var().unwrap_or("PROMPT"), value)
    }

    /// Sources a script into the current shell.
    fn source_script(&self, path: &Path) -> String;

    /// Definitions that make the manager's command able to mutate the shell.
    fn hook(&self, params: &HookParams<'_>) -> String;

    /// The block `init` writes into the shell's startup file.
    fn init_block(&self, params: &HookParams<'_>) -> String;

    /// A command, valid once the hook is loaded, that activates `prefix`.
    /// `None` when the shell cannot call back into the hook from a startup
    /// file; the launcher then embeds the activation script itself.
    fn activate_command(&self, prefix: &Path) -> Option<String>;

    /// Files the hook expects next to the file that loads it, as
    /// `(file name, content)` pairs.
    fn companion_files(&self, _params: &HookParams<'_>) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// A statement deleting `dir`, run at the end of a subshell startup file.
    fn remove_dir(&self, _dir: &Path) -> Option<String> {
        None
    }

    /// Renders a script, one statement per line.
    fn render(&self, script: &ActivationScript) -> String {
        let mut out = String::new();
        for statement in script.statements() {
            let line = match statement {
                Statement::Unset(name) => self.unset_var(name),
                Statement::Export(name, value) => self.export_var(name, value),
                Statement::Prompt(value) => self.set_prompt(value),
                Statement::Source(path) => self.source_script(path),
            };
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

/// Produces hook, activation, reactivation and deactivation text for one
/// dialect against one invocation context.
#[derive(Debug)]
pub struct Activator<'a> {
    shell: &'a TargetShell,
    ctx: &'a Context,
}

impl<'a> Activator<'a> {
    /// Creates the activator for `shell`.
    pub fn new(shell: &'a TargetShell, ctx: &'a Context) -> Self {
        Self { shell, ctx }
    }

    /// The syntax generator in use.
    pub fn syntax(&self) -> &'static dyn ShellSyntax {
        self.shell.dialect.syntax()
    }

    /// The hook definitions.
    pub fn hook(&self) -> String {
        self.syntax().hook(&self.hook_params())
    }

    /// The startup-file block that loads the hook.
    pub fn init_block(&self) -> String {
        self.syntax().init_block(&self.hook_params())
    }

    /// Files to write beside whatever loads the hook.
    pub fn companion_files(&self) -> Vec<(&'static str, String)> {
        self.syntax().companion_files(&self.hook_params())
    }

    /// Activation text for `prefix`.
    pub fn activate(&self, prefix: &Path, stack: bool) -> String {
        self.syntax().render(&self.planner().activate(prefix, stack))
    }

    /// Text refreshing the current layer.
    pub fn reactivate(&self) -> String {
        self.syntax().render(&self.planner().reactivate())
    }

    /// Text unwinding the current layer.
    pub fn deactivate(&self) -> String {
        self.syntax().render(&self.planner().deactivate())
    }

    fn planner(&self) -> Planner<'a> {
        let syntax = self.shell.dialect.syntax();
        Planner::new(self.ctx, syntax.extension(), syntax.prompt_var())
    }

    fn hook_params(&self) -> HookParams<'a> {
        HookParams {
            exe: &self.ctx.exe,
            root_prefix: &self.ctx.root_prefix,
            shell_name: &self.shell.name,
        }
    }
}

/// Wraps `value` in single quotes, escaping embedded quotes with `escaped_quote`.
pub(crate) fn single_quote(value: &str, escaped_quote: &str) -> String {
    format!("'{}'", value.replace('\'', escaped_quote))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::env::EnvSnapshot;
    use std::{
        io::Write,
        process::{Command, Stdio},
    };

    /// Everything one dialect emits, against a shell with one layer active.
    fn generated_scripts(name: &str, dialect: ShellDialect) -> Vec<(&'static str, String)> {
        let env: EnvSnapshot = [
            ("PATH", "/opt/env-root/envs/a/bin:/usr/bin:/bin"),
            ("PS1", "$ "),
            ("CONDA_SHLVL", "1"),
            ("CONDA_PREFIX", "/opt/env-root/envs/a"),
            ("CONDA_DEFAULT_ENV", "a"),
            ("CONDA_PROMPT_MODIFIER", "(a) "),
        ]
        .into_iter()
        .collect();
        let ctx = Context::new("/opt/env-root", env);
        let shell = TargetShell {
            name: name.to_string(),
            dialect,
        };
        let activator = Activator::new(&shell, &ctx);
        let prefix = Path::new("/opt/env-root/envs/it's b");
        vec![
            ("hook", activator.hook()),
            ("init block", activator.init_block()),
            ("activation", activator.activate(prefix, false)),
            ("stacked activation", activator.activate(prefix, true)),
            ("reactivation", activator.reactivate()),
            ("deactivation", activator.deactivate()),
        ]
    }

    /// Feeds each script to `program` on stdin and expects a zero exit.
    /// Skipped where `program` is not installed.
    fn assert_parses(program: &str, args: &[&str], scripts: &[(&str, String)]) {
        for (label, script) in scripts {
            let child = Command::new(program)
                .args(args)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn();
            let Ok(mut child) = child else {
                eprintln!("{program} not available, skipping syntax check");
                return;
            };
            if let Some(mut stdin) = child.stdin.take() {
                let _ = stdin.write_all(script.as_bytes());
            }
            let output = child.wait_with_output().unwrap();
            assert!(
                output.status.success(),
                "{program} rejected the {label}:\n{script}\n{}{}",
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
    }

    #[test]
    fn test_bash_parses_generated_scripts() {
        assert_parses("bash", &["-n"], &generated_scripts("bash", ShellDialect::Posix));
    }

    #[test]
    fn test_zsh_parses_generated_scripts() {
        assert_parses("zsh", &["-f", "-n"], &generated_scripts("zsh", ShellDialect::Posix));
    }

    #[test]
    fn test_pwsh_parses_generated_scripts() {
        const PARSE: &str = "$errors = $null; \
            $null = [System.Management.Automation.Language.Parser]::ParseInput(\
            [Console]::In.ReadToEnd(), [ref]$null, [ref]$errors); \
            if ($errors) { $errors | ForEach-Object { $_.ToString() }; exit 1 }";
        assert_parses(
            "pwsh",
            &["-NoProfile", "-NonInteractive", "-Command", PARSE],
            &generated_scripts("pwsh", ShellDialect::PowerShell),
        );
    }

    #[test]
    fn test_xonsh_parses_generated_scripts() {
        assert_parses(
            "xonsh",
            &["--no-rc", "-c", "import sys; compilex(sys.stdin.read(), mode='exec')"],
            &generated_scripts("xonsh", ShellDialect::Xonsh),
        );
    }

    #[test]
    fn test_registry_lookup() {
        assert_eq!(ShellDialect::from_name("bash"), Some(ShellDialect::Posix));
        assert_eq!(ShellDialect::from_name("zsh"), Some(ShellDialect::Posix));
        assert_eq!(ShellDialect::from_name("cmd.exe"), Some(ShellDialect::CmdExe));
        assert_eq!(ShellDialect::from_name("pwsh"), Some(ShellDialect::PowerShell));
        assert_eq!(ShellDialect::from_name("xonsh"), Some(ShellDialect::Xonsh));
        assert_eq!(ShellDialect::from_name("fish"), None);
        assert_eq!(ShellDialect::from_name("Bash"), None);
    }

    #[test]
    fn test_every_known_name_resolves() {
        for name in ShellDialect::known_names() {
            assert!(ShellDialect::from_name(name).is_some(), "{name}");
        }
    }

    #[test]
    fn test_every_dialect_hook_mentions_exe_and_root() {
        let ctx = Context::new("/opt/env-root", EnvSnapshot::default());
        for (name, dialect) in [
            ("bash", ShellDialect::Posix),
            ("cmd.exe", ShellDialect::CmdExe),
            ("powershell", ShellDialect::PowerShell),
            ("xonsh", ShellDialect::Xonsh),
        ] {
            let shell = TargetShell {
                name: name.to_string(),
                dialect,
            };
            let hook = Activator::new(&shell, &ctx).hook();
            assert!(hook.contains("ENVSHELL_EXE"), "{name}");
            assert!(hook.contains("/opt/env-root"), "{name}");
            assert!(hook.ends_with('\n'), "{name}");
        }
    }

    #[test]
    fn test_empty_script_renders_to_nothing() {
        let ctx = Context::new("/opt/env-root", EnvSnapshot::default());
        let shell = TargetShell {
            name: "bash".to_string(),
            dialect: ShellDialect::Posix,
        };
        assert_eq!(Activator::new(&shell, &ctx).deactivate(), "");
    }
}
