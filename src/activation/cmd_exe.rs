// src/activation/cmd_exe.rs

use super::{HookParams, ShellSyntax};
use crate::constants::{
    ENV_EXE, ENV_ROOT_PREFIX, ENV_SHLVL, INIT_BLOCK_BEGIN, INIT_BLOCK_END, PACKAGE_COMMANDS,
};
use std::path::Path;

/// Syntax for the Windows command interpreter.
///
/// Output is batch-file text: cmd.exe cannot evaluate a string, so the
/// `envshell` macro runs a dispatcher batch file that redirects the output
/// to a file and `CALL`s it.
#[derive(Debug, Clone, Copy)]
pub struct CmdExeSyntax;

/// Name of the dispatcher batch file. The hook expects it in the directory
/// of the batch file that runs the hook.
pub const DISPATCHER_FILENAME: &str = "envshell.bat";

/// Actions whose output has to be `CALL`ed rather than just printed.
const ACTIVATION_ACTIONS: &[&str] = &["activate", "deactivate", "reactivate"];

const DISPATCHER_TEMPLATE: &str = r#"@REM envshell command dispatcher for cmd.exe
<activation_checks>@"%ENVSHELL_EXE%" %*
@IF ERRORLEVEL 1 GOTO :EOF
<package_checks>@GOTO :EOF

:apply
@FOR %%A IN (%*) DO @IF "%%~A"=="--subshell" GOTO :subshell
@SET "_ENVSHELL_SCRIPT=%TEMP%\envshell-%RANDOM%.bat"
@"%ENVSHELL_EXE%" shell %* --shell <shell> > "%_ENVSHELL_SCRIPT%"
@IF NOT ERRORLEVEL 1 @CALL "%_ENVSHELL_SCRIPT%"
@DEL "%_ENVSHELL_SCRIPT%" 2>NUL
@SET "_ENVSHELL_SCRIPT="
@GOTO :EOF

:refresh
@CALL :apply reactivate
@GOTO :EOF

:subshell
@"%ENVSHELL_EXE%" shell %* --shell <shell>
@GOTO :EOF
"#;

/// Escapes a value for use inside a batch-file `SET "KEY=VALUE"` command.
/// Inside the quotes only `%` is still special.
fn escape_for_cmd_set(value: &str) -> String {
    value.replace('%', "%%")
}

impl ShellSyntax for CmdExeSyntax {
    fn extension(&self) -> &'static str {
        "bat"
    }

    fn prompt_var(&self) -> Option<&'static str> {
        Some("PROMPT")
    }

    fn unset_var(&self, name: &str) -> String {
        format!("@SET \"{}=\"", name)
    }

    fn export_var(&self, name: &str, value: &str) -> String {
        format!("@SET \"{}={}\"", name, escape_for_cmd_set(value))
    }

    fn source_script(&self, path: &Path) -> String {
        format!("@CALL \"{}\"", escape_for_cmd_set(&path.display().to_string()))
    }

    fn hook(&self, params: &HookParams<'_>) -> String {
        let mut script = String::from("@REM envshell hook for cmd.exe\n");
        script.push_str(&self.export_var(ENV_EXE, &params.exe.display().to_string()));
        script.push('\n');
        script.push_str(&self.export_var(
            ENV_ROOT_PREFIX,
            &params.root_prefix.display().to_string(),
        ));
        script.push('\n');
        script.push_str(&format!(
            "@IF NOT DEFINED {shlvl} @SET \"{shlvl}=0\"\n",
            shlvl = ENV_SHLVL
        ));
        script.push_str(&format!(
            "@DOSKEY envshell=\"%~dp0{}\" $*\n",
            DISPATCHER_FILENAME
        ));
        script
    }

    fn init_block(&self, params: &HookParams<'_>) -> String {
        format!(
            "@REM {}\n{}@REM {}\n",
            INIT_BLOCK_BEGIN,
            self.hook(params),
            INIT_BLOCK_END
        )
    }

    fn activate_command(&self, _prefix: &Path) -> Option<String> {
        // DOSKEY macros do not expand inside batch files.
        None
    }

    fn companion_files(&self, params: &HookParams<'_>) -> Vec<(&'static str, String)> {
        vec![(DISPATCHER_FILENAME, dispatcher(params.shell_name))]
    }
}

/// The batch file behind the `envshell` macro. Activation actions are
/// written to a temporary file and `CALL`ed; package commands are followed
/// by a reactivation.
fn dispatcher(shell_name: &str) -> String {
    let checks = |names: &[&str], label: &str| {
        names
            .iter()
            .map(|name| format!("@IF \"%~1\"==\"{}\" GOTO :{}\n", name, label))
            .collect::<String>()
    };
    DISPATCHER_TEMPLATE
        .replace("<activation_checks>", &checks(ACTIVATION_ACTIONS, "apply"))
        .replace("<package_checks>", &checks(PACKAGE_COMMANDS, "refresh"))
        .replace("<shell>", shell_name)
}
