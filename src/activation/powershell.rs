// src/activation/powershell.rs

use super::{HookParams, ShellSyntax, single_quote};
use crate::constants::{
    ENV_EXE, ENV_PROMPT_MODIFIER, ENV_ROOT_PREFIX, ENV_SHLVL, INIT_BLOCK_BEGIN, INIT_BLOCK_END,
    PACKAGE_COMMANDS,
};
use std::path::Path;

/// Syntax for Windows PowerShell and PowerShell 7.
///
/// The prompt is a function in PowerShell, so activation leaves it alone and
/// the hook's `prompt` wrapper renders the modifier instead.
#[derive(Debug, Clone, Copy)]
pub struct PowerShellSyntax;

const HOOK_TEMPLATE: &str = r#"$Env:<exe_var> = <exe>
$Env:<root_var> = <root>
if ($null -eq $Env:<shlvl_var>) { $Env:<shlvl_var> = '0' }

function global:Invoke-EnvshellActivation {
    $script = & $Env:<exe_var> shell @args --shell <shell> | Out-String
    if ($LASTEXITCODE -eq 0 -and $script) {
        Invoke-Expression -Command $script
    }
}

function global:envshell {
    $cmd = if ($args.Count -gt 0) { $args[0] } else { '' }
    if (@('activate', 'deactivate', 'reactivate') -contains $cmd) {
        if ($args -contains '--subshell') {
            & $Env:<exe_var> shell @args --shell <shell>
        } else {
            Invoke-EnvshellActivation @args
        }
    } else {
        & $Env:<exe_var> @args
        if ($LASTEXITCODE -eq 0 -and @(<package_commands>) -contains $cmd) {
            Invoke-EnvshellActivation reactivate
        }
    }
}

if (-not (Test-Path Function:\__envshell_original_prompt)) {
    $function:global:__envshell_original_prompt = $function:prompt
}

function global:prompt {
    if ($Env:<modifier_var>) {
        Write-Host -NoNewline $Env:<modifier_var>
    }
    __envshell_original_prompt
}
"#;

const INIT_TEMPLATE: &str = r#"<begin>
# !! Contents within this block are managed by 'envshell shell init' !!
$Env:<exe_var> = <exe>
$Env:<root_var> = <root>
(& $Env:<exe_var> shell hook --shell <shell> --root-prefix $Env:<root_var>) | Out-String | Invoke-Expression
<end>
"#;

fn quote(value: &str) -> String {
    single_quote(value, "''")
}

fn fill(template: &str, params: &HookParams<'_>) -> String {
    let package_commands = PACKAGE_COMMANDS
        .iter()
        .map(|cmd| quote(cmd))
        .collect::<Vec<_>>()
        .join(", ");
    template
        .replace("<exe_var>", ENV_EXE)
        .replace("<root_var>", ENV_ROOT_PREFIX)
        .replace("<shlvl_var>", ENV_SHLVL)
        .replace("<modifier_var>", ENV_PROMPT_MODIFIER)
        .replace("<exe>", &quote(&params.exe.display().to_string()))
        .replace("<root>", &quote(&params.root_prefix.display().to_string()))
        .replace("<shell>", params.shell_name)
        .replace("<package_commands>", &package_commands)
        .replace("<begin>", INIT_BLOCK_BEGIN)
        .replace("<end>", INIT_BLOCK_END)
}

impl ShellSyntax for PowerShellSyntax {
    fn extension(&self) -> &'static str {
        "ps1"
    }

    fn unset_var(&self, name: &str) -> String {
        format!("Remove-Item -ErrorAction SilentlyContinue Env:\\{}", name)
    }

    fn export_var(&self, name: &str, value: &str) -> String {
        format!("$Env:{} = {}", name, quote(value))
    }

    fn source_script(&self, path: &Path) -> String {
        format!(". {}", quote(&path.display().to_string()))
    }

    fn hook(&self, params: &HookParams<'_>) -> String {
        fill(HOOK_TEMPLATE, params)
    }

    fn init_block(&self, params: &HookParams<'_>) -> String {
        fill(INIT_TEMPLATE, params)
    }

    fn activate_command(&self, prefix: &Path) -> Option<String> {
        Some(format!(
            "envshell activate {}",
            quote(&prefix.display().to_string())
        ))
    }

    fn remove_dir(&self, dir: &Path) -> Option<String> {
        Some(format!(
            "Remove-Item -Recurse -Force -ErrorAction SilentlyContinue -LiteralPath {}",
            quote(&dir.display().to_string())
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_export_and_unset() {
        assert_eq!(
            PowerShellSyntax.export_var("CONDA_PREFIX", "C:\\it's"),
            "$Env:CONDA_PREFIX = 'C:\\it''s'"
        );
        assert_eq!(
            PowerShellSyntax.unset_var("CONDA_PREFIX"),
            "Remove-Item -ErrorAction SilentlyContinue Env:\\CONDA_PREFIX"
        );
    }

    #[test]
    fn test_no_prompt_variable() {
        assert!(PowerShellSyntax.prompt_var().is_none());
    }

    #[test]
    fn test_hook_wraps_prompt_and_reactivates_after_installs() {
        let exe = PathBuf::from("/usr/bin/envshell");
        let root = PathBuf::from("/opt/env-root");
        let hook = PowerShellSyntax.hook(&HookParams {
            exe: &exe,
            root_prefix: &root,
            shell_name: "pwsh",
        });
        assert!(hook.contains("$Env:ENVSHELL_EXE = '/usr/bin/envshell'"));
        assert!(hook.contains("function global:prompt"));
        assert!(hook.contains("@('install', 'update', 'remove', 'uninstall')"));
        assert!(hook.contains("--shell pwsh"));
        assert!(!hook.contains("<exe"), "unfilled placeholder in hook");
    }
}
