// src/activation/xonsh.rs

use super::{HookParams, ShellSyntax};
use crate::constants::{
    ENV_EXE, ENV_PROMPT_MODIFIER, ENV_ROOT_PREFIX, ENV_SHLVL, INIT_BLOCK_BEGIN, INIT_BLOCK_END,
    PACKAGE_COMMANDS,
};
use std::path::Path;

/// Syntax for xonsh.
#[derive(Debug, Clone, Copy)]
pub struct XonshSyntax;

const HOOK_TEMPLATE: &str = r#"$<exe_var> = <exe>
$<root_var> = <root>
if '<shlvl_var>' not in ${...}:
    $<shlvl_var> = '0'

def _envshell_activation(args):
    script = $(@($<exe_var>) shell @(args) --shell xonsh)
    if script:
        execx(script, 'exec', __xonsh__.ctx, filename='envshell')

def _envshell_main(args):
    cmd = args[0] if args else ''
    if cmd in ('activate', 'deactivate', 'reactivate'):
        if '--subshell' in args:
            @($<exe_var>) shell @(args) --shell xonsh
        else:
            _envshell_activation(args)
    else:
        @($<exe_var>) @(args)
        if cmd in (<package_commands>):
            _envshell_activation(['reactivate'])

aliases['envshell'] = _envshell_main

$PROMPT_FIELDS['envshell_prompt_modifier'] = lambda: ${...}.get('<modifier_var>', '')
if isinstance($PROMPT, str) and '{envshell_prompt_modifier}' not in $PROMPT:
    $PROMPT = '{envshell_prompt_modifier}' + $PROMPT
"#;

const INIT_TEMPLATE: &str = r#"<begin>
# !! Contents within this block are managed by 'envshell shell init' !!
$<exe_var> = <exe>
$<root_var> = <root>
execx($(@($<exe_var>) shell hook --shell xonsh --root-prefix @($<root_var>)), 'exec', __xonsh__.ctx, filename='envshell')
<end>
"#;

/// Quotes a value as a Python string literal.
fn quote(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n");
    format!("'{}'", escaped)
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
        .replace("<package_commands>", &package_commands)
        .replace("<begin>", INIT_BLOCK_BEGIN)
        .replace("<end>", INIT_BLOCK_END)
}

impl ShellSyntax for XonshSyntax {
    fn extension(&self) -> &'static str {
        "xsh"
    }

    fn unset_var(&self, name: &str) -> String {
        format!("${{...}}.pop({}, None)", quote(name))
    }

    fn export_var(&self, name: &str, value: &str) -> String {
        format!("${} = {}", name, quote(value))
    }

    fn source_script(&self, path: &Path) -> String {
        format!("source {}", quote(&path.display().to_string()))
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
            "__import__('shutil').rmtree({}, True)",
            quote(&dir.display().to_string())
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_python_quoting() {
        assert_eq!(quote(r"C:\it's"), r"'C:\\it\'s'");
        assert_eq!(XonshSyntax.export_var("CONDA_SHLVL", "1"), "$CONDA_SHLVL = '1'");
        assert_eq!(
            XonshSyntax.unset_var("CONDA_PREFIX"),
            "${...}.pop('CONDA_PREFIX', None)"
        );
    }

    #[test]
    fn test_hook_registers_alias() {
        let exe = PathBuf::from("/usr/bin/envshell");
        let root = PathBuf::from("/opt/env-root");
        let hook = XonshSyntax.hook(&HookParams {
            exe: &exe,
            root_prefix: &root,
            shell_name: "xonsh",
        });
        assert!(hook.starts_with("$ENVSHELL_EXE = '/usr/bin/envshell'\n"));
        assert!(hook.contains("aliases['envshell'] = _envshell_main"));
        assert!(hook.contains("('install', 'update', 'remove', 'uninstall')"));
        assert!(hook.contains(
            "$PROMPT_FIELDS['envshell_prompt_modifier'] = lambda: ${...}.get('CONDA_PROMPT_MODIFIER', '')"
        ));
        assert!(hook.contains("$PROMPT = '{envshell_prompt_modifier}' + $PROMPT"));
    }
}
