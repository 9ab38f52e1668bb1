// src/activation/posix.rs

use super::{HookParams, ShellSyntax, single_quote};
use crate::constants::{
    ENV_EXE, ENV_ROOT_PREFIX, ENV_SHLVL, INIT_BLOCK_BEGIN, INIT_BLOCK_END, PACKAGE_COMMANDS,
};
use std::path::Path;

/// Syntax for bash, zsh, dash and other POSIX shells.
#[derive(Debug, Clone, Copy)]
pub struct PosixSyntax;

const HOOK_TEMPLATE: &str = r#"export <exe_var>=<exe>
export <root_var>=<root>
if [ -z "${<shlvl_var>+x}" ]; then
    \export <shlvl_var>=0
fi

__envshell_exe() (
    "$<exe_var>" "$@"
)

__envshell_hashr() {
    if [ -n "${ZSH_VERSION:+x}" ]; then
        \rehash
    elif [ -n "${POSH_VERSION:+x}" ]; then
        :  # pass
    else
        \hash -r
    fi
}

__envshell_activate() {
    \local ask_envshell
    ask_envshell="$(PS1="${PS1:-}" __envshell_exe shell "$@" --shell <shell>)" || \return
    \eval "$ask_envshell"
    __envshell_hashr
}

envshell() {
    \local cmd="${1-__missing__}"
    case "$cmd" in
        activate|deactivate|reactivate)
            case " $* " in
                *" --subshell "*) __envshell_exe shell "$@" --shell <shell> ;;
                *) __envshell_activate "$@" ;;
            esac
            ;;
        <package_commands>)
            __envshell_exe "$@" || \return
            __envshell_activate reactivate
            ;;
        *)
            __envshell_exe "$@"
            ;;
    esac
}
"#;

const INIT_TEMPLATE: &str = r#"<begin>
# !! Contents within this block are managed by 'envshell shell init' !!
export <exe_var>=<exe>
export <root_var>=<root>
__envshell_setup="$("$<exe_var>" shell hook --shell <shell> --root-prefix "$<root_var>" 2> /dev/null)"
if [ $? -eq 0 ]; then
    eval "$__envshell_setup"
else
    alias envshell="$<exe_var>"  # Fallback on help from envshell activate
fi
unset __envshell_setup
<end>
"#;

fn quote(value: &str) -> String {
    single_quote(value, "'\\''")
}

fn fill(template: &str, params: &HookParams<'_>) -> String {
    template
        .replace("<exe_var>", ENV_EXE)
        .replace("<root_var>", ENV_ROOT_PREFIX)
        .replace("<shlvl_var>", ENV_SHLVL)
        .replace("<exe>", &quote(&params.exe.display().to_string()))
        .replace("<root>", &quote(&params.root_prefix.display().to_string()))
        .replace("<shell>", params.shell_name)
        .replace("<package_commands>", &PACKAGE_COMMANDS.join("|"))
        .replace("<begin>", INIT_BLOCK_BEGIN)
        .replace("<end>", INIT_BLOCK_END)
}

impl ShellSyntax for PosixSyntax {
    fn extension(&self) -> &'static str {
        "sh"
    }

    fn prompt_var(&self) -> Option<&'static str> {
        Some("PS1")
    }

    fn unset_var(&self, name: &str) -> String {
        format!("unset {}", name)
    }

    fn export_var(&self, name: &str, value: &str) -> String {
        format!("export {}={}", name, quote(value))
    }

    // PS1 stays a shell variable; exporting it would leak into child shells.
    fn set_prompt(&self, value: &str) -> String {
        format!("PS1={}", quote(value))
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
        Some(format!("\\rm -rf -- {}", quote(&dir.display().to_string())))
    }
}
