// src/cli/dispatcher.rs

use crate::{
    activation::Activator,
    core::{
        config::Context,
        prefix::{self, PrefixError},
        shell_resolver::{self, ResolveError},
    },
    models::{ActivationRequest, ShellAction, ShellInvocation},
    output::Emission,
    system::{
        detect,
        shell::{self, ShellError, SubshellSession},
        shell_init::{self, InitError},
    },
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("{}", invalid_action_message(.action))]
    InvalidAction { action: Option<String> },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Prefix(#[from] PrefixError),
    #[error(transparent)]
    Shell(#[from] ShellError),
    #[error(transparent)]
    Init(#[from] InitError),
}

impl DispatchError {
    /// `true` for failures that end the invocation with instructions rather
    /// than an error status.
    pub fn is_guided_exit(&self) -> bool {
        matches!(self, Self::Resolve(ResolveError::UnknownDialect))
    }
}

fn invalid_action_message(action: &Option<String>) -> String {
    let expected = ACTION_REGISTRY
        .iter()
        .map(|def| def.action.name())
        .collect::<Vec<_>>()
        .join(", ");
    match action {
        Some(action) => format!("Invalid action '{}'. Expected one of: {}.", action, expected),
        None => format!("No action given. Expected one of: {}.", expected),
    }
}

/// What the caller has to do once dispatch returns.
#[derive(Debug)]
pub enum Outcome {
    /// Write the text to stdout.
    Emit(Emission),
    /// Hand the process over to an interactive shell.
    Handoff(SubshellSession),
}

// --- Action Definition and Registry ---

/// Binds an action token to its handler.
struct ActionDefinition {
    action: ShellAction,
    handler: fn(&ActivationRequest, &Context) -> Result<Outcome, DispatchError>,
}

/// The single source of truth for every action `envshell shell` accepts.
static ACTION_REGISTRY: &[ActionDefinition] = &[
    ActionDefinition {
        action: ShellAction::Init,
        handler: handle_init,
    },
    ActionDefinition {
        action: ShellAction::Hook,
        handler: handle_hook,
    },
    ActionDefinition {
        action: ShellAction::Activate,
        handler: handle_activate,
    },
    ActionDefinition {
        action: ShellAction::Reactivate,
        handler: handle_reactivate,
    },
    ActionDefinition {
        action: ShellAction::Deactivate,
        handler: handle_deactivate,
    },
];

fn find_action(name: &str) -> Option<&'static ActionDefinition> {
    ACTION_REGISTRY.iter().find(|def| def.action.name() == name)
}

/// Validates `invocation` and performs its one action, guessing the shell
/// from the calling process when none was named.
pub fn dispatch(invocation: &ShellInvocation, ctx: &Context) -> Result<Outcome, DispatchError> {
    dispatch_with(invocation, ctx, || detect::guess_shell(&ctx.env))
}

/// [`dispatch`] with an explicit shell guesser.
pub fn dispatch_with<F>(
    invocation: &ShellInvocation,
    ctx: &Context,
    guess: F,
) -> Result<Outcome, DispatchError>
where
    F: FnOnce() -> Option<String>,
{
    log::debug!("Dispatching shell invocation: {:?}", invocation);

    // 1. The action comes first: a bad one must not cost anything.
    let token = invocation
        .action
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty());
    let definition = match token {
        Some(name) => find_action(name).ok_or_else(|| DispatchError::InvalidAction {
            action: Some(name.to_string()),
        })?,
        None => return Err(DispatchError::InvalidAction { action: None }),
    };

    // 2. The shell.
    let shell = shell_resolver::resolve_shell(invocation.shell.as_deref(), guess)?;

    // 3. Flags that only `activate` reads.
    if definition.action != ShellAction::Activate {
        if invocation.stack {
            log::warn!("--stack is ignored by '{}'", definition.action);
        }
        if invocation.subshell {
            log::warn!("--subshell is ignored by '{}'", definition.action);
        }
    }

    let request = ActivationRequest {
        action: definition.action,
        shell,
        target_spec: invocation.target.clone(),
        stack: invocation.stack,
        subshell: invocation.subshell,
    };
    (definition.handler)(&request, ctx)
}

// --- Handlers ---

fn emit(request: &ActivationRequest, text: String) -> Outcome {
    Outcome::Emit(Emission {
        operation: request.action.operation(),
        shell_name: request.shell.name.clone(),
        text,
    })
}

fn handle_init(request: &ActivationRequest, ctx: &Context) -> Result<Outcome, DispatchError> {
    // The prefix need not exist yet; it only ends up in the startup file.
    let prefix = prefix::resolve_prefix(&request.target_spec, ctx);
    let outcome = shell_init::init_shell(&request.shell, &prefix, ctx)?;
    Ok(emit(request, format!("{}\n", outcome.summary())))
}

fn handle_hook(request: &ActivationRequest, ctx: &Context) -> Result<Outcome, DispatchError> {
    Ok(emit(request, Activator::new(&request.shell, ctx).hook()))
}

fn handle_activate(request: &ActivationRequest, ctx: &Context) -> Result<Outcome, DispatchError> {
    let prefix = prefix::resolve_existing_prefix(&request.target_spec, ctx)?;
    if request.subshell {
        let session = shell::prepare_session(&request.shell, &prefix, request.stack, ctx)?;
        return Ok(Outcome::Handoff(session));
    }
    let text = Activator::new(&request.shell, ctx).activate(&prefix, request.stack);
    Ok(emit(request, text))
}

fn handle_reactivate(request: &ActivationRequest, ctx: &Context) -> Result<Outcome, DispatchError> {
    Ok(emit(request, Activator::new(&request.shell, ctx).reactivate()))
}

fn handle_deactivate(request: &ActivationRequest, ctx: &Context) -> Result<Outcome, DispatchError> {
    Ok(emit(request, Activator::new(&request.shell, ctx).deactivate()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::env::EnvSnapshot;
    use std::fs;
    use tempfile::TempDir;

    fn invocation(action: &str, shell: &str, target: &str) -> ShellInvocation {
        ShellInvocation {
            action: Some(action.to_string()),
            shell: Some(shell.to_string()),
            target: target.to_string(),
            stack: false,
            subshell: false,
        }
    }

    fn context(root: &TempDir) -> Context {
        let env: EnvSnapshot = [("PATH", "/usr/bin:/bin")].into_iter().collect();
        Context::new(root.path(), env)
    }

    fn emitted(outcome: Outcome) -> Emission {
        match outcome {
            Outcome::Emit(emission) => emission,
            Outcome::Handoff(_) => panic!("expected emitted text"),
        }
    }

    #[test]
    fn test_bogus_action_fails_without_side_effects() {
        let root = TempDir::new().unwrap();
        let ctx = context(&root);
        let result = dispatch_with(&invocation("bogus", "bash", ""), &ctx, || {
            panic!("shell guessing must not run for an invalid action")
        });
        assert!(matches!(
            result,
            Err(DispatchError::InvalidAction { action: Some(ref a) }) if a == "bogus"
        ));
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_action_fails() {
        let root = TempDir::new().unwrap();
        let ctx = context(&root);
        let mut inv = invocation("", "bash", "");
        inv.action = None;
        let err = dispatch_with(&inv, &ctx, || None).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidAction { action: None }));
        assert!(err.to_string().contains("init, hook, activate, reactivate, deactivate"));
        assert!(!err.is_guided_exit());
    }

    #[test]
    fn test_unresolvable_shell_is_guided_exit() {
        let root = TempDir::new().unwrap();
        let ctx = context(&root);
        let mut inv = invocation("hook", "", "");
        inv.shell = None;
        let err = dispatch_with(&inv, &ctx, || None).unwrap_err();
        assert!(err.is_guided_exit());
    }

    #[test]
    fn test_unsupported_shell_is_an_error() {
        let root = TempDir::new().unwrap();
        let ctx = context(&root);
        let err = dispatch_with(&invocation("hook", "fish", ""), &ctx, || None).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Resolve(ResolveError::UnsupportedDialect(_))
        ));
        assert!(!err.is_guided_exit());
    }

    #[test]
    fn test_hook_emits_hook_text() {
        let root = TempDir::new().unwrap();
        let ctx = context(&root);
        let emission = emitted(dispatch_with(&invocation("hook", "zsh", ""), &ctx, || None).unwrap());
        assert_eq!(emission.operation, "shell_hook");
        assert_eq!(emission.shell_name, "zsh");
        assert!(emission.text.contains("envshell()"));
    }

    #[test]
    fn test_guessed_shell_is_used() {
        let root = TempDir::new().unwrap();
        let ctx = context(&root);
        let mut inv = invocation("hook", "", "");
        inv.shell = None;
        let emission = emitted(dispatch_with(&inv, &ctx, || Some("xonsh".to_string())).unwrap());
        assert_eq!(emission.shell_name, "xonsh");
    }

    #[test]
    fn test_activate_missing_prefix_fails() {
        let root = TempDir::new().unwrap();
        let ctx = context(&root);
        let result = dispatch_with(&invocation("activate", "bash", "myenv"), &ctx, || None);
        assert!(matches!(
            result,
            Err(DispatchError::Prefix(PrefixError::PrefixNotFound(ref p)))
                if *p == root.path().join("envs").join("myenv")
        ));
    }

    #[test]
    fn test_activate_emits_layer() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("envs").join("myenv")).unwrap();
        let ctx = context(&root);
        let emission =
            emitted(dispatch_with(&invocation("activate", "bash", "myenv"), &ctx, || None).unwrap());
        assert_eq!(emission.operation, "shell_activate");
        assert!(emission.text.contains("export CONDA_SHLVL='1'"));
        assert!(emission.text.contains("export CONDA_DEFAULT_ENV='myenv'"));
    }

    #[test]
    fn test_activate_subshell_hands_off() {
        let root = TempDir::new().unwrap();
        let ctx = context(&root);
        let mut inv = invocation("activate", "bash", "");
        inv.subshell = true;
        match dispatch_with(&inv, &ctx, || None).unwrap() {
            Outcome::Handoff(session) => {
                assert!(session.startup_file().is_file());
                assert_eq!(session.shell_name(), "bash");
            }
            Outcome::Emit(_) => panic!("expected a subshell handoff"),
        }
    }

    #[test]
    fn test_deactivate_at_level_zero_is_empty() {
        let root = TempDir::new().unwrap();
        let ctx = context(&root);
        let emission =
            emitted(dispatch_with(&invocation("deactivate", "pwsh", ""), &ctx, || None).unwrap());
        assert_eq!(emission.text, "");
    }

    #[test]
    fn test_init_accepts_missing_prefix() {
        let home = TempDir::new().unwrap();
        let mut ctx = context(&home);
        ctx.home = Some(home.path().to_path_buf());
        let emission =
            emitted(dispatch_with(&invocation("init", "zsh", "myenv"), &ctx, || None).unwrap());
        assert_eq!(emission.operation, "shell_init");

        let rc = fs::read_to_string(home.path().join(".zshrc")).unwrap();
        let expected_root = home.path().join("envs").join("myenv");
        assert!(rc.contains(&format!("export ENVSHELL_ROOT_PREFIX='{}'", expected_root.display())));
        assert!(!expected_root.exists());
    }

    #[test]
    fn test_cmd_init_for_named_env_keeps_hook_under_root() {
        let root = TempDir::new().unwrap();
        let ctx = context(&root);
        let emission =
            emitted(dispatch_with(&invocation("init", "cmd.exe", "myenv"), &ctx, || None).unwrap());

        let hook_file = root.path().join("condabin").join(shell_init::CMD_HOOK_FILENAME);
        assert!(emission.text.contains(&hook_file.display().to_string()));
        assert!(hook_file.is_file());
        assert!(!root.path().join("envs").exists());
    }
}
