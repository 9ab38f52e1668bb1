// src/activation/script.rs

//! Dialect-independent planning of activation changes.
//!
//! The [`Planner`] reads the calling shell's state from the context's
//! environment snapshot and produces an ordered [`ActivationScript`]. Each
//! dialect then renders the statements in its own syntax.

use crate::{
    constants::{
        ENV_DEFAULT_ENV, ENV_PATH_BACKUP_LAYER, ENV_PREFIX, ENV_PREFIX_LAYER,
        ENV_PROMPT_MODIFIER, ENV_SHLVL, ENV_STACKED_LAYER,
    },
    core::{config::Context, prefix::env_display_name},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

const ACTIVATE_D: &str = "activate.d";
const DEACTIVATE_D: &str = "deactivate.d";

/// One dialect-neutral change to the calling shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Remove a variable.
    Unset(String),
    /// Set and export a variable.
    Export(String, String),
    /// Replace the prompt (only emitted for dialects with a prompt variable).
    Prompt(String),
    /// Source a script shipped by the environment.
    Source(PathBuf),
}

/// An ordered list of statements. Order matters: later statements may rely
/// on earlier exports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationScript {
    statements: Vec<Statement>,
}

impl ActivationScript {
    /// Appends a statement.
    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    /// The statements, in order.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// `true` when nothing needs to change.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    fn export(&mut self, name: impl Into<String>, value: impl ToString) {
        self.push(Statement::Export(name.into(), value.to_string()));
    }

    fn unset(&mut self, name: impl Into<String>) {
        self.push(Statement::Unset(name.into()));
    }
}

/// Computes activation changes from the environment snapshot in a [`Context`].
#[derive(Debug)]
pub struct Planner<'a> {
    ctx: &'a Context,
    extension: &'a str,
    prompt_var: Option<&'a str>,
}

impl<'a> Planner<'a> {
    /// Creates a planner for scripts with `extension`. `prompt_var` is the
    /// variable holding the prompt, if the dialect keeps it in one.
    pub fn new(ctx: &'a Context, extension: &'a str, prompt_var: Option<&'a str>) -> Self {
        Self {
            ctx,
            extension,
            prompt_var: prompt_var.filter(|_| ctx.changeps1),
        }
    }

    /// Plans one activation layer for `prefix`.
    ///
    /// Without `stack`, the current layer's directories are removed from
    /// `PATH` first; with it, the new layer goes on top of everything.
    pub fn activate(&self, prefix: &Path, stack: bool) -> ActivationScript {
        let env = &self.ctx.env;
        let old_level = env.shlvl();
        let old_prefix = self.current_prefix();

        if !stack && old_prefix.as_deref() == Some(prefix) {
            log::debug!("'{}' is already active, reactivating", prefix.display());
            return self.reactivate();
        }

        let mut script = ActivationScript::default();
        let new_level = old_level + 1;
        let current_path = env.path();

        // 1. Undo the current layer unless stacking on top of it.
        let base_path = match (&old_prefix, stack) {
            (Some(old), false) => {
                self.push_scripts(&mut script, old, DEACTIVATE_D);
                self.remove_dirs(current_path, old)
            }
            _ => current_path.to_string(),
        };

        // 2. Record what deactivation needs to unwind this layer.
        script.export(layer_var(ENV_PATH_BACKUP_LAYER, new_level), current_path);
        if let Some(old) = &old_prefix {
            script.export(layer_var(ENV_PREFIX_LAYER, old_level), old.display());
        }
        let stacked_var = layer_var(ENV_STACKED_LAYER, new_level);
        if stack {
            script.export(stacked_var, "true");
        } else if env.contains(&stacked_var) {
            script.unset(stacked_var);
        }

        // 3. Apply the new layer.
        let name = env_display_name(prefix, self.ctx);
        let modifier = prompt_modifier(&name);
        script.export(ENV_PREFIX, prefix.display());
        script.export(ENV_SHLVL, new_level);
        script.export(ENV_DEFAULT_ENV, &name);
        script.export(ENV_PROMPT_MODIFIER, &modifier);
        script.export("PATH", self.prepend_dirs(&base_path, prefix));
        self.push_prompt(&mut script, &modifier);
        self.push_scripts(&mut script, prefix, ACTIVATE_D);

        script
    }

    /// Plans the removal of the top layer. Empty when nothing is active.
    pub fn deactivate(&self) -> ActivationScript {
        let env = &self.ctx.env;
        let mut script = ActivationScript::default();
        let Some(current) = self.current_prefix() else {
            return script;
        };
        let level = env.shlvl();
        let stacked_var = layer_var(ENV_STACKED_LAYER, level);
        let was_stacked = env.get(&stacked_var) == Some("true");

        self.push_scripts(&mut script, &current, DEACTIVATE_D);

        // 1. The PATH as it was before this layer, or our best reconstruction.
        let backup_var = layer_var(ENV_PATH_BACKUP_LAYER, level);
        let restored_path = match env.get(&backup_var) {
            Some(path) => path.to_string(),
            None => {
                log::warn!("{} is missing, removing '{}' from PATH", backup_var, current.display());
                self.remove_dirs(env.path(), &current)
            }
        };
        if env.contains(&backup_var) {
            script.unset(backup_var);
        }
        if env.contains(&stacked_var) {
            script.unset(stacked_var);
        }

        // 2. Promote the layer below, if any.
        let new_level = level.saturating_sub(1);
        let previous_var = layer_var(ENV_PREFIX_LAYER, new_level);
        let previous = if new_level > 0 {
            env.get(&previous_var)
                .filter(|p| !p.is_empty())
                .map(PathBuf::from)
        } else {
            None
        };
        let modifier = match &previous {
            Some(prev) => {
                let name = env_display_name(prev, self.ctx);
                let modifier = prompt_modifier(&name);
                script.unset(previous_var);
                script.export(ENV_PREFIX, prev.display());
                script.export(ENV_DEFAULT_ENV, &name);
                script.export(ENV_PROMPT_MODIFIER, &modifier);
                modifier
            }
            None => {
                script.unset(ENV_PREFIX);
                script.unset(ENV_DEFAULT_ENV);
                script.unset(ENV_PROMPT_MODIFIER);
                String::new()
            }
        };
        script.export(ENV_SHLVL, new_level);
        script.export("PATH", restored_path);
        self.push_prompt(&mut script, &modifier);

        // The layer below was only suspended if this one replaced it.
        if let Some(prev) = &previous {
            if !was_stacked {
                self.push_scripts(&mut script, prev, ACTIVATE_D);
            }
        }

        script
    }

    /// Plans a refresh of the top layer: its `PATH` entries are rebuilt in
    /// place and its scripts re-run. Empty when nothing is active.
    pub fn reactivate(&self) -> ActivationScript {
        let mut script = ActivationScript::default();
        let Some(current) = self.current_prefix() else {
            return script;
        };
        self.push_scripts(&mut script, &current, DEACTIVATE_D);
        script.export("PATH", self.replace_dirs(self.ctx.env.path(), &current));
        self.push_scripts(&mut script, &current, ACTIVATE_D);
        script
    }

    fn current_prefix(&self) -> Option<PathBuf> {
        if self.ctx.env.shlvl() == 0 {
            return None;
        }
        self.ctx
            .env
            .get(ENV_PREFIX)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }

    fn push_prompt(&self, script: &mut ActivationScript, new_modifier: &str) {
        let Some(var) = self.prompt_var else {
            return;
        };
        // Without the current prompt we would only clobber it.
        let Some(current) = self.ctx.env.get(var) else {
            return;
        };
        let stripped = match self.ctx.env.get(ENV_PROMPT_MODIFIER).filter(|m| !m.is_empty()) {
            Some(old) => current.replacen(old, "", 1),
            None => current.to_string(),
        };
        script.push(Statement::Prompt(format!("{}{}", new_modifier, stripped)));
    }

    fn push_scripts(&self, script: &mut ActivationScript, prefix: &Path, kind: &str) {
        let dir = prefix.join("etc").join("conda").join(kind);
        let Ok(entries) = fs::read_dir(&dir) else {
            return;
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().is_some_and(|ext| ext == self.extension)
            })
            .collect();
        files.sort();
        log::debug!("Found {} {} script(s) in {}", files.len(), kind, dir.display());
        for file in files {
            script.push(Statement::Source(file));
        }
    }

    fn bin_dirs(&self, prefix: &Path) -> Vec<String> {
        self.ctx
            .platform
            .bin_dirs(prefix)
            .iter()
            .map(|dir| dir.display().to_string())
            .collect()
    }

    fn split(&self, path: &str) -> Vec<String> {
        if path.is_empty() {
            return Vec::new();
        }
        path.split(self.ctx.platform.path_separator())
            .map(str::to_string)
            .collect()
    }

    fn join(&self, entries: &[String]) -> String {
        entries.join(&self.ctx.platform.path_separator().to_string())
    }

    fn prepend_dirs(&self, path: &str, prefix: &Path) -> String {
        let mut entries = self.bin_dirs(prefix);
        entries.extend(self.split(path));
        self.join(&entries)
    }

    /// Removes the first occurrence of each of `prefix`'s directories.
    fn remove_dirs(&self, path: &str, prefix: &Path) -> String {
        let mut entries = self.split(path);
        for dir in self.bin_dirs(prefix) {
            if let Some(index) = entries.iter().position(|entry| *entry == dir) {
                entries.remove(index);
            }
        }
        self.join(&entries)
    }

    /// Re-inserts `prefix`'s directories where the first of them used to be,
    /// or at the front when none was present.
    fn replace_dirs(&self, path: &str, prefix: &Path) -> String {
        let dirs = self.bin_dirs(prefix);
        let mut entries = self.split(path);
        let mut insert_at: Option<usize> = None;
        for dir in &dirs {
            if let Some(index) = entries.iter().position(|entry| entry == dir) {
                entries.remove(index);
                insert_at = Some(insert_at.map_or(index, |at| at.min(index)));
            }
        }
        let at = insert_at.unwrap_or(0).min(entries.len());
        entries.splice(at..at, dirs);
        self.join(&entries)
    }
}

fn layer_var(base: &str, level: usize) -> String {
    format!("{}{}", base, level)
}

fn prompt_modifier(name: &str) -> String {
    format!("({}) ", name)
}

#[cfg(test)]
impl ActivationScript {
    /// Plays the script against `env` the way a shell would.
    pub(crate) fn apply(&self, env: &mut crate::core::env::EnvSnapshot, prompt_var: &str) {
        for statement in &self.statements {
            match statement {
                Statement::Unset(name) => env.remove(name),
                Statement::Export(name, value) => env.set(name.as_str(), value.as_str()),
                Statement::Prompt(value) => env.set(prompt_var, value.as_str()),
                Statement::Source(_) => {}
            }
        }
    }
}
