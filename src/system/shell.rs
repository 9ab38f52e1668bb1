// src/system/shell.rs

//! Subshell sessions: an interactive shell started with the hook loaded and
//! an environment already active.
//!
//! A session is prepared in two steps so the caller stays in control of the
//! process: [`prepare_session`] writes the startup file and returns a
//! [`SubshellSession`], and [`SubshellSession::exec`] hands the process over.

use crate::{
    activation::{Activator, TargetShell},
    core::{config::Context, paths},
    models::StartupPassing,
};
use std::{
    convert::Infallible,
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
    process::Command,
};
use tempfile::TempDir;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Requested shell '{0}' is not defined in shells.toml.")]
    ShellNotDefined(String),
    #[error("Failed to parse shells.toml: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Could not start '{shell}': {source}")]
    SubshellLaunch {
        shell: String,
        #[source]
        source: std::io::Error,
    },
}

/// A prepared interactive shell. Owns the session directory until the
/// process is handed over.
#[derive(Debug)]
pub struct SubshellSession {
    dir: TempDir,
    startup_file: PathBuf,
    program: PathBuf,
    args: Vec<OsString>,
    envs: Vec<(String, OsString)>,
    shell_name: String,
}

impl SubshellSession {
    /// The file the shell runs at start-up.
    pub fn startup_file(&self) -> &Path {
        &self.startup_file
    }

    /// The shell name from the request (`bash`, `zsh`, ...).
    pub fn shell_name(&self) -> &str {
        &self.shell_name
    }

    /// The program that will be started.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Its arguments.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    /// Replaces this process with the shell.
    ///
    /// Only returns on failure, after removing the session directory. On
    /// success the startup file deletes the directory itself.
    #[cfg(unix)]
    pub fn exec(self) -> Result<Infallible, ShellError> {
        use std::os::unix::process::CommandExt;

        log::debug!(
            "Executing {} {:?}",
            self.program.display(),
            self.args
        );
        let source = self.command().exec();
        let shell = self.shell_name;
        if let Err(e) = self.dir.close() {
            log::warn!("Could not remove the session directory: {}", e);
        }
        Err(ShellError::SubshellLaunch { shell, source })
    }

    /// Runs the shell as a child and exits with its status once it ends.
    ///
    /// Windows has no `exec`; the parent waits instead.
    #[cfg(not(unix))]
    pub fn exec(self) -> Result<Infallible, ShellError> {
        log::debug!(
            "Spawning {} {:?}",
            self.program.display(),
            self.args
        );
        let status = self.command().status();
        let shell = self.shell_name;
        if let Err(e) = self.dir.close() {
            log::warn!("Could not remove the session directory: {}", e);
        }
        match status {
            Ok(status) => std::process::exit(status.code().unwrap_or(1)),
            Err(source) => Err(ShellError::SubshellLaunch { shell, source }),
        }
    }
}

/// Prepares a subshell for `shell` with `prefix` active.
///
/// The startup file does, in order:
/// 1. restore the variable used to point the shell at the file, if any;
/// 2. source the user's own startup files, if there are any;
/// 3. load the hook;
/// 4. activate `prefix`;
/// 5. remove the session directory.
///
/// Files the hook needs beside its loader are written next to the startup file.
pub fn prepare_session(
    shell: &TargetShell,
    prefix: &Path,
    stack: bool,
    ctx: &Context,
) -> Result<SubshellSession, ShellError> {
    let config = ctx
        .shells
        .shells
        .get(&shell.name)
        .ok_or_else(|| ShellError::ShellNotDefined(shell.name.clone()))?;
    let activator = Activator::new(shell, ctx);
    let syntax = activator.syntax();

    let dir = tempfile::Builder::new().prefix("envshell-").tempdir()?;
    let file_name = config
        .startup_file
        .clone()
        .unwrap_or_else(|| format!("envshell-startup.{}", syntax.extension()));
    let startup_file = dir.path().join(file_name);

    let mut content = String::new();
    let mut line = |text: String| {
        content.push_str(&text);
        if !text.ends_with('\n') {
            content.push('\n');
        }
    };

    // 1. The shell only needed the variable to find this file.
    match &config.pass_via {
        StartupPassing::EnvDir(var) | StartupPassing::EnvFile(var) => match ctx.env.get(var) {
            Some(original) => line(syntax.export_var(var, original)),
            None => line(syntax.unset_var(var)),
        },
        StartupPassing::Argument => {}
    }

    // 2. Passing our own startup file suppresses the user's. For zsh the
    // redirected ZDOTDIR hides `.zshenv` too.
    let user_files = [
        paths::user_env_file(&shell.name, ctx.home.as_deref(), &ctx.env),
        paths::user_startup_file(&shell.name, ctx.home.as_deref(), &ctx.env, ctx.platform),
    ];
    for user_file in user_files.into_iter().flatten().filter(|f| f.is_file()) {
        log::debug!("Sourcing user startup file {}", user_file.display());
        line(syntax.source_script(&user_file));
    }

    // 3. + 4.
    line(activator.hook());
    match syntax.activate_command(prefix) {
        Some(cmd) if stack => line(format!("{} --stack", cmd)),
        Some(cmd) => line(cmd),
        None => line(activator.activate(prefix, stack)),
    }

    // 5.
    if let Some(cleanup) = syntax.remove_dir(dir.path()) {
        line(cleanup);
    }

    fs::write(&startup_file, content)?;
    for (name, companion) in activator.companion_files() {
        fs::write(dir.path().join(name), companion)?;
    }
    log::debug!("Subshell startup file written to {}", startup_file.display());

    let mut args: Vec<OsString> = config
        .interactive_args
        .iter()
        .flatten()
        .map(OsString::from)
        .collect();
    let mut envs = Vec::new();
    match &config.pass_via {
        StartupPassing::Argument => args.push(startup_file.clone().into_os_string()),
        StartupPassing::EnvFile(var) => {
            envs.push((var.clone(), startup_file.clone().into_os_string()))
        }
        StartupPassing::EnvDir(var) => envs.push((var.clone(), dir.path().as_os_str().to_owned())),
    }

    Ok(SubshellSession {
        dir,
        startup_file,
        program: config.path.clone(),
        args,
        envs,
        shell_name: shell.name.clone(),
    })
}
