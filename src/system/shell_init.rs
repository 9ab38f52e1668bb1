// src/system/shell_init.rs

//! Installs the hook loader into a shell's startup file.
//!
//! The loader lives between two marker lines, so running `init` again
//! replaces it instead of appending a second copy.

use crate::{
    activation::{Activator, ShellDialect, TargetShell},
    constants::{INIT_BLOCK_BEGIN, INIT_BLOCK_END},
    core::{config::Context, paths},
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Name of the batch file cmd.exe users call (or register as AutoRun).
pub const CMD_HOOK_FILENAME: &str = "envshell_hook.bat";

#[derive(Error, Debug)]
pub enum InitError {
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not locate the startup file for shell '{0}'.")]
    NoStartupFile(String),
    #[error("'{0}' contains the start of an envshell block but not its end. Please fix it by hand.")]
    UnterminatedBlock(PathBuf),
}

/// What `init` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// The file was created or its block rewritten.
    Modified(PathBuf),
    /// The file already held the current block.
    Unchanged(PathBuf),
}

impl InitOutcome {
    /// The file `init` looked at.
    pub fn path(&self) -> &Path {
        match self {
            Self::Modified(path) | Self::Unchanged(path) => path,
        }
    }

    /// A one-line human summary.
    pub fn summary(&self) -> String {
        match self {
            Self::Modified(path) => format!(t!("init.modified"), path = path.display()),
            Self::Unchanged(path) => format!(t!("init.unchanged"), path = path.display()),
        }
    }
}

/// Writes the loader for `shell` into its startup file. The loader points
/// the hook at `hook_root`.
///
/// cmd.exe has no startup file; its hook and the files the hook needs are
/// written to `condabin/` under the context's root prefix instead, whatever
/// `hook_root` is.
pub fn init_shell(
    shell: &TargetShell,
    hook_root: &Path,
    ctx: &Context,
) -> Result<InitOutcome, InitError> {
    let hook_ctx = Context {
        root_prefix: hook_root.to_path_buf(),
        ..ctx.clone()
    };
    let activator = Activator::new(shell, &hook_ctx);

    if shell.dialect == ShellDialect::CmdExe {
        let condabin = ctx.root_prefix.join("condabin");
        let mut outcome =
            write_if_changed(&condabin.join(CMD_HOOK_FILENAME), &activator.init_block())?;
        for (name, content) in activator.companion_files() {
            let written = write_if_changed(&condabin.join(name), &content)?;
            // Report the hook file unless only a companion changed.
            if matches!(outcome, InitOutcome::Unchanged(_))
                && matches!(written, InitOutcome::Modified(_))
            {
                outcome = written;
            }
        }
        return Ok(outcome);
    }

    let path = paths::user_startup_file(&shell.name, ctx.home.as_deref(), &ctx.env, ctx.platform)
        .ok_or_else(|| InitError::NoStartupFile(shell.name.clone()))?;
    let existing = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    let updated = splice_block(&existing, &activator.init_block())
        .ok_or_else(|| InitError::UnterminatedBlock(path.clone()))?;
    write_if_changed(&path, &updated)
}

fn write_if_changed(path: &Path, content: &str) -> Result<InitOutcome, InitError> {
    if fs::read_to_string(path).is_ok_and(|current| current == content) {
        log::debug!("{} is already up to date", path.display());
        return Ok(InitOutcome::Unchanged(path.to_path_buf()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    log::info!("Wrote envshell block to {}", path.display());
    Ok(InitOutcome::Modified(path.to_path_buf()))
}

/// Replaces the marked block in `content` with `block`, or appends `block`
/// when there is none. `None` when a start marker has no matching end.
fn splice_block(content: &str, block: &str) -> Option<String> {
    let Some(start) = content.find(INIT_BLOCK_BEGIN) else {
        let mut out = content.to_string();
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(block);
        return Some(out);
    };

    let (head, rest) = content.split_at(start);
    let (_, tail) = rest.split_at(rest.find(INIT_BLOCK_END)? + INIT_BLOCK_END.len());
    let tail = tail.strip_prefix('\n').unwrap_or(tail);

    let mut out = String::with_capacity(content.len() + block.len());
    out.push_str(head);
    out.push_str(block);
    out.push_str(tail);
    Some(out)
}
