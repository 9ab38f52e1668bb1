// src/core/config.rs

//! # Invocation Context
//!
//! Everything the engine needs to know about the world is gathered here once,
//! at the start of an invocation, and then passed by reference. Precedence for
//! each setting is: command-line flag, environment variable, `config.toml`,
//! built-in default.

use crate::{
    constants::{
        CONFIG_FILENAME, DEFAULT_ROOT_DIR_NAME, ENV_CHANGEPS1, ENV_EXE, ENV_ROOT_PREFIX,
    },
    core::{
        env::{EnvSnapshot, Platform},
        paths::{self, PathError},
    },
    models::ShellsConfig,
    system::{shell::ShellError, shells_config},
};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("Failed to parse '{path}': {source}")]
    TomlParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Shells(#[from] ShellError),
}

/// The optional `config.toml` in the envshell config directory.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root prefix; `~` and `$VAR` are expanded.
    pub root_prefix: Option<String>,
    /// Whether activation mutates the prompt.
    pub changeps1: Option<bool>,
}

/// Values the command line may force, overriding everything else.
#[derive(Debug, Default, Clone)]
pub struct ContextOverrides {
    /// `--root-prefix`.
    pub root_prefix: Option<String>,
    /// `--json`.
    pub json: bool,
}

/// The explicit configuration of one invocation.
#[derive(Debug, Clone)]
pub struct Context {
    /// Location under which named environments live.
    pub root_prefix: PathBuf,
    /// Path of the manager binary, written into hooks.
    pub exe: PathBuf,
    /// Wrap emitted text in a structured envelope.
    pub json: bool,
    /// Mutate the prompt on activation.
    pub changeps1: bool,
    /// Conventions for `PATH` layout.
    pub platform: Platform,
    /// The invoking user's home directory.
    pub home: Option<PathBuf>,
    /// Working directory, used to anchor relative prefix paths.
    pub cwd: PathBuf,
    /// The environment handed over by the calling shell.
    pub env: EnvSnapshot,
    /// Shells available for subshell sessions.
    pub shells: ShellsConfig,
}

impl Context {
    /// Builds a context with defaults for everything but the root prefix and
    /// the environment. Useful when the caller already knows both.
    pub fn new(root_prefix: impl Into<PathBuf>, env: EnvSnapshot) -> Self {
        let root_prefix = root_prefix.into();
        Self {
            cwd: root_prefix.clone(),
            root_prefix,
            exe: PathBuf::from(crate::BIN_NAME),
            json: false,
            changeps1: true,
            platform: Platform::current(),
            home: None,
            env,
            shells: shells_config::generate_default_shells_config(),
        }
    }

    /// Loads the context for this process: environment, config files and flags.
    pub fn load(overrides: &ContextOverrides) -> Result<Self, ConfigError> {
        let env = EnvSnapshot::capture();
        let home = dirs::home_dir();

        let config_dir = paths::get_config_dir().ok();
        let settings = match &config_dir {
            Some(dir) => load_settings(&dir.join(CONFIG_FILENAME))?,
            None => Settings::default(),
        };
        let shells = match &config_dir {
            Some(dir) => shells_config::load_shells_config(dir)?,
            None => shells_config::generate_default_shells_config(),
        };

        // 1. Root prefix: flag > env > config.toml > ~/envshell.
        let root_prefix = match overrides
            .root_prefix
            .clone()
            .or_else(|| env.get(ENV_ROOT_PREFIX).filter(|v| !v.is_empty()).map(str::to_string))
            .or_else(|| settings.root_prefix.clone())
        {
            Some(template) => paths::expand_path(&template)?,
            None => home
                .as_ref()
                .map(|h| h.join(DEFAULT_ROOT_DIR_NAME))
                .ok_or(PathError::HomeDirNotFound)?,
        };
        let cwd = std::env::current_dir()?;
        let root_prefix = if root_prefix.is_absolute() {
            root_prefix
        } else {
            cwd.join(root_prefix)
        };

        // 2. Prompt handling: env > config.toml > on.
        let changeps1 = env
            .get(ENV_CHANGEPS1)
            .map(parse_flag)
            .or(settings.changeps1)
            .unwrap_or(true);

        // 3. The binary path written into hooks. A hook sourced from a previous
        //    invocation already knows it; otherwise ask the OS.
        let exe = match env.get(ENV_EXE).filter(|v| !v.is_empty()) {
            Some(exe) => PathBuf::from(exe),
            None => std::env::current_exe()
                .map(|p| dunce::canonicalize(&p).unwrap_or(p))
                .unwrap_or_else(|_| PathBuf::from(crate::BIN_NAME)),
        };

        log::debug!(
            "Context loaded: root_prefix={}, exe={}, changeps1={}",
            root_prefix.display(),
            exe.display(),
            changeps1
        );

        Ok(Self {
            root_prefix,
            exe,
            json: overrides.json,
            changeps1,
            platform: Platform::current(),
            home,
            cwd,
            env,
            shells,
        })
    }
}

fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: path.display().to_string(),
        source,
    })
}

/// Interprets the usual spellings of a boolean environment variable.
fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off" | ""
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(" No "));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_load_settings_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let settings = load_settings(&dir.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_settings_reads_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "root_prefix = \"/opt/env-root\"\nchangeps1 = false\n").unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.root_prefix.as_deref(), Some("/opt/env-root"));
        assert_eq!(settings.changeps1, Some(false));
    }

    #[test]
    fn test_load_settings_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "root_prefix = [").unwrap();

        let result = load_settings(&path);
        assert!(matches!(result, Err(ConfigError::TomlParse { .. })));
    }

    #[test]
    fn test_new_uses_root_as_cwd() {
        let ctx = Context::new("/opt/env-root", EnvSnapshot::default());
        assert_eq!(ctx.root_prefix, PathBuf::from("/opt/env-root"));
        assert_eq!(ctx.cwd, ctx.root_prefix);
        assert!(ctx.changeps1);
        assert!(!ctx.json);
    }
}
