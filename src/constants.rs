// src/constants.rs

//! Names shared with the scripts that run inside the calling shell.
//!
//! Every variable below is read back by a later invocation (or by the hook
//! functions themselves), so renaming one breaks shells initialised by an
//! older release.

/// Absolute path of the manager binary, exported by every hook.
pub const ENV_EXE: &str = "ENVSHELL_EXE";

/// Root prefix under which named environments live (`<root>/envs/<name>`).
pub const ENV_ROOT_PREFIX: &str = "ENVSHELL_ROOT_PREFIX";

/// Set to `false`, `0` or `no` to keep the prompt untouched.
pub const ENV_CHANGEPS1: &str = "ENVSHELL_CHANGEPS1";

/// Number of activation layers currently applied.
pub const ENV_SHLVL: &str = "CONDA_SHLVL";

/// Prefix of the top activation layer.
pub const ENV_PREFIX: &str = "CONDA_PREFIX";

/// Display name of the top activation layer.
pub const ENV_DEFAULT_ENV: &str = "CONDA_DEFAULT_ENV";

/// Text prepended to the prompt while an environment is active.
pub const ENV_PROMPT_MODIFIER: &str = "CONDA_PROMPT_MODIFIER";

/// `CONDA_PREFIX_<n>`: prefix of layer `n` below the top one.
pub const ENV_PREFIX_LAYER: &str = "CONDA_PREFIX_";

/// `CONDA_STACKED_<n>`: layer `n` was stacked on top of layer `n - 1`.
pub const ENV_STACKED_LAYER: &str = "CONDA_STACKED_";

/// `ENVSHELL_PATH_BACKUP_<n>`: the `PATH` in effect before layer `n` was applied.
pub const ENV_PATH_BACKUP_LAYER: &str = "ENVSHELL_PATH_BACKUP_";

/// The name users type for the root environment.
pub const BASE_ENV_NAME: &str = "base";

/// Directory below the root prefix holding named environments.
pub const ENVS_DIR: &str = "envs";

/// Directory of the manager's own configuration (inside the system config dir).
pub const CONFIG_DIR_NAME: &str = "envshell";

/// Optional settings file (inside the config dir).
pub const CONFIG_FILENAME: &str = "config.toml";

/// Optional table of shells available for subshell sessions (inside the config dir).
pub const SHELLS_CONFIG_FILENAME: &str = "shells.toml";

/// Default root prefix, relative to the user's home directory.
pub const DEFAULT_ROOT_DIR_NAME: &str = "envshell";

/// Opening marker of the block `init` manages in startup files.
pub const INIT_BLOCK_BEGIN: &str = "# >>> envshell initialize >>>";

/// Closing marker of the block `init` manages in startup files.
pub const INIT_BLOCK_END: &str = "# <<< envshell initialize <<<";

/// Commands after which the hook re-runs `reactivate`.
pub const PACKAGE_COMMANDS: &[&str] = &["install", "update", "remove", "uninstall"];
