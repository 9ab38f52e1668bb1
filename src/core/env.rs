// src/core/env.rs

//! A read-only copy of the environment the calling shell handed us.
//!
//! Nothing in the engine reads `std::env` after start-up: the stack depth,
//! the previous `PATH` and the prompt all come from an [`EnvSnapshot`] so the
//! activation logic can be exercised against any state.

use crate::constants::ENV_SHLVL;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// An immutable set of environment variables captured at invocation start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Captures the current process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped: they can
    /// never be re-emitted faithfully as script text anyway.
    pub fn capture() -> Self {
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .map(|(k, v)| {
                // Windows spells it `Path`; the rest of the engine only knows `PATH`.
                if cfg!(windows) && k.eq_ignore_ascii_case("PATH") {
                    ("PATH".to_string(), v)
                } else {
                    (k, v)
                }
            })
            .collect()
    }

    /// Returns the value of `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Returns `true` when `key` is present (even with an empty value).
    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// The current `PATH`, or an empty string.
    pub fn path(&self) -> &str {
        self.get("PATH").unwrap_or_default()
    }

    /// The number of activation layers recorded by the calling shell.
    /// Missing or garbled values count as zero.
    pub fn shlvl(&self) -> usize {
        self.get(ENV_SHLVL)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Sets `key` to `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Removes `key`.
    pub fn remove(&mut self, key: &str) {
        self.vars.remove(key);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// The platform whose conventions drive `PATH` layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Linux, macOS and the other Unix-likes.
    Unix,
    /// Windows.
    Windows,
}

impl Platform {
    /// The platform this binary was built for.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }

    /// Separator between `PATH` entries.
    pub fn path_separator(self) -> char {
        match self {
            Self::Unix => ':',
            Self::Windows => ';',
        }
    }

    /// Directories of `prefix` that hold executables, in `PATH` order.
    pub fn bin_dirs(self, prefix: &Path) -> Vec<PathBuf> {
        match self {
            Self::Unix => vec![prefix.join("bin")],
            Self::Windows => vec![
                prefix.to_path_buf(),
                prefix.join("Library").join("mingw-w64").join("bin"),
                prefix.join("Library").join("usr").join("bin"),
                prefix.join("Library").join("bin"),
                prefix.join("Scripts"),
                prefix.join("bin"),
            ],
        }
    }
}
