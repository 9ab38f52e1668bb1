// src/system/shells_config.rs

use std::{collections::HashMap, fs, path::Path, path::PathBuf};

use crate::{
    constants::SHELLS_CONFIG_FILENAME,
    models::{ShellConfig, ShellsConfig, StartupPassing},
    system::shell::ShellError,
};

/// Loads `shells.toml` from `config_dir`, layered over the built-in defaults.
///
/// Entries in the file replace the default entry of the same name; shells the
/// file does not mention keep their defaults. A missing file is not an error.
pub fn load_shells_config(config_dir: &Path) -> Result<ShellsConfig, ShellError> {
    let mut config = generate_default_shells_config();
    let shells_path = config_dir.join(SHELLS_CONFIG_FILENAME);
    if !shells_path.exists() {
        return Ok(config);
    }

    let content = fs::read_to_string(&shells_path)?;
    let user: ShellsConfig = toml::from_str(&content)?;
    log::debug!(
        "Loaded {} shell definition(s) from {}",
        user.shells.len(),
        shells_path.display()
    );
    config.shells.extend(user.shells);
    Ok(config)
}

/// The shells a subshell session can start without any configuration.
pub fn generate_default_shells_config() -> ShellsConfig {
    let mut shells = HashMap::new();

    let exe = |name: &str| {
        if cfg!(windows) {
            PathBuf::from(format!("{}.exe", name))
        } else {
            PathBuf::from(name)
        }
    };
    let args = |args: &[&str]| Some(args.iter().map(|a| a.to_string()).collect::<Vec<_>>());

    shells.insert(
        "bash".to_string(),
        ShellConfig {
            path: exe("bash"),
            interactive_args: args(&["--rcfile"]),
            startup_file: None,
            pass_via: StartupPassing::Argument,
        },
    );
    shells.insert(
        "zsh".to_string(),
        ShellConfig {
            path: exe("zsh"),
            interactive_args: args(&["-i"]),
            startup_file: Some(".zshrc".to_string()),
            pass_via: StartupPassing::EnvDir("ZDOTDIR".to_string()),
        },
    );
    for name in ["sh", "posix", "dash"] {
        let binary = if name == "posix" { "sh" } else { name };
        shells.insert(
            name.to_string(),
            ShellConfig {
                path: exe(binary),
                interactive_args: args(&["-i"]),
                startup_file: None,
                pass_via: StartupPassing::EnvFile("ENV".to_string()),
            },
        );
    }
    shells.insert(
        "xonsh".to_string(),
        ShellConfig {
            path: exe("xonsh"),
            interactive_args: args(&["-i", "--rc"]),
            startup_file: None,
            pass_via: StartupPassing::Argument,
        },
    );
    // The startup file sources the profile itself.
    for name in ["pwsh", "powershell"] {
        shells.insert(
            name.to_string(),
            ShellConfig {
                path: exe(name),
                interactive_args: args(&["-NoProfile", "-NoExit", "-File"]),
                startup_file: None,
                pass_via: StartupPassing::Argument,
            },
        );
    }
    if cfg!(windows) {
        for name in ["cmd.exe", "cmd"] {
            shells.insert(
                name.to_string(),
                ShellConfig {
                    path: PathBuf::from("cmd.exe"),
                    interactive_args: args(&["/K"]),
                    startup_file: None,
                    pass_via: StartupPassing::Argument,
                },
            );
        }
    }

    ShellsConfig { shells }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_cover_unix_shells() {
        let config = generate_default_shells_config();
        let bash = config.shells.get("bash").unwrap();
        assert_eq!(bash.interactive_args, Some(vec!["--rcfile".to_string()]));

        let zsh = config.shells.get("zsh").unwrap();
        assert_eq!(zsh.pass_via, StartupPassing::EnvDir("ZDOTDIR".to_string()));

        let posix = config.shells.get("posix").unwrap();
        assert_eq!(posix.pass_via, StartupPassing::EnvFile("ENV".to_string()));
        assert!(config.shells.contains_key("xonsh"));
        assert!(config.shells.contains_key("pwsh"));
    }

    #[test]
    fn test_powershell_defaults_skip_the_profile() {
        let config = generate_default_shells_config();
        for name in ["pwsh", "powershell"] {
            let args = config.shells.get(name).unwrap().interactive_args.clone().unwrap();
            assert_eq!(args, ["-NoProfile", "-NoExit", "-File"]);
        }
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_shells_config(dir.path()).unwrap();
        assert_eq!(config, generate_default_shells_config());
        // Loading never writes the file.
        assert!(!dir.path().join(SHELLS_CONFIG_FILENAME).exists());
    }

    #[test]
    fn test_file_entries_override_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(SHELLS_CONFIG_FILENAME),
            "[shells.bash]\npath = \"/opt/bash-5/bin/bash\"\ninteractive_args = [\"--rcfile\"]\n",
        )
        .unwrap();

        let config = load_shells_config(dir.path()).unwrap();
        let bash = config.shells.get("bash").unwrap();
        assert_eq!(bash.path, PathBuf::from("/opt/bash-5/bin/bash"));
        assert!(config.shells.contains_key("zsh"));
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(SHELLS_CONFIG_FILENAME), "[shells.bash\n").unwrap();
        assert!(matches!(
            load_shells_config(dir.path()),
            Err(ShellError::TomlParse(_))
        ));
    }
}
