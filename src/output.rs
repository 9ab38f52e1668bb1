// src/output.rs

//! Everything `envshell shell` prints to stdout goes through here.
//!
//! Stdout is evaluated by the calling shell, so it carries only the emitted
//! text (or its JSON envelope). Diagnostics belong on stderr.

use serde_json::json;
use std::io::{self, Write};

/// Text produced by one action, plus what structured output needs to describe it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    /// Operation name (`shell_hook`, `shell_activate`, ...).
    pub operation: String,
    /// Name of the target shell.
    pub shell_name: String,
    /// Script text or human summary.
    pub text: String,
}

/// Renders `emission` as plain text or as the structured envelope.
pub fn render(emission: &Emission, json: bool) -> Result<String, serde_json::Error> {
    if !json {
        return Ok(emission.text.clone());
    }
    let envelope = json!({
        "success": true,
        "operation": emission.operation,
        "context": { "shell_type": emission.shell_name },
        "actions": { "print": [emission.text] },
    });
    let mut rendered = serde_json::to_string_pretty(&envelope)?;
    rendered.push('\n');
    Ok(rendered)
}

/// Renders `emission` and writes it to `out` in one go.
pub fn write_emission(emission: &Emission, json: bool, out: &mut impl Write) -> io::Result<()> {
    let rendered = render(emission, json).map_err(io::Error::other)?;
    out.write_all(rendered.as_bytes())?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        activation::{Activator, ShellDialect, TargetShell},
        core::{config::Context, env::EnvSnapshot},
    };

    fn emission(text: &str) -> Emission {
        Emission {
            operation: "shell_hook".to_string(),
            shell_name: "zsh".to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_plain_render_is_the_text() {
        assert_eq!(render(&emission("export X='1'\n"), false).unwrap(), "export X='1'\n");
    }

    #[test]
    fn test_json_print_matches_plain_hook() {
        let ctx = Context::new("/opt/env-root", EnvSnapshot::default());
        let shell = TargetShell {
            name: "zsh".to_string(),
            dialect: ShellDialect::Posix,
        };
        let hook = Activator::new(&shell, &ctx).hook();

        let rendered = render(&emission(&hook), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["operation"], "shell_hook");
        assert_eq!(value["context"]["shell_type"], "zsh");
        assert_eq!(value["actions"]["print"][0], hook.as_str());
        assert_eq!(value["actions"]["print"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_write_emission() {
        let mut buf = Vec::new();
        write_emission(&emission("unset X\n"), false, &mut buf).unwrap();
        assert_eq!(buf, b"unset X\n");
    }
}
