// src/core/prefix.rs

//! Turns what the user typed after the action into an environment location.
//!
//! * empty or `base` selects the root prefix;
//! * anything containing a path separator is a path;
//! * anything else names an environment under `<root>/envs/`.

use crate::{
    constants::{BASE_ENV_NAME, ENVS_DIR},
    core::{config::Context, paths},
};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrefixError {
    #[error("Cannot activate, prefix does not exist at: '{0}'")]
    PrefixNotFound(PathBuf),
}

/// Resolves `target_spec` to an absolute prefix without touching the filesystem.
pub fn resolve_prefix(target_spec: &str, ctx: &Context) -> PathBuf {
    let expanded = paths::expand_user(target_spec.trim(), ctx.home.as_deref());

    if expanded.is_empty() || expanded == BASE_ENV_NAME {
        return ctx.root_prefix.clone();
    }

    if expanded.contains(['/', '\\']) {
        let path = PathBuf::from(&expanded);
        return if path.is_absolute() {
            path
        } else {
            ctx.cwd.join(path)
        };
    }

    ctx.root_prefix.join(ENVS_DIR).join(expanded)
}

/// Resolves `target_spec` and requires the result to exist, as activation does.
pub fn resolve_existing_prefix(target_spec: &str, ctx: &Context) -> Result<PathBuf, PrefixError> {
    let prefix = resolve_prefix(target_spec, ctx);
    if !prefix.exists() {
        return Err(PrefixError::PrefixNotFound(prefix));
    }
    log::debug!("Resolved prefix '{}' to {}", target_spec, prefix.display());
    Ok(prefix)
}

/// The name shown for `prefix` in `CONDA_DEFAULT_ENV` and the prompt:
/// `base` for the root, the directory name for named environments, the full
/// path otherwise.
pub fn env_display_name(prefix: &Path, ctx: &Context) -> String {
    if prefix == ctx.root_prefix {
        return BASE_ENV_NAME.to_string();
    }
    let envs_dir = ctx.root_prefix.join(ENVS_DIR);
    match (prefix.parent(), prefix.file_name()) {
        (Some(parent), Some(name)) if parent == envs_dir => name.to_string_lossy().into_owned(),
        _ => prefix.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::env::EnvSnapshot;
    use std::fs;
    use tempfile::TempDir;

    fn context(root: &Path) -> Context {
        Context::new(root, EnvSnapshot::default())
    }

    #[test]
    fn test_empty_and_base_resolve_to_root() {
        let ctx = context(Path::new("/opt/env-root"));
        assert_eq!(resolve_prefix("", &ctx), PathBuf::from("/opt/env-root"));
        assert_eq!(resolve_prefix("base", &ctx), PathBuf::from("/opt/env-root"));
    }

    #[test]
    fn test_name_resolves_under_envs() {
        let ctx = context(Path::new("/opt/env-root"));
        assert_eq!(
            resolve_prefix("myenv", &ctx),
            PathBuf::from("/opt/env-root/envs/myenv")
        );
    }

    #[test]
    fn test_absolute_path_is_kept_verbatim() {
        let ctx = context(Path::new("/opt/env-root"));
        assert_eq!(
            resolve_prefix("/abs/custom/path", &ctx),
            PathBuf::from("/abs/custom/path")
        );
    }

    #[test]
    fn test_relative_path_is_anchored_at_cwd() {
        let mut ctx = context(Path::new("/opt/env-root"));
        ctx.cwd = PathBuf::from("/work");
        assert_eq!(resolve_prefix("./envs/x", &ctx), PathBuf::from("/work/./envs/x"));
    }

    #[test]
    fn test_home_relative_path_is_expanded() {
        let mut ctx = context(Path::new("/opt/env-root"));
        ctx.home = Some(PathBuf::from("/home/alice"));
        assert_eq!(
            resolve_prefix("~/envs/tools", &ctx),
            PathBuf::from("/home/alice/envs/tools")
        );
    }

    #[test]
    fn test_existing_prefix_required_for_activation() {
        let root = TempDir::new().unwrap();
        let ctx = context(root.path());

        // The root itself exists.
        assert_eq!(resolve_existing_prefix("", &ctx).unwrap(), root.path());

        // A missing named environment does not.
        let result = resolve_existing_prefix("myenv", &ctx);
        assert!(
            matches!(result, Err(PrefixError::PrefixNotFound(ref p)) if p == &root.path().join("envs").join("myenv"))
        );

        fs::create_dir_all(root.path().join("envs").join("myenv")).unwrap();
        assert!(resolve_existing_prefix("myenv", &ctx).is_ok());
    }

    #[test]
    fn test_display_names() {
        let ctx = context(Path::new("/opt/env-root"));
        assert_eq!(env_display_name(Path::new("/opt/env-root"), &ctx), "base");
        assert_eq!(
            env_display_name(Path::new("/opt/env-root/envs/myenv"), &ctx),
            "myenv"
        );
        assert_eq!(
            env_display_name(Path::new("/abs/custom/path"), &ctx),
            "/abs/custom/path"
        );
    }
}
