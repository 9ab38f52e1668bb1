//! # System Interaction Layer
//!
//! Everything that touches the machine beyond reading the environment:
//!
//! - **`detect`**: guesses the calling shell from the parent process.
//! - **`shell`**: prepares and launches subshell sessions.
//! - **`shell_init`**: writes the hook loader into startup files.
//! - **`shells_config`**: loads `shells.toml`, which defines how each shell
//!   is started for a subshell session.

pub mod detect;
pub mod shell;
pub mod shell_init;
pub mod shells_config;
