include!(concat!(env!("OUT_DIR"), "/translations.rs"));

/// Name of the binary, used when the real path cannot be determined.
pub const BIN_NAME: &str = "envshell";

pub mod activation;
pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod output;
pub mod system;
