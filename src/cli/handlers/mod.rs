// src/cli/handlers/mod.rs

// One module per top-level subcommand.

pub mod shell;
