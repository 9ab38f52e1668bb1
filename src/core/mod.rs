// src/core/mod.rs

pub mod config;
pub mod env;
pub mod paths;
pub mod prefix;
pub mod shell_resolver;
