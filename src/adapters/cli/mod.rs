//! CLI Adapter
//!
//! Command-line interface for the pairs screener.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{CliApp, Command, DecodeCmd, RefreshCmd, RunCmd, ShowCmd};
