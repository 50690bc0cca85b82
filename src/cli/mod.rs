//! Command-line interface
//!
//! This module contains the CLI commands and argument parsing
//! for the exchange simulator.

pub mod commands;

pub use commands::{Command, Opt, ReportFormat};
