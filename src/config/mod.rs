//! Configuration management
//!
//! This module handles the exchange and simulation settings: TOML file,
//! environment overrides and validation.

pub mod settings;

pub use settings::{ExchangeSettings, Settings, SimulationSettings, GLOBAL_SETTINGS};
