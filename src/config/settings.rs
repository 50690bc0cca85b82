use crate::core::{
    BASE_ISSUANCE, DEFAULT_TICK_INTERVAL_MS, EXCHANGE_ID, GENESIS_INVESTOR, GENESIS_ISSUANCE,
};
use crate::error::{ExchangeError, Result};
use log::error;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Settings loaded from the file named by `EXCHANGE_CONFIG`, or defaults
pub static GLOBAL_SETTINGS: Lazy<Settings> = Lazy::new(|| {
    let path = env::var(CONFIG_PATH_KEY).ok();
    match Settings::load(path.as_deref().map(Path::new)) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load settings, using defaults: {e}");
            Settings::default()
        }
    }
});

const CONFIG_PATH_KEY: &str = "EXCHANGE_CONFIG";
const TICK_MS_KEY: &str = "EXCHANGE_TICK_MS";
const SEED_KEY: &str = "EXCHANGE_SEED";
const DURATION_KEY: &str = "EXCHANGE_DURATION_SECS";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub exchange: ExchangeSettings,
    pub simulation: SimulationSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeSettings {
    /// Id presented to miners when the exchange asks for their chain
    pub id: String,
    pub tick_interval_ms: u64,
    pub genesis_investor: String,
    pub genesis_balance: u64,
    pub base_issuance: u64,
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            id: EXCHANGE_ID.to_string(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            genesis_investor: GENESIS_INVESTOR.to_string(),
            genesis_balance: GENESIS_ISSUANCE,
            base_issuance: BASE_ISSUANCE,
        }
    }
}

impl ExchangeSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub investors: usize,
    pub initial_balance: u64,
    pub miners: usize,
    pub block_interval_ms: u64,
    /// Most pooled transactions a miner puts in one block
    pub block_size: usize,
    pub block_reward: u64,
    /// How long a miner takes to answer a chain query
    pub resync_delay_ms: u64,
    /// Chance that a peer misses an accepted block and falls behind
    pub lag_probability: f64,
    pub duration_secs: u64,
    pub seed: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            investors: 5,
            initial_balance: 0,
            miners: 2,
            block_interval_ms: 2_000,
            block_size: 10,
            block_reward: 50,
            resync_delay_ms: 200,
            lag_probability: 0.1,
            duration_secs: 10,
            seed: None,
        }
    }
}

impl SimulationSettings {
    pub fn block_interval(&self) -> Duration {
        Duration::from_millis(self.block_interval_ms)
    }

    pub fn resync_delay(&self) -> Duration {
        Duration::from_millis(self.resync_delay_ms)
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

impl Settings {
    /// Read `path` when given (a missing file is an error), apply environment
    /// overrides, then validate
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let mut settings = match path {
            Some(path) => Self::from_toml(&fs::read_to_string(path)?)?,
            None => Settings::default(),
        };
        settings.apply_env_overrides()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml(contents: &str) -> Result<Settings> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ExchangeError::Config(e.to_string()))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(ms) = env_number(TICK_MS_KEY)? {
            self.exchange.tick_interval_ms = ms;
        }
        if let Some(seed) = env_number(SEED_KEY)? {
            self.simulation.seed = Some(seed);
        }
        if let Some(secs) = env_number(DURATION_KEY)? {
            self.simulation.duration_secs = secs;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.exchange.tick_interval_ms == 0 {
            return Err(ExchangeError::Config(
                "exchange.tick_interval_ms must be positive".to_string(),
            ));
        }
        if self.exchange.genesis_investor.is_empty() {
            return Err(ExchangeError::Config(
                "exchange.genesis_investor must be set".to_string(),
            ));
        }
        if self.exchange.genesis_balance == 0 {
            return Err(ExchangeError::Config(
                "exchange.genesis_balance must be positive".to_string(),
            ));
        }
        if self.simulation.block_interval_ms == 0 {
            return Err(ExchangeError::Config(
                "simulation.block_interval_ms must be positive".to_string(),
            ));
        }
        if self.simulation.block_size == 0 {
            return Err(ExchangeError::Config(
                "simulation.block_size must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.simulation.lag_probability) {
            return Err(ExchangeError::Config(format!(
                "simulation.lag_probability must be within [0, 1], got {}",
                self.simulation.lag_probability
            )));
        }
        Ok(())
    }
}

fn env_number(key: &str) -> Result<Option<u64>> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ExchangeError::Config(format!("{key}={raw}: {e}"))),
        Err(_) => Ok(None),
    }
}
