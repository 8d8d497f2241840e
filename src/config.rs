//! Configuration management for LedgerSeal

use crate::error::LedgerError;
use crate::transaction::{parse_amount, Amount};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub directory: DirectoryConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub miner: MinerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default = "default_starting_balance")]
    pub starting_balance: f64,
    #[serde(default = "default_suffix_min")]
    pub suffix_min: u32,
    #[serde(default = "default_suffix_max")]
    pub suffix_max: u32,
    #[serde(default = "default_max_id_attempts")]
    pub max_id_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MinerConfig {
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default = "default_difficulty_bits")]
    pub difficulty_bits: u32,
    /// Upper bound on nonces tried per seal. Unbounded when absent.
    #[serde(default)]
    pub max_attempts: Option<u64>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            starting_balance: default_starting_balance(),
            suffix_min: default_suffix_min(),
            suffix_max: default_suffix_max(),
            max_id_attempts: default_max_id_attempts(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_pending: default_max_pending(),
        }
    }
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            threads: default_threads(),
            difficulty_bits: default_difficulty_bits(),
            max_attempts: None,
        }
    }
}

impl DirectoryConfig {
    /// The starting balance as an exact decimal.
    ///
    /// The TOML float is read through its shortest round-trip decimal text, so
    /// `12.5` or `0.1` become exactly that many base units.
    pub fn starting_balance_amount(&self) -> Result<Amount, LedgerError> {
        parse_amount(&self.starting_balance.to_string()).map_err(|_| {
            LedgerError::ConfigError(format!(
                "directory.starting_balance must be a non-negative decimal within range, got {}",
                self.starting_balance
            ))
        })
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        self.starting_balance_amount()?;
        if self.suffix_min > self.suffix_max {
            return Err(LedgerError::ConfigError(format!(
                "directory.suffix_min ({}) exceeds directory.suffix_max ({})",
                self.suffix_min, self.suffix_max
            )));
        }
        Ok(())
    }
}

impl LedgerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, LedgerError> {
        let config: LedgerConfig =
            toml::from_str(text).map_err(|e| LedgerError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        self.directory.validate()?;
        if self.pool.max_pending == 0 {
            return Err(LedgerError::ConfigError(
                "pool.max_pending must be at least 1".to_string(),
            ));
        }
        if self.miner.threads == 0 {
            return Err(LedgerError::ConfigError(
                "miner.threads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load configuration from a TOML file, falling back to defaults when the file is
/// absent or empty.
pub fn load_config(path: impl AsRef<Path>) -> Result<LedgerConfig, Box<dyn std::error::Error>> {
    let config_str = fs::read_to_string(path).unwrap_or_default();
    let config = if config_str.trim().is_empty() {
        LedgerConfig::default()
    } else {
        LedgerConfig::from_toml_str(&config_str)?
    };

    config.validate()?;
    Ok(config)
}

fn default_starting_balance() -> f64 {
    5.0
}

fn default_suffix_min() -> u32 {
    1000
}

fn default_suffix_max() -> u32 {
    9999
}

fn default_max_id_attempts() -> u32 {
    32
}

fn default_max_pending() -> usize {
    10_000
}

fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_difficulty_bits() -> u32 {
    8
}
