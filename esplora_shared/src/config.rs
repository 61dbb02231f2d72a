//! Shared configuration logic for the simulator, the harness, and tests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::board::{self, DEFAULT_PWM_FREQUENCIES};
use crate::mux::MuxChannel;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SimConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub mux: MuxConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Seed for the floating-pin noise generator.
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_emit_snapshots")]
    pub emit_snapshots: bool,
    /// Simulated time after which the harness requests a shutdown.
    #[serde(default)]
    pub max_micros: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            emit_snapshots: default_emit_snapshots(),
            max_micros: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoardConfig {
    #[serde(default = "default_board_name")]
    pub name: String,
    #[serde(default = "default_pwm")]
    pub pwm: Vec<PwmPinConfig>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            name: default_board_name(),
            pwm: default_pwm(),
        }
    }
}

impl BoardConfig {
    /// Out-of-reset PWM period of `pin`, or `None` when the table has no entry for it.
    pub fn pwm_period(&self, pin: usize) -> Option<u32> {
        self.pwm
            .iter()
            .find(|p| p.pin == pin)
            .map(|p| board::period_from_frequency(p.frequency_hz))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PwmPinConfig {
    pub pin: usize,
    pub frequency_hz: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MuxConfig {
    /// Idle voltage overrides keyed by channel name (e.g. `slider = 2.5`).
    #[serde(default)]
    pub idle_voltage: BTreeMap<String, f64>,
}

impl MuxConfig {
    pub fn idle_voltage(&self, channel: MuxChannel) -> f64 {
        self.idle_voltage
            .get(channel.name())
            .copied()
            .unwrap_or_else(|| channel.idle_voltage())
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for entry in &self.board.pwm {
            if !board::has_pwm(entry.pin) {
                return Err(ConfigError::Invalid(format!(
                    "pin {} has no PWM timer",
                    entry.pin
                )));
            }
            if entry.frequency_hz == 0 {
                return Err(ConfigError::Invalid(format!(
                    "PWM frequency for pin {} must be > 0",
                    entry.pin
                )));
            }
        }
        for (name, voltage) in &self.mux.idle_voltage {
            if MuxChannel::from_name(name).is_none() {
                return Err(ConfigError::Invalid(format!("unknown mux channel '{}'", name)));
            }
            if !(0.0..=crate::V_REF).contains(voltage) {
                return Err(ConfigError::Invalid(format!(
                    "idle voltage for '{}' must be between 0 and {}",
                    name,
                    crate::V_REF
                )));
            }
        }
        Ok(())
    }
}

fn default_seed() -> u64 { 0x5EED_E5B1 }
fn default_emit_snapshots() -> bool { true }
fn default_board_name() -> String { "esplora".to_string() }
fn default_pwm() -> Vec<PwmPinConfig> {
    DEFAULT_PWM_FREQUENCIES
        .iter()
        .map(|&(pin, frequency_hz)| PwmPinConfig { pin, frequency_hz })
        .collect()
}

pub fn parse_config(contents: &str) -> Result<SimConfig, ConfigError> {
    let config: SimConfig = toml::from_str(contents).map_err(|e| {
        tracing::error!("Failed to parse config TOML: {}", e);
        ConfigError::Toml(e)
    })?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: impl AsRef<Path>) -> Result<SimConfig, ConfigError> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents),
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path.display(), e);
            Err(ConfigError::Io(e))
        }
    }
}
