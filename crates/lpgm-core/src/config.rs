//! # Configuration System
//!
//! YAML-based configuration for the LPGM pipeline:
//!
//! - Sample rate of the incoming acceleration stream
//! - Oscillator bank (damping ratio and target period grid)
//! - High-pass cutoff period used before velocity integration
//! - Rolling classification window length
//! - Logging
//!
//! Every default reproduces the JMA procedure; overriding them is meant for
//! experiments and tests.
//!
//! ## Configuration Search Path
//!
//! Configuration is loaded from the first file found:
//! 1. Path specified via `LPGM_CONFIG` environment variable
//! 2. `./lpgm.yaml` (current directory)
//! 3. `~/.config/lpgm/config.yaml` (user config)
//! 4. `/etc/lpgm/config.yaml` (system config)
//!
//! ## Example Configuration
//!
//! ```yaml
//! sample_rate: 100.0
//!
//! spectrum:
//!   damping: 0.05
//!   period_min_s: 1.6
//!   period_max_s: 7.8
//!   period_count: 32
//!
//! highpass:
//!   cutoff_period_s: 20.0
//!
//! window:
//!   duration_s: 30.0
//!
//! logging:
//!   level: info
//!   format: compact
//! ```

use crate::observe::LogConfig;
use crate::oscillator::{
    period_grid, DEFAULT_DAMPING, DEFAULT_PERIOD_COUNT, DEFAULT_PERIOD_MAX_S, DEFAULT_PERIOD_MIN_S,
};
use crate::types::LpgmError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "LPGM_CONFIG";

/// Largest rolling window accepted, in ticks.
pub const MAX_WINDOW_CAPACITY: usize = 10_000_000;

/// Error type for configuration operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Configuration file not found
    NotFound(String),
    /// Failed to read or write configuration file
    ReadError(String),
    /// Failed to parse configuration
    ParseError(String),
    /// Invalid configuration value
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(msg) => write!(f, "config not found: {}", msg),
            ConfigError::ReadError(msg) => write!(f, "failed to read config: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "failed to parse config: {}", msg),
            ConfigError::ValidationError(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for LpgmError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ValidationError(msg) => LpgmError::InvalidConfiguration(msg),
            other => LpgmError::InvalidConfiguration(other.to_string()),
        }
    }
}

/// Oscillator bank configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumConfig {
    /// Fraction of critical damping, in [0, 1)
    pub damping: f64,
    /// Shortest target period in seconds
    pub period_min_s: f64,
    /// Longest target period in seconds
    pub period_max_s: f64,
    /// Number of linearly spaced periods
    pub period_count: usize,
    /// Explicit period list; overrides the linear grid when set
    pub periods: Option<Vec<f64>>,
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            damping: DEFAULT_DAMPING,
            period_min_s: DEFAULT_PERIOD_MIN_S,
            period_max_s: DEFAULT_PERIOD_MAX_S,
            period_count: DEFAULT_PERIOD_COUNT,
            periods: None,
        }
    }
}

/// High-pass filter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighPassConfig {
    /// Cutoff period in seconds (cutoff frequency = 1 / period)
    pub cutoff_period_s: f64,
}

impl Default for HighPassConfig {
    fn default() -> Self {
        Self {
            cutoff_period_s: 20.0,
        }
    }
}

/// Rolling classification window configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window length in seconds
    pub duration_s: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { duration_s: 30.0 }
    }
}

/// Complete LPGM configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LpgmConfig {
    /// Sample rate of the acceleration stream in Hz
    pub sample_rate: f64,
    /// Oscillator bank settings
    pub spectrum: SpectrumConfig,
    /// High-pass settings
    pub highpass: HighPassConfig,
    /// Rolling window settings
    pub window: WindowConfig,
    /// Logging settings
    pub logging: LogConfig,
}

impl Default for LpgmConfig {
    fn default() -> Self {
        Self {
            sample_rate: 100.0,
            spectrum: SpectrumConfig::default(),
            highpass: HighPassConfig::default(),
            window: WindowConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl LpgmConfig {
    /// Default configuration at the given sample rate.
    pub fn with_sample_rate(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            ..Default::default()
        }
    }

    /// Load configuration from the default search path.
    ///
    /// Search order:
    /// 1. `LPGM_CONFIG` environment variable
    /// 2. `./lpgm.yaml`
    /// 3. `~/.config/lpgm/config.yaml`
    /// 4. `/etc/lpgm/config.yaml`
    ///
    /// Returns default config if no file is found.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if Path::new(&path).exists() {
                return Self::load_from(Path::new(&path));
            }
            tracing::warn!("{} points to a missing file: {}", CONFIG_ENV_VAR, path);
        }

        for path in &Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./lpgm.yaml")];

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "lpgm") {
            paths.push(config_dir.config_dir().join("config.yaml"));
        }

        paths.push(PathBuf::from("/etc/lpgm/config.yaml"));

        paths
    }

    /// Sample period in seconds.
    pub fn sample_period(&self) -> f64 {
        1.0 / self.sample_rate
    }

    /// High-pass cutoff frequency in Hz.
    pub fn cutoff_hz(&self) -> f64 {
        1.0 / self.highpass.cutoff_period_s
    }

    /// Number of ticks held by the rolling window.
    pub fn window_capacity(&self) -> usize {
        (self.window.duration_s * self.sample_rate).round() as usize
    }

    /// Target periods in ascending order as configured.
    pub fn periods(&self) -> Result<Vec<f64>, ConfigError> {
        match &self.spectrum.periods {
            Some(periods) => Ok(periods.clone()),
            None => period_grid(
                self.spectrum.period_min_s,
                self.spectrum.period_max_s,
                self.spectrum.period_count,
            )
            .map_err(|e| ConfigError::ValidationError(e.to_string())),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "sample_rate must be positive, got {}",
                self.sample_rate
            )));
        }

        let damping = self.spectrum.damping;
        if !(damping.is_finite() && (0.0..1.0).contains(&damping)) {
            return Err(ConfigError::ValidationError(format!(
                "damping must lie in [0, 1), got {}",
                damping
            )));
        }

        let periods = self.periods()?;
        if periods.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one period is required".to_string(),
            ));
        }
        if let Some(p) = periods.iter().find(|p| !(p.is_finite() && **p > 0.0)) {
            return Err(ConfigError::ValidationError(format!(
                "periods must be positive, got {}",
                p
            )));
        }

        let cutoff_period = self.highpass.cutoff_period_s;
        if !(cutoff_period.is_finite() && cutoff_period > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "cutoff_period_s must be positive, got {}",
                cutoff_period
            )));
        }
        if self.cutoff_hz() >= self.sample_rate / 2.0 {
            return Err(ConfigError::ValidationError(format!(
                "high-pass cutoff {} Hz is not below Nyquist ({} Hz)",
                self.cutoff_hz(),
                self.sample_rate / 2.0
            )));
        }

        let duration = self.window.duration_s;
        if !(duration.is_finite() && duration > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "window duration_s must be positive, got {}",
                duration
            )));
        }
        let ticks = (duration * self.sample_rate).round();
        if !ticks.is_finite() || ticks > MAX_WINDOW_CAPACITY as f64 {
            return Err(ConfigError::ValidationError(format!(
                "window of {} s at {} Hz exceeds {} samples",
                duration, self.sample_rate, MAX_WINDOW_CAPACITY
            )));
        }
        if self.window_capacity() == 0 {
            return Err(ConfigError::ValidationError(
                "window must hold at least one sample".to_string(),
            ));
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example_yaml() -> String {
        serde_yaml::to_string(&Self::default()).unwrap_or_default()
    }
}
