// src/config.rs
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Fixed per-session constants of the sampler. Never negotiated over the wire.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Length of one recording session.
    pub duration_ms: u32,
    /// Minimum spacing between two emitted rows.
    pub sample_interval_ms: u32,
    pub full_scale_voltage: f32,
    /// Largest raw converter reading (10-bit converter -> 1023).
    pub max_raw_value: u16,
    pub baud_rate: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            duration_ms: 5000,
            sample_interval_ms: 2,
            full_scale_voltage: 5.0,
            max_raw_value: 1023,
            baud_rate: 115_200,
        }
    }
}

impl DeviceConfig {
    pub fn volts_per_count(&self) -> f32 {
        self.full_scale_voltage / self.max_raw_value as f32
    }
}

/// Low-pass parameters used by the host pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub cutoff_hz: f64,
    /// Butterworth order (number of poles).
    pub order: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            cutoff_hz: 5.0,
            order: 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// How long to wait for the ready banner after opening the port.
    pub ready_timeout_secs: u64,
    /// Upper bound on one capture. Must exceed the device session duration.
    pub capture_timeout_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            ready_timeout_secs: 10,
            capture_timeout_secs: 15,
            poll_interval_ms: 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaqConfig {
    pub device: DeviceConfig,
    pub filter: FilterConfig,
    pub host: HostConfig,
}

impl DaqConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads `path` when given, otherwise the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_json_file(p),
            None => Ok(Self::default()),
        }
    }
}
