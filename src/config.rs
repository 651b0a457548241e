use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::error::{HarnessError, Result};
use crate::core::pipeline::queue::BackpressurePolicy;

const DEFAULT_TIMEOUT: u32 = 100;
const MIN_RESET_CYCLES: u32 = 5;

const DIV_LATENCY: u64 = 4;
const DIV_CAPACITY: usize = 4;
const FPU_LATENCY: u64 = 3;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HarnessConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub handshake: HandshakeConfig,
    #[serde(default)]
    pub divider: DividerConfig,
    #[serde(default)]
    pub fpu: FpuConfig,
}

impl HarnessConfig {
    /// Parses a TOML document and validates it.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: HarnessConfig =
            toml::from_str(s).map_err(|e| HarnessError::ConfigLoad(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| HarnessError::ConfigLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Rejects values the driver or the models cannot honour.
    pub fn validate(&self) -> Result<()> {
        let hs = &self.handshake;
        if hs.reset_cycles < MIN_RESET_CYCLES {
            return Err(HarnessError::Configuration(format!(
                "reset_cycles must be at least {}, got {}",
                MIN_RESET_CYCLES, hs.reset_cycles
            )));
        }
        if hs.input_timeout == 0 || hs.output_timeout == 0 {
            return Err(HarnessError::Configuration(
                "handshake timeouts must be non-zero".to_string(),
            ));
        }
        let div = &self.divider;
        if div.capacity == 0 {
            return Err(HarnessError::Configuration(
                "divider.capacity must be non-zero".to_string(),
            ));
        }
        if div.latency == 0 || self.fpu.latency == 0 {
            return Err(HarnessError::Configuration(
                "unit latencies must be non-zero".to_string(),
            ));
        }
        if let BackpressurePolicy::EveryNth { period: 0 } = div.backpressure {
            return Err(HarnessError::Configuration(
                "divider.backpressure period must be non-zero".to_string(),
            ));
        }
        if self.fpu.latency > hs.output_timeout as u64 {
            return Err(HarnessError::Configuration(format!(
                "fpu.latency {} exceeds output_timeout {}",
                self.fpu.latency, hs.output_timeout
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct GeneralConfig {
    /// Emit a trace event on every clock step.
    #[serde(default)]
    pub trace: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HandshakeConfig {
    #[serde(default = "default_timeout")]
    pub input_timeout: u32,

    #[serde(default = "default_timeout")]
    pub output_timeout: u32,

    #[serde(default = "default_reset_cycles")]
    pub reset_cycles: u32,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            input_timeout: DEFAULT_TIMEOUT,
            output_timeout: DEFAULT_TIMEOUT,
            reset_cycles: MIN_RESET_CYCLES,
        }
    }
}

/// Behavioural divider model parameters.
#[derive(Debug, Deserialize, Clone)]
pub struct DividerConfig {
    /// Cycles between input and output handshake.
    #[serde(default = "default_div_latency")]
    pub latency: u64,

    /// Operations the divider holds before input ready drops.
    #[serde(default = "default_div_capacity")]
    pub capacity: usize,

    #[serde(default)]
    pub backpressure: BackpressurePolicy,
}

impl Default for DividerConfig {
    fn default() -> Self {
        Self {
            latency: DIV_LATENCY,
            capacity: DIV_CAPACITY,
            backpressure: BackpressurePolicy::None,
        }
    }
}

/// FP adder / FMA parameters. The same latency drives the model and the
/// driver's sampling point.
#[derive(Debug, Deserialize, Clone)]
pub struct FpuConfig {
    #[serde(default = "default_fpu_latency")]
    pub latency: u64,
}

impl Default for FpuConfig {
    fn default() -> Self {
        Self {
            latency: FPU_LATENCY,
        }
    }
}

fn default_timeout() -> u32 {
    DEFAULT_TIMEOUT
}

fn default_reset_cycles() -> u32 {
    MIN_RESET_CYCLES
}

fn default_div_latency() -> u64 {
    DIV_LATENCY
}

fn default_div_capacity() -> usize {
    DIV_CAPACITY
}

fn default_fpu_latency() -> u64 {
    FPU_LATENCY
}
