use serde_json::Value;
use thiserror::Error;

/// Errors raised while validating a device configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("all phase durations are zero; the operating cycle must be at least one second long")]
    DegenerateCycle,
}

const DEFAULT_NAME: &str = "lathe";
const DEFAULT_SPINUP_SECS: u64 = 5;
const DEFAULT_RUNTIME_SECS: u64 = 30;
const DEFAULT_SPINDOWN_SECS: u64 = 5;
const DEFAULT_IDLE_SECS: u64 = 15;
const DEFAULT_RPM: u64 = 1000;
const DEFAULT_CURRENT_MA: u64 = 1500;

/// Device configuration for one simulated lathe.
///
/// Replaced wholesale on reconfiguration, never mutated field by field.
/// Defaults: 5s spinup, 30s cutting, 5s spindown, 15s idle, 1000 rpm,
/// 1500 mA.
#[derive(Debug, Clone, PartialEq)]
pub struct LatheConfig {
    /// Asset name stem; the current, vibration and infrared groups append
    /// `Current`, `Vibration` and `IR` suffixes to it.
    pub name: String,
    pub spinup_secs: u64,
    pub runtime_secs: u64,
    pub spindown_secs: u64,
    pub idle_secs: u64,
    /// Nominal cutting speed.
    pub rpm: u32,
    /// Nominal cutting current draw in milliamps.
    pub current_ma: u32,
}

impl Default for LatheConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            spinup_secs: DEFAULT_SPINUP_SECS,
            runtime_secs: DEFAULT_RUNTIME_SECS,
            spindown_secs: DEFAULT_SPINDOWN_SECS,
            idle_secs: DEFAULT_IDLE_SECS,
            rpm: DEFAULT_RPM as u32,
            current_ma: DEFAULT_CURRENT_MA as u32,
        }
    }
}

impl LatheConfig {
    /// Build a configuration from a JSON category document.
    ///
    /// Parsing is permissive: items may be JSON numbers or numeric strings,
    /// an item that fails to parse falls back to its default with a warning,
    /// and unknown items are ignored. Only an all-zero cycle is rejected.
    pub fn from_value(doc: &Value) -> Result<Self, ConfigError> {
        let mut config = LatheConfig::default();
        if let Some(name) = doc.get("name").and_then(Value::as_str) {
            config.name = name.to_string();
        }
        config.spinup_secs = numeric_item(doc, "spinup", DEFAULT_SPINUP_SECS);
        config.runtime_secs = numeric_item(doc, "runtime", DEFAULT_RUNTIME_SECS);
        config.spindown_secs = numeric_item(doc, "spindown", DEFAULT_SPINDOWN_SECS);
        config.idle_secs = numeric_item(doc, "idletime", DEFAULT_IDLE_SECS);
        config.rpm = numeric_item(doc, "rpm", DEFAULT_RPM) as u32;
        config.current_ma = numeric_item(doc, "current", DEFAULT_CURRENT_MA) as u32;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the cycle clock cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle_secs() == 0 {
            return Err(ConfigError::DegenerateCycle);
        }
        Ok(())
    }

    pub fn cycle_secs(&self) -> u64 {
        self.spinup_secs + self.runtime_secs + self.spindown_secs + self.idle_secs
    }

    pub fn cycle_ms(&self) -> u64 {
        self.cycle_secs() * 1000
    }

    /// Cycle offset at which SpinningUp hands over to Cutting.
    pub fn spinup_end_ms(&self) -> u64 {
        self.spinup_secs * 1000
    }

    /// Cycle offset at which Cutting hands over to SpinningDown.
    pub fn cutting_end_ms(&self) -> u64 {
        (self.spinup_secs + self.runtime_secs) * 1000
    }

    /// Cycle offset at which SpinningDown hands over to Idle.
    pub fn spindown_end_ms(&self) -> u64 {
        (self.spinup_secs + self.runtime_secs + self.spindown_secs) * 1000
    }
}

fn numeric_item(doc: &Value, name: &str, default: u64) -> u64 {
    let Some(item) = doc.get(name) else {
        return default;
    };
    let parsed = match item {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match parsed {
        Some(value) => value,
        None => {
            log::warn!(
                "configuration item '{}' is not a non-negative integer ({}), using default {}",
                name,
                item,
                default
            );
            default
        }
    }
}
