//! Thermometer capability with script-backed and in-memory drivers.

use std::process::Command;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::ThermometerError;
use crate::status::TemperatureScale;

pub fn celsius_to_fahrenheit(value: f64) -> f64 {
    1.8 * value + 32.0
}

pub fn fahrenheit_to_celsius(value: f64) -> f64 {
    (value - 32.0) / 1.8
}

/// A thermometer reports the current temperature in its native scale.
pub trait Thermometer: Send + Sync {
    fn temperature(&self) -> Result<f64, ThermometerError>;

    fn scale(&self) -> TemperatureScale;
}

/// Runs an external command and parses a bare float from its stdout.
pub struct ScriptThermometer {
    script: String,
    scale: TemperatureScale,
}

impl ScriptThermometer {
    pub fn new(script: impl Into<String>, scale: TemperatureScale) -> Self {
        let script = script.into();
        debug!(script = %script, "initializing script thermometer");
        ScriptThermometer { script, scale }
    }
}

impl Thermometer for ScriptThermometer {
    fn temperature(&self) -> Result<f64, ThermometerError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.script)
            .output()
            .map_err(|source| ThermometerError::Spawn {
                script: self.script.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                format!("the script exited with {}", output.status)
            } else {
                stderr
            };
            return Err(ThermometerError::Script {
                script: self.script.clone(),
                reason,
            });
        }

        let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let value: f64 = raw
            .parse()
            .map_err(|_| ThermometerError::InvalidReading(raw.clone()))?;
        if !value.is_finite() {
            return Err(ThermometerError::InvalidReading(raw));
        }

        debug!(temperature = value, "current temperature read");
        Ok(value)
    }

    fn scale(&self) -> TemperatureScale {
        self.scale
    }
}

/// In-memory thermometer for tests and dry runs.
pub struct FakeThermometer {
    temperature: Mutex<f64>,
    scale: TemperatureScale,
}

impl FakeThermometer {
    pub fn new(temperature: f64, scale: TemperatureScale) -> Self {
        FakeThermometer {
            temperature: Mutex::new(temperature),
            scale,
        }
    }

    pub fn set(&self, temperature: f64) {
        *self.temperature.lock().expect("thermometer lock poisoned") = temperature;
    }
}

impl Thermometer for FakeThermometer {
    fn temperature(&self) -> Result<f64, ThermometerError> {
        Ok(*self.temperature.lock().expect("thermometer lock poisoned"))
    }

    fn scale(&self) -> TemperatureScale {
        self.scale
    }
}

/// Decorator converting another thermometer's readings into the wanted
/// scale, so the rest of the daemon only ever sees the configured one.
pub struct ScaleAdapter {
    inner: Arc<dyn Thermometer>,
    scale: TemperatureScale,
}

impl ScaleAdapter {
    /// Returns the inner thermometer untouched when no conversion is needed.
    pub fn wrap(inner: Arc<dyn Thermometer>, scale: TemperatureScale) -> Arc<dyn Thermometer> {
        if inner.scale() == scale {
            inner
        } else {
            Arc::new(ScaleAdapter { inner, scale })
        }
    }
}

impl Thermometer for ScaleAdapter {
    fn temperature(&self) -> Result<f64, ThermometerError> {
        let raw = self.inner.temperature()?;
        Ok(match (self.inner.scale(), self.scale) {
            (TemperatureScale::Celsius, TemperatureScale::Fahrenheit) => {
                celsius_to_fahrenheit(raw)
            }
            (TemperatureScale::Fahrenheit, TemperatureScale::Celsius) => {
                fahrenheit_to_celsius(raw)
            }
            _ => raw,
        })
    }

    fn scale(&self) -> TemperatureScale {
        self.scale
    }
}
