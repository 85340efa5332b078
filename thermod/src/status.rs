//! Operating mode, temperature scale and the publishable status snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Temperature scale of every value exchanged with the core.
///
/// Drivers reporting a different native scale are wrapped in a
/// [`ScaleAdapter`](crate::thermometer::ScaleAdapter) at the thermometer
/// boundary, so the decision engine never converts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureScale {
    #[default]
    Celsius,
    Fahrenheit,
}

/// Operating mode of the thermostat.
///
/// In `auto` the weekly schedule picks the target for the current slot, in
/// `on`/`off` the actuator is forced regardless of temperature, and in the
/// alias modes the corresponding setpoint is used for every slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Auto,
    On,
    Off,
    Tmax,
    Tmin,
    T0,
}

impl Mode {
    /// True when the decision follows a target temperature instead of being
    /// forced by the mode itself.
    pub fn is_target_driven(self) -> bool {
        !matches!(self, Mode::On | Mode::Off)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Auto => "auto",
            Mode::On => "on",
            Mode::Off => "off",
            Mode::Tmax => "tmax",
            Mode::Tmin => "tmin",
            Mode::T0 => "t0",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the whole thermostat state, published to monitors after every
/// control-cycle iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermodStatus {
    /// POSIX timestamp of the iteration that produced this snapshot.
    pub timestamp: i64,
    pub mode: Mode,
    pub current_temperature: Option<f64>,
    pub target_temperature: Option<f64>,
    /// 1 when the active actuator is energised, 0 otherwise.
    pub heating_status: u8,
    pub error: Option<String>,
}

impl ThermodStatus {
    /// Snapshot describing a failed iteration.
    pub fn with_error(
        timestamp: i64,
        mode: Mode,
        heating_status: u8,
        error: impl Into<String>,
    ) -> Self {
        ThermodStatus {
            timestamp,
            mode,
            current_temperature: None,
            target_temperature: None,
            heating_status,
            error: Some(error.into()),
        }
    }
}

/// Outcome of one evaluation of the decision function: the wanted actuator
/// state plus the status snapshot describing how it was reached.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub heat: bool,
    pub status: ThermodStatus,
}

impl From<&Decision> for bool {
    fn from(decision: &Decision) -> bool {
        decision.heat
    }
}
