//! Core of the thermod programmable thermostat.
//!
//! The library holds everything the daemon needs to decide whether the
//! heating (or cooling) relay should be energised: the weekly timetable with
//! its validation and mutation protocol, the hysteresis decision function,
//! the publishable status snapshot, and the capability traits for
//! thermometers and actuators together with script-backed and in-memory
//! implementations.
//!
//! Runtime coordination (control cycle, control socket, signals) lives in
//! the `thermod-daemon` binary crate.

pub mod actuator;
pub mod clock;
pub mod error;
pub mod schedule;
pub mod status;
pub mod thermometer;
pub mod timetable;

pub use actuator::{Actuator, FakeActuator, ScriptActuator};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ActuatorError, ThermometerError, TimetableError};
pub use schedule::{Day, Hour, Schedule, SchedulePatch, Target};
pub use status::{Decision, Mode, TemperatureScale, ThermodStatus};
pub use thermometer::{FakeThermometer, ScaleAdapter, ScriptThermometer, Thermometer};
pub use timetable::{Settings, SettingsPatch, Temperatures, TemperaturesPatch, TimeTable};
