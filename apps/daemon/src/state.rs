//! Shared state of the daemon: everything the master lock protects plus the
//! wake-up and status fan-out channels.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex, Notify};

use thermod::{Actuator, Thermometer, ThermodStatus, TimeTable};

use crate::exit::ExitCode;

/// State guarded by the master lock.
///
/// The control cycle holds the lock for evaluation, actuation and
/// publication; mutating socket handlers hold it for their transaction.
pub struct Daemon {
    pub timetable: TimeTable,
    pub heating: Arc<dyn Actuator>,
    pub cooling: Arc<dyn Actuator>,
    pub thermometer: Arc<dyn Thermometer>,
    /// Cleared under the lock to request the control cycle to exit.
    pub enabled: bool,
    /// Return code the process should exit with, set by whoever requested
    /// the shutdown.
    pub exit_code: ExitCode,
    /// Last snapshot published to monitors, kept for `GET /status`.
    pub last_status: ThermodStatus,
}

/// Handle shared between the control cycle, the socket handlers and the
/// signal task.
pub struct Shared {
    pub daemon: Mutex<Daemon>,
    /// Notify half of the master condition: a settings change or a signal
    /// wakes the control cycle for immediate re-evaluation.
    pub wakeup: Notify,
    /// Latest-value-only status fan-out; monitors await the next send.
    pub status: watch::Sender<ThermodStatus>,
    pub interval: Duration,
    pub sleep_on_error: Duration,
}

impl Shared {
    pub fn new(daemon: Daemon, interval: Duration, sleep_on_error: Duration) -> Arc<Shared> {
        let (status, _) = watch::channel(daemon.last_status.clone());
        Arc::new(Shared {
            daemon: Mutex::new(daemon),
            wakeup: Notify::new(),
            status,
            interval,
            sleep_on_error,
        })
    }
}
