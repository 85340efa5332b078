//! The control cycle: periodically reconcile the actuator with the decision
//! of the timetable and publish the resulting status snapshot.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{debug, error, info};

use thermod::{Clock, ThermodStatus};

use crate::exit::ExitCode;
use crate::state::{Daemon, Shared};

/// Runs the cycle until `enabled` is cleared, then switches the actuator off
/// and hands monitors a terminal status.
///
/// Known failures (thermometer, actuator, runtime-invalid schedule) are
/// reported and the cycle keeps going; an unknown panic inside an iteration
/// is logged as critical and initiates shutdown with a stable exit code.
pub async fn run(shared: Arc<Shared>, clock: Arc<dyn Clock>) {
    info!("control cycle started");
    let mut woken_by_notify = false;

    loop {
        let sleep = {
            let mut daemon = shared.daemon.lock().await;
            if !daemon.enabled {
                break;
            }
            match iteration(&mut daemon, &shared, woken_by_notify, clock.now()) {
                Ok(sleep) => sleep,
                Err(code) => {
                    daemon.enabled = false;
                    if daemon.exit_code == ExitCode::Ok {
                        daemon.exit_code = code;
                    }
                    break;
                }
            }
        };

        // The lock is released while waiting; a notify on the master
        // condition wakes the cycle early for immediate re-evaluation.
        woken_by_notify = tokio::select! {
            _ = shared.wakeup.notified() => true,
            _ = tokio::time::sleep(sleep) => false,
        };
    }

    shutdown(&shared, clock.now()).await;
    info!("control cycle stopped");
}

/// One evaluation under the master lock. Returns how long to wait before the
/// next iteration, or the exit code to shut down with after an unknown
/// panic.
pub(crate) fn iteration(
    daemon: &mut Daemon,
    shared: &Shared,
    woken_by_notify: bool,
    now: DateTime<Local>,
) -> Result<Duration, ExitCode> {
    let cooling = daemon.timetable.cooling();
    let actuator = if cooling {
        daemon.cooling.clone()
    } else {
        daemon.heating.clone()
    };
    let device = if cooling { "cooling" } else { "heating" };
    let mode = daemon.timetable.mode();
    let thermometer = daemon.thermometer.clone();

    let current = match catching(ExitCode::RunOther, || thermometer.temperature())? {
        Ok(current) => current,
        Err(err) => {
            error!("error from thermometer: {err}");
            let heating_status = actuator.is_on().map(|on| on as u8).unwrap_or(0);
            publish(
                daemon,
                shared,
                ThermodStatus::with_error(now.timestamp(), mode, heating_status, err.to_string()),
            );
            return Ok(shared.sleep_on_error);
        }
    };

    let is_on = match catching(ExitCode::RunHeating, || actuator.is_on())? {
        Ok(is_on) => is_on,
        Err(err) => {
            error!("error from {device}: {err}");
            publish(
                daemon,
                shared,
                ThermodStatus::with_error(now.timestamp(), mode, 0, err.to_string()),
            );
            return Ok(shared.sleep_on_error);
        }
    };

    let decision = catching(ExitCode::RunInvalidState, || {
        daemon.timetable.should_the_heating_be_on(current, is_on, now)
    })?;
    if let Some(err) = &decision.status.error {
        error!("invalid schedule at runtime: {err}");
    }

    let heat = bool::from(&decision);
    let mut status = decision.status;
    let mut sleep = shared.interval;

    if heat == is_on {
        let state = if is_on { "ON" } else { "OFF" };
        if woken_by_notify {
            info!("the {device} is already {state} (temperature {current:.2})");
        } else {
            debug!("the {device} is already {state} (temperature {current:.2})");
        }
    } else if heat {
        match catching(ExitCode::RunHeating, || actuator.switch_on())? {
            Ok(()) => {
                daemon.timetable.note_switch_on();
                info!("{device} switched ON (temperature {current:.2})");
            }
            Err(err) => {
                error!("cannot switch on the {device}: {err}");
                status.error = Some(err.to_string());
                sleep = shared.sleep_on_error;
            }
        }
    } else {
        match catching(ExitCode::RunHeating, || actuator.switch_off())? {
            Ok(()) => {
                // Only threshold transitions start the grace period; a
                // switch-off forced by the mode must not.
                if mode.is_target_driven() {
                    daemon.timetable.note_switch_off(now);
                }
                info!("{device} switched OFF (temperature {current:.2})");
            }
            Err(err) => {
                error!("cannot switch off the {device}: {err}");
                status.error = Some(err.to_string());
                sleep = shared.sleep_on_error;
            }
        }
    }

    // The published snapshot reflects the actuator as it actually is after
    // the switch, not merely the intent.
    if let Ok(is_on) = actuator.is_on() {
        status.heating_status = is_on as u8;
    }
    publish(daemon, shared, status);
    Ok(sleep)
}

/// Runs one section of the iteration, translating a panic into the exit
/// code the daemon must stop with: the thermometer read maps to the generic
/// runtime code, the timetable decision to the invalid-state code, actuator
/// calls to the heating code.
fn catching<T>(code: ExitCode, section: impl FnOnce() -> T) -> Result<T, ExitCode> {
    std::panic::catch_unwind(AssertUnwindSafe(section)).map_err(|panic| {
        error!(
            "unknown error occurred in the control cycle: {}",
            panic_text(panic.as_ref())
        );
        code
    })
}

fn panic_text(panic: &(dyn Any + Send)) -> &str {
    if let Some(text) = panic.downcast_ref::<&str>() {
        text
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text
    } else {
        "unknown panic payload"
    }
}

fn publish(daemon: &mut Daemon, shared: &Shared, status: ThermodStatus) {
    daemon.last_status = status.clone();
    shared.status.send_replace(status);
}

/// Final actions under the lock: leave the actuator off and publish a
/// terminal status so outstanding monitor requests complete.
async fn shutdown(shared: &Shared, now: DateTime<Local>) {
    let mut daemon = shared.daemon.lock().await;

    let actuator = if daemon.timetable.cooling() {
        daemon.cooling.clone()
    } else {
        daemon.heating.clone()
    };

    match actuator.is_on() {
        Ok(true) => match actuator.switch_off() {
            Ok(()) => info!("heating switched OFF"),
            Err(err) => {
                error!("cannot switch off the heating during shutdown: {err}");
                if daemon.exit_code == ExitCode::Ok {
                    daemon.exit_code = ExitCode::ShutdownSwitchOff;
                }
            }
        },
        Ok(false) => {}
        Err(err) => {
            error!("cannot query the heating during shutdown: {err}");
            if daemon.exit_code == ExitCode::Ok {
                daemon.exit_code = ExitCode::ShutdownSwitchOff;
            }
        }
    }

    let heating_status = actuator.is_on().map(|on| on as u8).unwrap_or(0);
    let status = ThermodStatus::with_error(
        now.timestamp(),
        daemon.timetable.mode(),
        heating_status,
        "the daemon is shutting down",
    );
    daemon.last_status = status.clone();
    shared.status.send_replace(status);
}
