//! POSIX signal handling.
//!
//! Signals never touch the shared state directly from a handler: they are
//! received on the event loop and serialized through the master lock, so
//! they cannot race with an in-flight control-cycle iteration.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use crate::exit::ExitCode;
use crate::logging;
use crate::state::Shared;

/// Spawns the signal listener task.
///
/// SIGINT/SIGTERM request a graceful shutdown, SIGHUP reloads the timetable
/// from disk, SIGUSR1 toggles debug logging.
pub fn spawn(shared: Arc<Shared>) -> anyhow::Result<()> {
    let mut interrupt = signal(SignalKind::interrupt()).context("cannot listen for SIGINT")?;
    let mut terminate = signal(SignalKind::terminate()).context("cannot listen for SIGTERM")?;
    let mut hangup = signal(SignalKind::hangup()).context("cannot listen for SIGHUP")?;
    let mut user1 = signal(SignalKind::user_defined1()).context("cannot listen for SIGUSR1")?;

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = interrupt.recv() => shutdown(&shared, ExitCode::KeyboardInterrupt).await,
                _ = terminate.recv() => shutdown(&shared, ExitCode::Ok).await,
                _ = hangup.recv() => reload(&shared).await,
                _ = user1.recv() => {
                    let debug_enabled = logging::toggle_debug();
                    info!("debug logging {}", if debug_enabled { "enabled" } else { "disabled" });
                }
            }
        }
    });

    Ok(())
}

async fn shutdown(shared: &Shared, exit_code: ExitCode) {
    info!("shutdown requested");
    {
        let mut daemon = shared.daemon.lock().await;
        daemon.enabled = false;
        daemon.exit_code = exit_code;
    }
    shared.wakeup.notify_one();
}

async fn reload(shared: &Shared) {
    info!("timetable reload requested");
    {
        let mut daemon = shared.daemon.lock().await;
        match daemon.timetable.reload() {
            Ok(()) => info!("timetable reloaded"),
            Err(err) => error!("cannot reload timetable, keeping current settings: {err}"),
        }
    }
    shared.wakeup.notify_one();
}
