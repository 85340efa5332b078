//! Thermod daemon entry point: configuration, subsystem initialization,
//! control socket and the control cycle.

mod config;
mod cycle;
mod exit;
mod logging;
mod signals;
mod socket;
mod state;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, error, info};

use thermod::{
    Actuator, Clock, FakeActuator, FakeThermometer, ScaleAdapter, ScriptActuator,
    ScriptThermometer, SystemClock, Thermometer, ThermodStatus, TimeTable, TimetableError,
};

use crate::config::{ActuatorSection, Config, CoolingSection, ThermometerSection};
use crate::exit::ExitCode;
use crate::state::{Daemon, Shared};

#[derive(Debug, Parser)]
#[command(name = "thermod", about = "programmable thermostat daemon", version)]
struct Args {
    /// Path to the main configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start the daemon in debug mode.
    #[arg(short = 'D', long)]
    debug: bool,

    /// Write messages to this log file instead of the console.
    #[arg(short = 'L', long)]
    log: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> process::ExitCode {
    let args = Args::parse();

    if let Err(err) = logging::init(args.debug, args.log.as_deref()) {
        eprintln!("cannot initialize logging: {err:#}");
        return ExitCode::InitOther.into();
    }

    run(args).await.into()
}

async fn run(args: Args) -> ExitCode {
    let config = match Config::read(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return err.exit_code();
        }
    };

    if !config.daemon.enabled {
        info!("daemon disabled in configuration file, exiting");
        return ExitCode::DaemonDisabled;
    }

    if config.daemon.debug && !args.debug {
        logging::set_debug(true);
    }
    debug!("main configuration read");

    // The timetable is loaded first because its scale drives the
    // thermometer adapter.
    let timetable = match TimeTable::load(&config.daemon.timetable) {
        Ok(timetable) => timetable,
        Err(err) => {
            error!(
                "cannot load timetable file `{}`: {err}",
                config.daemon.timetable.display()
            );
            return timetable_exit_code(&err);
        }
    };

    let heating: Arc<dyn Actuator> = match &config.heating {
        ActuatorSection::Scripts {
            switchon,
            switchoff,
            status,
        } => Arc::new(ScriptActuator::new(
            switchon.clone(),
            switchoff.clone(),
            status.clone(),
        )),
        ActuatorSection::Fake => Arc::new(FakeActuator::new()),
    };
    if let Err(err) = heating.is_on() {
        error!("cannot initialize the heating: {err}");
        return ExitCode::HeatingInit;
    }

    let cooling: Arc<dyn Actuator> = match &config.cooling {
        CoolingSection::Heating => heating.clone(),
        CoolingSection::Scripts {
            switchon,
            switchoff,
            status,
        } => Arc::new(ScriptActuator::new(
            switchon.clone(),
            switchoff.clone(),
            status.clone(),
        )),
        CoolingSection::Fake => Arc::new(FakeActuator::new()),
    };
    if let Err(err) = cooling.is_on() {
        error!("cannot initialize the cooling: {err}");
        return ExitCode::CoolingInit;
    }

    let thermometer: Arc<dyn Thermometer> = match &config.thermometer {
        ThermometerSection::Script { script, scale } => {
            let raw = Arc::new(ScriptThermometer::new(
                script.clone(),
                (*scale).unwrap_or(timetable.scale()),
            ));
            ScaleAdapter::wrap(raw, timetable.scale())
        }
        ThermometerSection::Fake { temperature } => Arc::new(FakeThermometer::new(
            *temperature,
            timetable.scale(),
        )),
    };
    if let Err(err) = thermometer.temperature() {
        error!("cannot initialize the thermometer: {err}");
        return ExitCode::ThermometerInit;
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let now = clock.now();
    let heating_is_on = heating.is_on().unwrap_or(false);
    info!(
        "the heating is currently {}",
        if heating_is_on { "ON" } else { "OFF" }
    );

    let daemon = Daemon {
        last_status: ThermodStatus {
            timestamp: now.timestamp(),
            mode: timetable.mode(),
            current_temperature: None,
            target_temperature: None,
            heating_status: heating_is_on as u8,
            error: None,
        },
        timetable,
        heating,
        cooling,
        thermometer,
        enabled: true,
        exit_code: ExitCode::Ok,
    };
    let shared = Shared::new(daemon, config.interval(), config.sleep_on_error());

    let listener = match tokio::net::TcpListener::bind((
        config.socket.host.as_str(),
        config.socket.port,
    ))
    .await
    {
        Ok(listener) => listener,
        Err(err) => {
            error!(
                "cannot start control socket on {}:{}: {err}",
                config.socket.host, config.socket.port
            );
            return ExitCode::SocketStart;
        }
    };
    info!(
        "control socket listening on {}:{}",
        config.socket.host, config.socket.port
    );

    let (stop_socket, stopped) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(socket::serve(listener, shared.clone(), async {
        let _ = stopped.await;
    }));

    if let Err(err) = signals::spawn(shared.clone()) {
        error!("cannot install signal handlers: {err:#}");
        return ExitCode::InitOther;
    }

    info!("daemon started");
    cycle::run(shared.clone(), clock).await;

    // The cycle has exited: stop accepting connections and drain the socket.
    let _ = stop_socket.send(());
    let mut code = shared.daemon.lock().await.exit_code;
    match server.await {
        Ok(Ok(())) => info!("control socket halted"),
        Ok(Err(err)) => {
            error!("error stopping control socket: {err}");
            if code == ExitCode::Ok {
                code = ExitCode::SocketStop;
            }
        }
        Err(err) => {
            error!("control socket task failed: {err}");
            if code == ExitCode::Ok {
                code = ExitCode::ShutdownOther;
            }
        }
    }

    info!("daemon stopped with return code {}", code.code());
    code
}

fn timetable_exit_code(err: &TimetableError) -> ExitCode {
    match err {
        TimetableError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => ExitCode::TimetableNotFound,
            std::io::ErrorKind::PermissionDenied => ExitCode::TimetableRead,
            _ => ExitCode::TimetableOther,
        },
        TimetableError::InvalidSyntax(_) => ExitCode::TimetableSyntax,
        TimetableError::InvalidContent(_) => ExitCode::TimetableContent,
        TimetableError::NoBackingFile => ExitCode::TimetableOther,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timetable_errors_map_to_stable_codes() {
        let not_found = TimetableError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(timetable_exit_code(&not_found), ExitCode::TimetableNotFound);

        let syntax = TimetableError::InvalidSyntax("oops".to_string());
        assert_eq!(timetable_exit_code(&syntax), ExitCode::TimetableSyntax);

        let content = TimetableError::InvalidContent("bad".to_string());
        assert_eq!(timetable_exit_code(&content), ExitCode::TimetableContent);
    }

    #[test]
    fn exit_codes_are_stable() {
        assert_eq!(ExitCode::Ok.code(), 0);
        assert_eq!(ExitCode::ConfigFileMissing.code(), 10);
        assert_eq!(ExitCode::TimetableNotFound.code(), 20);
        assert_eq!(ExitCode::HeatingInit.code(), 25);
        assert_eq!(ExitCode::SocketStart.code(), 31);
        assert_eq!(ExitCode::KeyboardInterrupt.code(), 130);
    }
}
