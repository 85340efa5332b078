//! Daemon configuration file (TOML).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use thermod::TemperatureScale;

use crate::exit::ExitCode;

/// Searched in order when no `--config` is given.
pub const DEFAULT_CONFIG_FILES: &[&str] = &[
    "thermod.toml",
    "/usr/local/etc/thermod/thermod.toml",
    "/etc/thermod/thermod.toml",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration file found")]
    Missing,

    #[error("invalid syntax in configuration file `{path}`: {reason}", path = .path.display())]
    Syntax { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("cannot read configuration file `{path}`: {source}", path = .path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl ConfigError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ConfigError::Missing => ExitCode::ConfigFileMissing,
            ConfigError::Syntax { .. } => ExitCode::ConfigFileSyntax,
            ConfigError::Invalid(_) => ExitCode::ConfigFileInvalid,
            ConfigError::Io { .. } => ExitCode::ConfigFileUnknown,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub daemon: DaemonSection,
    #[serde(default)]
    pub socket: SocketSection,
    pub heating: ActuatorSection,
    #[serde(default)]
    pub cooling: CoolingSection,
    pub thermometer: ThermometerSection,
}

fn default_enabled() -> bool {
    true
}

fn default_interval() -> u64 {
    30
}

fn default_sleep_on_error() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonSection {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub debug: bool,
    /// Full path to the timetable JSON file.
    pub timetable: PathBuf,
    /// Seconds between two control-cycle iterations.
    #[serde(default = "default_interval")]
    pub interval: u64,
    /// Seconds to wait before retrying after a thermometer or actuator
    /// failure.
    #[serde(default = "default_sleep_on_error")]
    pub sleep_on_error: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4344
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SocketSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for SocketSection {
    fn default() -> Self {
        SocketSection {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "manager", rename_all = "lowercase", deny_unknown_fields)]
pub enum ActuatorSection {
    Scripts {
        switchon: String,
        switchoff: String,
        status: String,
    },
    Fake,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "manager", rename_all = "lowercase", deny_unknown_fields)]
pub enum CoolingSection {
    /// Cooling shares the heating relay.
    #[default]
    Heating,
    Scripts {
        switchon: String,
        switchoff: String,
        status: String,
    },
    Fake,
}

fn default_fake_temperature() -> f64 {
    20.0
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "manager", rename_all = "lowercase", deny_unknown_fields)]
pub enum ThermometerSection {
    Script {
        script: String,
        /// Native scale of the script output when it differs from the
        /// timetable scale.
        #[serde(default)]
        scale: Option<TemperatureScale>,
    },
    Fake {
        #[serde(default = "default_fake_temperature")]
        temperature: f64,
    },
}

impl Config {
    /// Reads and validates the configuration, searching the default
    /// locations unless an explicit path is given.
    pub fn read(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => DEFAULT_CONFIG_FILES
                .iter()
                .map(PathBuf::from)
                .find(|candidate| candidate.is_file())
                .ok_or(ConfigError::Missing)?,
        };
        debug!(path = %path.display(), "reading main configuration");

        let raw = fs::read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::Missing
            } else {
                ConfigError::Io { path: path.clone(), source }
            }
        })?;

        let config: Config = toml::from_str(&raw).map_err(|err| ConfigError::Syntax {
            path,
            reason: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.daemon.interval == 0 {
            return Err(ConfigError::Invalid(
                "the interval must be at least 1 second".to_string(),
            ));
        }
        if self.daemon.sleep_on_error == 0 {
            return Err(ConfigError::Invalid(
                "sleep_on_error must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.daemon.interval)
    }

    pub fn sleep_on_error(&self) -> Duration {
        Duration::from_secs(self.daemon.sleep_on_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
        [daemon]
        timetable = "/var/lib/thermod/timetable.json"
        interval = 10

        [socket]
        port = 4345

        [heating]
        manager = "scripts"
        switchon = "/etc/thermod/switch.sh --on"
        switchoff = "/etc/thermod/switch.sh --off"
        status = "/etc/thermod/switch.sh --status"

        [thermometer]
        manager = "script"
        script = "/etc/thermod/temperature.sh"
        scale = "fahrenheit"
    "#;

    #[test]
    fn sample_config_parses() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = Config::read(Some(file.path())).unwrap();
        assert!(config.daemon.enabled);
        assert_eq!(config.daemon.interval, 10);
        assert_eq!(config.socket.port, 4345);
        assert_eq!(config.socket.host, "127.0.0.1");
        assert!(matches!(config.cooling, CoolingSection::Heating));
        assert!(matches!(
            config.thermometer,
            ThermometerSection::Script {
                scale: Some(TemperatureScale::Fahrenheit),
                ..
            }
        ));
    }

    #[test]
    fn unknown_keys_are_a_syntax_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[daemon]\ntimetable = \"/tmp/tt.json\"\nbogus = 1\n[heating]\nmanager = \"fake\"\n[thermometer]\nmanager = \"fake\"\n")
            .unwrap();

        let err = Config::read(Some(file.path())).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ConfigFileSyntax);
    }

    #[test]
    fn zero_interval_is_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[daemon]\ntimetable = \"/tmp/tt.json\"\ninterval = 0\n[heating]\nmanager = \"fake\"\n[thermometer]\nmanager = \"fake\"\n")
            .unwrap();

        let err = Config::read(Some(file.path())).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ConfigFileInvalid);
    }

    #[test]
    fn missing_explicit_file_is_reported() {
        let err = Config::read(Some(Path::new("/nonexistent/thermod.toml"))).unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ConfigFileMissing);
    }
}
