//! Actuator capability: two idempotent switch operations and a state query.
//!
//! Heating and cooling use separate instances of the same capability; when
//! they share a relay the daemon simply clones the `Arc` of the heating
//! instance.

use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;
use tracing::debug;

use crate::error::ActuatorError;

pub trait Actuator: Send + Sync {
    fn switch_on(&self) -> Result<(), ActuatorError>;

    fn switch_off(&self) -> Result<(), ActuatorError>;

    fn is_on(&self) -> Result<bool, ActuatorError>;
}

/// Reply every actuator script prints on stdout.
#[derive(Debug, Deserialize)]
struct ScriptReply {
    success: bool,
    #[serde(default)]
    status: Option<u8>,
    #[serde(default)]
    error: Option<String>,
}

/// Drives a relay through three external commands: switch-on, switch-off and
/// status. The commands exit 0 on success and report `{"success": bool,
/// "status": 0|1, "error": string|null}` on stdout.
pub struct ScriptActuator {
    switchon: String,
    switchoff: String,
    status: String,
}

impl ScriptActuator {
    pub fn new(
        switchon: impl Into<String>,
        switchoff: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        let actuator = ScriptActuator {
            switchon: switchon.into(),
            switchoff: switchoff.into(),
            status: status.into(),
        };
        debug!(
            on = %actuator.switchon,
            off = %actuator.switchoff,
            status = %actuator.status,
            "initializing script actuator"
        );
        actuator
    }

    fn run(&self, kind: &'static str, script: &str) -> Result<ScriptReply, ActuatorError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(script)
            .output()
            .map_err(|source| ActuatorError::Spawn {
                kind,
                script: script.to_string(),
                source,
            })?;

        let reply: ScriptReply =
            serde_json::from_slice(&output.stdout).unwrap_or_else(|_| ScriptReply {
                success: output.status.success(),
                status: None,
                error: (!output.status.success())
                    .then(|| format!("the script exited with {}", output.status)),
            });

        if !output.status.success() || !reply.success {
            let reason = reply
                .error
                .unwrap_or_else(|| format!("the script exited with {}", output.status));
            return Err(ActuatorError::Script {
                kind,
                script: script.to_string(),
                reason,
            });
        }

        Ok(reply)
    }
}

impl Actuator for ScriptActuator {
    fn switch_on(&self) -> Result<(), ActuatorError> {
        debug!("switching on");
        self.run("switch-on", &self.switchon).map(|_| ())
    }

    fn switch_off(&self) -> Result<(), ActuatorError> {
        debug!("switching off");
        self.run("switch-off", &self.switchoff).map(|_| ())
    }

    fn is_on(&self) -> Result<bool, ActuatorError> {
        let reply = self.run("status", &self.status)?;
        match reply.status {
            Some(status) => Ok(status != 0),
            None => Err(ActuatorError::MissingStatus),
        }
    }
}

/// In-memory actuator for tests and dry runs.
#[derive(Debug, Default)]
pub struct FakeActuator {
    on: AtomicBool,
}

impl FakeActuator {
    pub fn new() -> Self {
        FakeActuator::default()
    }

    pub fn set(&self, on: bool) {
        self.on.store(on, Ordering::SeqCst);
    }
}

impl Actuator for FakeActuator {
    fn switch_on(&self) -> Result<(), ActuatorError> {
        self.on.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn switch_off(&self) -> Result<(), ActuatorError> {
        self.on.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_on(&self) -> Result<bool, ActuatorError> {
        Ok(self.on.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_actuator_switches() {
        let actuator = FakeActuator::new();
        assert!(!actuator.is_on().unwrap());

        actuator.switch_on().unwrap();
        assert!(actuator.is_on().unwrap());

        actuator.switch_off().unwrap();
        assert!(!actuator.is_on().unwrap());
    }

    #[test]
    fn script_actuator_reads_the_status_reply() {
        let actuator = ScriptActuator::new(
            r#"echo '{"success": true}'"#,
            r#"echo '{"success": true}'"#,
            r#"echo '{"success": true, "status": 1}'"#,
        );

        actuator.switch_on().unwrap();
        assert!(actuator.is_on().unwrap());
    }

    #[test]
    fn script_error_reply_is_surfaced() {
        let actuator = ScriptActuator::new(
            r#"echo '{"success": false, "error": "relay stuck"}'; exit 1"#,
            "true",
            "true",
        );

        let err = actuator.switch_on().unwrap_err();
        assert!(err.to_string().contains("relay stuck"));
    }

    #[test]
    fn status_reply_without_state_is_an_error() {
        let actuator = ScriptActuator::new("true", "true", r#"echo '{"success": true}'"#);
        assert!(matches!(
            actuator.is_on(),
            Err(ActuatorError::MissingStatus)
        ));
    }
}
