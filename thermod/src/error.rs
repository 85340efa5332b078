//! Error types shared across the thermostat core.

use std::io;

use thiserror::Error;

/// Errors raised while loading, validating or persisting the timetable.
#[derive(Debug, Error)]
pub enum TimetableError {
    /// The document is not parseable JSON.
    #[error("invalid JSON syntax: {0}")]
    InvalidSyntax(String),

    /// The document parses but violates the schema or a semantic rule.
    #[error("invalid timetable content: {0}")]
    InvalidContent(String),

    /// The backing file cannot be read or written.
    #[error("cannot access timetable file: {0}")]
    Io(#[from] io::Error),

    /// The timetable has no backing file to reload from or save to.
    #[error("no timetable file provided")]
    NoBackingFile,
}

impl TimetableError {
    pub(crate) fn from_json(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Io => TimetableError::Io(err.into()),
            Category::Syntax | Category::Eof => TimetableError::InvalidSyntax(err.to_string()),
            Category::Data => TimetableError::InvalidContent(err.to_string()),
        }
    }
}

/// Errors reported by a thermometer driver.
#[derive(Debug, Error)]
pub enum ThermometerError {
    #[error("the thermometer script `{script}` failed: {reason}")]
    Script { script: String, reason: String },

    #[error("cannot execute thermometer script `{script}`: {source}")]
    Spawn { script: String, source: io::Error },

    /// The driver produced something that is not a finite number.
    #[error("invalid temperature reading `{0}`")]
    InvalidReading(String),
}

/// Errors reported by an actuator driver.
#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("the {kind} script `{script}` failed: {reason}")]
    Script {
        kind: &'static str,
        script: String,
        reason: String,
    },

    #[error("cannot execute {kind} script `{script}`: {source}")]
    Spawn {
        kind: &'static str,
        script: String,
        source: io::Error,
    },

    /// The status script replied without the current on/off state.
    #[error("the status script did not report the current state")]
    MissingStatus,
}
