//! Stable process exit codes of the daemon.
//!
//! The numbering is part of the external contract with init scripts and
//! monitoring, so values must never be reused for a different meaning.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Ok = 0,
    DaemonDisabled = 6,

    // configuration file
    ConfigFileMissing = 10,
    ConfigFileSyntax = 11,
    ConfigFileInvalid = 12,
    ConfigFileUnknown = 13,

    // timetable file
    TimetableNotFound = 20,
    TimetableRead = 21,
    TimetableSyntax = 22,
    TimetableContent = 23,
    TimetableOther = 24,

    // subsystem initialization
    HeatingInit = 25,
    CoolingInit = 26,
    ThermometerInit = 27,
    InitOther = 29,

    // control socket
    SocketPort = 30,
    SocketStart = 31,
    SocketStop = 32,

    // runtime
    RunInvalidState = 50,
    RunHeating = 52,
    RunOther = 59,

    // shutdown
    ShutdownSwitchOff = 60,
    ShutdownOther = 69,

    KeyboardInterrupt = 130,
}

impl ExitCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code.code())
    }
}
