//! Unified error types for the ColdBox firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! top-level control loop's error handling uniform. All variants are `Copy`
//! so they can be cheaply passed through the control cycle and event sink
//! without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned out-of-range data.
    Sensor(SensorError),
    /// An actuator command failed or was refused.
    Actuator(ActuatorError),
    /// Configuration is invalid or a setpoint/preset was rejected.
    Config(ConfigError),
    /// Unrecoverable startup/shutdown failure.
    Fatal(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Fatal(msg) => write!(f, "fatal: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// A failed compartment sensor read. The control loop skips the cycle and
/// counts the failure toward the sensor-timeout budget; it never invents a
/// reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Bus read returned an error or timed out.
    ReadFailed,
    /// Frame arrived but failed CRC validation.
    CrcMismatch,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed => write!(f, "read failed"),
            Self::CrcMismatch => write!(f, "CRC mismatch"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

/// Why an actuator command did not take effect.
///
/// `CycleTimeGate` and `WaterLevelLow` are interlocks: logged, not
/// escalated, the prior state simply persists. `WriteFailed` marks the
/// actuator FAULT and excludes it from auto-commands until reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// Minimum cycle time between state changes has not elapsed.
    CycleTimeGate,
    /// Pump refused: water reservoir level is low.
    WaterLevelLow,
    /// Actuator is in FAULT and excluded from commands.
    Faulted,
    /// Physical output write failed.
    WriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CycleTimeGate => write!(f, "minimum cycle time not met"),
            Self::WaterLevelLow => write!(f, "water level low"),
            Self::Faulted => write!(f, "actuator faulted"),
            Self::WriteFailed => write!(f, "output write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Rejected at the call site; state is never mutated on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `load_preset` was given a name with no preset entry.
    UnknownPreset,
    /// A setpoint is NaN or outside the physical range.
    InvalidSetpoint,
    /// A config field failed range validation at startup.
    /// The `&'static str` describes which field and why.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPreset => write!(f, "unknown preset"),
            Self::InvalidSetpoint => write!(f, "invalid setpoint"),
            Self::Invalid(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
