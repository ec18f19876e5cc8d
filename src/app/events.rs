//! Structured events emitted by the control cycle.
//!
//! Events are the observable record of what the service did and why. They
//! flow out through the [`EventSink`](super::ports::EventSink) port; the
//! default binary sink just logs them, tests assert on them.

use std::time::Duration;

use crate::actuators::bank::BankStatus;
use crate::actuators::OutputId;
use crate::engine::decision::{ActuatorTargets, CoolingMode};
use crate::error::SensorError;

use super::ports::ClimateReading;

/// Why the service latched an emergency shutdown. An emergency-mode
/// *decision* is not a shutdown; it runs maximum cooling through the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmergencyReason {
    /// No good sensor reading within the configured timeout.
    SensorTimeout,
    /// Operator-commanded shutdown.
    Commanded,
}

/// Summary of one completed control cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub at: Duration,
    pub reading: ClimateReading,
    pub mode: CoolingMode,
    pub priority: u8,
    pub reason: String,
    /// What the decision (after any override merge) asked for.
    pub requested: ActuatorTargets,
    /// What the bank actually achieved after its gates.
    pub applied: ActuatorTargets,
    /// True when a manual override modified the automatic targets.
    pub overridden: bool,
    pub bank: BankStatus,
}

/// Application events, one level above log lines.
#[derive(Debug, Clone)]
pub enum AppEvent {
    CycleCompleted(CycleReport),
    ModeChanged {
        from: CoolingMode,
        to: CoolingMode,
        reason: String,
    },
    /// A sensor read failed; the cycle was skipped.
    SensorFault {
        error: SensorError,
        consecutive_failures: u32,
    },
    /// The safety sweep had to intervene (runtime cap or water loss).
    SafetyIntervention { at: Duration },
    EmergencyShutdown {
        reason: EmergencyReason,
        at: Duration,
    },
    OverrideChanged { active: bool },
    PresetLoaded { name: String },
    FaultReset { id: OutputId },
}
