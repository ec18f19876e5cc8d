//! Cooling modes and the decision value type.
//!
//! A [`CoolingMode`] is the single source of truth for which actuators run
//! in that mode — a [`Decision`] is constructed from a mode and can never
//! carry a target set that contradicts it.

use core::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Cooling mode
// ---------------------------------------------------------------------------

/// Operating modes for the cooling system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CoolingMode {
    Idle = 0,
    /// Pump only — energy-preferred evaporative cooling.
    Evaporative = 1,
    /// Chiller + pump.
    Chiller = 2,
    /// Dehumidifier only.
    Dehumidify = 3,
    /// Chiller + dehumidifier.
    CoolAndDehumidify = 4,
    /// Emergency cooling: pump + chiller, everything subordinate to
    /// getting the temperature down.
    Emergency = 5,
}

impl CoolingMode {
    /// Total number of modes — sizes the per-mode duration table.
    pub const COUNT: usize = 6;

    /// All modes, in discriminant order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Idle,
        Self::Evaporative,
        Self::Chiller,
        Self::Dehumidify,
        Self::CoolAndDehumidify,
        Self::Emergency,
    ];

    /// Index into per-mode tables.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The actuator set this mode drives.
    pub fn targets(self) -> ActuatorTargets {
        match self {
            Self::Idle => ActuatorTargets::all_off(),
            Self::Evaporative => ActuatorTargets {
                pump: true,
                chiller: false,
                dehumidifier: false,
            },
            Self::Chiller => ActuatorTargets {
                pump: true,
                chiller: true,
                dehumidifier: false,
            },
            Self::Dehumidify => ActuatorTargets {
                pump: false,
                chiller: false,
                dehumidifier: true,
            },
            Self::CoolAndDehumidify => ActuatorTargets {
                pump: false,
                chiller: true,
                dehumidifier: true,
            },
            Self::Emergency => ActuatorTargets {
                pump: true,
                chiller: true,
                dehumidifier: false,
            },
        }
    }
}

impl fmt::Display for CoolingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Evaporative => write!(f, "evaporative"),
            Self::Chiller => write!(f, "chiller"),
            Self::Dehumidify => write!(f, "dehumidify"),
            Self::CoolAndDehumidify => write!(f, "cool_and_dehumidify"),
            Self::Emergency => write!(f, "emergency"),
        }
    }
}

// ---------------------------------------------------------------------------
// Actuator targets
// ---------------------------------------------------------------------------

/// Desired on/off state for each of the three actuators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorTargets {
    pub pump: bool,
    pub chiller: bool,
    pub dehumidifier: bool,
}

impl ActuatorTargets {
    /// All actuators off — safe default.
    pub fn all_off() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// A control decision with its reasoning. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub mode: CoolingMode,
    pub targets: ActuatorTargets,
    /// Human-readable explanation embedding the triggering metric.
    pub reason: String,
    /// Urgency of this decision, 0 (idle) to 10 (emergency).
    pub priority: u8,
    /// Monotonic timestamp at which the decision was produced.
    pub at: Duration,
}

impl Decision {
    /// Build a decision; the actuator targets are derived from the mode.
    pub fn new(mode: CoolingMode, reason: String, priority: u8, at: Duration) -> Self {
        debug_assert!(priority <= 10);
        Self {
            mode,
            targets: mode.targets(),
            reason,
            priority,
            at,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Decision({}, reason='{}', priority={})",
            self.mode, self.reason, self.priority
        )
    }
}
