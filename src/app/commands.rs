//! Commands accepted by the climate service between control cycles.

use crate::actuators::OutputId;
use crate::engine::decision::ActuatorTargets;

/// A partial manual override of the automatic actuator targets.
///
/// `None` fields defer to the automatic decision; `Some` fields replace it.
/// The safety layer is NOT bypassed: overridden targets still pass through
/// every bank gate (cycle time, water level, runtime caps).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManualOverride {
    pub pump: Option<bool>,
    pub chiller: Option<bool>,
    pub dehumidifier: Option<bool>,
}

impl ManualOverride {
    /// Merge over the automatic targets.
    pub fn merge(&self, auto: ActuatorTargets) -> ActuatorTargets {
        ActuatorTargets {
            pump: self.pump.unwrap_or(auto.pump),
            chiller: self.chiller.unwrap_or(auto.chiller),
            dehumidifier: self.dehumidifier.unwrap_or(auto.dehumidifier),
        }
    }

    /// True when at least one field is forced.
    pub fn is_active(&self) -> bool {
        self.pump.is_some() || self.chiller.is_some() || self.dehumidifier.is_some()
    }
}

/// External commands into the service.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Update target setpoints; `None` leaves a target unchanged.
    SetTargets {
        temp_target: Option<f32>,
        humidity_target: Option<f32>,
    },
    /// Load a named produce preset.
    LoadPreset(String),
    /// Install or clear the manual override.
    SetOverride(Option<ManualOverride>),
    /// Operator-commanded emergency shutdown.
    EmergencyShutdown,
    /// Maintenance reset of a faulted actuator.
    ResetFault(OutputId),
}
