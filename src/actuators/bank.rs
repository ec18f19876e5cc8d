//! The actuator bank: three actuators behind one safety boundary.
//!
//! The bank is the only component allowed to drive the output port. It
//! layers the cross-actuator interlocks on top of the per-actuator gates:
//! the water-level check before pump activation, the per-cycle safety sweep
//! for runtime caps, and emergency shutdown. Commands that fail a gate are
//! refused and logged, never queued.

use std::time::Duration;

use log::{error, info, warn};

use crate::app::ports::{OutputPort, WaterLevelPort};
use crate::config::ClimateConfig;
use crate::engine::decision::ActuatorTargets;

use super::{Actuator, ActuatorState, ActuatorStatus, OutputId};

/// Snapshot of the whole bank, for telemetry and cycle reports.
#[derive(Debug, Clone, Copy)]
pub struct BankStatus {
    pub pump: ActuatorStatus,
    pub chiller: ActuatorStatus,
    pub dehumidifier: ActuatorStatus,
    /// Last observed water-level state.
    pub water_available: bool,
    /// True once an emergency shutdown has run; activations are refused.
    pub emergency_mode: bool,
}

/// Owns the pump, chiller and dehumidifier and enforces the interlocks
/// between them. Hardware access goes through the port traits, passed into
/// each call so the bank itself stays hardware-free.
pub struct ActuatorBank {
    pump: Actuator,
    chiller: Actuator,
    dehumidifier: Actuator,

    water_check_enabled: bool,
    /// Treat an unavailable water-level reading as adequate.
    water_fail_open: bool,
    /// Last observed level; starts optimistic so status reads sensibly
    /// before the first check.
    water_available: bool,
    /// Latched by `emergency_shutdown`; cleared only by process restart.
    emergency_mode: bool,
}

impl ActuatorBank {
    pub fn new(config: &ClimateConfig) -> Self {
        let timing = &config.actuators;
        let min_cycle = Duration::from_secs_f32(timing.min_cycle_secs);

        Self {
            pump: Actuator::new(
                "Water Pump",
                OutputId::Pump,
                config.gpio.water_pump,
                min_cycle,
                Duration::from_secs_f32(timing.max_pump_runtime_secs),
                true,
            ),
            chiller: Actuator::new(
                "Chiller",
                OutputId::Chiller,
                config.gpio.chiller,
                min_cycle,
                Duration::from_secs_f32(timing.max_chiller_runtime_secs),
                true,
            ),
            dehumidifier: Actuator::new(
                "Dehumidifier",
                OutputId::Dehumidifier,
                config.gpio.dehumidifier,
                min_cycle,
                Duration::from_secs_f32(timing.max_dehumidifier_runtime_secs),
                true,
            ),
            water_check_enabled: config.safety.water_level_check_enabled,
            water_fail_open: config.safety.water_level_fail_open,
            water_available: true,
            emergency_mode: false,
        }
    }

    // ── Water interlock ───────────────────────────────────────

    /// Read the water level and cache the result. With the check disabled
    /// this always reports adequate. An unavailable reading resolves via
    /// the fail-open setting.
    pub fn check_water_level(&mut self, water: &mut impl WaterLevelPort) -> bool {
        if !self.water_check_enabled {
            return true;
        }
        let available = match water.read_water_level() {
            Some(level) => level,
            None => {
                warn!("Water level sensor unavailable");
                self.water_fail_open
            }
        };
        if self.water_available && !available {
            warn!("Water level LOW - pump interlock engaged");
        }
        self.water_available = available;
        available
    }

    // ── Individual commands ───────────────────────────────────

    /// Command the pump. Activation requires a fresh water-level check in
    /// the same call; deactivation is never gated on water.
    pub fn set_pump(
        &mut self,
        on: bool,
        hw: &mut (impl OutputPort + WaterLevelPort),
        now: Duration,
    ) -> bool {
        if on && self.emergency_mode {
            warn!("pump: activation refused - emergency mode");
            return false;
        }
        if on && !self.check_water_level(hw) {
            return false;
        }
        Self::command(&mut self.pump, on, hw, now)
    }

    pub fn set_chiller(&mut self, on: bool, out: &mut impl OutputPort, now: Duration) -> bool {
        if on && self.emergency_mode {
            warn!("chiller: activation refused - emergency mode");
            return false;
        }
        Self::command(&mut self.chiller, on, out, now)
    }

    pub fn set_dehumidifier(
        &mut self,
        on: bool,
        out: &mut impl OutputPort,
        now: Duration,
    ) -> bool {
        if on && self.emergency_mode {
            warn!("dehumidifier: activation refused - emergency mode");
            return false;
        }
        Self::command(&mut self.dehumidifier, on, out, now)
    }

    /// Shared command path: update the logical state machine first, then
    /// drive the physical output to match. A physical write failure marks
    /// the actuator FAULT and attempts to hold the output off.
    fn command(
        actuator: &mut Actuator,
        on: bool,
        out: &mut impl OutputPort,
        now: Duration,
    ) -> bool {
        let accepted = if on {
            actuator.turn_on(now)
        } else {
            actuator.turn_off(now)
        };
        if !accepted {
            return false;
        }

        let physical_on = actuator.is_on();
        if let Err(err) = out.set_output(actuator.id(), physical_on) {
            error!("{}: output write failed: {err}", actuator.id());
            actuator.mark_fault(now);
            // Best effort to leave the relay de-energized.
            let _ = out.set_output(actuator.id(), false);
            return false;
        }
        true
    }

    // ── Decision application ──────────────────────────────────

    /// Drive all three actuators toward `targets`. Deactivations are
    /// applied before activations so a mode change never transiently runs
    /// more equipment than either mode needs.
    ///
    /// Returns the achieved state, which may differ from the request when a
    /// gate refused a change.
    pub fn apply(
        &mut self,
        targets: ActuatorTargets,
        hw: &mut (impl OutputPort + WaterLevelPort),
        now: Duration,
    ) -> ActuatorTargets {
        if !targets.chiller {
            self.set_chiller(false, hw, now);
        }
        if !targets.dehumidifier {
            self.set_dehumidifier(false, hw, now);
        }
        if !targets.pump {
            self.set_pump(false, hw, now);
        }

        if targets.pump {
            self.set_pump(true, hw, now);
        }
        if targets.chiller {
            self.set_chiller(true, hw, now);
        }
        if targets.dehumidifier {
            self.set_dehumidifier(true, hw, now);
        }

        ActuatorTargets {
            pump: self.pump.is_on(),
            chiller: self.chiller.is_on(),
            dehumidifier: self.dehumidifier.is_on(),
        }
    }

    // ── Safety sweep ──────────────────────────────────────────

    /// Per-cycle safety pass, independent of whatever was decided:
    /// force-stop any actuator past its runtime cap, and stop the pump if
    /// the water ran low while it was running.
    ///
    /// Returns `true` when no intervention was needed.
    pub fn run_safety_sweep(
        &mut self,
        hw: &mut (impl OutputPort + WaterLevelPort),
        now: Duration,
    ) -> bool {
        let mut clean = true;

        for actuator in [&mut self.pump, &mut self.chiller, &mut self.dehumidifier] {
            if actuator.is_runtime_exceeded(now) {
                warn!("{}: maximum runtime exceeded - forcing off", actuator.id());
                // Normal OFF path: never gated, keeps the runtime accounting.
                actuator.turn_off(now);
                if let Err(err) = hw.set_output(actuator.id(), false) {
                    error!("{}: output write failed: {err}", actuator.id());
                    actuator.mark_fault(now);
                }
                clean = false;
            }
        }

        // Refresh the cached water level every sweep, not only while the
        // pump runs, so status reports a dry reservoir promptly.
        let water_ok = self.check_water_level(hw);
        if self.pump.is_on() && !water_ok {
            warn!("Water ran low while pump active - forcing off");
            self.pump.turn_off(now);
            if let Err(err) = hw.set_output(OutputId::Pump, false) {
                error!("pump: output write failed: {err}");
                self.pump.mark_fault(now);
            }
            clean = false;
        }

        clean
    }

    // ── Emergency & maintenance ───────────────────────────────

    /// Force everything off, bypassing every gate. Infallible: a failing
    /// output write is logged and the actuator marked FAULT, but the
    /// shutdown continues through the remaining actuators.
    pub fn emergency_shutdown(&mut self, out: &mut impl OutputPort, now: Duration) {
        error!("EMERGENCY SHUTDOWN - all actuators off");
        self.emergency_mode = true;
        for actuator in [&mut self.pump, &mut self.chiller, &mut self.dehumidifier] {
            actuator.emergency_stop(now);
            if let Err(err) = out.set_output(actuator.id(), false) {
                error!("{}: output write failed during shutdown: {err}", actuator.id());
                actuator.mark_fault(now);
            }
        }
    }

    /// Maintenance reset of a faulted actuator.
    pub fn reset_fault(&mut self, id: OutputId, now: Duration) {
        self.actuator_mut(id).reset_fault(now);
        info!("{id}: fault reset requested");
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn status(&self, now: Duration) -> BankStatus {
        BankStatus {
            pump: self.pump.status(now),
            chiller: self.chiller.status(now),
            dehumidifier: self.dehumidifier.status(now),
            water_available: self.water_available,
            emergency_mode: self.emergency_mode,
        }
    }

    pub fn is_emergency_mode(&self) -> bool {
        self.emergency_mode
    }

    pub fn any_faulted(&self) -> bool {
        [&self.pump, &self.chiller, &self.dehumidifier]
            .iter()
            .any(|a| a.state() == ActuatorState::Fault)
    }

    pub fn actuator(&self, id: OutputId) -> &Actuator {
        match id {
            OutputId::Pump => &self.pump,
            OutputId::Chiller => &self.chiller,
            OutputId::Dehumidifier => &self.dehumidifier,
        }
    }

    fn actuator_mut(&mut self, id: OutputId) -> &mut Actuator {
        match id {
            OutputId::Pump => &mut self.pump,
            OutputId::Chiller => &mut self.chiller,
            OutputId::Dehumidifier => &mut self.dehumidifier,
        }
    }
}
