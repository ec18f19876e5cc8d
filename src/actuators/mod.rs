//! Actuator state machines and the safety-gated actuator bank.
//!
//! An [`Actuator`] is the leaf: one physical output (pump, chiller, or
//! dehumidifier) with its own cycle-time gate, runtime cap, and runtime
//! accounting. The [`bank::ActuatorBank`] owns the three actuators and adds
//! the water-level interlock, the per-cycle safety sweep, and emergency
//! shutdown.
//!
//! All methods take an explicit monotonic `now` so the state machines stay
//! pure: the control loop reads the clock once per cycle and threads the
//! timestamp through every gate check.

pub mod bank;

use core::fmt;
use std::time::Duration;

use log::{debug, info, warn};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Which physical output an actuator (or an output-port write) refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputId {
    Pump,
    Chiller,
    Dehumidifier,
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pump => write!(f, "pump"),
            Self::Chiller => write!(f, "chiller"),
            Self::Dehumidifier => write!(f, "dehumidifier"),
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Actuator operating states.
///
/// FAULT is entered on a physical output-write failure and is terminal
/// until [`Actuator::reset_fault`] is called by an external maintenance
/// path; a faulted actuator refuses auto-commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorState {
    Off,
    On,
    Fault,
}

impl fmt::Display for ActuatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "OFF"),
            Self::On => write!(f, "ON"),
            Self::Fault => write!(f, "FAULT"),
        }
    }
}

// ---------------------------------------------------------------------------
// Actuator
// ---------------------------------------------------------------------------

/// A single actuator with short-cycling and runtime protection.
pub struct Actuator {
    name: &'static str,
    id: OutputId,
    /// BCM pin this actuator's relay is wired to (status reporting only;
    /// physical writes go through the output port).
    pin: u8,
    /// LOW signal activates the relay (safer wiring default).
    active_low: bool,
    /// Minimum time between any two state changes.
    min_cycle: Duration,
    /// Longest permitted continuous ON duration.
    max_runtime: Duration,

    state: ActuatorState,
    /// `None` until the first state change — the first activation after
    /// startup is never gated.
    last_state_change: Option<Duration>,
    /// Set iff `state == On`.
    runtime_start: Option<Duration>,
    total_runtime: Duration,
    cycle_count: u32,
}

/// Read-only snapshot of one actuator, for status reporting and telemetry.
#[derive(Debug, Clone, Copy)]
pub struct ActuatorStatus {
    pub name: &'static str,
    pub id: OutputId,
    pub pin: u8,
    pub state: ActuatorState,
    /// Runtime of the in-progress ON interval (zero when not ON).
    pub current_runtime: Duration,
    /// Accumulated runtime across all completed ON intervals.
    pub total_runtime: Duration,
    /// Number of OFF→ON transitions since startup.
    pub cycle_count: u32,
    /// Time since the last state change; `None` if it never changed.
    pub time_since_change: Option<Duration>,
}

impl Actuator {
    pub fn new(
        name: &'static str,
        id: OutputId,
        pin: u8,
        min_cycle: Duration,
        max_runtime: Duration,
        active_low: bool,
    ) -> Self {
        info!("Initialized actuator '{name}' on GPIO {pin}");
        Self {
            name,
            id,
            pin,
            active_low,
            min_cycle,
            max_runtime,
            state: ActuatorState::Off,
            last_state_change: None,
            runtime_start: None,
            total_runtime: Duration::ZERO,
            cycle_count: 0,
        }
    }

    /// True iff enough time has passed since the last state change.
    /// Pure time gate, no side effect.
    pub fn can_change_state(&self, now: Duration) -> bool {
        match self.last_state_change {
            Some(at) => now.saturating_sub(at) >= self.min_cycle,
            None => true,
        }
    }

    /// True iff the actuator is ON and has been running for `max_runtime`
    /// or longer.
    pub fn is_runtime_exceeded(&self, now: Duration) -> bool {
        match (self.state, self.runtime_start) {
            (ActuatorState::On, Some(start)) => now.saturating_sub(start) >= self.max_runtime,
            _ => false,
        }
    }

    /// Turn the actuator on.
    ///
    /// No-op success if already ON. Refused (logged, no state change) when
    /// the cycle-time gate is closed — the anti-short-cycling interlock —
    /// or when the actuator is FAULT.
    pub fn turn_on(&mut self, now: Duration) -> bool {
        if self.state == ActuatorState::On {
            return true;
        }
        if self.state == ActuatorState::Fault {
            warn!("{}: Cannot turn on - actuator faulted", self.name);
            return false;
        }
        if !self.can_change_state(now) {
            warn!("{}: Cannot turn on - minimum cycle time not met", self.name);
            return false;
        }

        self.state = ActuatorState::On;
        self.last_state_change = Some(now);
        self.runtime_start = Some(now);
        self.cycle_count += 1;

        info!("{}: Turned ON", self.name);
        true
    }

    /// Turn the actuator off.
    ///
    /// Never gated: blocking an OFF command could leave equipment
    /// damagingly ON. Accumulates the finished ON interval into
    /// `total_runtime`. A FAULT actuator stays FAULT (the command is
    /// accepted; the physical output is already being held off).
    pub fn turn_off(&mut self, now: Duration) -> bool {
        match self.state {
            ActuatorState::Off => true,
            ActuatorState::Fault => true,
            ActuatorState::On => {
                self.accumulate_runtime(now);
                self.state = ActuatorState::Off;
                self.last_state_change = Some(now);
                info!("{}: Turned OFF", self.name);
                true
            }
        }
    }

    /// Immediately force the actuator OFF, regardless of state.
    ///
    /// Used only by fault/emergency paths. Runtime accounting is the same
    /// as a normal `turn_off`, so no runtime is lost on emergency stops.
    pub fn emergency_stop(&mut self, now: Duration) {
        if self.state == ActuatorState::On {
            self.accumulate_runtime(now);
        }
        if self.state != ActuatorState::Off {
            self.last_state_change = Some(now);
        }
        self.state = ActuatorState::Off;
        self.runtime_start = None;
        warn!("{}: EMERGENCY STOP", self.name);
    }

    /// Mark the actuator FAULT after a physical output-write failure.
    /// The in-progress runtime (if any) is closed out.
    pub fn mark_fault(&mut self, now: Duration) {
        if self.state == ActuatorState::On {
            self.accumulate_runtime(now);
        }
        self.state = ActuatorState::Fault;
        self.last_state_change = Some(now);
        warn!("{}: marked FAULT", self.name);
    }

    /// External maintenance reset: FAULT → OFF. No-op in other states.
    pub fn reset_fault(&mut self, now: Duration) {
        if self.state == ActuatorState::Fault {
            self.state = ActuatorState::Off;
            self.last_state_change = Some(now);
            info!("{}: fault reset", self.name);
        }
    }

    /// Read-only status snapshot. No mutation.
    pub fn status(&self, now: Duration) -> ActuatorStatus {
        let current_runtime = match (self.state, self.runtime_start) {
            (ActuatorState::On, Some(start)) => now.saturating_sub(start),
            _ => Duration::ZERO,
        };
        ActuatorStatus {
            name: self.name,
            id: self.id,
            pin: self.pin,
            state: self.state,
            current_runtime,
            total_runtime: self.total_runtime,
            cycle_count: self.cycle_count,
            time_since_change: self.last_state_change.map(|at| now.saturating_sub(at)),
        }
    }

    pub fn state(&self) -> ActuatorState {
        self.state
    }

    pub fn is_on(&self) -> bool {
        self.state == ActuatorState::On
    }

    pub fn id(&self) -> OutputId {
        self.id
    }

    pub fn active_low(&self) -> bool {
        self.active_low
    }

    fn accumulate_runtime(&mut self, now: Duration) {
        if let Some(start) = self.runtime_start.take() {
            let runtime = now.saturating_sub(start);
            self.total_runtime += runtime;
            debug!(
                "{}: Runtime was {:.1}s (total: {:.1}s)",
                self.name,
                runtime.as_secs_f32(),
                self.total_runtime.as_secs_f32()
            );
        }
    }
}
