//! The climate service: one object wiring engine, bank, and ports together.
//!
//! Each call to [`ClimateService::run_cycle`] performs one full control
//! cycle: read the sensor, decide, merge any manual override, drive the
//! actuator bank, run the safety sweep, and emit events. The service holds
//! no hardware; ports are passed into every call, so the same service runs
//! against real GPIO, the simulator, or test doubles.

use std::time::Duration;

use log::{error, info, warn};

use crate::actuators::bank::{ActuatorBank, BankStatus};
use crate::actuators::OutputId;
use crate::config::ClimateConfig;
use crate::engine::{ControlEngine, Statistics};
use crate::error::{ConfigError, Error, Result};

use super::commands::{AppCommand, ManualOverride};
use super::events::{AppEvent, CycleReport, EmergencyReason};
use super::ports::{EventSink, OutputPort, SensorPort, WaterLevelPort};

/// Whether the control loop should keep running after a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Running,
    /// An emergency shutdown latched; the loop must stop. The latch is
    /// permanent for the lifetime of the service.
    Shutdown,
}

/// Full service status snapshot.
#[derive(Debug, Clone)]
pub struct ServiceStatus {
    pub engine: Statistics,
    pub bank: BankStatus,
    pub override_active: bool,
    pub emergency_latched: bool,
}

pub struct ClimateService {
    engine: ControlEngine,
    bank: ActuatorBank,

    manual_override_enabled: bool,
    override_: Option<ManualOverride>,

    sensor_timeout: Duration,
    /// Timestamp of the last good reading; `None` until the first one, in
    /// which case the timeout counts from service start.
    last_good_reading: Option<Duration>,
    consecutive_sensor_failures: u32,

    started_at: Duration,
    emergency_latched: bool,
}

impl ClimateService {
    /// Build the service from validated configuration.
    pub fn new(config: &ClimateConfig, now: Duration) -> Self {
        Self {
            engine: ControlEngine::new(config, now),
            bank: ActuatorBank::new(config),
            manual_override_enabled: config.safety.manual_override_enabled,
            override_: None,
            sensor_timeout: Duration::from_secs_f32(config.safety.sensor_timeout_secs),
            last_good_reading: None,
            consecutive_sensor_failures: 0,
            started_at: now,
            emergency_latched: false,
        }
    }

    /// One control cycle. Sensor failures are absorbed (the cycle is
    /// skipped) until the sensor timeout elapses, at which point the
    /// service latches an emergency shutdown.
    ///
    /// An emergency-mode decision is maximum cooling, executed through the
    /// bank like any other decision; the shutdown latch is reserved for
    /// sensor loss and the operator command.
    pub fn run_cycle(
        &mut self,
        hw: &mut (impl SensorPort + OutputPort + WaterLevelPort),
        sink: &mut impl EventSink,
        now: Duration,
    ) -> CycleOutcome {
        if self.emergency_latched {
            return CycleOutcome::Shutdown;
        }

        let reading = match hw.read() {
            Ok(r) => r,
            Err(err) => {
                self.consecutive_sensor_failures += 1;
                warn!(
                    "Sensor read failed ({err}), {} consecutive",
                    self.consecutive_sensor_failures
                );
                sink.emit(&AppEvent::SensorFault {
                    error: err,
                    consecutive_failures: self.consecutive_sensor_failures,
                });

                let since_good =
                    now.saturating_sub(self.last_good_reading.unwrap_or(self.started_at));
                if since_good >= self.sensor_timeout {
                    error!(
                        "No sensor data for {:.0}s - emergency shutdown",
                        since_good.as_secs_f32()
                    );
                    return self.latch_emergency(hw, sink, EmergencyReason::SensorTimeout, now);
                }
                return CycleOutcome::Running;
            }
        };
        self.last_good_reading = Some(now);
        self.consecutive_sensor_failures = 0;

        let previous_mode = self.engine.current_mode();
        let decision = self.engine.decide(reading.temperature, reading.humidity, now);

        // Manual override rides on top of the automatic decision but never
        // bypasses the bank's gates.
        let (requested, overridden) = match self.active_override() {
            Some(ovr) => (ovr.merge(decision.targets), true),
            None => (decision.targets, false),
        };

        let applied = self.bank.apply(requested, hw, now);
        self.engine.execute(&decision, now);

        if decision.mode != previous_mode {
            sink.emit(&AppEvent::ModeChanged {
                from: previous_mode,
                to: decision.mode,
                reason: decision.reason.clone(),
            });
        }

        if !self.bank.run_safety_sweep(hw, now) {
            sink.emit(&AppEvent::SafetyIntervention { at: now });
        }

        sink.emit(&AppEvent::CycleCompleted(CycleReport {
            at: now,
            reading,
            mode: decision.mode,
            priority: decision.priority,
            reason: decision.reason,
            requested,
            applied,
            overridden,
            bank: self.bank.status(now),
        }));

        CycleOutcome::Running
    }

    /// Process an external command between cycles.
    pub fn handle_command(
        &mut self,
        command: AppCommand,
        hw: &mut impl OutputPort,
        sink: &mut impl EventSink,
        now: Duration,
    ) -> Result<()> {
        match command {
            AppCommand::SetTargets {
                temp_target,
                humidity_target,
            } => {
                self.engine.set_targets(temp_target, humidity_target)?;
                Ok(())
            }
            AppCommand::LoadPreset(name) => {
                if !self.engine.load_preset(&name) {
                    return Err(Error::Config(ConfigError::UnknownPreset));
                }
                sink.emit(&AppEvent::PresetLoaded { name });
                Ok(())
            }
            AppCommand::SetOverride(ovr) => {
                if !self.manual_override_enabled {
                    return Err(Error::Config(ConfigError::Invalid(
                        "manual override disabled by configuration",
                    )));
                }
                let active = ovr.is_some_and(|o| o.is_active());
                self.override_ = ovr.filter(|o| o.is_active());
                info!(
                    "Manual override {}",
                    if active { "installed" } else { "cleared" }
                );
                sink.emit(&AppEvent::OverrideChanged { active });
                Ok(())
            }
            AppCommand::EmergencyShutdown => {
                self.latch_emergency_outputs_only(hw, sink, EmergencyReason::Commanded, now);
                Ok(())
            }
            AppCommand::ResetFault(id) => {
                self.bank.reset_fault(id, now);
                sink.emit(&AppEvent::FaultReset { id });
                Ok(())
            }
        }
    }

    /// Orderly exit: everything off via the infallible emergency path, so
    /// shutdown completes even from an error path. The service-level
    /// emergency latch is not set; the process is expected to exit.
    pub fn shutdown(&mut self, hw: &mut impl OutputPort, now: Duration) {
        info!("Shutting down - all actuators off");
        self.bank.emergency_shutdown(hw, now);
    }

    pub fn status(&self, now: Duration) -> ServiceStatus {
        ServiceStatus {
            engine: self.engine.statistics(now),
            bank: self.bank.status(now),
            override_active: self.active_override().is_some(),
            emergency_latched: self.emergency_latched,
        }
    }

    pub fn is_emergency_latched(&self) -> bool {
        self.emergency_latched
    }

    pub fn actuator(&self, id: OutputId) -> &crate::actuators::Actuator {
        self.bank.actuator(id)
    }

    fn active_override(&self) -> Option<&ManualOverride> {
        if !self.manual_override_enabled {
            return None;
        }
        self.override_.as_ref().filter(|o| o.is_active())
    }

    fn latch_emergency(
        &mut self,
        hw: &mut impl OutputPort,
        sink: &mut impl EventSink,
        reason: EmergencyReason,
        now: Duration,
    ) -> CycleOutcome {
        self.latch_emergency_outputs_only(hw, sink, reason, now);
        CycleOutcome::Shutdown
    }

    fn latch_emergency_outputs_only(
        &mut self,
        hw: &mut impl OutputPort,
        sink: &mut impl EventSink,
        reason: EmergencyReason,
        now: Duration,
    ) {
        self.bank.emergency_shutdown(hw, now);
        self.emergency_latched = true;
        sink.emit(&AppEvent::EmergencyShutdown { reason, at: now });
    }
}
