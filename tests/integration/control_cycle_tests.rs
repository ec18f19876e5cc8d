//! End-to-end control-cycle tests: service + engine + bank against the
//! scriptable mock hardware, plus a closed-loop run against the simulator.

use std::time::Duration;

use coldbox::actuators::{ActuatorState, OutputId};
use coldbox::adapters::sim::SimulatedCompartment;
use coldbox::app::commands::{AppCommand, ManualOverride};
use coldbox::app::events::{AppEvent, EmergencyReason};
use coldbox::app::service::{ClimateService, CycleOutcome};
use coldbox::config::ClimateConfig;
use coldbox::engine::decision::CoolingMode;
use coldbox::error::{ConfigError, Error};

use crate::mock_hw::{MockHw, RecordingSink};

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

fn make_service() -> ClimateService {
    ClimateService::new(&ClimateConfig::default(), Duration::ZERO)
}

#[test]
fn warm_compartment_starts_chiller() {
    let mut service = make_service();
    let mut hw = MockHw::new(13.0, 85.0);
    let mut sink = RecordingSink::new();

    let outcome = service.run_cycle(&mut hw, &mut sink, secs(0));
    assert_eq!(outcome, CycleOutcome::Running);
    assert!(hw.is_on(OutputId::Pump));
    assert!(hw.is_on(OutputId::Chiller));
    assert!(!hw.is_on(OutputId::Dehumidifier));

    // One mode change (idle -> chiller) and one cycle report.
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ModeChanged { .. })),
        1
    );
    let report = sink
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::CycleCompleted(r) => Some(r),
            _ => None,
        })
        .unwrap();
    assert_eq!(report.mode, CoolingMode::Chiller);
    assert_eq!(report.priority, 8);
    assert!(!report.overridden);
    assert!(report.applied.chiller);
}

#[test]
fn steady_mode_emits_no_repeat_mode_changes() {
    let mut service = make_service();
    let mut hw = MockHw::new(13.0, 85.0);
    let mut sink = RecordingSink::new();

    for i in 0..5 {
        service.run_cycle(&mut hw, &mut sink, secs(i * 2));
    }
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ModeChanged { .. })),
        1
    );
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::CycleCompleted(_))),
        5
    );
}

#[test]
fn optimal_conditions_drive_nothing() {
    let mut service = make_service();
    let mut hw = MockHw::new(11.0, 87.5);
    let mut sink = RecordingSink::new();

    service.run_cycle(&mut hw, &mut sink, secs(0));
    assert!(hw.all_off());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ModeChanged { .. })), 0);
}

#[test]
fn temperature_excursion_runs_emergency_cooling() {
    let mut service = make_service();
    let mut hw = MockHw::new(16.0, 85.0);
    let mut sink = RecordingSink::new();

    // An emergency-mode decision is maximum cooling, not a shutdown: the
    // loop keeps running with pump and chiller driven.
    let outcome = service.run_cycle(&mut hw, &mut sink, secs(0));
    assert_eq!(outcome, CycleOutcome::Running);
    assert!(hw.is_on(OutputId::Pump), "pump must run emergency cooling");
    assert!(hw.is_on(OutputId::Chiller));
    assert!(!hw.is_on(OutputId::Dehumidifier));
    assert!(!service.is_emergency_latched());
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::EmergencyShutdown { .. })),
        0
    );

    let report = sink
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::CycleCompleted(r) => Some(r),
            _ => None,
        })
        .unwrap();
    assert_eq!(report.mode, CoolingMode::Emergency);
    assert_eq!(report.priority, 10);

    // Once the excursion clears, the service recovers on its own.
    hw.set_reading(11.0, 87.5);
    service.run_cycle(&mut hw, &mut sink, secs(30));
    assert!(hw.all_off());
}

#[test]
fn sensor_failures_tolerated_until_timeout() {
    // Default sensor timeout is 30 s.
    let mut service = make_service();
    let mut hw = MockHw::new(11.0, 87.5);
    let mut sink = RecordingSink::new();

    assert_eq!(service.run_cycle(&mut hw, &mut sink, secs(0)), CycleOutcome::Running);

    hw.fail_sensor();
    assert_eq!(service.run_cycle(&mut hw, &mut sink, secs(10)), CycleOutcome::Running);
    assert_eq!(service.run_cycle(&mut hw, &mut sink, secs(20)), CycleOutcome::Running);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SensorFault { .. })), 2);

    // 30 s since the last good reading: emergency shutdown.
    assert_eq!(
        service.run_cycle(&mut hw, &mut sink, secs(30)),
        CycleOutcome::Shutdown
    );
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::EmergencyShutdown {
            reason: EmergencyReason::SensorTimeout,
            ..
        }
    )));
}

#[test]
fn sensor_recovery_resets_failure_budget() {
    let mut service = make_service();
    let mut hw = MockHw::new(11.0, 87.5);
    let mut sink = RecordingSink::new();

    service.run_cycle(&mut hw, &mut sink, secs(0));
    hw.fail_sensor();
    service.run_cycle(&mut hw, &mut sink, secs(10));
    hw.set_reading(11.0, 87.5);
    service.run_cycle(&mut hw, &mut sink, secs(20));

    // Failures restart after the good reading at t=20; t=45 is only 25 s
    // since then.
    hw.fail_sensor();
    assert_eq!(
        service.run_cycle(&mut hw, &mut sink, secs(45)),
        CycleOutcome::Running
    );
}

#[test]
fn sensor_timeout_counts_from_start_when_never_read() {
    let mut service = make_service();
    let mut hw = MockHw::new(11.0, 87.5);
    let mut sink = RecordingSink::new();
    hw.fail_sensor();

    assert_eq!(service.run_cycle(&mut hw, &mut sink, secs(10)), CycleOutcome::Running);
    assert_eq!(
        service.run_cycle(&mut hw, &mut sink, secs(30)),
        CycleOutcome::Shutdown
    );
}

#[test]
fn manual_override_rides_on_automatic_decision() {
    let mut service = make_service();
    let mut hw = MockHw::new(11.0, 87.5);
    let mut sink = RecordingSink::new();

    service
        .handle_command(
            AppCommand::SetOverride(Some(ManualOverride {
                dehumidifier: Some(true),
                ..Default::default()
            })),
            &mut hw,
            &mut sink,
            secs(0),
        )
        .unwrap();

    service.run_cycle(&mut hw, &mut sink, secs(0));
    // Automatic decision is idle, but the override forces the dehumidifier.
    assert!(hw.is_on(OutputId::Dehumidifier));
    assert!(!hw.is_on(OutputId::Chiller));
    let report = sink
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::CycleCompleted(r) => Some(r),
            _ => None,
        })
        .unwrap();
    assert!(report.overridden);
    assert_eq!(report.mode, CoolingMode::Idle);

    // Clearing the override releases the dehumidifier next cycle.
    service
        .handle_command(AppCommand::SetOverride(None), &mut hw, &mut sink, secs(12))
        .unwrap();
    service.run_cycle(&mut hw, &mut sink, secs(12));
    assert!(!hw.is_on(OutputId::Dehumidifier));
}

#[test]
fn override_cannot_bypass_water_interlock() {
    let mut service = make_service();
    let mut hw = MockHw::new(11.0, 87.5);
    let mut sink = RecordingSink::new();
    hw.water = Some(false);

    service
        .handle_command(
            AppCommand::SetOverride(Some(ManualOverride {
                pump: Some(true),
                ..Default::default()
            })),
            &mut hw,
            &mut sink,
            secs(0),
        )
        .unwrap();
    service.run_cycle(&mut hw, &mut sink, secs(0));

    assert!(!hw.is_on(OutputId::Pump), "water interlock beats the override");
    let report = sink
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::CycleCompleted(r) => Some(r),
            _ => None,
        })
        .unwrap();
    assert!(report.requested.pump);
    assert!(!report.applied.pump);
}

#[test]
fn override_rejected_when_disabled_by_config() {
    let mut config = ClimateConfig::default();
    config.safety.manual_override_enabled = false;
    let mut service = ClimateService::new(&config, Duration::ZERO);
    let mut hw = MockHw::new(11.0, 87.5);
    let mut sink = RecordingSink::new();

    let result = service.handle_command(
        AppCommand::SetOverride(Some(ManualOverride {
            pump: Some(true),
            ..Default::default()
        })),
        &mut hw,
        &mut sink,
        secs(0),
    );
    assert!(matches!(result, Err(Error::Config(ConfigError::Invalid(_)))));
}

#[test]
fn preset_commands_update_engine_targets() {
    let mut service = make_service();
    let mut hw = MockHw::new(11.0, 87.5);
    let mut sink = RecordingSink::new();

    assert!(matches!(
        service.handle_command(
            AppCommand::LoadPreset("durian".to_owned()),
            &mut hw,
            &mut sink,
            secs(0)
        ),
        Err(Error::Config(ConfigError::UnknownPreset))
    ));

    service
        .handle_command(
            AppCommand::LoadPreset("citrus".to_owned()),
            &mut hw,
            &mut sink,
            secs(0),
        )
        .unwrap();
    let status = service.status(secs(0));
    assert_eq!(status.engine.temp_target, 8.0);
    assert_eq!(status.engine.humidity_target, 85.0);
    assert!(sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::PresetLoaded { name } if name == "citrus")));
}

#[test]
fn commanded_emergency_shutdown_latches() {
    let mut service = make_service();
    let mut hw = MockHw::new(13.0, 85.0);
    let mut sink = RecordingSink::new();
    service.run_cycle(&mut hw, &mut sink, secs(0));

    service
        .handle_command(AppCommand::EmergencyShutdown, &mut hw, &mut sink, secs(5))
        .unwrap();
    assert!(hw.all_off());
    assert!(service.is_emergency_latched());

    // The latch is permanent: later cycles touch no outputs, even with good
    // readings.
    hw.set_reading(11.0, 87.5);
    hw.output_calls.clear();
    assert_eq!(
        service.run_cycle(&mut hw, &mut sink, secs(10)),
        CycleOutcome::Shutdown
    );
    assert!(hw.output_calls.is_empty());
}

#[test]
fn runtime_cap_triggers_safety_intervention() {
    let mut config = ClimateConfig::default();
    config.actuators.max_chiller_runtime_secs = 60.0;
    let mut service = ClimateService::new(&config, Duration::ZERO);
    let mut hw = MockHw::new(13.0, 85.0);
    let mut sink = RecordingSink::new();

    service.run_cycle(&mut hw, &mut sink, secs(0));
    assert!(hw.is_on(OutputId::Chiller));

    service.run_cycle(&mut hw, &mut sink, secs(62));
    assert!(!hw.is_on(OutputId::Chiller));
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::SafetyIntervention { .. })),
        1
    );
}

#[test]
fn write_failure_faults_actuator_until_reset() {
    let mut service = make_service();
    let mut hw = MockHw::new(13.0, 92.0); // wants chiller + dehumidifier
    let mut sink = RecordingSink::new();
    hw.fail_output = Some(OutputId::Chiller);

    service.run_cycle(&mut hw, &mut sink, secs(0));
    assert_eq!(
        service.actuator(OutputId::Chiller).state(),
        ActuatorState::Fault
    );
    // The healthy actuator still runs.
    assert!(hw.is_on(OutputId::Dehumidifier));

    // Faulted actuator stays excluded even after the hardware recovers.
    hw.fail_output = None;
    service.run_cycle(&mut hw, &mut sink, secs(20));
    assert!(!hw.is_on(OutputId::Chiller));

    service
        .handle_command(
            AppCommand::ResetFault(OutputId::Chiller),
            &mut hw,
            &mut sink,
            secs(30),
        )
        .unwrap();
    service.run_cycle(&mut hw, &mut sink, secs(40));
    assert!(hw.is_on(OutputId::Chiller));
}

#[test]
fn shutdown_releases_all_actuators_without_latching() {
    let mut service = make_service();
    let mut hw = MockHw::new(13.0, 85.0);
    let mut sink = RecordingSink::new();
    service.run_cycle(&mut hw, &mut sink, secs(0));
    assert!(!hw.all_off());

    service.shutdown(&mut hw, secs(5));
    assert!(hw.all_off());
    assert!(!service.is_emergency_latched());
}

#[test]
fn closed_loop_simulation_holds_temperature_band() {
    let config = ClimateConfig::default();
    let interval = secs(2);
    let mut sim = SimulatedCompartment::new(14.0, 91.0);
    let mut sink = RecordingSink::new();
    let mut service = ClimateService::new(&config, Duration::ZERO);

    let mut now = Duration::ZERO;
    for _ in 0..1200 {
        sim.step(interval);
        now += interval;
        assert_eq!(
            service.run_cycle(&mut sim, &mut sink, now),
            CycleOutcome::Running,
            "no emergency expected in the closed loop"
        );
    }

    // 40 simulated minutes: pulled out of the warm start and held near the
    // band, never tripping the 15 °C emergency threshold.
    assert!(
        sim.temperature() < 13.0,
        "temperature {:.2} not brought down",
        sim.temperature()
    );
    assert!(sim.temperature() > 10.0 - 0.5);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::EmergencyShutdown { .. })),
        0
    );
}
