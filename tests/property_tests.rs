//! Property-based invariant tests for the decision engine, the actuator
//! state machine, and the reading history.

use std::time::Duration;

use proptest::prelude::*;

use coldbox::actuators::{Actuator, ActuatorState, OutputId};
use coldbox::config::ClimateConfig;
use coldbox::engine::decision::{CoolingMode, Decision};
use coldbox::engine::history::{Reading, ReadingHistory};
use coldbox::engine::ControlEngine;

proptest! {
    /// Every decision carries a priority in 0..=10, targets consistent with
    /// its mode, and the emergency mode exactly iff the temperature exceeds
    /// the shutdown threshold.
    #[test]
    fn decisions_are_always_well_formed(
        temp in -5.0f32..25.0,
        humidity in 0.0f32..100.0,
    ) {
        let mut engine = ControlEngine::new(&ClimateConfig::default(), Duration::ZERO);
        let decision = engine.decide(temp, humidity, Duration::ZERO);

        prop_assert!(decision.priority <= 10);
        prop_assert_eq!(decision.targets, decision.mode.targets());
        prop_assert_eq!(
            decision.mode == CoolingMode::Emergency,
            temp > 15.0,
            "emergency exactly above the shutdown threshold"
        );
        prop_assert!(!decision.reason.is_empty());
    }

    /// No command sequence can make an actuator change state twice within
    /// its minimum cycle time, except turning OFF (which is never gated).
    #[test]
    fn actuator_never_short_cycles_on(
        commands in prop::collection::vec((any::<bool>(), 0u64..30), 1..60),
    ) {
        let min_cycle = Duration::from_secs(10);
        let mut actuator = Actuator::new(
            "Chiller",
            OutputId::Chiller,
            27,
            min_cycle,
            Duration::from_secs(600),
            true,
        );

        let mut now = Duration::ZERO;
        let mut last_change: Option<Duration> = None;
        let mut prev_state = actuator.state();

        for (on, dt) in commands {
            now += Duration::from_secs(dt);
            if on {
                actuator.turn_on(now);
            } else {
                actuator.turn_off(now);
            }

            let state = actuator.state();
            if state != prev_state {
                if state == ActuatorState::On {
                    if let Some(prev) = last_change {
                        prop_assert!(
                            now - prev >= min_cycle,
                            "ON transition {}s after previous change",
                            (now - prev).as_secs()
                        );
                    }
                }
                last_change = Some(now);
                prev_state = state;
            }
        }
    }

    /// Mode-duration accounting never loses or invents time: summed over
    /// all modes (including the open interval) it equals wall time since
    /// engine construction.
    #[test]
    fn mode_durations_sum_to_elapsed(
        steps in prop::collection::vec((0usize..CoolingMode::COUNT, 1u64..500), 1..40),
    ) {
        let mut engine = ControlEngine::new(&ClimateConfig::default(), Duration::ZERO);
        let mut now = Duration::ZERO;

        for (mode_idx, dt) in steps {
            now += Duration::from_secs(dt);
            let decision = Decision::new(CoolingMode::ALL[mode_idx], "step".to_owned(), 0, now);
            engine.execute(&decision, now);
        }

        let stats = engine.statistics(now);
        let total: Duration = stats.modes.iter().map(|m| m.duration).sum();
        prop_assert_eq!(total, now);
    }

    /// A trend is reported iff at least two samples fall inside the rate
    /// window, and it is always finite.
    #[test]
    fn rate_known_only_with_two_in_window_samples(
        temps in prop::collection::vec(-10.0f32..30.0, 0..10),
    ) {
        let mut history = ReadingHistory::new(20);
        let mut at = Duration::ZERO;
        for (i, t) in temps.iter().enumerate() {
            at = Duration::from_secs(i as u64 * 10);
            history.push(Reading {
                at,
                temperature: *t,
                humidity: 50.0,
            });
        }

        let rate = history.temp_rate_per_minute(at, Duration::from_secs(60));
        if temps.len() < 2 {
            prop_assert!(rate.is_none());
        } else {
            prop_assert!(rate.is_some());
            prop_assert!(rate.unwrap_or(f32::NAN).is_finite());
        }
    }

    /// Setpoint updates accept exactly the finite, physically plausible
    /// values and reject the rest without mutation.
    #[test]
    fn set_targets_accepts_only_physical_values(
        temp in prop::num::f32::ANY,
        humidity in prop::num::f32::ANY,
    ) {
        let mut engine = ControlEngine::new(&ClimateConfig::default(), Duration::ZERO);
        let result = engine.set_targets(Some(temp), Some(humidity));

        let valid = temp.is_finite()
            && (-40.0..=60.0).contains(&temp)
            && humidity.is_finite()
            && (0.0..=100.0).contains(&humidity);
        prop_assert_eq!(result.is_ok(), valid);

        let stats = engine.statistics(Duration::ZERO);
        prop_assert!(stats.temp_target.is_finite());
        prop_assert!(stats.humidity_target.is_finite());
    }
}
