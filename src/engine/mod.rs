//! Hybrid control engine.
//!
//! Converts sensor readings into a cooling-mode decision each cycle using:
//!
//! 1. Rule-based control with safe operating bounds
//! 2. Predictive logic based on trend detection
//! 3. Competing-objective arbitration (temperature beats humidity beats
//!    energy), encoded as an ordered first-match-wins rule cascade
//!
//! The engine only decides; physical actuation and interlocks belong to the
//! actuator bank. `execute` feeds decisions back in for mode/duration
//! accounting, so statistics also cover cycles where a manual override
//! replaced the automatic targets.

pub mod decision;
pub mod history;

use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, info, warn};

use crate::config::{ClimateConfig, Preset};
use crate::error::ConfigError;

use decision::{CoolingMode, Decision};
use history::{Reading, ReadingHistory};

/// Physically plausible setpoint bounds — setpoints outside these are
/// rejected, not clamped.
const TEMP_SETPOINT_RANGE: core::ops::RangeInclusive<f32> = -40.0..=60.0;
const HUMIDITY_SETPOINT_RANGE: core::ops::RangeInclusive<f32> = 0.0..=100.0;

// ---------------------------------------------------------------------------
// Assessment
// ---------------------------------------------------------------------------

/// Outcome of assessing one physical quantity: a label for decision reason
/// strings and an urgency score 0–10 feeding the rule cascade.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub label: String,
    pub urgency: u8,
}

impl Assessment {
    fn new(label: impl Into<String>, urgency: u8) -> Self {
        Self {
            label: label.into(),
            urgency,
        }
    }
}

// ---------------------------------------------------------------------------
// ControlEngine
// ---------------------------------------------------------------------------

/// Rule-based/predictive decision engine with setpoint and statistics state.
pub struct ControlEngine {
    // Target ranges
    temp_target: f32,
    temp_min: f32,
    temp_max: f32,
    humidity_target: f32,
    humidity_min: f32,
    humidity_max: f32,

    // Tunables
    temp_hysteresis: f32,
    humidity_hysteresis: f32,
    temp_rate_warning: f32,
    humidity_rate_warning: f32,
    prediction_window_mins: f32,
    rate_window: Duration,
    spray_cooldown: Duration,
    emergency_shutdown_temp: f32,

    presets: BTreeMap<String, Preset>,
    history: ReadingHistory,

    // Runtime state
    current_mode: CoolingMode,
    last_decision: Option<Decision>,
    started_at: Duration,
    last_mode_change: Duration,
    spray_last_activated: Option<Duration>,

    // Statistics
    decisions_made: u64,
    mode_durations: [Duration; CoolingMode::COUNT],
}

/// Per-mode share of runtime, including the still-open current interval.
#[derive(Debug, Clone, Copy)]
pub struct ModeStats {
    pub mode: CoolingMode,
    pub duration: Duration,
    pub percentage: f32,
}

/// Read-only engine statistics snapshot.
#[derive(Debug, Clone)]
pub struct Statistics {
    pub current_mode: CoolingMode,
    pub decisions_made: u64,
    pub readings_in_history: usize,
    pub modes: [ModeStats; CoolingMode::COUNT],
    pub temp_target: f32,
    pub humidity_target: f32,
}

impl ControlEngine {
    /// Build the engine from validated configuration. `now` anchors the
    /// mode-duration accounting.
    pub fn new(config: &ClimateConfig, now: Duration) -> Self {
        let t = &config.targets;
        info!("Hybrid control engine initialized");
        info!(
            "Temperature target: {}°C (range: {}-{}°C)",
            t.temp_target, t.temp_min, t.temp_max
        );
        info!(
            "Humidity target: {}% (range: {}-{}%)",
            t.humidity_target, t.humidity_min, t.humidity_max
        );

        Self {
            temp_target: t.temp_target,
            temp_min: t.temp_min,
            temp_max: t.temp_max,
            humidity_target: t.humidity_target,
            humidity_min: t.humidity_min,
            humidity_max: t.humidity_max,
            temp_hysteresis: config.control.temp_hysteresis,
            humidity_hysteresis: config.control.humidity_hysteresis,
            temp_rate_warning: t.temp_rate_warning,
            humidity_rate_warning: t.humidity_rate_warning,
            prediction_window_mins: config.control.prediction_window_mins,
            rate_window: Duration::from_secs_f32(config.control.rate_window_secs),
            spray_cooldown: Duration::from_secs_f32(config.actuators.spray_cooldown_secs),
            emergency_shutdown_temp: config.safety.emergency_shutdown_temp,
            presets: config.presets.clone(),
            history: ReadingHistory::new(config.control.history_samples),
            current_mode: CoolingMode::Idle,
            last_decision: None,
            started_at: now,
            last_mode_change: now,
            spray_last_activated: None,
            decisions_made: 0,
            mode_durations: [Duration::ZERO; CoolingMode::COUNT],
        }
    }

    // ── History & trends ──────────────────────────────────────

    /// Append a reading to the bounded history.
    pub fn add_reading(&mut self, temperature: f32, humidity: f32, now: Duration) {
        self.history.push(Reading {
            at: now,
            temperature,
            humidity,
        });
    }

    /// Temperature trend (°C/min) over the rate window, `None` if unknown.
    pub fn temp_rate(&self, now: Duration) -> Option<f32> {
        self.history.temp_rate_per_minute(now, self.rate_window)
    }

    /// Humidity trend (%/min) over the rate window, `None` if unknown.
    pub fn humidity_rate(&self, now: Duration) -> Option<f32> {
        self.history.humidity_rate_per_minute(now, self.rate_window)
    }

    /// Extrapolate a value along its trend. An unknown rate predicts no
    /// change.
    fn predict_future_value(current: f32, rate: Option<f32>, minutes_ahead: f32) -> f32 {
        match rate {
            Some(rate) => current + rate * minutes_ahead,
            None => current,
        }
    }

    // ── Assessment ────────────────────────────────────────────

    /// Assess the temperature situation: critical bands beat
    /// target-deviation bands beat predictive extrapolation. Values inside
    /// the hysteresis band are optimal regardless of instantaneous noise.
    pub fn assess_temperature(&self, temperature: f32, temp_rate: Option<f32>) -> Assessment {
        if temperature > self.temp_max + 2.0 {
            return Assessment::new("critically high", 10);
        }
        if temperature > self.temp_max {
            return Assessment::new("high", 8);
        }
        if temperature > self.temp_target + self.temp_hysteresis {
            return Assessment::new("above target", 6);
        }
        if temperature < self.temp_min {
            return Assessment::new("critically low", 9);
        }
        if temperature < self.temp_target - self.temp_hysteresis {
            return Assessment::new("below target", 3);
        }

        // Predictive tier: only reached while the current value is optimal.
        if let Some(rate) = temp_rate {
            if rate.abs() > self.temp_rate_warning {
                let future =
                    Self::predict_future_value(temperature, temp_rate, self.prediction_window_mins);
                if future > self.temp_max {
                    return Assessment::new(format!("rising rapidly (predicted {future:.1}°C)"), 7);
                }
                if future < self.temp_min {
                    return Assessment::new(
                        format!("falling rapidly (predicted {future:.1}°C)"),
                        4,
                    );
                }
            }
        }

        Assessment::new("optimal", 0)
    }

    /// Assess the humidity situation (same tier structure as temperature).
    pub fn assess_humidity(&self, humidity: f32, humidity_rate: Option<f32>) -> Assessment {
        if humidity > self.humidity_max + 5.0 {
            return Assessment::new("critically high", 9);
        }
        if humidity > self.humidity_max {
            return Assessment::new("high", 7);
        }
        if humidity > self.humidity_target + self.humidity_hysteresis {
            return Assessment::new("above target", 5);
        }
        if humidity < self.humidity_min {
            return Assessment::new("critically low", 8);
        }
        if humidity < self.humidity_target - self.humidity_hysteresis {
            return Assessment::new("below target", 4);
        }

        if let Some(rate) = humidity_rate {
            if rate.abs() > self.humidity_rate_warning {
                let future =
                    Self::predict_future_value(humidity, humidity_rate, self.prediction_window_mins);
                if future > self.humidity_max {
                    return Assessment::new(format!("rising rapidly (predicted {future:.1}%)"), 6);
                }
                if future < self.humidity_min {
                    return Assessment::new(format!("falling rapidly (predicted {future:.1}%)"), 5);
                }
            }
        }

        Assessment::new("optimal", 0)
    }

    /// True once the spray cooldown has elapsed since the pump last ran.
    pub fn can_spray_now(&self, now: Duration) -> bool {
        match self.spray_last_activated {
            Some(at) => now.saturating_sub(at) >= self.spray_cooldown,
            None => true,
        }
    }

    // ── Decision ──────────────────────────────────────────────

    /// The core policy: an ordered set of mutually exclusive rules, first
    /// match wins. Every branch embeds the triggering metric in its reason.
    pub fn decide(&mut self, temperature: f32, humidity: f32, now: Duration) -> Decision {
        self.add_reading(temperature, humidity, now);

        let temp_rate = self.temp_rate(now);
        let humidity_rate = self.humidity_rate(now);

        let temp = self.assess_temperature(temperature, temp_rate);
        let hum = self.assess_humidity(humidity, humidity_rate);

        debug!(
            "Temp: {temperature:.1}°C ({}, urgency={})",
            temp.label, temp.urgency
        );
        debug!(
            "Humidity: {humidity:.1}% ({}, urgency={})",
            hum.label, hum.urgency
        );

        // Rule 1: emergency temperature excursion — everything else is moot.
        if temperature > self.emergency_shutdown_temp {
            return Decision::new(
                CoolingMode::Emergency,
                format!(
                    "Emergency: temperature {temperature:.1}°C exceeds {}°C",
                    self.emergency_shutdown_temp
                ),
                10,
                now,
            );
        }

        // Rule 2: temperature critical — maximum cooling.
        if temp.urgency >= 8 {
            if humidity < self.humidity_max {
                // Evaporative assist is acceptable (adds humidity).
                return Decision::new(
                    CoolingMode::Chiller,
                    format!("Temperature {} - aggressive cooling with chiller", temp.label),
                    temp.urgency,
                    now,
                );
            }
            return Decision::new(
                CoolingMode::CoolAndDehumidify,
                format!(
                    "Temperature {}, humidity {} - chiller + dehumidifier",
                    temp.label, hum.label
                ),
                temp.urgency.max(hum.urgency),
                now,
            );
        }

        // Rule 3: humidity critical — dehumidify, escalating if the
        // temperature is elevated too.
        if hum.urgency >= 7 {
            if temp.urgency > 3 {
                return Decision::new(
                    CoolingMode::CoolAndDehumidify,
                    format!("Temperature {}, humidity {}", temp.label, hum.label),
                    temp.urgency.max(hum.urgency),
                    now,
                );
            }
            return Decision::new(
                CoolingMode::Dehumidify,
                format!("Humidity {} - dehumidifying", hum.label),
                hum.urgency,
                now,
            );
        }

        // Rule 4: moderate heat with humidity headroom — prefer the
        // energy-efficient evaporative path, gated on the spray cooldown.
        if temp.urgency >= 4 && humidity < self.humidity_max - 5.0 && self.can_spray_now(now) {
            return Decision::new(
                CoolingMode::Evaporative,
                format!(
                    "Temperature {} - energy-efficient evaporative cooling",
                    temp.label
                ),
                temp.urgency,
                now,
            );
        }

        // Rule 5: both drifting but manageable — conservative chiller use.
        if temp.urgency >= 3 && hum.urgency >= 3 {
            return Decision::new(
                CoolingMode::Chiller,
                format!(
                    "Temperature {}, humidity {} - moderate cooling",
                    temp.label, hum.label
                ),
                temp.urgency.max(hum.urgency),
                now,
            );
        }

        // Rule 6: predictive pre-emption on a rising temperature trend.
        if let Some(rate) = temp_rate {
            if rate > self.temp_rate_warning && humidity < self.humidity_max - 3.0 {
                return Decision::new(
                    CoolingMode::Evaporative,
                    format!("Predictive: temperature rising at {rate:.2}°C/min"),
                    5,
                    now,
                );
            }
        }

        // Rule 7: all good.
        Decision::new(
            CoolingMode::Idle,
            format!(
                "Conditions optimal (temp {}, humidity {})",
                temp.label, hum.label
            ),
            0,
            now,
        )
    }

    /// Record an executed decision: mode-duration accounting, decision
    /// counter, spray-cooldown restart. The engine's `current_mode` changes
    /// only here.
    pub fn execute(&mut self, decision: &Decision, now: Duration) {
        if self.current_mode != decision.mode {
            let elapsed = now.saturating_sub(self.last_mode_change);
            self.mode_durations[self.current_mode.index()] += elapsed;
            self.last_mode_change = now;

            info!("Mode change: {} -> {}", self.current_mode, decision.mode);
            info!("Reason: {}", decision.reason);
        }

        self.current_mode = decision.mode;
        self.last_decision = Some(decision.clone());
        self.decisions_made += 1;

        if decision.targets.pump {
            // Cooldown window restarts from the last activation, not from
            // the request time.
            self.spray_last_activated = Some(now);
        }
    }

    // ── Setpoints & presets ───────────────────────────────────

    /// Update target temperature and/or humidity. Invalid setpoints are
    /// rejected without mutating anything.
    pub fn set_targets(
        &mut self,
        temp_target: Option<f32>,
        humidity_target: Option<f32>,
    ) -> Result<(), ConfigError> {
        if let Some(t) = temp_target {
            if !t.is_finite() || !TEMP_SETPOINT_RANGE.contains(&t) {
                return Err(ConfigError::InvalidSetpoint);
            }
        }
        if let Some(h) = humidity_target {
            if !h.is_finite() || !HUMIDITY_SETPOINT_RANGE.contains(&h) {
                return Err(ConfigError::InvalidSetpoint);
            }
        }

        if let Some(t) = temp_target {
            self.temp_target = t;
            info!("Temperature target updated to {t}°C");
        }
        if let Some(h) = humidity_target {
            self.humidity_target = h;
            info!("Humidity target updated to {h}%");
        }
        Ok(())
    }

    /// Load a produce-type preset. Returns `false` for an unknown name,
    /// leaving all setpoints unchanged.
    pub fn load_preset(&mut self, name: &str) -> bool {
        let Some(preset) = self.presets.get(name).cloned() else {
            warn!("Preset '{name}' not found");
            return false;
        };
        if self
            .set_targets(Some(preset.temp_target), Some(preset.humidity_target))
            .is_err()
        {
            warn!("Preset '{name}' holds invalid setpoints - ignored");
            return false;
        }
        info!("Loaded preset: {name}");
        true
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn current_mode(&self) -> CoolingMode {
        self.current_mode
    }

    pub fn last_decision(&self) -> Option<&Decision> {
        self.last_decision.as_ref()
    }

    pub fn decisions_made(&self) -> u64 {
        self.decisions_made
    }

    /// Statistics snapshot. Per-mode durations include the still-open
    /// interval of the current mode; summed over all modes they equal the
    /// wall time since engine construction.
    pub fn statistics(&self, now: Duration) -> Statistics {
        let open_interval = now.saturating_sub(self.last_mode_change);
        let total = now.saturating_sub(self.started_at);

        let modes = CoolingMode::ALL.map(|mode| {
            let mut duration = self.mode_durations[mode.index()];
            if mode == self.current_mode {
                duration += open_interval;
            }
            let percentage = if total > Duration::ZERO {
                duration.as_secs_f32() / total.as_secs_f32() * 100.0
            } else {
                0.0
            };
            ModeStats {
                mode,
                duration,
                percentage,
            }
        });

        Statistics {
            current_mode: self.current_mode,
            decisions_made: self.decisions_made,
            readings_in_history: self.history.len(),
            modes,
            temp_target: self.temp_target,
            humidity_target: self.humidity_target,
        }
    }
}
