//! System configuration parameters
//!
//! All tunable parameters for the ColdBox system, grouped by concern and
//! validated once at startup. Defaults are the mango-storage profile
//! (50–54 °F, 85–90 % RH). Values can be overridden from a JSON file at
//! boot; there is no process-wide mutable settings module.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::history::MAX_HISTORY_SAMPLES;
use crate::error::ConfigError;

/// Core system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimateConfig {
    pub targets: Targets,
    pub control: ControlTuning,
    pub actuators: ActuatorTiming,
    pub gpio: GpioPins,
    pub safety: SafetyLimits,
    /// Produce-type presets selectable at runtime by name.
    #[serde(default = "default_presets")]
    pub presets: BTreeMap<String, Preset>,
}

/// Target compartment conditions and trend-warning thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Targets {
    /// Lower temperature bound (°C).
    pub temp_min: f32,
    /// Optimal temperature (°C).
    pub temp_target: f32,
    /// Upper temperature bound (°C).
    pub temp_max: f32,
    /// Lower humidity bound (%RH).
    pub humidity_min: f32,
    /// Optimal humidity (%RH).
    pub humidity_target: f32,
    /// Upper humidity bound (%RH).
    pub humidity_max: f32,
    /// Rate-of-change warning threshold (°C per minute).
    pub temp_rate_warning: f32,
    /// Rate-of-change warning threshold (% per minute).
    pub humidity_rate_warning: f32,
}

/// Decision-engine tunables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ControlTuning {
    /// Temperature tolerance band around target (°C) — prevents oscillation.
    pub temp_hysteresis: f32,
    /// Humidity tolerance band around target (%) — prevents oscillation.
    pub humidity_hysteresis: f32,
    /// How far ahead the predictive tier extrapolates (minutes).
    pub prediction_window_mins: f32,
    /// Number of readings retained for trend analysis.
    pub history_samples: usize,
    /// Time window over which rates of change are computed (seconds).
    pub rate_window_secs: f32,
    /// Control loop interval (seconds).
    pub cycle_interval_secs: f32,
}

/// Per-actuator cycle and runtime protection bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ActuatorTiming {
    /// Minimum seconds between state changes of one actuator.
    pub min_cycle_secs: f32,
    /// Maximum continuous pump runtime (seconds).
    pub max_pump_runtime_secs: f32,
    /// Maximum continuous chiller runtime (seconds).
    pub max_chiller_runtime_secs: f32,
    /// Maximum continuous dehumidifier runtime (seconds).
    pub max_dehumidifier_runtime_secs: f32,
    /// Minimum seconds between evaporative spray activations.
    pub spray_cooldown_secs: f32,
}

/// BCM pin assignments for the relay board and water-level input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GpioPins {
    pub water_pump: u8,
    pub chiller: u8,
    pub dehumidifier: u8,
    pub water_level_sensor: u8,
}

/// Safety interlock configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SafetyLimits {
    /// Gate the pump on the water-level input.
    pub water_level_check_enabled: bool,
    /// Treat an unavailable water-level reading as adequate.
    /// Fail-open by configuration, never by default.
    pub water_level_fail_open: bool,
    /// Compartment temperature (°C) above which the engine decides EMERGENCY.
    pub emergency_shutdown_temp: f32,
    /// Seconds without a good sensor reading before emergency shutdown.
    pub sensor_timeout_secs: f32,
    /// Accept manual-override commands from the external interface.
    pub manual_override_enabled: bool,
}

/// A produce-type preset: target setpoints loadable by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preset {
    pub temp_target: f32,
    pub humidity_target: f32,
    pub description: String,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            targets: Targets {
                // Mango storage: 50–54 °F
                temp_min: 10.0,
                temp_target: 11.0,
                temp_max: 12.2,
                humidity_min: 85.0,
                humidity_target: 87.5,
                humidity_max: 90.0,
                temp_rate_warning: 0.5,
                humidity_rate_warning: 2.0,
            },
            control: ControlTuning {
                temp_hysteresis: 0.5,
                humidity_hysteresis: 2.0,
                prediction_window_mins: 5.0,
                history_samples: 20,
                rate_window_secs: 60.0,
                cycle_interval_secs: 2.0,
            },
            actuators: ActuatorTiming {
                min_cycle_secs: 10.0,
                max_pump_runtime_secs: 600.0,       // 10 minutes
                max_chiller_runtime_secs: 1800.0,   // 30 minutes
                max_dehumidifier_runtime_secs: 1200.0, // 20 minutes
                spray_cooldown_secs: 30.0,
            },
            gpio: GpioPins {
                water_pump: 17,
                chiller: 27,
                dehumidifier: 22,
                water_level_sensor: 23,
            },
            safety: SafetyLimits {
                water_level_check_enabled: true,
                water_level_fail_open: false,
                emergency_shutdown_temp: 15.0,
                sensor_timeout_secs: 30.0,
                manual_override_enabled: true,
            },
            presets: default_presets(),
        }
    }
}

impl ClimateConfig {
    /// Parse a configuration from JSON. The result still needs `validate()`.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|_| ConfigError::Invalid("malformed config JSON"))
    }

    /// Validate cross-field invariants. Missing or inconsistent values fail
    /// fast here rather than surfacing deep inside decision logic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.targets;
        if !(t.temp_min < t.temp_target && t.temp_target < t.temp_max) {
            return Err(ConfigError::Invalid(
                "temperature targets must satisfy min < target < max",
            ));
        }
        if !(t.humidity_min < t.humidity_target && t.humidity_target < t.humidity_max) {
            return Err(ConfigError::Invalid(
                "humidity targets must satisfy min < target < max",
            ));
        }
        if t.temp_rate_warning <= 0.0 || t.humidity_rate_warning <= 0.0 {
            return Err(ConfigError::Invalid("rate warnings must be positive"));
        }

        let c = &self.control;
        if c.temp_hysteresis <= 0.0 || c.humidity_hysteresis <= 0.0 {
            return Err(ConfigError::Invalid("hysteresis bands must be positive"));
        }
        if c.prediction_window_mins <= 0.0 {
            return Err(ConfigError::Invalid("prediction window must be positive"));
        }
        if c.history_samples < 2 || c.history_samples > MAX_HISTORY_SAMPLES {
            return Err(ConfigError::Invalid("history_samples out of range"));
        }
        if c.rate_window_secs < 1.0 {
            return Err(ConfigError::Invalid("rate window must be at least 1 s"));
        }
        if c.cycle_interval_secs <= 0.0 {
            return Err(ConfigError::Invalid("cycle interval must be positive"));
        }

        let a = &self.actuators;
        if a.min_cycle_secs <= 0.0 {
            return Err(ConfigError::Invalid("min cycle time must be positive"));
        }
        if a.max_pump_runtime_secs <= 0.0
            || a.max_chiller_runtime_secs <= 0.0
            || a.max_dehumidifier_runtime_secs <= 0.0
        {
            return Err(ConfigError::Invalid("max runtimes must be positive"));
        }
        if a.spray_cooldown_secs < 0.0 {
            return Err(ConfigError::Invalid("spray cooldown must not be negative"));
        }

        let s = &self.safety;
        if s.emergency_shutdown_temp <= t.temp_max {
            return Err(ConfigError::Invalid(
                "emergency shutdown temperature must exceed temp_max",
            ));
        }
        if s.sensor_timeout_secs < c.cycle_interval_secs {
            return Err(ConfigError::Invalid(
                "sensor timeout must cover at least one control interval",
            ));
        }

        for (name, p) in &self.presets {
            if !p.temp_target.is_finite() || !p.humidity_target.is_finite() {
                let _ = name;
                return Err(ConfigError::Invalid("preset contains non-finite setpoint"));
            }
        }

        Ok(())
    }
}

fn default_presets() -> BTreeMap<String, Preset> {
    let mut presets = BTreeMap::new();
    presets.insert(
        "mango".to_owned(),
        Preset {
            temp_target: 11.0,
            humidity_target: 87.5,
            description: "Mango optimal storage: 50-54°F (10-12.2°C), 85-90% RH".to_owned(),
        },
    );
    presets.insert(
        "leafy_greens".to_owned(),
        Preset {
            temp_target: 4.0,
            humidity_target: 95.0,
            description: "Leafy greens storage".to_owned(),
        },
    );
    presets.insert(
        "berries".to_owned(),
        Preset {
            temp_target: 2.0,
            humidity_target: 90.0,
            description: "Berries storage".to_owned(),
        },
    );
    presets.insert(
        "tomatoes".to_owned(),
        Preset {
            temp_target: 13.0,
            humidity_target: 85.0,
            description: "Tomatoes storage".to_owned(),
        },
    );
    presets.insert(
        "citrus".to_owned(),
        Preset {
            temp_target: 8.0,
            humidity_target: 85.0,
            description: "Citrus storage".to_owned(),
        },
    );
    presets
}
