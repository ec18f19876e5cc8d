//! Simulated compartment for desktop runs and integration tests.
//!
//! A deliberately simple first-order model: temperature and humidity relax
//! toward ambient through the insulation, and each actuator contributes a
//! fixed rate while on. Good enough to exercise every decision path and the
//! interlocks without hardware.

use std::time::Duration;

use log::trace;

use crate::actuators::OutputId;
use crate::app::ports::{ClimateReading, OutputPort, SensorPort, WaterLevelPort};
use crate::error::{ActuatorError, SensorError};

pub struct SimulatedCompartment {
    temperature: f32,
    humidity: f32,
    ambient_temp: f32,
    ambient_humidity: f32,

    pump_on: bool,
    chiller_on: bool,
    dehumidifier_on: bool,

    /// Fraction of reservoir remaining, 1.0 = full.
    water_level: f32,
    /// Force the next `fail_reads` sensor reads to fail.
    fail_reads: u32,
}

// Per-second rates for the toy thermal model. The chiller pull and spray
// humidification must exceed the worst-case leak toward ambient (24 °C,
// 60 %RH at LEAK_RATE), or the actuators can stall at equilibrium inside
// the operating range.
const LEAK_RATE: f32 = 0.002;
const CHILLER_PULL_C_PER_S: f32 = 0.05;
const EVAP_PULL_C_PER_S: f32 = 0.008;
const EVAP_HUMIDIFY_PCT_PER_S: f32 = 0.08;
const DEHUMIDIFY_PCT_PER_S: f32 = 0.05;
const PUMP_DRAIN_PER_S: f32 = 0.0005;
const WATER_LOW_THRESHOLD: f32 = 0.1;

impl SimulatedCompartment {
    pub fn new(temperature: f32, humidity: f32) -> Self {
        Self {
            temperature,
            humidity,
            ambient_temp: 24.0,
            ambient_humidity: 60.0,
            pump_on: false,
            chiller_on: false,
            dehumidifier_on: false,
            water_level: 1.0,
            fail_reads: 0,
        }
    }

    /// Advance the physics by `dt`.
    pub fn step(&mut self, dt: Duration) {
        let s = dt.as_secs_f32();

        let mut dtemp = (self.ambient_temp - self.temperature) * LEAK_RATE * s;
        let mut dhum = (self.ambient_humidity - self.humidity) * LEAK_RATE * s;

        if self.chiller_on {
            dtemp -= CHILLER_PULL_C_PER_S * s;
        }
        if self.pump_on && self.water_level > 0.0 {
            dtemp -= EVAP_PULL_C_PER_S * s;
            dhum += EVAP_HUMIDIFY_PCT_PER_S * s;
            self.water_level = (self.water_level - PUMP_DRAIN_PER_S * s).max(0.0);
        }
        if self.dehumidifier_on {
            dhum -= DEHUMIDIFY_PCT_PER_S * s;
        }

        self.temperature += dtemp;
        self.humidity = (self.humidity + dhum).clamp(0.0, 100.0);
        trace!(
            "sim: {:.2}°C {:.1}% water={:.2}",
            self.temperature, self.humidity, self.water_level
        );
    }

    pub fn set_ambient(&mut self, temperature: f32, humidity: f32) {
        self.ambient_temp = temperature;
        self.ambient_humidity = humidity;
    }

    pub fn set_conditions(&mut self, temperature: f32, humidity: f32) {
        self.temperature = temperature;
        self.humidity = humidity;
    }

    pub fn set_water_level(&mut self, level: f32) {
        self.water_level = level.clamp(0.0, 1.0);
    }

    pub fn fail_next_reads(&mut self, count: u32) {
        self.fail_reads = count;
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn humidity(&self) -> f32 {
        self.humidity
    }
}

impl SensorPort for SimulatedCompartment {
    fn read(&mut self) -> Result<ClimateReading, SensorError> {
        if self.fail_reads > 0 {
            self.fail_reads -= 1;
            return Err(SensorError::ReadFailed);
        }
        Ok(ClimateReading {
            temperature: self.temperature,
            humidity: self.humidity,
        })
    }
}

impl OutputPort for SimulatedCompartment {
    fn set_output(&mut self, id: OutputId, on: bool) -> Result<(), ActuatorError> {
        match id {
            OutputId::Pump => self.pump_on = on,
            OutputId::Chiller => self.chiller_on = on,
            OutputId::Dehumidifier => self.dehumidifier_on = on,
        }
        Ok(())
    }
}

impl WaterLevelPort for SimulatedCompartment {
    fn read_water_level(&mut self) -> Option<bool> {
        Some(self.water_level > WATER_LOW_THRESHOLD)
    }
}
