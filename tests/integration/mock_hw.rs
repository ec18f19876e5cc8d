//! Shared hardware and sink doubles for the integration tests.

use coldbox::actuators::OutputId;
use coldbox::app::events::AppEvent;
use coldbox::app::ports::{ClimateReading, EventSink, OutputPort, SensorPort, WaterLevelPort};
use coldbox::error::{ActuatorError, SensorError};

/// Scriptable hardware double: fixed sensor reading, settable water level,
/// optional per-output write failure, and a full call trace.
pub struct MockHw {
    pub sensor: Result<ClimateReading, SensorError>,
    pub water: Option<bool>,
    pub fail_output: Option<OutputId>,
    /// Every `set_output` call in order.
    pub output_calls: Vec<(OutputId, bool)>,
    pump_on: bool,
    chiller_on: bool,
    dehumidifier_on: bool,
}

impl MockHw {
    pub fn new(temperature: f32, humidity: f32) -> Self {
        Self {
            sensor: Ok(ClimateReading {
                temperature,
                humidity,
            }),
            water: Some(true),
            fail_output: None,
            output_calls: Vec::new(),
            pump_on: false,
            chiller_on: false,
            dehumidifier_on: false,
        }
    }

    pub fn set_reading(&mut self, temperature: f32, humidity: f32) {
        self.sensor = Ok(ClimateReading {
            temperature,
            humidity,
        });
    }

    pub fn fail_sensor(&mut self) {
        self.sensor = Err(SensorError::ReadFailed);
    }

    pub fn is_on(&self, id: OutputId) -> bool {
        match id {
            OutputId::Pump => self.pump_on,
            OutputId::Chiller => self.chiller_on,
            OutputId::Dehumidifier => self.dehumidifier_on,
        }
    }

    pub fn all_off(&self) -> bool {
        !self.pump_on && !self.chiller_on && !self.dehumidifier_on
    }
}

impl SensorPort for MockHw {
    fn read(&mut self) -> Result<ClimateReading, SensorError> {
        self.sensor
    }
}

impl OutputPort for MockHw {
    fn set_output(&mut self, id: OutputId, on: bool) -> Result<(), ActuatorError> {
        if self.fail_output == Some(id) && on {
            return Err(ActuatorError::WriteFailed);
        }
        self.output_calls.push((id, on));
        match id {
            OutputId::Pump => self.pump_on = on,
            OutputId::Chiller => self.chiller_on = on,
            OutputId::Dehumidifier => self.dehumidifier_on = on,
        }
        Ok(())
    }
}

impl WaterLevelPort for MockHw {
    fn read_water_level(&mut self) -> Option<bool> {
        self.water
    }
}

/// Sink that records every emitted event for assertions.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count<F: Fn(&AppEvent) -> bool>(&self, pred: F) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
