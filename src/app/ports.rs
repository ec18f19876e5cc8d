//! Port traits — the hexagonal boundary between the control core and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ClimateService (domain)
//! ```
//!
//! Driven adapters (the compartment sensor, the relay board, the water-level
//! input, event sinks, clocks) implement these traits. The domain consumes
//! them via generics, so the core never touches hardware directly and every
//! time gate is testable with an injected clock.

use std::time::Duration;

use crate::actuators::OutputId;
use crate::error::{ActuatorError, SensorError};

// ───────────────────────────────────────────────────────────────
// Clock port (monotonic time)
// ───────────────────────────────────────────────────────────────

/// Monotonic time source. `now()` is a duration since an arbitrary fixed
/// origin (boot); it never goes backwards.
pub trait Clock {
    fn now(&self) -> Duration;
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// One validated compartment reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    /// Compartment temperature (°C).
    pub temperature: f32,
    /// Relative humidity (%RH).
    pub humidity: f32,
}

/// Read-side port for the temperature/humidity sensor.
///
/// Transport details (I2C, CRC-8 validation, plausibility filtering) live
/// behind this trait. A failed read means "skip this cycle" — the core
/// never invents a value.
pub trait SensorPort {
    fn read(&mut self) -> Result<ClimateReading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Output port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the three relay outputs.
///
/// A write failure transitions the owning actuator to FAULT inside the
/// core; the core does not retry writes itself.
pub trait OutputPort {
    fn set_output(&mut self, id: OutputId, on: bool) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Water-level port
// ───────────────────────────────────────────────────────────────

/// Water reservoir level input.
///
/// `Some(true)` = adequate, `Some(false)` = low, `None` = sensor
/// unavailable (the bank then fails open or closed per configuration).
pub trait WaterLevelPort {
    fn read_water_level(&mut self) -> Option<bool>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port after every cycle. Fire-and-forget: the API is
/// infallible, so a broken sink can never block or abort the control
/// cycle.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
