//! Relay-board output adapter over `embedded-hal` pins.
//!
//! Most relay boards are active-low: driving the pin LOW energizes the
//! relay. The polarity is handled here so the rest of the system only
//! thinks in logical on/off.

use embedded_hal::digital::OutputPin;
use log::debug;

use crate::actuators::OutputId;
use crate::app::ports::OutputPort;
use crate::error::ActuatorError;

/// One relay channel wrapping an output pin with its polarity.
pub struct Relay<P: OutputPin> {
    pin: P,
    active_low: bool,
}

impl<P: OutputPin> Relay<P> {
    pub fn new(pin: P, active_low: bool) -> Self {
        Self { pin, active_low }
    }

    /// Drive the relay to the logical state.
    pub fn set(&mut self, on: bool) -> Result<(), ActuatorError> {
        let high = on != self.active_low;
        let result = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|_| ActuatorError::WriteFailed)
    }
}

/// The three-channel relay board implementing the output port.
pub struct RelayBoard<P1, P2, P3>
where
    P1: OutputPin,
    P2: OutputPin,
    P3: OutputPin,
{
    pump: Relay<P1>,
    chiller: Relay<P2>,
    dehumidifier: Relay<P3>,
}

impl<P1, P2, P3> RelayBoard<P1, P2, P3>
where
    P1: OutputPin,
    P2: OutputPin,
    P3: OutputPin,
{
    /// Build the board and drive every channel to the de-energized state.
    pub fn new(
        pump: Relay<P1>,
        chiller: Relay<P2>,
        dehumidifier: Relay<P3>,
    ) -> Result<Self, ActuatorError> {
        let mut board = Self {
            pump,
            chiller,
            dehumidifier,
        };
        board.pump.set(false)?;
        board.chiller.set(false)?;
        board.dehumidifier.set(false)?;
        Ok(board)
    }
}

impl<P1, P2, P3> OutputPort for RelayBoard<P1, P2, P3>
where
    P1: OutputPin,
    P2: OutputPin,
    P3: OutputPin,
{
    fn set_output(&mut self, id: OutputId, on: bool) -> Result<(), ActuatorError> {
        debug!("relay {id}: {}", if on { "energize" } else { "release" });
        match id {
            OutputId::Pump => self.pump.set(on),
            OutputId::Chiller => self.chiller.set(on),
            OutputId::Dehumidifier => self.dehumidifier.set(on),
        }
    }
}
