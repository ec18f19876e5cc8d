//! ColdBox climate-control firmware.
//!
//! Decision-and-actuation core for a refrigerated produce compartment:
//! keeps temperature and humidity inside produce-specific target bands by
//! driving a water pump (evaporative cooling), a chiller, and a
//! dehumidifier through relays.
//!
//! Layout follows a hexagonal layering:
//!
//! - [`engine`] — pure decision logic: reading history, trend estimation,
//!   and the rule cascade that picks a [`engine::decision::CoolingMode`].
//! - [`actuators`] — per-actuator state machines with anti-short-cycling
//!   and runtime caps, plus the [`actuators::bank::ActuatorBank`] with the
//!   water interlock, safety sweep, and emergency shutdown.
//! - [`app`] — the [`app::service::ClimateService`] orchestrating one
//!   control cycle, the port traits, commands and events.
//! - [`adapters`] — implementations of the ports: relay board, simulator,
//!   clocks, log sink.
//!
//! The core is hardware-free and time is an explicit parameter everywhere,
//! so every gate and every decision path is testable deterministically.

pub mod actuators;
pub mod adapters;
pub mod app;
pub mod config;
pub mod engine;
pub mod error;

pub use config::ClimateConfig;
pub use error::{Error, Result};
