//! Application layer: service orchestration, commands, events, and the
//! port traits the adapters implement.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
