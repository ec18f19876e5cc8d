//! Driven adapters behind the application ports.

pub mod log_sink;
pub mod relay;
pub mod sim;
pub mod time;
