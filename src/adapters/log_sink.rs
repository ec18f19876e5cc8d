//! Event sink that forwards application events to the `log` facade.

use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Default sink for the binary: every event becomes a log line at a
/// severity matching its weight.
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::CycleCompleted(report) => {
                debug!(
                    "cycle @{:.0}s: {:.1}°C {:.1}% -> {} (p{}) pump={} chiller={} dehum={}",
                    report.at.as_secs_f32(),
                    report.reading.temperature,
                    report.reading.humidity,
                    report.mode,
                    report.priority,
                    report.applied.pump,
                    report.applied.chiller,
                    report.applied.dehumidifier,
                );
            }
            AppEvent::ModeChanged { from, to, reason } => {
                info!("mode {from} -> {to}: {reason}");
            }
            AppEvent::SensorFault {
                error,
                consecutive_failures,
            } => {
                warn!("sensor fault ({error}), {consecutive_failures} consecutive");
            }
            AppEvent::SafetyIntervention { at } => {
                warn!("safety sweep intervened @{:.0}s", at.as_secs_f32());
            }
            AppEvent::EmergencyShutdown { reason, at } => {
                error!("EMERGENCY SHUTDOWN ({reason:?}) @{:.0}s", at.as_secs_f32());
            }
            AppEvent::OverrideChanged { active } => {
                info!(
                    "manual override {}",
                    if *active { "active" } else { "cleared" }
                );
            }
            AppEvent::PresetLoaded { name } => info!("preset loaded: {name}"),
            AppEvent::FaultReset { id } => info!("fault reset: {id}"),
        }
    }
}
