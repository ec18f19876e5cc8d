//! ColdBox control loop binary.
//!
//! Runs the climate service against the simulated compartment at the
//! configured cycle interval. On real hardware the simulator is replaced by
//! the relay-board and sensor adapters; everything above the ports is
//! identical.
//!
//! Usage: `coldbox [--config FILE] [--cycles N] [--preset NAME]`

use std::time::Duration;

use anyhow::{Context, bail};
use log::{error, info, warn};

use coldbox::adapters::log_sink::LogEventSink;
use coldbox::adapters::sim::SimulatedCompartment;
use coldbox::adapters::time::MonotonicClock;
use coldbox::app::commands::AppCommand;
use coldbox::app::ports::Clock;
use coldbox::app::service::{ClimateService, CycleOutcome};
use coldbox::{ClimateConfig, Error};

struct Args {
    config: Option<String>,
    cycles: Option<u64>,
    preset: Option<String>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args {
        config: None,
        cycles: None,
        preset: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(iter.next().context("--config needs a path")?),
            "--cycles" => {
                args.cycles = Some(
                    iter.next()
                        .context("--cycles needs a count")?
                        .parse()
                        .context("--cycles must be an integer")?,
                );
            }
            "--preset" => args.preset = Some(iter.next().context("--preset needs a name")?),
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

fn load_config(path: Option<&str>) -> anyhow::Result<ClimateConfig> {
    let config = match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {path}"))?;
            ClimateConfig::from_json_str(&json).map_err(Error::from)?
        }
        None => ClimateConfig::default(),
    };
    config.validate().map_err(Error::from)?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;
    let config = load_config(args.config.as_deref())?;
    let interval = Duration::from_secs_f32(config.control.cycle_interval_secs);

    info!("ColdBox starting, cycle interval {:.1}s", interval.as_secs_f32());

    let clock = MonotonicClock::new();
    // Start warm and humid so the controller has work to do.
    let mut hw = SimulatedCompartment::new(13.5, 91.0);
    let mut sink = LogEventSink;
    let mut service = ClimateService::new(&config, clock.now());

    if let Some(preset) = args.preset {
        service
            .handle_command(AppCommand::LoadPreset(preset), &mut hw, &mut sink, clock.now())
            .map_err(anyhow::Error::from)?;
    }

    let mut cycles = 0u64;
    loop {
        let cycle_start = clock.now();
        hw.step(interval);

        if service.run_cycle(&mut hw, &mut sink, clock.now()) == CycleOutcome::Shutdown {
            error!("Emergency shutdown latched - exiting control loop");
            break;
        }

        cycles += 1;
        if args.cycles.is_some_and(|budget| cycles >= budget) {
            info!("Cycle budget reached ({cycles} cycles)");
            break;
        }

        let elapsed = clock.now().saturating_sub(cycle_start);
        if elapsed > interval {
            warn!(
                "Control cycle overran its interval ({:.2}s > {:.2}s)",
                elapsed.as_secs_f32(),
                interval.as_secs_f32()
            );
        } else {
            std::thread::sleep(interval - elapsed);
        }
    }

    let now = clock.now();
    service.shutdown(&mut hw, now);

    let status = service.status(now);
    info!(
        "Final: mode={}, {} decisions, {} readings",
        status.engine.current_mode, status.engine.decisions_made, status.engine.readings_in_history
    );
    for mode_stats in &status.engine.modes {
        info!(
            "  {}: {:.0}s ({:.1}%)",
            mode_stats.mode,
            mode_stats.duration.as_secs_f32(),
            mode_stats.percentage
        );
    }

    Ok(())
}
