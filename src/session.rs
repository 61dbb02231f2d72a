//! One harness run: a sketch thread plus the host loop that records its
//! snapshots and stops it once enough simulated time has passed.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use serde::Serialize;

use esplora_mcu::{Sketch, spawn_sketch};
use esplora_shared::config::SimConfig;
use esplora_simulator::Device;

use crate::error::HarnessError;
use crate::trace::TraceWriter;

/// Simulated time a run gets when neither the CLI nor the config bounds it.
pub const DEFAULT_MAX_MICROS: u64 = 1_000_000;

pub const SUMMARY_FILE: &str = "summary.json";
pub const EFFECTIVE_CONFIG_FILE: &str = "effective_config.toml";

/// How often the host loop wakes when no snapshot arrives.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Value returned by every `random()` call, for at most `draws` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForcedRandom {
    pub value: i64,
    /// Negative means no limit.
    pub draws: i64,
}

impl std::str::FromStr for ForcedRandom {
    type Err = HarnessError;

    /// Parses `value:draws`, or a bare `value` with no draw limit.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || HarnessError::InvalidArgument(format!("expected VALUE[:DRAWS], got '{s}'"));
        let (value, draws) = match s.split_once(':') {
            Some((value, draws)) => (value, Some(draws)),
            None => (s, None),
        };
        let value = value.trim().parse().map_err(|_| invalid())?;
        let draws = match draws {
            Some(d) => d.trim().parse().map_err(|_| invalid())?,
            None => -1,
        };
        Ok(Self { value, draws })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub max_micros: Option<u64>,
    pub max_iterations: Option<u64>,
    pub force_random: Option<ForcedRandom>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub scenario: String,
    pub iterations: u64,
    pub elapsed_us: u64,
    pub snapshots: usize,
    pub saw_final_snapshot: bool,
    pub serial: String,
    pub random_budget_exceeded: bool,
    pub failure: Option<(String, String)>,
}

impl SessionReport {
    pub fn write_json(&self, dir: impl AsRef<Path>) -> Result<(), HarnessError> {
        let file = std::fs::File::create(dir.as_ref().join(SUMMARY_FILE))?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

/// Record the configuration a run actually used next to its trace.
pub fn write_effective_config(config: &SimConfig, dir: impl AsRef<Path>) -> Result<(), HarnessError> {
    let text = toml::to_string_pretty(config)?;
    std::fs::write(dir.as_ref().join(EFFECTIVE_CONFIG_FILE), text)?;
    Ok(())
}

/// Run `sketch` on a fresh device until it has used up its simulated time.
///
/// The limit is `options.max_micros`, else the config's `max_micros`, else
/// [`DEFAULT_MAX_MICROS`]. Every snapshot the device publishes goes to `trace`.
pub fn run_session(
    config: &SimConfig,
    sketch: Box<dyn Sketch>,
    options: &SessionOptions,
    trace: &mut TraceWriter,
) -> Result<SessionReport, HarnessError> {
    let scenario = sketch.name().to_string();
    let max_micros = options
        .max_micros
        .or(config.simulation.max_micros)
        .unwrap_or(DEFAULT_MAX_MICROS);

    let device = Arc::new(Device::new(config));
    if let Some(forced) = options.force_random {
        device.injector().set_forced_value(forced.value, forced.draws);
    }
    let snapshots = device.subscribe();
    tracing::info!(%scenario, max_micros, "session started");
    let handle = spawn_sketch(Arc::clone(&device), sketch, options.max_iterations)?;

    let mut shutdown_sent = false;
    let mut saw_final = false;
    loop {
        match snapshots.recv_timeout(POLL_INTERVAL) {
            Ok(snap) => {
                trace.write(&snap)?;
                if snap.is_final {
                    saw_final = true;
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) if handle.is_finished() => {
                // the sketch returned on its own; keep what it published last
                for snap in snapshots.try_iter() {
                    saw_final |= snap.is_final;
                    trace.write(&snap)?;
                }
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
        if !shutdown_sent && device.elapsed_us() >= max_micros {
            tracing::info!(elapsed_us = device.elapsed_us(), "time limit reached, stopping sketch");
            device.request_shutdown();
            shutdown_sent = true;
        }
    }

    let summary = handle.join().map_err(|_| HarnessError::SketchPanicked)?;
    let random_budget_exceeded = device.injector().has_exceeded_budget();
    if random_budget_exceeded {
        tracing::warn!("sketch drew more random values than were forced");
    }
    let report = SessionReport {
        scenario,
        iterations: summary.iterations,
        elapsed_us: summary.elapsed_us,
        snapshots: trace.rows(),
        saw_final_snapshot: saw_final,
        serial: summary.serial,
        random_budget_exceeded,
        failure: device.failure().get().map(|f| (f.category, f.message)),
    };
    tracing::info!(
        scenario = %report.scenario,
        iterations = report.iterations,
        elapsed_us = report.elapsed_us,
        snapshots = report.snapshots,
        "session finished"
    );
    Ok(report)
}
