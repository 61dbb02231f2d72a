//! Snapshot trace output: one CSV row per snapshot, optionally full JSONL

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::Writer;
use serde::Serialize;

use esplora_shared::{DeviceSnapshot, MuxChannel, PinState};

use crate::error::HarnessError;

pub const CSV_FILE: &str = "trace.csv";
pub const JSONL_FILE: &str = "trace.jsonl";

/// Flattened view of a snapshot for the CSV trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRecord {
    pub elapsed_us: u64,
    pub running: bool,
    pub is_final: bool,
    /// Space-separated pins driven high.
    pub high_pins: String,
    /// `pin:high/period` for every pin running PWM.
    pub pwm: String,
    /// `pin:period` for every pin playing a tone.
    pub tones: String,
    /// Space-separated raw readings of all mux channels, in channel order.
    pub mux: String,
}

impl From<&DeviceSnapshot> for SnapshotRecord {
    fn from(snap: &DeviceSnapshot) -> Self {
        let join = |parts: Vec<String>| parts.join(" ");
        let high_pins: Vec<String> = snap
            .pins
            .iter()
            .filter(|p| p.state == PinState::OutputHigh)
            .map(|p| p.index.to_string())
            .collect();
        let pwm: Vec<String> = snap
            .pins
            .iter()
            .filter(|p| p.state == PinState::OutputPwm && !p.is_tone_active)
            .map(|p| format!("{}:{}/{}", p.index, p.pwm_high_time_us, p.pwm_period_us))
            .collect();
        let tones: Vec<String> = snap
            .active_tones()
            .map(|p| format!("{}:{}", p.index, p.pwm_period_us))
            .collect();
        let mux: Vec<String> = MuxChannel::ALL
            .iter()
            .filter_map(|&channel| snap.mux_value(channel))
            .map(|value| value.to_string())
            .collect();
        Self {
            elapsed_us: snap.elapsed_us,
            running: snap.running,
            is_final: snap.is_final,
            high_pins: join(high_pins),
            pwm: join(pwm),
            tones: join(tones),
            mux: join(mux),
        }
    }
}

pub struct TraceWriter {
    csv: Writer<File>,
    jsonl: Option<BufWriter<File>>,
    rows: usize,
}

impl TraceWriter {
    /// Create `trace.csv` (and `trace.jsonl` if asked) in `dir`, creating the directory.
    pub fn create(dir: impl AsRef<Path>, jsonl: bool) -> Result<Self, HarnessError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let csv = Writer::from_path(dir.join(CSV_FILE))?;
        let jsonl = if jsonl {
            Some(BufWriter::new(File::create(dir.join(JSONL_FILE))?))
        } else {
            None
        };
        tracing::debug!(dir = %dir.display(), "trace files opened");
        Ok(Self {
            csv,
            jsonl,
            rows: 0,
        })
    }

    pub fn write(&mut self, snapshot: &DeviceSnapshot) -> Result<(), HarnessError> {
        self.csv.serialize(SnapshotRecord::from(snapshot))?;
        if let Some(out) = self.jsonl.as_mut() {
            serde_json::to_writer(&mut *out, snapshot)?;
            out.write_all(b"\n")?;
        }
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn finish(mut self) -> Result<usize, HarnessError> {
        self.csv.flush()?;
        if let Some(out) = self.jsonl.as_mut() {
            out.flush()?;
        }
        Ok(self.rows)
    }
}
