//! Point-in-time copy of the whole board, handed to host observers

use serde::{Deserialize, Serialize};

use crate::mux::{MuxChannel, MuxChannelState};
use crate::pin::Pin;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub elapsed_us: u64,
    pub running: bool,
    /// True for the single snapshot emitted when a shutdown is observed.
    pub is_final: bool,
    pub pins: Vec<Pin>,
    pub mux: Vec<MuxChannelState>,
}

impl DeviceSnapshot {
    pub fn pin(&self, index: usize) -> Option<&Pin> {
        self.pins.get(index)
    }

    pub fn mux_value(&self, channel: MuxChannel) -> Option<u16> {
        self.mux.get(channel.index()).map(MuxChannelState::value)
    }

    /// Pins currently producing a tone.
    pub fn active_tones(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter().filter(|p| p.is_tone_active)
    }
}
