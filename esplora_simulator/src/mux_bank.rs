use esplora_shared::config::MuxConfig;
use esplora_shared::{MuxChannel, MuxChannelState, clamp_voltage};

/// Sensor voltages behind the analog multiplexer.
#[derive(Debug, Clone)]
pub struct MuxBank {
    channels: Vec<MuxChannelState>,
}

impl MuxBank {
    pub fn new(config: &MuxConfig) -> Self {
        let channels = MuxChannel::ALL
            .iter()
            .map(|&channel| MuxChannelState {
                channel,
                voltage: config.idle_voltage(channel),
            })
            .collect();
        Self { channels }
    }

    pub fn set_channel_voltage(&mut self, channel: MuxChannel, voltage: f64) {
        let clamped = clamp_voltage(voltage);
        if clamped != voltage {
            tracing::warn!(%channel, voltage, clamped, "mux voltage clamped");
        }
        self.channels[channel.index()].voltage = clamped;
    }

    pub fn get_channel_value(&self, channel: MuxChannel) -> u16 {
        self.channels[channel.index()].value()
    }

    pub fn channel_voltage(&self, channel: MuxChannel) -> f64 {
        self.channels[channel.index()].voltage
    }

    pub fn channels(&self) -> &[MuxChannelState] {
        &self.channels
    }
}

impl Default for MuxBank {
    fn default() -> Self {
        Self::new(&MuxConfig::default())
    }
}
