//! Sensor channels wired through the analog multiplexer

use serde::{Deserialize, Serialize};

use crate::{N_MUX_CHANNELS, voltage_to_reading};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuxChannel {
    Switch1,
    Switch2,
    Switch3,
    Switch4,
    Slider,
    Light,
    Temperature,
    Mic,
    TinkerkitA,
    TinkerkitB,
    JoystickSwitch,
    JoystickX,
    JoystickY,
    AccelX,
    AccelY,
    AccelZ,
}

impl MuxChannel {
    pub const ALL: [MuxChannel; N_MUX_CHANNELS] = [
        MuxChannel::Switch1,
        MuxChannel::Switch2,
        MuxChannel::Switch3,
        MuxChannel::Switch4,
        MuxChannel::Slider,
        MuxChannel::Light,
        MuxChannel::Temperature,
        MuxChannel::Mic,
        MuxChannel::TinkerkitA,
        MuxChannel::TinkerkitB,
        MuxChannel::JoystickSwitch,
        MuxChannel::JoystickX,
        MuxChannel::JoystickY,
        MuxChannel::AccelX,
        MuxChannel::AccelY,
        MuxChannel::AccelZ,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            MuxChannel::Switch1 => "switch_1",
            MuxChannel::Switch2 => "switch_2",
            MuxChannel::Switch3 => "switch_3",
            MuxChannel::Switch4 => "switch_4",
            MuxChannel::Slider => "slider",
            MuxChannel::Light => "light",
            MuxChannel::Temperature => "temperature",
            MuxChannel::Mic => "mic",
            MuxChannel::TinkerkitA => "tinkerkit_a",
            MuxChannel::TinkerkitB => "tinkerkit_b",
            MuxChannel::JoystickSwitch => "joystick_switch",
            MuxChannel::JoystickX => "joystick_x",
            MuxChannel::JoystickY => "joystick_y",
            MuxChannel::AccelX => "accel_x",
            MuxChannel::AccelY => "accel_y",
            MuxChannel::AccelZ => "accel_z",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|ch| ch.name() == name)
    }

    /// Voltage the channel sits at with nobody touching the board.
    ///
    /// Buttons are active-low so released switches read full scale. The
    /// temperature sensor outputs 10 mV/°C over a 500 mV offset; 0.75 V is 25 °C.
    pub fn idle_voltage(&self) -> f64 {
        match self {
            MuxChannel::Switch1
            | MuxChannel::Switch2
            | MuxChannel::Switch3
            | MuxChannel::Switch4
            | MuxChannel::JoystickSwitch => 5.0,
            MuxChannel::Slider | MuxChannel::Light => 4.6,
            MuxChannel::Temperature => 0.75,
            MuxChannel::Mic | MuxChannel::TinkerkitA | MuxChannel::TinkerkitB => 0.0,
            MuxChannel::JoystickX
            | MuxChannel::JoystickY
            | MuxChannel::AccelX
            | MuxChannel::AccelY
            | MuxChannel::AccelZ => 2.5,
        }
    }

    /// Index of the button channel for Esplora switch `number` (1..=4).
    pub fn switch(number: u8) -> Option<Self> {
        match number {
            1 => Some(MuxChannel::Switch1),
            2 => Some(MuxChannel::Switch2),
            3 => Some(MuxChannel::Switch3),
            4 => Some(MuxChannel::Switch4),
            _ => None,
        }
    }
}

impl std::fmt::Display for MuxChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Stored voltage of one multiplexer channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MuxChannelState {
    pub channel: MuxChannel,
    pub voltage: f64,
}

impl MuxChannelState {
    pub fn idle(channel: MuxChannel) -> Self {
        Self {
            channel,
            voltage: channel.idle_voltage(),
        }
    }

    pub fn value(&self) -> u16 {
        voltage_to_reading(self.voltage)
    }
}
