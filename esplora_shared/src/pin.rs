//! Per-pin electrical and logical state

use serde::{Deserialize, Serialize};

use crate::board;

/// Logic level seen on, or driven onto, a digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn from_bool(value: bool) -> Self {
        if value { Level::High } else { Level::Low }
    }
}

/// Coarse direction configured by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PinMode {
    #[default]
    Unset,
    Input,
    InputPullup,
    Output,
}

/// Resistor and driver configuration of the line, finer grained than [`PinMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PinState {
    #[default]
    Floating,
    PullupHigh,
    PullupLowEnabled,
    PulldownHigh,
    OutputLow,
    OutputHigh,
    OutputPwm,
}

impl PinState {
    pub fn is_floating(&self) -> bool {
        matches!(self, PinState::Floating)
    }

    /// States in which an internal pull resistor is switched in.
    pub fn is_pull_enabled(&self) -> bool {
        matches!(
            self,
            PinState::PullupHigh | PinState::PullupLowEnabled | PinState::PulldownHigh
        )
    }

    pub fn is_driven(&self) -> bool {
        matches!(
            self,
            PinState::OutputLow | PinState::OutputHigh | PinState::OutputPwm
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub index: usize,
    /// Externally applied voltage; `None` while nothing drives the line.
    pub voltage: Option<f64>,
    pub mode: PinMode,
    pub state: PinState,
    pub pwm_period_us: u32,
    pub pwm_high_time_us: u32,
    pub countdown_us: u64,
    /// Last ADC conversion, refreshed whenever an analog pin's voltage changes.
    pub analog_reading: Option<u16>,
    pub is_analog_capable: bool,
    pub is_pwm_capable: bool,
    pub is_tone_active: bool,
}

impl Pin {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            voltage: None,
            mode: PinMode::Unset,
            state: PinState::Floating,
            pwm_period_us: 0,
            pwm_high_time_us: 0,
            countdown_us: 0,
            analog_reading: None,
            is_analog_capable: board::is_analog_pin(index),
            is_pwm_capable: board::has_pwm(index),
            is_tone_active: false,
        }
    }

    pub fn is_floating(&self) -> bool {
        self.voltage.is_none()
    }
}
