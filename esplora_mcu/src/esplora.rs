//! Esplora board helpers: multiplexed sensors, RGB LED and buzzer

use esplora_shared::board::{PIN_BLUE, PIN_BUZZER, PIN_GREEN, PIN_RED};
use esplora_shared::{Level, MuxChannel};

use crate::arduino::Board;

/// Cost of one multiplexer conversion, same as `analog_read`.
const MUX_READ_US: u64 = 100;

/// Readings at or below this count as a pressed (grounded) switch.
const PRESSED_THRESHOLD: u16 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureScale {
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn channel(self) -> MuxChannel {
        match self {
            Axis::X => MuxChannel::AccelX,
            Axis::Y => MuxChannel::AccelY,
            Axis::Z => MuxChannel::AccelZ,
        }
    }
}

impl Board {
    /// Raw 10-bit reading of a multiplexer channel.
    pub fn read_channel(&mut self, channel: MuxChannel) -> u16 {
        self.tick(MUX_READ_US);
        self.device().get_channel_value(channel)
    }

    /// Slider position; the potentiometer is wired inverted.
    pub fn read_slider(&mut self) -> u16 {
        1023 - self.read_channel(MuxChannel::Slider)
    }

    pub fn read_light_sensor(&mut self) -> u16 {
        self.read_channel(MuxChannel::Light)
    }

    pub fn read_microphone(&mut self) -> u16 {
        self.read_channel(MuxChannel::Mic)
    }

    pub fn read_temperature(&mut self, scale: TemperatureScale) -> i32 {
        let raw = i32::from(self.read_channel(MuxChannel::Temperature));
        let celsius = raw * 500 / 1024 - 50;
        match scale {
            TemperatureScale::Celsius => celsius,
            TemperatureScale::Fahrenheit => celsius * 9 / 5 + 32,
        }
    }

    /// Joystick deflection, centered on 0.
    pub fn read_joystick_x(&mut self) -> i32 {
        i32::from(self.read_channel(MuxChannel::JoystickX)) - 512
    }

    pub fn read_joystick_y(&mut self) -> i32 {
        i32::from(self.read_channel(MuxChannel::JoystickY)) - 512
    }

    /// `Level::Low` while the joystick is pushed in.
    pub fn read_joystick_button(&mut self) -> Level {
        self.read_switch(MuxChannel::JoystickSwitch)
    }

    /// `Level::Low` while push-button `n` (1..=4) is held. Unknown buttons read high.
    pub fn read_button(&mut self, n: u8) -> Level {
        match MuxChannel::switch(n) {
            Some(channel) => self.read_switch(channel),
            None => {
                tracing::warn!(button = n, "no such button");
                Level::High
            }
        }
    }

    pub fn read_accelerometer(&mut self, axis: Axis) -> i32 {
        i32::from(self.read_channel(axis.channel())) - 512
    }

    fn read_switch(&mut self, channel: MuxChannel) -> Level {
        Level::from_bool(self.read_channel(channel) > PRESSED_THRESHOLD)
    }

    pub fn write_rgb(&mut self, red: u8, green: u8, blue: u8) {
        self.write_red(red);
        self.write_green(green);
        self.write_blue(blue);
    }

    pub fn write_red(&mut self, value: u8) {
        self.analog_write(PIN_RED as i32, value);
    }

    pub fn write_green(&mut self, value: u8) {
        self.analog_write(PIN_GREEN as i32, value);
    }

    pub fn write_blue(&mut self, value: u8) {
        self.analog_write(PIN_BLUE as i32, value);
    }

    pub fn buzzer_tone(&mut self, frequency_hz: u32) {
        self.tone(PIN_BUZZER as i32, frequency_hz);
    }

    pub fn buzzer_tone_for(&mut self, frequency_hz: u32, duration_ms: u64) {
        self.tone_for(PIN_BUZZER as i32, frequency_hz, duration_ms);
    }

    pub fn buzzer_off(&mut self) {
        self.no_tone(PIN_BUZZER as i32);
    }
}
