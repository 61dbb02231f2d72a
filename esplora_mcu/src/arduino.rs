//! Arduino core API: pin I/O, tone, time and random numbers

use std::sync::Arc;

use esplora_shared::{Level, PinMode, board};
use esplora_simulator::Device;

use crate::serial::Serial;

/// Pin number of the first analog input; A0..A11 alias analog channels 0..11.
pub const A0: i32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    LsbFirst,
    MsbFirst,
}

/// Firmware-facing handle to a simulated board.
#[derive(Debug)]
pub struct Board {
    device: Arc<Device>,
    serial: Serial,
}

impl Board {
    pub fn new(device: Arc<Device>) -> Self {
        let serial = Serial::new(Arc::clone(&device));
        Self { device, serial }
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn serial(&mut self) -> &mut Serial {
        &mut self.serial
    }

    pub(crate) fn tick(&self, us: u64) {
        self.device.advance(us);
    }

    fn checked_pin(&self, pin: i32, call: &str) -> Option<usize> {
        match usize::try_from(pin) {
            Ok(index) if board::is_valid_pin(index) => Some(index),
            _ => {
                tracing::warn!(pin, call, "pin out of range");
                None
            }
        }
    }

    fn checked_pwm_pin(&self, pin: i32, call: &str) -> Option<usize> {
        self.checked_pin(pin, call).filter(|&p| board::has_pwm(p))
    }

    // --- digital I/O ---

    pub fn pin_mode(&mut self, pin: i32, mode: PinMode) {
        if let Some(p) = self.checked_pin(pin, "pin_mode") {
            if mode != PinMode::Unset {
                self.device.set_mode(p, mode);
            }
        }
        self.tick(1);
    }

    pub fn digital_write(&mut self, pin: i32, level: Level) {
        let Some(p) = self.checked_pin(pin, "digital_write") else {
            self.tick(1);
            return;
        };
        match self.device.pin(p).mode {
            PinMode::Input => self.device.set_pullup_from_write(p, level),
            PinMode::Output => self.device.set_digital_output(p, level),
            _ => {}
        }
        self.tick(4);
    }

    pub fn digital_read(&mut self, pin: i32) -> Level {
        self.tick(1);
        match self.checked_pin(pin, "digital_read") {
            Some(p) => self.device.read_digital(p),
            None => Level::Low,
        }
    }

    // --- analog I/O ---

    pub fn analog_write(&mut self, pin: i32, value: u8) {
        let Some(p) = self.checked_pwm_pin(pin, "analog_write") else {
            self.tick(1);
            return;
        };
        self.pin_mode(pin, PinMode::Output);
        match value {
            0 => self.digital_write(pin, Level::Low),
            255 => self.digital_write(pin, Level::High),
            _ => {
                // high time is derived from the period, so the period goes first
                self.device.default_pwm_period(p);
                self.device.set_pwm_duty_from_byte(p, u32::from(value));
            }
        }
        self.tick(10);
    }

    /// Read analog channel `pin` (0..=11, or A0..=A11). Other pins read 0.
    pub fn analog_read(&mut self, pin: i32) -> u16 {
        self.tick(100);
        let channel = match pin {
            0..=11 => Some(pin),
            _ if (A0..A0 + 12).contains(&pin) => Some(pin - A0),
            _ => None,
        };
        match channel.and_then(|c| usize::try_from(c).ok()) {
            Some(p) => self.device.read_analog(p),
            None => {
                tracing::warn!(pin, "analog_read on a pin without an ADC channel");
                0
            }
        }
    }

    // --- advanced I/O ---

    pub fn tone(&mut self, pin: i32, frequency_hz: u32) {
        let Some(p) = self.checked_pwm_pin(pin, "tone") else {
            self.tick(1);
            return;
        };
        self.pin_mode(pin, PinMode::Output);
        self.device.set_tone(p, frequency_hz);
        self.tick(1);
    }

    /// Play a tone that stops by itself after `duration_ms`.
    pub fn tone_for(&mut self, pin: i32, frequency_hz: u32, duration_ms: u64) {
        self.tick(1);
        let Some(p) = self.checked_pwm_pin(pin, "tone_for") else {
            return;
        };
        self.tone(pin, frequency_hz);
        self.device.set_countdown(p, duration_ms.saturating_mul(1000));
    }

    pub fn no_tone(&mut self, pin: i32) {
        self.tone(pin, 0);
    }

    pub fn shift_out(&mut self, _data_pin: i32, _clock_pin: i32, _order: BitOrder, _value: u8) {
        self.tick(1);
    }

    pub fn shift_in(&mut self, _data_pin: i32, _clock_pin: i32, _order: BitOrder) -> u8 {
        self.tick(1);
        0
    }

    // --- time ---

    pub fn millis(&mut self) -> u64 {
        self.tick(1);
        self.device.elapsed_us() / 1000
    }

    /// Elapsed microseconds, rounded down to a multiple of 4 like the 16 MHz timer.
    pub fn micros(&mut self) -> u64 {
        self.tick(1);
        let elapsed = self.device.elapsed_us();
        elapsed - elapsed % 4
    }

    pub fn delay(&mut self, ms: u64) {
        self.tick(ms.saturating_mul(1000));
    }

    pub fn delay_microseconds(&mut self, us: u64) {
        self.tick(us);
    }

    // --- math ---

    /// Re-map `x` from one range onto another, truncating toward zero.
    pub fn map(&mut self, x: i64, from_low: i64, from_high: i64, to_low: i64, to_high: i64) -> i64 {
        self.tick(1);
        if from_high == from_low {
            return to_low;
        }
        // in f64 so extreme ranges cannot overflow
        let scaled = (x as f64 - from_low as f64) / (from_high as f64 - from_low as f64)
            * (to_high as f64 - to_low as f64);
        (scaled as i64).saturating_add(to_low)
    }

    // --- random numbers ---

    pub fn random_seed(&mut self, seed: u64) {
        self.tick(1);
        self.device.reseed(seed);
    }

    /// A value in `[0, upper)`, unless the host injected one.
    pub fn random(&mut self, upper: i64) -> i64 {
        self.tick(2);
        self.device.draw_random(upper)
    }

    /// A value in `[lower, upper)`, unless the host injected one. 0 for an empty range.
    pub fn random_between(&mut self, lower: i64, upper: i64) -> i64 {
        self.tick(2);
        if lower >= upper {
            return 0;
        }
        self.random_in(lower, upper)
    }

    fn random_in(&mut self, lower: i64, upper: i64) -> i64 {
        self.tick(2);
        self.device.draw_random_in(lower, upper)
    }
}
