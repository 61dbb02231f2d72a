//! Pin state machine, voltage mapping, PWM/tone math and countdown sweep

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use esplora_shared::board;
use esplora_shared::config::BoardConfig;
use esplora_shared::{ADC_MAX, Level, N_PINS, Pin, PinMode, PinState, clamp_voltage, voltage_to_reading};

use crate::random::RandomInjector;

/// Input threshold of a plain input buffer.
const INPUT_HIGH_THRESHOLD_V: f64 = 3.0;
/// Input threshold with the weak pull-up switched in.
const PULLUP_HIGH_THRESHOLD_V: f64 = 1.0;

const FULL_DUTY: u32 = 255;

/// Owns every pin on the board. Indices are validated by the caller.
#[derive(Debug)]
pub struct PinBank {
    pins: Vec<Pin>,
    default_periods: Vec<Option<u32>>,
    noise: StdRng,
}

impl PinBank {
    pub fn new(board_config: &BoardConfig, seed: u64) -> Self {
        let mut pins: Vec<Pin> = (0..N_PINS).map(Pin::new).collect();
        let mut default_periods = vec![None; N_PINS];
        for (index, pin) in pins.iter_mut().enumerate() {
            if !pin.is_pwm_capable {
                continue;
            }
            if let Some(period) = board_config.pwm_period(index) {
                pin.pwm_period_us = period;
                default_periods[index] = Some(period);
            }
        }
        Self {
            pins,
            default_periods,
            noise: StdRng::seed_from_u64(seed),
        }
    }

    pub fn pin(&self, pin: usize) -> &Pin {
        &self.pins[pin]
    }

    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }

    pub fn set_mode(&mut self, pin: usize, mode: PinMode) {
        let p = &mut self.pins[pin];
        if p.mode == mode {
            return;
        }
        let state = match mode {
            PinMode::Input => PinState::Floating,
            PinMode::InputPullup => PinState::PullupHigh,
            PinMode::Output => PinState::OutputLow,
            PinMode::Unset => return,
        };
        tracing::debug!(pin, ?mode, ?state, "pin mode changed");
        p.mode = mode;
        p.state = state;
    }

    /// Drive an output pin. Ignored unless the pin is in OUTPUT mode.
    pub fn set_digital_output(&mut self, pin: usize, level: Level) {
        let p = &mut self.pins[pin];
        if p.mode != PinMode::Output {
            return;
        }
        p.state = match level {
            Level::Low => PinState::OutputLow,
            Level::High => PinState::OutputHigh,
        };
    }

    /// Writing to an INPUT pin switches its pull-up resistor in or out.
    pub fn set_pullup_from_write(&mut self, pin: usize, level: Level) {
        let p = &mut self.pins[pin];
        match level {
            Level::High if p.state.is_floating() => p.state = PinState::PullupHigh,
            Level::Low if p.state.is_pull_enabled() => p.state = PinState::Floating,
            _ => {}
        }
    }

    pub fn read_digital(&mut self, pin: usize, injector: &RandomInjector) -> Level {
        let p = &self.pins[pin];
        if p.mode == PinMode::Output {
            return match p.state {
                PinState::OutputHigh => Level::High,
                PinState::OutputPwm => Level::from_bool(p.pwm_high_time_us > 0),
                _ => Level::Low,
            };
        }
        // only the configured mode decides; a pull-up toggled by a write does not
        let pulled_up = p.mode == PinMode::InputPullup;
        match p.voltage {
            None if pulled_up => Level::High,
            None => {
                let noise = &mut self.noise;
                let drawn = injector.next_draw(|| i64::from(noise.random_bool(0.5)));
                Level::from_bool(drawn != 0)
            }
            Some(voltage) => {
                let threshold = if pulled_up {
                    PULLUP_HIGH_THRESHOLD_V
                } else {
                    INPUT_HIGH_THRESHOLD_V
                };
                Level::from_bool(voltage >= threshold)
            }
        }
    }

    pub fn read_analog(&mut self, pin: usize, injector: &RandomInjector) -> u16 {
        let p = &self.pins[pin];
        match p.voltage {
            Some(voltage) => p
                .analog_reading
                .unwrap_or_else(|| voltage_to_reading(voltage)),
            None => {
                let noise = &mut self.noise;
                let drawn = injector.next_draw(|| i64::from(noise.random_range(0..=ADC_MAX)));
                drawn.clamp(0, i64::from(ADC_MAX)) as u16
            }
        }
    }

    /// Apply an external signal to the pin, clamped into [0, 5] V.
    pub fn set_external_voltage(&mut self, pin: usize, voltage: f64) {
        let clamped = clamp_voltage(voltage);
        if clamped != voltage {
            tracing::warn!(pin, voltage, clamped, "external voltage clamped");
        }
        let p = &mut self.pins[pin];
        p.voltage = Some(clamped);
        if p.is_analog_capable {
            p.analog_reading = Some(voltage_to_reading(clamped));
        }
    }

    /// Disconnect the external signal, leaving the pin floating.
    pub fn release_pin(&mut self, pin: usize) {
        let p = &mut self.pins[pin];
        p.voltage = None;
        p.analog_reading = None;
    }

    pub fn set_pwm_period(&mut self, pin: usize, period_us: u32) {
        let p = &mut self.pins[pin];
        p.pwm_period_us = period_us;
        p.pwm_high_time_us = p.pwm_high_time_us.min(period_us);
    }

    /// Restore the board's out-of-reset timer period on a PWM pin.
    pub fn default_pwm_period(&mut self, pin: usize) {
        if let Some(period) = self.default_periods[pin] {
            self.set_pwm_period(pin, period);
        }
    }

    pub fn set_pwm_duty_from_byte(&mut self, pin: usize, value: u32) {
        let p = &mut self.pins[pin];
        if !p.is_pwm_capable {
            return;
        }
        match value {
            0 => {
                p.state = PinState::OutputLow;
                p.pwm_high_time_us = 0;
            }
            FULL_DUTY => {
                p.state = PinState::OutputHigh;
                p.pwm_high_time_us = p.pwm_period_us;
            }
            _ => {
                let high_time =
                    (f64::from(p.pwm_period_us) * f64::from(value) / f64::from(FULL_DUTY)).round();
                let period = f64::from(p.pwm_period_us);
                if high_time > period {
                    tracing::warn!(pin, value, high_time, period, "PWM high time clamped to period");
                }
                p.state = PinState::OutputPwm;
                p.pwm_high_time_us = high_time.min(period) as u32;
            }
        }
    }

    /// Start a square wave at `frequency_hz`, or stop it when the frequency is 0.
    ///
    /// The frequency itself is passed on as the duty argument, so tones above
    /// 254 Hz end up with a high time equal to the period.
    pub fn set_tone(&mut self, pin: usize, frequency_hz: u32) {
        if frequency_hz == 0 {
            let p = &mut self.pins[pin];
            p.is_tone_active = false;
            p.pwm_period_us = 0;
            p.pwm_high_time_us = 0;
            p.countdown_us = 0;
            if p.state.is_driven() {
                p.state = PinState::OutputLow;
            }
            tracing::debug!(pin, "tone stopped");
            return;
        }
        let p = &mut self.pins[pin];
        p.pwm_period_us = board::period_from_frequency(frequency_hz);
        p.is_tone_active = true;
        tracing::debug!(pin, frequency_hz, period_us = p.pwm_period_us, "tone started");
        self.set_pwm_duty_from_byte(pin, frequency_hz);
    }

    /// Arm a one-shot timer that silences the pin after `duration_us`.
    pub fn set_countdown(&mut self, pin: usize, duration_us: u64) {
        self.pins[pin].countdown_us = duration_us;
    }

    /// Age every armed countdown by `elapsed_us`, stopping the tone on each
    /// pin whose timer runs out. Returns how many timers expired.
    pub fn sweep_countdowns(&mut self, elapsed_us: u64) -> usize {
        let mut expired = 0;
        for pin in 0..self.pins.len() {
            let p = &mut self.pins[pin];
            if p.countdown_us == 0 {
                continue;
            }
            p.countdown_us = p.countdown_us.saturating_sub(elapsed_us);
            if p.countdown_us == 0 {
                self.set_tone(pin, 0);
                expired += 1;
            }
        }
        expired
    }

    /// Reseed the floating-pin noise generator.
    pub fn reseed(&mut self, seed: u64) {
        self.noise = StdRng::seed_from_u64(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> PinBank {
        PinBank::new(&BoardConfig::default(), 1)
    }

    #[test]
    fn test_default_periods_from_board_table() {
        let bank = bank();
        assert_eq!(bank.pin(3).pwm_period_us, 1020);
        assert_eq!(bank.pin(5).pwm_period_us, 2041);
        assert_eq!(bank.pin(4).pwm_period_us, 0);
    }

    #[test]
    fn test_mode_transitions() {
        let mut bank = bank();
        bank.set_mode(2, PinMode::Input);
        assert_eq!(bank.pin(2).state, PinState::Floating);
        bank.set_mode(2, PinMode::InputPullup);
        assert_eq!(bank.pin(2).state, PinState::PullupHigh);
        bank.set_mode(2, PinMode::Output);
        assert_eq!(bank.pin(2).state, PinState::OutputLow);
    }

    #[test]
    fn test_set_mode_is_idempotent() {
        let mut once = bank();
        let mut twice = bank();
        once.set_mode(7, PinMode::InputPullup);
        twice.set_mode(7, PinMode::InputPullup);
        twice.set_mode(7, PinMode::InputPullup);
        assert_eq!(once.pin(7), twice.pin(7));
    }

    #[test]
    fn test_unchanged_mode_keeps_pullup_from_write() {
        let mut bank = bank();
        bank.set_mode(4, PinMode::Input);
        bank.set_pullup_from_write(4, Level::High);
        bank.set_mode(4, PinMode::Input);
        assert_eq!(bank.pin(4).state, PinState::PullupHigh);
    }

    #[test]
    fn test_digital_output_requires_output_mode() {
        let mut bank = bank();
        let injector = RandomInjector::new();
        bank.set_mode(8, PinMode::Input);
        bank.set_digital_output(8, Level::High);
        assert_eq!(bank.pin(8).state, PinState::Floating);

        bank.set_mode(8, PinMode::Output);
        bank.set_digital_output(8, Level::High);
        assert_eq!(bank.read_digital(8, &injector), Level::High);
        bank.set_digital_output(8, Level::Low);
        assert_eq!(bank.read_digital(8, &injector), Level::Low);
    }

    #[test]
    fn test_pullup_toggle_by_write() {
        let mut bank = bank();
        bank.set_mode(12, PinMode::Input);
        bank.set_pullup_from_write(12, Level::Low);
        assert_eq!(bank.pin(12).state, PinState::Floating);
        bank.set_pullup_from_write(12, Level::High);
        assert_eq!(bank.pin(12).state, PinState::PullupHigh);
        bank.set_pullup_from_write(12, Level::High);
        assert_eq!(bank.pin(12).state, PinState::PullupHigh);
        bank.set_pullup_from_write(12, Level::Low);
        assert_eq!(bank.pin(12).state, PinState::Floating);
    }

    #[test]
    fn test_floating_pullup_reads_high() {
        let mut bank = bank();
        let injector = RandomInjector::new();
        bank.set_mode(14, PinMode::InputPullup);
        for _ in 0..100 {
            assert_eq!(bank.read_digital(14, &injector), Level::High);
        }
    }

    #[test]
    fn test_floating_input_uses_injector() {
        let mut bank = bank();
        let injector = RandomInjector::new();
        bank.set_mode(14, PinMode::Input);
        injector.set_forced_value(0, -1);
        assert_eq!(bank.read_digital(14, &injector), Level::Low);
        injector.set_forced_value(1, -1);
        assert_eq!(bank.read_digital(14, &injector), Level::High);
    }

    #[test]
    fn test_floating_noise_is_reproducible_per_seed() {
        let injector = RandomInjector::new();
        let mut a = PinBank::new(&BoardConfig::default(), 99);
        let mut b = PinBank::new(&BoardConfig::default(), 99);
        let reads_a: Vec<_> = (0..32).map(|_| a.read_analog(0, &injector)).collect();
        let reads_b: Vec<_> = (0..32).map(|_| b.read_analog(0, &injector)).collect();
        assert_eq!(reads_a, reads_b);
        assert!(reads_a.iter().all(|&v| v <= ADC_MAX));
    }

    #[test]
    fn test_voltage_thresholds() {
        let mut bank = bank();
        let injector = RandomInjector::new();
        bank.set_mode(15, PinMode::Input);
        bank.set_external_voltage(15, 2.9);
        assert_eq!(bank.read_digital(15, &injector), Level::Low);
        bank.set_external_voltage(15, 3.0);
        assert_eq!(bank.read_digital(15, &injector), Level::High);

        bank.set_mode(16, PinMode::InputPullup);
        bank.set_external_voltage(16, 0.99);
        assert_eq!(bank.read_digital(16, &injector), Level::Low);
        bank.set_external_voltage(16, 1.0);
        assert_eq!(bank.read_digital(16, &injector), Level::High);
    }

    #[test]
    fn test_write_enabled_pullup_does_not_change_input_reads() {
        let mut bank = bank();
        let injector = RandomInjector::new();
        bank.set_mode(15, PinMode::Input);
        bank.set_pullup_from_write(15, Level::High);
        assert_eq!(bank.pin(15).state, PinState::PullupHigh);

        // INPUT keeps the 3.0 V threshold
        bank.set_external_voltage(15, 2.0);
        assert_eq!(bank.read_digital(15, &injector), Level::Low);

        // and a floating INPUT still takes the injected value
        bank.release_pin(15);
        injector.set_forced_value(0, -1);
        assert_eq!(bank.read_digital(15, &injector), Level::Low);
        injector.set_forced_value(1, -1);
        assert_eq!(bank.read_digital(15, &injector), Level::High);
    }

    #[test]
    fn test_output_ignores_external_voltage() {
        let mut bank = bank();
        let injector = RandomInjector::new();
        injector.set_forced_value(1, -1);
        bank.set_mode(17, PinMode::Output);
        bank.set_external_voltage(17, 5.0);
        assert_eq!(bank.read_digital(17, &injector), Level::Low);
    }

    #[test]
    fn test_analog_mapping_and_cache() {
        let mut bank = bank();
        let injector = RandomInjector::new();
        bank.set_external_voltage(0, 2.5);
        assert_eq!(bank.pin(0).analog_reading, Some(512));
        assert_eq!(bank.read_analog(0, &injector), 512);
        bank.set_external_voltage(0, 7.0);
        assert_eq!(bank.read_analog(0, &injector), 1023);

        // digital-only pins still map their voltage, without a cached reading
        bank.set_external_voltage(20, 1.0);
        assert_eq!(bank.pin(20).analog_reading, None);
        assert_eq!(bank.read_analog(20, &injector), 205);

        bank.release_pin(0);
        injector.set_forced_value(5000, -1);
        assert_eq!(bank.read_analog(0, &injector), 1023);
    }

    #[test]
    fn test_pwm_duty_from_byte() {
        let mut bank = bank();
        bank.set_mode(9, PinMode::Output);
        bank.set_pwm_duty_from_byte(9, 128);
        assert_eq!(bank.pin(9).state, PinState::OutputPwm);
        // round(2041 * 128 / 255) = round(1024.50...)
        assert_eq!(bank.pin(9).pwm_high_time_us, 1025);

        bank.set_pwm_duty_from_byte(9, 0);
        assert_eq!(bank.pin(9).state, PinState::OutputLow);
        assert_eq!(bank.pin(9).pwm_high_time_us, 0);

        bank.set_pwm_duty_from_byte(9, 255);
        assert_eq!(bank.pin(9).state, PinState::OutputHigh);
        assert_eq!(bank.pin(9).pwm_high_time_us, 2041);
    }

    #[test]
    fn test_pwm_ignored_on_plain_pin() {
        let mut bank = bank();
        bank.set_mode(4, PinMode::Output);
        bank.set_pwm_duty_from_byte(4, 100);
        assert_eq!(bank.pin(4).state, PinState::OutputLow);
        assert_eq!(bank.pin(4).pwm_high_time_us, 0);
    }

    #[test]
    fn test_tone_period_and_frequency_as_duty() {
        let mut bank = bank();
        bank.set_tone(5, 440);
        let pin = bank.pin(5);
        assert_eq!(pin.pwm_period_us, 2273);
        assert!(pin.is_tone_active);
        assert_eq!(pin.state, PinState::OutputPwm);
        assert_eq!(pin.pwm_high_time_us, 2273);

        bank.set_tone(5, 100);
        // round(10000 * 100 / 255)
        assert_eq!(bank.pin(5).pwm_high_time_us, 3922);
    }

    #[test]
    fn test_tone_off_clears_fields() {
        let mut bank = bank();
        bank.set_tone(6, 440);
        bank.set_countdown(6, 500);
        bank.set_tone(6, 0);
        let pin = bank.pin(6);
        assert!(!pin.is_tone_active);
        assert_eq!(pin.pwm_period_us, 0);
        assert_eq!(pin.pwm_high_time_us, 0);
        assert_eq!(pin.countdown_us, 0);
        assert_eq!(pin.state, PinState::OutputLow);
    }

    #[test]
    fn test_countdown_sweep() {
        let mut bank = bank();
        bank.set_tone(5, 440);
        bank.set_countdown(5, 1000);
        assert_eq!(bank.sweep_countdowns(400), 0);
        assert_eq!(bank.pin(5).countdown_us, 600);
        assert!(bank.pin(5).is_tone_active);
        assert_eq!(bank.sweep_countdowns(5000), 1);
        assert_eq!(bank.pin(5).countdown_us, 0);
        assert!(!bank.pin(5).is_tone_active);
        assert_eq!(bank.sweep_countdowns(5000), 0);
    }
}
