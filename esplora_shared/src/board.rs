//! Pin map and fixed capabilities of the simulated Esplora board

/// Number of directly addressable pins.
pub const N_PINS: usize = 30;

/// Number of channels behind the on-board analog multiplexer.
pub const N_MUX_CHANNELS: usize = 16;

/// Highest pin index wired to the ADC.
pub const LAST_ANALOG_PIN: usize = 11;

/// Pins with a hardware timer behind them.
pub const PWM_PINS: [usize; 7] = [3, 5, 6, 9, 10, 11, 13];

/// RGB LED and buzzer wiring.
pub const PIN_RED: usize = 5;
pub const PIN_GREEN: usize = 9;
pub const PIN_BLUE: usize = 10;
pub const PIN_BUZZER: usize = 6;

/// Timer frequencies out of reset, per PWM pin.
pub const DEFAULT_PWM_FREQUENCIES: [(usize, u32); 7] = [
    (3, 980),
    (5, 490),
    (6, 490),
    (9, 490),
    (10, 490),
    (11, 980),
    (13, 490),
];

pub fn is_analog_pin(pin: usize) -> bool {
    pin <= LAST_ANALOG_PIN
}

pub fn has_pwm(pin: usize) -> bool {
    PWM_PINS.contains(&pin)
}

pub fn is_valid_pin(pin: usize) -> bool {
    pin < N_PINS
}

/// Period in microseconds of a square wave at `frequency_hz`, rounded to the nearest microsecond.
///
/// A zero frequency has no period and yields 0.
pub fn period_from_frequency(frequency_hz: u32) -> u32 {
    if frequency_hz == 0 {
        return 0;
    }
    (1_000_000.0 / f64::from(frequency_hz)).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities() {
        assert!(is_analog_pin(0));
        assert!(is_analog_pin(11));
        assert!(!is_analog_pin(12));
        assert!(has_pwm(13));
        assert!(!has_pwm(4));
        assert!(is_valid_pin(29));
        assert!(!is_valid_pin(30));
    }

    #[test]
    fn test_period_rounding() {
        assert_eq!(period_from_frequency(440), 2273);
        assert_eq!(period_from_frequency(490), 2041);
        assert_eq!(period_from_frequency(980), 1020);
        assert_eq!(period_from_frequency(0), 0);
    }
}
