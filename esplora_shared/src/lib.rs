// esplora_shared: shared board types for the simulator, the adapter layer and the harness

pub mod board;
pub mod config;
pub mod mux;
pub mod pin;
pub mod snapshot;

pub use board::{N_MUX_CHANNELS, N_PINS};
pub use mux::{MuxChannel, MuxChannelState};
pub use pin::{Level, Pin, PinMode, PinState};
pub use snapshot::DeviceSnapshot;

/// Full-scale voltage of the board's ADC reference.
pub const V_REF: f64 = 5.0;

/// Largest value the 10-bit ADC can report.
pub const ADC_MAX: u16 = 1023;

/// Map a voltage in [0, V_REF] onto the ADC range, rounding half away from zero.
///
/// Out-of-range inputs are clamped first so every voltage yields a reading.
pub fn voltage_to_reading(voltage: f64) -> u16 {
    let clamped = clamp_voltage(voltage);
    ((clamped / V_REF) * f64::from(ADC_MAX)).round() as u16
}

/// Clamp a voltage into the representable [0, V_REF] range.
pub fn clamp_voltage(voltage: f64) -> f64 {
    if voltage.is_nan() {
        return 0.0;
    }
    voltage.clamp(0.0, V_REF)
}
