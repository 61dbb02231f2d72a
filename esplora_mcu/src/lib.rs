// esplora_mcu: Arduino-style firmware API on top of the simulated Esplora device
//
// Every call charges the microseconds the real board spends on it to the
// virtual clock, which is also where a host can pause or stop the program.

pub mod arduino;
pub mod esplora;
pub mod runtime;
pub mod serial;

pub use arduino::{A0, BitOrder, Board};
pub use esplora::{Axis, TemperatureScale};
pub use runtime::{RunSummary, Sketch, run_sketch, spawn_sketch};
pub use serial::{Radix, Serial};

pub use esplora_shared::{Level, PinMode};
