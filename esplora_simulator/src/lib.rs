//! Device simulation engine for the Esplora board: pin state machine, mux
//! channels, virtual clock, suspend/shutdown gate and the host inspection
//! channels.

pub mod clock;
pub mod device;
pub mod failure;
pub mod gate;
pub mod mux_bank;
pub mod pin_bank;
pub mod random;

pub use clock::VirtualClock;
pub use device::Device;
pub use failure::{FailureChannel, FailureEvent};
pub use gate::{ConcurrencyGate, GateOutcome};
pub use mux_bank::MuxBank;
pub use pin_bank::PinBank;
pub use random::{ChoiceDescriptor, RandomInjector};

pub use esplora_shared::{
    DeviceSnapshot, Level, MuxChannel, N_MUX_CHANNELS, N_PINS, Pin, PinMode, PinState,
};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock `mutex`, carrying on with the inner value if a previous holder panicked.
///
/// Every mutation in this crate completes before its guard drops, so a
/// poisoned lock still guards a consistent record.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
