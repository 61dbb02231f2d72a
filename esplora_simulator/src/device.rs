//! Device facade: one simulation session.
//!
//! Every piece of session state lives here, so independent `Device`s can run
//! side by side. Each entity group (pins, mux, clock, gate) has its own lock;
//! when several are taken together the order is clock, pins, mux.

use std::sync::Mutex;

use crossbeam_channel::{Receiver, Sender, unbounded};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use esplora_shared::config::SimConfig;
use esplora_shared::{DeviceSnapshot, Level, MuxChannel, Pin, PinMode};

use crate::clock::VirtualClock;
use crate::failure::FailureChannel;
use crate::gate::{ConcurrencyGate, GateOutcome};
use crate::lock;
use crate::mux_bank::MuxBank;
use crate::pin_bank::PinBank;
use crate::random::RandomInjector;

/// Offset between the noise seed and the program's `random()` seed.
const PROGRAM_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug)]
pub struct Device {
    pins: Mutex<PinBank>,
    mux: Mutex<MuxBank>,
    clock: Mutex<VirtualClock>,
    gate: ConcurrencyGate,
    injector: RandomInjector,
    failure: FailureChannel,
    program_rng: Mutex<StdRng>,
    subscribers: Mutex<Vec<Sender<DeviceSnapshot>>>,
    periodic_snapshots: bool,
}

impl Device {
    pub fn new(config: &SimConfig) -> Self {
        let seed = config.simulation.seed;
        tracing::info!(
            board = %config.board.name,
            seed,
            "device initialized at 0us"
        );
        Self {
            pins: Mutex::new(PinBank::new(&config.board, seed)),
            mux: Mutex::new(MuxBank::new(&config.mux)),
            clock: Mutex::new(VirtualClock::new()),
            gate: ConcurrencyGate::new(),
            injector: RandomInjector::new(),
            failure: FailureChannel::new(),
            program_rng: Mutex::new(StdRng::seed_from_u64(seed ^ PROGRAM_SEED_SALT)),
            subscribers: Mutex::new(Vec::new()),
            periodic_snapshots: config.simulation.emit_snapshots,
        }
    }

    // --- operations called by the adapter layer ---

    pub fn set_mode(&self, pin: usize, mode: PinMode) {
        lock(&self.pins).set_mode(pin, mode);
    }

    pub fn set_digital_output(&self, pin: usize, level: Level) {
        lock(&self.pins).set_digital_output(pin, level);
    }

    pub fn set_pullup_from_write(&self, pin: usize, level: Level) {
        lock(&self.pins).set_pullup_from_write(pin, level);
    }

    pub fn read_digital(&self, pin: usize) -> Level {
        lock(&self.pins).read_digital(pin, &self.injector)
    }

    pub fn read_analog(&self, pin: usize) -> u16 {
        lock(&self.pins).read_analog(pin, &self.injector)
    }

    pub fn set_external_voltage(&self, pin: usize, voltage: f64) {
        lock(&self.pins).set_external_voltage(pin, voltage);
    }

    pub fn release_pin(&self, pin: usize) {
        lock(&self.pins).release_pin(pin);
    }

    pub fn set_pwm_period(&self, pin: usize, period_us: u32) {
        lock(&self.pins).set_pwm_period(pin, period_us);
    }

    pub fn default_pwm_period(&self, pin: usize) {
        lock(&self.pins).default_pwm_period(pin);
    }

    pub fn set_pwm_duty_from_byte(&self, pin: usize, value: u32) {
        lock(&self.pins).set_pwm_duty_from_byte(pin, value);
    }

    pub fn set_tone(&self, pin: usize, frequency_hz: u32) {
        lock(&self.pins).set_tone(pin, frequency_hz);
    }

    pub fn set_countdown(&self, pin: usize, duration_us: u64) {
        lock(&self.pins).set_countdown(pin, duration_us);
    }

    /// Charge `delta_us` of simulated time, then pass the suspend/shutdown gate.
    ///
    /// This is the only call in the engine that can block.
    pub fn advance(&self, delta_us: u64) {
        {
            let mut clock = lock(&self.clock);
            let mut pins = lock(&self.pins);
            let expired = clock.advance(delta_us, &mut pins);
            if expired > 0 {
                tracing::debug!(expired, elapsed_us = clock.elapsed_us(), "tone countdowns expired");
            }
        }
        match self.gate.checkpoint() {
            GateOutcome::Continue if self.periodic_snapshots => self.publish(false),
            GateOutcome::FinalSnapshot => self.publish(true),
            _ => {}
        }
    }

    pub fn elapsed_us(&self) -> u64 {
        lock(&self.clock).elapsed_us()
    }

    /// A value in `[0, upper)` for the program's `random()`, or the injected value.
    pub fn draw_random(&self, upper: i64) -> i64 {
        self.draw_random_in(0, upper)
    }

    /// A value in `[lower, upper)`, or the injected value. An empty range yields 0.
    pub fn draw_random_in(&self, lower: i64, upper: i64) -> i64 {
        if lower >= upper {
            return 0;
        }
        self.injector
            .next_draw(|| lock(&self.program_rng).random_range(lower..upper))
    }

    /// Reseed the program's generator and the floating-pin noise.
    pub fn reseed(&self, seed: u64) {
        lock(&self.pins).reseed(seed);
        *lock(&self.program_rng) = StdRng::seed_from_u64(seed ^ PROGRAM_SEED_SALT);
    }

    // --- host-facing operations ---

    pub fn suspend(&self) {
        self.gate.suspend();
    }

    pub fn resume(&self) {
        self.gate.resume();
    }

    pub fn request_shutdown(&self) {
        self.gate.request_shutdown();
    }

    pub fn is_running(&self) -> bool {
        self.gate.is_running()
    }

    pub fn is_suspended(&self) -> bool {
        self.gate.is_suspended()
    }

    pub fn is_fast_forward(&self) -> bool {
        self.gate.is_fast_forward()
    }

    pub fn set_channel_voltage(&self, channel: MuxChannel, voltage: f64) {
        lock(&self.mux).set_channel_voltage(channel, voltage);
    }

    pub fn get_channel_value(&self, channel: MuxChannel) -> u16 {
        lock(&self.mux).get_channel_value(channel)
    }

    pub fn channel_voltage(&self, channel: MuxChannel) -> f64 {
        lock(&self.mux).channel_voltage(channel)
    }

    pub fn pin(&self, pin: usize) -> Pin {
        lock(&self.pins).pin(pin).clone()
    }

    pub fn injector(&self) -> &RandomInjector {
        &self.injector
    }

    pub fn failure(&self) -> &FailureChannel {
        &self.failure
    }

    /// Copy of every pin, every mux channel and the clock, taken atomically.
    pub fn snapshot(&self) -> DeviceSnapshot {
        self.capture(false)
    }

    /// Receive a snapshot after each advance, and the final one at shutdown.
    pub fn subscribe(&self) -> Receiver<DeviceSnapshot> {
        let (tx, rx) = unbounded();
        lock(&self.subscribers).push(tx);
        rx
    }

    fn capture(&self, is_final: bool) -> DeviceSnapshot {
        let clock = lock(&self.clock);
        let pins = lock(&self.pins);
        let mux = lock(&self.mux);
        DeviceSnapshot {
            elapsed_us: clock.elapsed_us(),
            running: self.gate.is_running(),
            is_final,
            pins: pins.pins().to_vec(),
            mux: mux.channels().to_vec(),
        }
    }

    fn publish(&self, is_final: bool) {
        let mut subscribers = lock(&self.subscribers);
        if subscribers.is_empty() {
            return;
        }
        let snapshot = self.capture(is_final);
        subscribers.retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::new(&SimConfig::default())
    }
}
