//! Running a sketch: `setup` once, then `run_loop` until the host stops the device

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use esplora_simulator::Device;

use crate::arduino::Board;

/// An Arduino program. Both hooks get exclusive use of the board.
pub trait Sketch: Send {
    fn setup(&mut self, board: &mut Board);
    fn run_loop(&mut self, board: &mut Board);

    fn name(&self) -> &str {
        "sketch"
    }
}

/// What a finished program left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub iterations: u64,
    pub elapsed_us: u64,
    pub serial: String,
}

/// Run `sketch` on the current thread.
///
/// Returns once the device stops running, or after `max_iterations` passes of
/// `run_loop`. A loop body that never calls into the board never reaches the
/// suspend/shutdown checkpoint, so it can only be bounded by `max_iterations`.
pub fn run_sketch<S: Sketch + ?Sized>(
    device: Arc<Device>,
    sketch: &mut S,
    max_iterations: Option<u64>,
) -> RunSummary {
    let mut board = Board::new(device);
    tracing::info!(sketch = sketch.name(), "setup");
    sketch.setup(&mut board);

    let mut iterations = 0u64;
    while board.device().is_running() && max_iterations.is_none_or(|max| iterations < max) {
        sketch.run_loop(&mut board);
        iterations += 1;
    }

    let elapsed_us = board.device().elapsed_us();
    tracing::info!(sketch = sketch.name(), iterations, elapsed_us, "sketch finished");
    RunSummary {
        iterations,
        elapsed_us,
        serial: board.serial().take_transcript(),
    }
}

/// Run `sketch` on its own thread, as the firmware side of a session.
pub fn spawn_sketch(
    device: Arc<Device>,
    mut sketch: Box<dyn Sketch>,
    max_iterations: Option<u64>,
) -> std::io::Result<JoinHandle<RunSummary>> {
    let name = format!("sketch-{}", sketch.name());
    thread::Builder::new()
        .name(name)
        .spawn(move || run_sketch(device, sketch.as_mut(), max_iterations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Level, PinMode};

    struct Blink;

    impl Sketch for Blink {
        fn setup(&mut self, board: &mut Board) {
            board.pin_mode(13, PinMode::Output);
            board.serial().begin(9600);
        }

        fn run_loop(&mut self, board: &mut Board) {
            board.digital_write(13, Level::High);
            board.delay(1);
            board.digital_write(13, Level::Low);
            board.delay(1);
        }
    }

    #[test]
    fn test_bounded_run() {
        let device = Arc::new(Device::default());
        let summary = run_sketch(Arc::clone(&device), &mut Blink, Some(3));
        assert_eq!(summary.iterations, 3);
        // pin_mode 1, then 3 * (4 + 1000 + 4 + 1000)
        assert_eq!(summary.elapsed_us, 1 + 3 * 2008);
        assert!(device.is_running());
    }

    #[test]
    fn test_shutdown_ends_run() {
        let device = Arc::new(Device::default());
        let handle = spawn_sketch(Arc::clone(&device), Box::new(Blink), None).unwrap();
        while device.elapsed_us() < 10_000 {
            thread::yield_now();
        }
        device.request_shutdown();
        let summary = handle.join().unwrap();
        assert!(!device.is_running());
        assert!(summary.iterations >= 4);
    }
}
