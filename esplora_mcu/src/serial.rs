//! Serial port: output goes to an in-memory transcript, nothing ever arrives

use std::fmt::{self, Display};
use std::sync::Arc;

use esplora_simulator::Device;

const STANDARD_BAUDS: [u32; 12] = [
    300, 600, 1200, 2400, 4800, 9600, 14400, 19200, 28800, 38400, 57600, 115200,
];
const DEFAULT_BAUD: u32 = 9600;

/// Fixed overhead of a print call, plus this much per character.
const PRINT_BASE_US: u64 = 28;
const PRINT_PER_CHAR_US: u64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Bin,
    Oct,
    Dec,
    Hex,
}

#[derive(Debug)]
pub struct Serial {
    device: Arc<Device>,
    baud: Option<u32>,
    transcript: String,
}

impl Serial {
    pub(crate) fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            baud: None,
            transcript: String::new(),
        }
    }

    pub fn begin(&mut self, baud: u32) {
        let chosen = if STANDARD_BAUDS.contains(&baud) {
            baud
        } else {
            tracing::warn!(baud, fallback = DEFAULT_BAUD, "non-standard baud rate");
            DEFAULT_BAUD
        };
        tracing::debug!(baud = chosen, "serial opened");
        self.baud = Some(chosen);
    }

    pub fn end(&mut self) {
        self.baud = None;
    }

    /// Baud rate chosen by `begin`, if the port is open.
    pub fn baud(&self) -> Option<u32> {
        self.baud
    }

    pub fn available(&self) -> usize {
        0
    }

    pub fn read(&mut self) -> Option<u8> {
        None
    }

    pub fn print(&mut self, value: impl Display) {
        self.emit(&value.to_string());
    }

    pub fn println(&mut self, value: impl Display) {
        self.print(value);
        self.println_empty();
    }

    pub fn println_empty(&mut self) {
        self.transcript.push_str("\r\n");
        self.device.advance(PRINT_BASE_US);
    }

    pub fn print_radix(&mut self, value: i64, radix: Radix) {
        self.emit(&RadixDisplay(value, radix).to_string());
    }

    pub fn println_radix(&mut self, value: i64, radix: Radix) {
        self.print_radix(value, radix);
        self.println_empty();
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn take_transcript(&mut self) -> String {
        std::mem::take(&mut self.transcript)
    }

    fn emit(&mut self, text: &str) {
        self.transcript.push_str(text);
        let cost = PRINT_BASE_US + PRINT_PER_CHAR_US * text.chars().count() as u64;
        self.device.advance(cost);
    }
}

/// Formats like the Arduino core: negative values in a non-decimal base show
/// their 32-bit two's complement.
struct RadixDisplay(i64, Radix);

impl Display for RadixDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let RadixDisplay(value, radix) = *self;
        let bits = value as u32;
        match radix {
            Radix::Dec => write!(f, "{value}"),
            Radix::Bin => write!(f, "{bits:b}"),
            Radix::Oct => write!(f, "{bits:o}"),
            Radix::Hex => write!(f, "{bits:X}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serial() -> Serial {
        Serial::new(Arc::new(Device::default()))
    }

    #[test]
    fn test_begin_falls_back_to_9600() {
        let mut s = serial();
        assert_eq!(s.baud(), None);
        s.begin(115200);
        assert_eq!(s.baud(), Some(115200));
        s.begin(12345);
        assert_eq!(s.baud(), Some(9600));
        s.end();
        assert_eq!(s.baud(), None);
    }

    #[test]
    fn test_print_costs() {
        let mut s = serial();
        s.print("hi");
        assert_eq!(s.device.elapsed_us(), 28 + 28);
        s.println(42);
        assert_eq!(s.device.elapsed_us(), 56 + 56 + 28);
        assert_eq!(s.transcript(), "hi42\r\n");
    }

    #[test]
    fn test_radix() {
        let mut s = serial();
        s.print_radix(10, Radix::Bin);
        s.print(' ');
        s.print_radix(255, Radix::Hex);
        s.print(' ');
        s.print_radix(8, Radix::Oct);
        s.print(' ');
        s.print_radix(-1, Radix::Hex);
        s.print(' ');
        s.print_radix(-7, Radix::Dec);
        assert_eq!(s.take_transcript(), "1010 FF 10 FFFFFFFF -7");
        assert!(s.transcript().is_empty());
    }

    #[test]
    fn test_nothing_to_read() {
        let mut s = serial();
        s.begin(9600);
        assert_eq!(s.available(), 0);
        assert_eq!(s.read(), None);
    }
}
