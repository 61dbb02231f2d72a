//! Host side of the Esplora simulator: built-in sketches, the session loop
//! that drives and stops them, and trace output.

pub mod error;
pub mod scenarios;
pub mod session;
pub mod trace;

pub use error::HarnessError;
pub use session::{ForcedRandom, SessionOptions, SessionReport, run_session};
pub use trace::TraceWriter;
