//! Suspend/shutdown coordination between the simulated program and its host.
//!
//! The simulated thread passes through [`ConcurrencyGate::checkpoint`] on every
//! clock advance; that is the only place it can be parked or told to stop.
//! Code that never advances the clock cannot be suspended or shut down.

use std::sync::{Condvar, Mutex};

use crate::lock;

#[derive(Debug)]
struct GateState {
    suspended: bool,
    shutdown_requested: bool,
    running: bool,
    /// Set once a shutdown is observed; suspension is skipped from then on.
    fast_forward: bool,
    send_updates: bool,
}

impl Default for GateState {
    fn default() -> Self {
        Self {
            suspended: false,
            shutdown_requested: false,
            running: true,
            fast_forward: false,
            send_updates: true,
        }
    }
}

/// What the advancing thread should do after passing the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Keep going; snapshot emission is still on.
    Continue,
    /// Shutdown was just observed: publish the final snapshot.
    FinalSnapshot,
    /// Shut down earlier; nothing more to publish.
    Stopped,
}

#[derive(Debug, Default)]
pub struct ConcurrencyGate {
    state: Mutex<GateState>,
    resumed: Condvar,
}

impl ConcurrencyGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn suspend(&self) {
        lock(&self.state).suspended = true;
        tracing::info!("simulation suspended");
    }

    /// Clear the suspension and wake every parked thread at once.
    pub fn resume(&self) {
        lock(&self.state).suspended = false;
        tracing::info!("simulation resumed");
        self.resumed.notify_all();
    }

    /// Ask the program to stop. Takes effect at the next checkpoint; a thread
    /// already parked there stays parked until `resume`.
    pub fn request_shutdown(&self) {
        lock(&self.state).shutdown_requested = true;
        tracing::info!("shutdown requested");
    }

    pub fn is_suspended(&self) -> bool {
        lock(&self.state).suspended
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).running
    }

    pub fn is_fast_forward(&self) -> bool {
        lock(&self.state).fast_forward
    }

    pub fn updates_enabled(&self) -> bool {
        lock(&self.state).send_updates
    }

    /// Park while suspended, then act on a pending shutdown.
    pub fn checkpoint(&self) -> GateOutcome {
        let mut st = lock(&self.state);
        while st.suspended && !st.fast_forward {
            st = self
                .resumed
                .wait(st)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
        if !st.shutdown_requested {
            return GateOutcome::Continue;
        }
        st.running = false;
        st.fast_forward = true;
        if st.send_updates {
            st.send_updates = false;
            tracing::info!("shutdown observed, fast-forwarding to completion");
            return GateOutcome::FinalSnapshot;
        }
        GateOutcome::Stopped
    }
}
