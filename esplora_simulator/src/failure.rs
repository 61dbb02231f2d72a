//! Single-slot failure record the host polls

use std::sync::Mutex;

use crate::lock;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureEvent {
    pub category: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct FailureChannel {
    slot: Mutex<Option<FailureEvent>>,
}

impl FailureChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot. An empty category and message clears it.
    pub fn set(&self, category: impl Into<String>, message: impl Into<String>) {
        let (category, message) = (category.into(), message.into());
        let mut slot = lock(&self.slot);
        if category.is_empty() && message.is_empty() {
            *slot = None;
            return;
        }
        tracing::info!(%category, %message, "failure staged");
        *slot = Some(FailureEvent { category, message });
    }

    pub fn clear(&self) {
        *lock(&self.slot) = None;
    }

    pub fn get(&self) -> Option<FailureEvent> {
        lock(&self.slot).clone()
    }

    pub fn is_present(&self) -> bool {
        lock(&self.slot).is_some()
    }
}
