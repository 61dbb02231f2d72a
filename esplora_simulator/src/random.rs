//! Host-controlled override for the board's "random" outcomes

use std::sync::Mutex;

use crate::lock;

/// Branch choices the host expects the program to make. Inspection only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceDescriptor {
    pub count: u32,
    pub text: String,
}

#[derive(Debug, Default)]
struct InjectorState {
    enabled: bool,
    forced_value: i64,
    unlimited: bool,
    /// Goes negative once the program draws more values than budgeted.
    remaining_draws: i64,
    choice: Option<ChoiceDescriptor>,
}

#[derive(Debug, Default)]
pub struct RandomInjector {
    state: Mutex<InjectorState>,
}

impl RandomInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force every draw to `value`. A negative `remaining_draws` means no budget.
    pub fn set_forced_value(&self, value: i64, remaining_draws: i64) {
        let mut st = lock(&self.state);
        st.enabled = true;
        st.forced_value = value;
        st.unlimited = remaining_draws < 0;
        st.remaining_draws = remaining_draws.max(0);
        tracing::debug!(value, remaining_draws, "random injection armed");
    }

    /// Stop forcing values; draws go back to the fallback generator.
    pub fn clear(&self) {
        let mut st = lock(&self.state);
        st.enabled = false;
        st.unlimited = false;
        st.remaining_draws = 0;
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.state).enabled
    }

    /// Draws left in the budget, `None` when unlimited or disabled.
    pub fn remaining_draws(&self) -> Option<i64> {
        let st = lock(&self.state);
        (st.enabled && !st.unlimited).then_some(st.remaining_draws)
    }

    /// Produce the next "random" value.
    ///
    /// While injection is enabled the forced value is returned and the budget
    /// decremented, past zero if need be; `fallback` runs only when injection
    /// is off. The lock is released before `fallback` is called.
    pub fn next_draw(&self, fallback: impl FnOnce() -> i64) -> i64 {
        {
            let mut st = lock(&self.state);
            if st.enabled {
                if !st.unlimited {
                    st.remaining_draws -= 1;
                    if st.remaining_draws == -1 {
                        tracing::warn!(
                            forced_value = st.forced_value,
                            "random draw budget exceeded"
                        );
                    }
                }
                return st.forced_value;
            }
        }
        fallback()
    }

    pub fn has_exceeded_budget(&self) -> bool {
        let st = lock(&self.state);
        st.enabled && !st.unlimited && st.remaining_draws < 0
    }

    pub fn set_choice_descriptor(&self, count: u32, text: impl Into<String>) {
        lock(&self.state).choice = Some(ChoiceDescriptor {
            count,
            text: text.into(),
        });
    }

    pub fn clear_choice_descriptor(&self) {
        lock(&self.state).choice = None;
    }

    pub fn choice_descriptor(&self) -> Option<ChoiceDescriptor> {
        lock(&self.state).choice.clone()
    }
}
