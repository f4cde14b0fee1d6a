//! Stabilization gate: decides when a changed spreadsheet has settled.
//!
//! Per watched file, on every poll:
//! 1. a signature different from the last recorded one is recorded and the
//!    stable count resets to 0;
//! 2. an identical signature increments the stable count;
//! 3. a present file whose count equals the window is ready.
//!
//! The count moves by exactly one per observation and any change resets it,
//! so every stable episode passes through the window value exactly once: a
//! file fires at most once per change episode. `Absent` never fires.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::Serialize;

use progwatch_core::ClassCode;

use crate::signature::Signature;

/// Result of feeding one poll's signature through the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub class: ClassCode,
    /// Previously recorded signature, set only when this poll changed it.
    pub previous: Option<Signature>,
    pub current: Signature,
    pub stable_count: u64,
    pub ready: bool,
}

impl Observation {
    pub fn changed(&self) -> bool {
        self.previous.is_some()
    }
}

#[derive(Debug, Clone)]
struct FileState {
    last: Signature,
    stable_count: u64,
}

impl FileState {
    fn new(signature: Signature) -> Self {
        Self {
            last: signature,
            stable_count: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StabilizationGate {
    window: u64,
    states: HashMap<ClassCode, FileState>,
}

impl StabilizationGate {
    pub fn new(window: u32) -> Self {
        Self {
            window: u64::from(window),
            states: HashMap::new(),
        }
    }

    /// Record the initial signature of `class` with a stable count of 0.
    pub fn seed(&mut self, class: ClassCode, signature: Signature) {
        self.states.insert(class, FileState::new(signature));
    }

    /// Feed the signature observed for `class` at this poll.
    ///
    /// A class that was never seeded is seeded by its first observation.
    pub fn observe(&mut self, class: &ClassCode, current: Signature) -> Observation {
        let state = match self.states.entry(class.clone()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                slot.insert(FileState::new(current));
                return Observation {
                    class: class.clone(),
                    previous: None,
                    current,
                    stable_count: 0,
                    ready: false,
                };
            }
        };

        let previous = if current != state.last {
            let previous = state.last;
            state.last = current;
            state.stable_count = 0;
            Some(previous)
        } else {
            state.stable_count = state.stable_count.saturating_add(1);
            None
        };

        let ready = !current.is_absent() && state.stable_count == self.window;

        Observation {
            class: class.clone(),
            previous,
            current,
            stable_count: state.stable_count,
            ready,
        }
    }

    pub fn last_signature(&self, class: &ClassCode) -> Option<Signature> {
        self.states.get(class).map(|s| s.last)
    }

    pub fn stable_count(&self, class: &ClassCode) -> Option<u64> {
        self.states.get(class).map(|s| s.stable_count)
    }
}
