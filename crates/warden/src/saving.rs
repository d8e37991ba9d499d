//! Per-holder save coalescing.
//!
//! At most one save per holder is in flight at any time. A save request
//! made while one is running sets a pending bit instead of spawning a
//! second write; when the running save finishes it re-reads the holder
//! and saves once more. Requests made while a save is pending collapse
//! into that single follow-up write.

use std::collections::HashMap;
use std::sync::Mutex;

use warden_model::UserId;

/// Identity of a saveable holder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SaveKey {
    User(UserId),
    Group(String),
    Track(String),
}

#[derive(Default)]
struct SaveState {
    in_flight: bool,
    pending: bool,
}

/// Tracks in-flight and pending saves per holder.
#[derive(Default)]
pub struct SaveCoalescer {
    states: Mutex<HashMap<SaveKey, SaveState>>,
}

impl SaveCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a save. Returns true when the caller now owns the save
    /// and must run it; false when a running save will pick it up.
    pub fn begin(&self, key: &SaveKey) -> bool {
        let mut states = self.states.lock().unwrap();
        let state = states.entry(key.clone()).or_default();
        if state.in_flight {
            state.pending = true;
            false
        } else {
            state.in_flight = true;
            true
        }
    }

    /// Report a finished save. Returns true when a request arrived in
    /// the meantime and the caller must save again; the caller keeps
    /// ownership in that case.
    pub fn finish(&self, key: &SaveKey) -> bool {
        let mut states = self.states.lock().unwrap();
        let Some(state) = states.get_mut(key) else {
            return false;
        };
        if state.pending {
            state.pending = false;
            true
        } else {
            states.remove(key);
            false
        }
    }

    /// Whether a save for the holder is currently running.
    pub fn is_in_flight(&self, key: &SaveKey) -> bool {
        self.states
            .lock()
            .unwrap()
            .get(key)
            .map(|s| s.in_flight)
            .unwrap_or(false)
    }
}
