//! One-shot shutdown gate.
//!
//! The flag starts `false` and transitions to `true` at most once. Ingress
//! consults [`ShutdownController::is_shutting_down`] before admitting new
//! work; [`ShutdownController::begin`] is the only way to flip it, and
//! reports whether *this* call was the one that flipped it so the caller
//! can run the quiesce protocol exactly once.

use std::sync::Mutex;

pub struct ShutdownController {
    is_shutting_down: Mutex<bool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        Self {
            is_shutting_down: Mutex::new(false),
        }
    }

    /// Snapshot read of the flag.
    #[allow(clippy::unwrap_used)]
    pub fn is_shutting_down(&self) -> bool {
        *self.is_shutting_down.lock().unwrap()
    }

    /// Attempt to transition `false -> true`.
    ///
    /// Returns `true` if this call performed the transition (i.e. the
    /// caller is responsible for running the quiesce protocol), `false` if
    /// shutdown was already underway.
    #[allow(clippy::unwrap_used)]
    pub fn begin(&self) -> bool {
        let mut guard = self.is_shutting_down.lock().unwrap();
        if *guard {
            false
        } else {
            *guard = true;
            true
        }
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
