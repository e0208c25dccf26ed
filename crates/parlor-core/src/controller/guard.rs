//! Per-resource in-flight guards.
//!
//! The controller runs on a single-threaded, event-driven model: multiple
//! logical flows can be suspended at once, but only one instance of a given
//! operation may be in flight. These guards are small Idle/InFlight state
//! machines with explicit transitions, replacing bare boolean flags so the
//! transitions are testable independent of any UI. They are cooperative:
//! there is no lock, only a refusal to begin a second run.
//!
//! Callers must release the guard on every exit path of the operation.

use parlor_types::error::ControllerError;
use uuid::Uuid;

/// Whether an operation is currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Idle,
    InFlight,
}

/// Guard for an operation with at most one run at a time (send, create,
/// load-messages).
#[derive(Debug)]
pub struct OpGuard {
    name: &'static str,
    state: GuardState,
}

impl OpGuard {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            state: GuardState::Idle,
        }
    }

    /// Transition Idle -> InFlight, or refuse with `Busy` if already running.
    pub fn try_begin(&mut self) -> Result<(), ControllerError> {
        match self.state {
            GuardState::Idle => {
                self.state = GuardState::InFlight;
                Ok(())
            }
            GuardState::InFlight => Err(ControllerError::Busy(self.name)),
        }
    }

    /// Transition back to Idle. Safe to call when already idle.
    pub fn finish(&mut self) {
        self.state = GuardState::Idle;
    }

    pub fn is_in_flight(&self) -> bool {
        self.state == GuardState::InFlight
    }
}

/// Guard for an operation keyed by resource id (delete-session): at most one
/// deletion in flight, remembering which id it is for.
#[derive(Debug)]
pub struct KeyedGuard {
    name: &'static str,
    in_flight: Option<Uuid>,
}

impl KeyedGuard {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            in_flight: None,
        }
    }

    /// Begin an operation for `key`, refusing while any run is in flight.
    pub fn try_begin(&mut self, key: Uuid) -> Result<(), ControllerError> {
        if self.in_flight.is_some() {
            return Err(ControllerError::Busy(self.name));
        }
        self.in_flight = Some(key);
        Ok(())
    }

    pub fn finish(&mut self) {
        self.in_flight = None;
    }

    pub fn in_flight_for(&self) -> Option<Uuid> {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn op_guard_refuses_double_begin() {
        let mut guard = OpGuard::new("send");
        guard.try_begin().unwrap();
        assert!(guard.is_in_flight());

        let err = guard.try_begin().unwrap_err();
        assert!(matches!(err, ControllerError::Busy("send")));

        guard.finish();
        assert!(!guard.is_in_flight());
        guard.try_begin().unwrap();
    }

    #[test]
    fn op_guard_finish_is_idempotent() {
        let mut guard = OpGuard::new("load");
        guard.finish();
        assert!(!guard.is_in_flight());
        guard.try_begin().unwrap();
        guard.finish();
        guard.finish();
        assert!(!guard.is_in_flight());
    }

    #[test]
    fn keyed_guard_tracks_the_key() {
        let mut guard = KeyedGuard::new("delete");
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();

        guard.try_begin(a).unwrap();
        assert_eq!(guard.in_flight_for(), Some(a));

        // A second deletion is refused even for a different id.
        assert!(matches!(
            guard.try_begin(b),
            Err(ControllerError::Busy("delete"))
        ));

        guard.finish();
        assert_eq!(guard.in_flight_for(), None);
        guard.try_begin(b).unwrap();
    }
}
