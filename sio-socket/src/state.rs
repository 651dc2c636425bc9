//! Connection state machine.
//!
//! The state is only ever changed through compare-and-transition, so two
//! racing tasks can never both act on the same transition. `Closed` is
//! terminal.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info};

/// Lifecycle state of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Constructed, `connect` not called yet.
    Idle,
    /// First connection attempt (or its retries) in progress.
    Connecting,
    /// A live connection is being driven.
    Ready,
    /// Connection lost, dialing again.
    Reconnecting,
    /// Shut down for good.
    Closed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::Ready => write!(f, "ready"),
            Self::Reconnecting => write!(f, "reconnecting"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

pub struct StateMachine {
    state: Mutex<ConnectionState>,
    watch: watch::Sender<ConnectionState>,
}

impl StateMachine {
    pub fn new() -> Self {
        let (watch, _) = watch::channel(ConnectionState::Idle);
        Self {
            state: Mutex::new(ConnectionState::Idle),
            watch,
        }
    }

    pub fn current(&self) -> ConnectionState {
        *self.lock()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.watch.subscribe()
    }

    /// Move to `next` only if the state is currently `expected`.
    ///
    /// Returns whether the transition happened. Nothing leaves `Closed`.
    pub fn transition(&self, expected: ConnectionState, next: ConnectionState) -> bool {
        let mut state = self.lock();
        if *state != expected || *state == ConnectionState::Closed {
            debug!("state transition {expected} -> {next} skipped (state is {})", *state);
            return false;
        }
        if expected != next {
            info!("socket state: {expected} -> {next}");
        }
        *state = next;
        self.watch.send_replace(next);
        true
    }

    /// Move to `Closed` from any state.
    ///
    /// Returns `false` if the machine was already closed.
    pub fn close(&self) -> bool {
        let mut state = self.lock();
        if *state == ConnectionState::Closed {
            return false;
        }
        info!("socket state: {} -> {}", *state, ConnectionState::Closed);
        *state = ConnectionState::Closed;
        self.watch.send_replace(ConnectionState::Closed);
        true
    }

    fn lock(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectionState::*;
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_transition_requires_expected_state() {
        let machine = StateMachine::new();
        assert!(!machine.transition(Connecting, Ready));
        assert_eq!(machine.current(), Idle);

        assert!(machine.transition(Idle, Connecting));
        assert!(machine.transition(Connecting, Ready));
        assert!(machine.transition(Ready, Reconnecting));
        assert!(machine.transition(Reconnecting, Reconnecting));
        assert!(machine.transition(Reconnecting, Ready));
        assert_eq!(machine.current(), Ready);
    }

    #[test]
    fn test_closed_is_terminal() {
        let machine = StateMachine::new();
        assert!(machine.close());
        assert!(!machine.close());
        assert!(!machine.transition(Idle, Connecting));
        assert!(!machine.transition(Closed, Idle));
        assert_eq!(machine.current(), Closed);
    }

    #[test]
    fn test_only_one_racer_wins() {
        let machine = Arc::new(StateMachine::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let machine = machine.clone();
                std::thread::spawn(move || machine.transition(Idle, Connecting))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_watchers_see_transitions() {
        let machine = StateMachine::new();
        let mut rx = machine.subscribe();

        machine.transition(Idle, Connecting);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), Connecting);

        machine.close();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), Closed);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(Ready.to_string(), "ready");
        assert_eq!(Reconnecting.to_string(), "reconnecting");
    }
}
