//! Listener registry.
//!
//! Maps event names to callbacks in registration order. Dispatch runs every
//! callback synchronously on the caller's task, so a slow callback holds up
//! the read loop that delivered the event.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{debug, warn};

/// Callback invoked with the event's arguments.
pub type Listener = Arc<dyn Fn(&[Value]) + Send + Sync>;

#[derive(Clone, Default)]
pub struct Emitter {
    listeners: Arc<RwLock<HashMap<String, Vec<Listener>>>>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `listener` to the list for `event`.
    pub fn on<F>(&self, event: &str, listener: F)
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        let mut listeners = match self.listeners.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("listener registry poisoned, recovering");
                poisoned.into_inner()
            }
        };
        listeners
            .entry(event.to_string())
            .or_default()
            .push(Arc::new(listener));
    }

    /// Invoke every listener for `event` in registration order.
    ///
    /// Returns whether any listener was registered. The list is snapshotted
    /// under the read lock, so a callback may itself register listeners.
    pub fn dispatch(&self, event: &str, args: &[Value]) -> bool {
        let snapshot: Option<Vec<Listener>> = {
            let listeners = match self.listeners.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            listeners.get(event).cloned()
        };

        match snapshot {
            Some(listeners) => {
                debug!("dispatching {event} to {} listener(s)", listeners.len());
                for listener in &listeners {
                    listener(args);
                }
                true
            }
            None => false,
        }
    }

    pub fn has_listeners(&self, event: &str) -> bool {
        match self.listeners.read() {
            Ok(guard) => guard.contains_key(event),
            Err(poisoned) => poisoned.into_inner().contains_key(event),
        }
    }

    pub fn listener_count(&self, event: &str) -> usize {
        match self.listeners.read() {
            Ok(guard) => guard.get(event).map_or(0, Vec::len),
            Err(poisoned) => poisoned.into_inner().get(event).map_or(0, Vec::len),
        }
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let events: Vec<String> = match self.listeners.read() {
            Ok(guard) => guard.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        f.debug_struct("Emitter").field("events", &events).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_dispatch_order() {
        let emitter = Emitter::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        for name in ["A", "B", "C"] {
            let calls = calls.clone();
            emitter.on("tick", move |_| calls.lock().unwrap().push(name));
        }

        assert!(emitter.dispatch("tick", &[]));
        assert_eq!(*calls.lock().unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_dispatch_without_listeners() {
        let emitter = Emitter::new();
        assert!(!emitter.dispatch("missing", &[json!(1)]));
        assert!(!emitter.has_listeners("missing"));
    }

    #[test]
    fn test_arguments_are_passed_through() {
        let emitter = Emitter::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        emitter.on("chat", move |args| sink.lock().unwrap().extend_from_slice(args));

        emitter.dispatch("chat", &[json!("hi"), json!({"n": 1})]);
        assert_eq!(*seen.lock().unwrap(), vec![json!("hi"), json!({"n": 1})]);
        assert_eq!(emitter.listener_count("chat"), 1);
    }

    #[test]
    fn test_listener_can_register_during_dispatch() {
        let emitter = Emitter::new();
        let inner = emitter.clone();
        emitter.on("first", move |_| inner.on("second", |_| {}));

        emitter.dispatch("first", &[]);
        assert!(emitter.has_listeners("second"));
    }

    #[test]
    fn test_concurrent_registration() {
        let emitter = Emitter::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let emitter = emitter.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        emitter.on("event", |_| {});
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(emitter.listener_count("event"), 400);
    }
}
