//! Wallet event registry.

use crate::logging::EVENTS_TARGET;
use parking_lot::Mutex;
use serde_json::Value;
use std::{
    collections::HashMap,
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

/// A registered event callback, invoked with the event arguments.
///
/// Listener identity is the `Arc` allocation: registering a clone of the same `Arc` twice is a
/// no-op.
pub type Listener = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// The events a wallet emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WalletEvent {
    AccountsChanged,
    ChainChanged,
    Connect,
    Disconnect,
    Message,
}

impl WalletEvent {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AccountsChanged => "accountsChanged",
            Self::ChainChanged => "chainChanged",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for WalletEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for WalletEvent {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Mapping of event names to the ordered set of their listeners.
///
/// Names are not validated, anything can be subscribed to and emitted.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
}

impl EventBus {
    /// Registers `listener` for `event`, appended after the existing listeners.
    pub fn on(&self, event: impl AsRef<str>, listener: Listener) {
        let mut listeners = self.listeners.lock();
        let entry = listeners.entry(event.as_ref().to_string()).or_default();
        if !entry.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            entry.push(listener);
        }
    }

    /// Unregisters `listener` for `event`, if it was registered.
    pub fn remove_listener(&self, event: impl AsRef<str>, listener: &Listener) {
        let mut listeners = self.listeners.lock();
        if let Some(entry) = listeners.get_mut(event.as_ref()) {
            entry.retain(|l| !Arc::ptr_eq(l, listener));
            if entry.is_empty() {
                listeners.remove(event.as_ref());
            }
        }
    }

    /// Invokes every listener registered for `event` at the time of the call, in order.
    ///
    /// Listeners run after the registry lock is released, so they may subscribe or unsubscribe
    /// themselves. A panicking listener does not prevent the others from running.
    ///
    /// Returns `true` if the event had listeners.
    pub fn emit(&self, event: impl AsRef<str>, args: &[Value]) -> bool {
        let event = event.as_ref();
        let snapshot = match self.listeners.lock().get(event) {
            Some(listeners) if !listeners.is_empty() => listeners.clone(),
            _ => return false,
        };

        for listener in snapshot {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| listener(args))) {
                let msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!(target: EVENTS_TARGET, %event, %msg, "event listener panicked");
            }
        }
        true
    }

    /// Number of listeners currently registered for `event`.
    pub fn listener_count(&self, event: impl AsRef<str>) -> usize {
        self.listeners.lock().get(event.as_ref()).map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.lock();
        let mut map = f.debug_map();
        for (event, entry) in listeners.iter() {
            map.entry(event, &entry.len());
        }
        map.finish()
    }
}
