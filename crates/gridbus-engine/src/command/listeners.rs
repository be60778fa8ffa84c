use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::CommandInfo;

pub(crate) type Listener = Arc<dyn Fn(&CommandInfo) + Send + Sync>;

#[derive(Default)]
struct Slots {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Execution listeners, in registration order.
///
/// Dispatch walks a snapshot taken at the start of the cycle, so listeners
/// may subscribe or dispose (themselves or others) from inside a callback.
/// A listener added mid-cycle is first called on the next dispatch; one
/// disposed mid-cycle is not called again.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    slots: Arc<Mutex<Slots>>,
}

impl ListenerRegistry {
    pub(crate) fn subscribe(&self, listener: Listener) -> Subscription {
        let mut slots = self.slots.lock();
        let id = slots.next_id;
        slots.next_id += 1;
        slots.listeners.push((id, listener));
        Subscription {
            id,
            slots: Arc::downgrade(&self.slots),
        }
    }

    pub(crate) fn dispatch(&self, info: &CommandInfo) {
        let snapshot: Vec<(u64, Listener)> = self.slots.lock().listeners.clone();
        for (id, listener) in snapshot {
            let live = self.slots.lock().listeners.iter().any(|(l, _)| *l == id);
            if live {
                listener(info);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.lock().listeners.len()
    }
}

/// Handle for a registered listener. Dropping it unregisters the listener.
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    id: u64,
    slots: Weak<Mutex<Slots>>,
}

impl Subscription {
    /// Unregister now. Equivalent to dropping the handle.
    pub fn dispose(self) {}

    pub fn is_active(&self) -> bool {
        self.slots
            .upgrade()
            .is_some_and(|slots| slots.lock().listeners.iter().any(|(l, _)| *l == self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(slots) = self.slots.upgrade() {
            slots.lock().listeners.retain(|(l, _)| *l != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info() -> CommandInfo {
        CommandInfo::mutation("test.mutation", json!({}))
    }

    #[test]
    fn drop_unregisters() {
        let registry = ListenerRegistry::default();
        let sub = registry.subscribe(Arc::new(|_: &CommandInfo| {}));
        assert_eq!(registry.len(), 1);
        assert!(sub.is_active());
        drop(sub);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn listener_can_dispose_itself_during_dispatch() {
        let registry = ListenerRegistry::default();
        let holder: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(Mutex::new(0));

        let h = holder.clone();
        let c = calls.clone();
        let sub = registry.subscribe(Arc::new(move |_: &CommandInfo| {
            *c.lock() += 1;
            h.lock().take();
        }));
        *holder.lock() = Some(sub);

        registry.dispatch(&info());
        registry.dispatch(&info());
        assert_eq!(*calls.lock(), 1);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn disposed_mid_cycle_listener_is_skipped() {
        let registry = ListenerRegistry::default();
        let second: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = second.clone();
        let log = seen.clone();
        let _first = registry.subscribe(Arc::new(move |_: &CommandInfo| {
            log.lock().push("first");
            s.lock().take();
        }));
        let log = seen.clone();
        let sub = registry.subscribe(Arc::new(move |_: &CommandInfo| log.lock().push("second")));
        *second.lock() = Some(sub);

        registry.dispatch(&info());
        assert_eq!(*seen.lock(), vec!["first"]);
    }
}
