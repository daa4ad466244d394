//! Observable state container
//!
//! Every store owns one `StateCell`. Mutations go through `update`,
//! which commits under the lock and notifies subscribers with the
//! committed snapshot afterwards, so a listener never observes a torn
//! intermediate state for a single action's commit step.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

type Listener<S> = Arc<dyn Fn(&S) + Send + Sync>;

struct CellInner<S> {
    state: S,
    listeners: HashMap<u64, Listener<S>>,
    next_listener_id: u64,
}

/// Shared state cell with atomic commits and change notification.
pub struct StateCell<S> {
    inner: Arc<Mutex<CellInner<S>>>,
}

impl<S> Clone for StateCell<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Clone> StateCell<S> {
    pub fn new(initial: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CellInner {
                state: initial,
                listeners: HashMap::new(),
                next_listener_id: 0,
            })),
        }
    }

    /// Clone of the committed state.
    pub fn snapshot(&self) -> S {
        self.inner.lock().unwrap().state.clone()
    }

    /// Apply `f` as one atomic commit, then notify subscribers.
    ///
    /// Listeners run outside the lock, so they may call `snapshot` or
    /// `subscribe` without deadlocking.
    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let (result, snapshot, listeners) = {
            let mut inner = self.inner.lock().unwrap();
            let result = f(&mut inner.state);
            let listeners: Vec<Listener<S>> = inner.listeners.values().cloned().collect();
            (result, inner.state.clone(), listeners)
        };
        for listener in listeners {
            listener(&snapshot);
        }
        result
    }

    /// Register a change listener. Dropping the returned guard (or
    /// calling `unsubscribe`) removes it.
    pub fn subscribe(&self, listener: impl Fn(&S) + Send + Sync + 'static) -> Subscription<S> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_listener_id;
        inner.next_listener_id += 1;
        inner.listeners.insert(id, Arc::new(listener));
        Subscription {
            cell: Arc::downgrade(&self.inner),
            id,
        }
    }
}

/// Guard for a registered listener.
pub struct Subscription<S> {
    cell: Weak<Mutex<CellInner<S>>>,
    id: u64,
}

impl<S> Subscription<S> {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl<S> Drop for Subscription<S> {
    fn drop(&mut self) {
        if let Some(inner) = self.cell.upgrade() {
            if let Ok(mut inner) = inner.lock() {
                inner.listeners.remove(&self.id);
            }
        }
    }
}
