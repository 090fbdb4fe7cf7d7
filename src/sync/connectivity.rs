//! Connectivity monitoring seam.

use std::sync::{Arc, Mutex, Weak};

/// Callback invoked with the new online state on every transition.
pub type ConnectivityCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Source of online/offline transitions.
pub trait ConnectivityMonitor: Send + Sync {
    /// The current online state.
    fn fetch_current(&self) -> bool;

    /// Register `callback` for future transitions.
    fn subscribe(&self, callback: ConnectivityCallback) -> Subscription;
}

/// Handle for a registered callback.
///
/// Call [`unsubscribe`](Self::unsubscribe) to stop receiving transitions.
/// Dropping the handle unsubscribes as well.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[derive(Default)]
struct Listeners {
    online: bool,
    next_id: u64,
    callbacks: Vec<(u64, ConnectivityCallback)>,
}

/// A monitor whose state is set explicitly.
///
/// Used by the CLI (state comes from configuration and `--offline`) and by
/// tests that script connectivity transitions.
#[derive(Clone)]
pub struct ManualConnectivity {
    inner: Arc<Mutex<Listeners>>,
}

impl ManualConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Listeners {
                online,
                ..Listeners::default()
            })),
        }
    }

    /// Change the state, notifying subscribers if it actually changed.
    ///
    /// Callbacks run on the caller's thread after the internal lock is
    /// released. Returns whether a transition happened.
    pub fn set_online(&self, online: bool) -> bool {
        let callbacks: Vec<ConnectivityCallback> = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            if inner.online == online {
                return false;
            }
            inner.online = online;
            inner.callbacks.iter().map(|(_, cb)| cb.clone()).collect()
        };

        tracing::info!("Connectivity changed: {}", if online { "online" } else { "offline" });
        for callback in callbacks {
            callback(online);
        }
        true
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .callbacks
            .len()
    }
}

impl ConnectivityMonitor for ManualConnectivity {
    fn fetch_current(&self) -> bool {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).online
    }

    fn subscribe(&self, callback: ConnectivityCallback) -> Subscription {
        let id = {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            let id = inner.next_id;
            inner.next_id += 1;
            inner.callbacks.push((id, callback));
            id
        };

        let weak: Weak<Mutex<Listeners>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut inner = inner.lock().unwrap_or_else(|e| e.into_inner());
                inner.callbacks.retain(|(cid, _)| *cid != id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, ConnectivityCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (
            count,
            Arc::new(move |_online| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn notifies_only_on_transition() {
        let monitor = ManualConnectivity::new(false);
        let (count, callback) = counter();
        let _sub = monitor.subscribe(callback);

        assert!(!monitor.set_online(false));
        assert!(monitor.set_online(true));
        assert!(!monitor.set_online(true));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(monitor.fetch_current());
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let monitor = ManualConnectivity::new(false);
        let (count, callback) = counter();
        let sub = monitor.subscribe(callback);

        sub.unsubscribe();
        monitor.set_online(true);

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(monitor.subscriber_count(), 0);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let monitor = ManualConnectivity::new(true);
        let (_, callback) = counter();
        {
            let _sub = monitor.subscribe(callback);
            assert_eq!(monitor.subscriber_count(), 1);
        }
        assert_eq!(monitor.subscriber_count(), 0);
    }

    #[test]
    fn callback_receives_state() {
        let monitor = ManualConnectivity::new(true);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let _sub = monitor.subscribe(Arc::new(move |online| s.lock().unwrap().push(online)));

        monitor.set_online(false);
        monitor.set_online(true);

        assert_eq!(*seen.lock().unwrap(), vec![false, true]);
    }
}
