use parking_lot::Mutex;
use std::sync::{Arc, Weak};

use crate::error::NumeratorError;
use crate::types::FlagCollection;

/// Called with the freshly published collection after a successful poll.
pub type FlagUpdatedCallback = Arc<dyn Fn(&FlagCollection) + Send + Sync>;

/// Called with the current (unchanged) collection and the poll's error.
pub type FlagUpdatedErrorCallback = Arc<dyn Fn(&FlagCollection, &NumeratorError) + Send + Sync>;

type Slots<F> = Mutex<Vec<Arc<F>>>;

/// Ordered list of callbacks of one kind.
///
/// Notification walks a snapshot of the list, so a listener may unregister
/// itself or others mid-notification without affecting the current round.
pub struct ListenerRegistry<F: ?Sized> {
    slots: Arc<Slots<F>>,
}

impl<F: ?Sized> Default for ListenerRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> ListenerRegistry<F> {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Listeners in registration order.
    pub fn snapshot(&self) -> Vec<Arc<F>> {
        self.slots.lock().clone()
    }
}

impl<F: ?Sized + Send + Sync + 'static> ListenerRegistry<F> {
    /// Appends `listener` and returns the handle that removes it again.
    pub fn register(&self, listener: Arc<F>) -> ListenerHandle {
        self.slots.lock().push(Arc::clone(&listener));

        let slots: Weak<Slots<F>> = Arc::downgrade(&self.slots);
        ListenerHandle {
            unregister: Box::new(move || {
                if let Some(slots) = slots.upgrade() {
                    slots.lock().retain(|l| !same_listener(l, &listener));
                }
            }),
        }
    }
}

/// Removes a registered listener when [`ListenerHandle::unregister`] is called.
///
/// Dropping the handle leaves the listener registered.
pub struct ListenerHandle {
    unregister: Box<dyn FnOnce() + Send + Sync>,
}

impl ListenerHandle {
    pub fn unregister(self) {
        (self.unregister)()
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle").finish_non_exhaustive()
    }
}

// Identity is the allocation, not the vtable.
fn same_listener<F: ?Sized>(a: &Arc<F>, b: &Arc<F>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
