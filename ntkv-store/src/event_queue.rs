//! Lifetime manager for the store's completion queue and event handles.

use std::sync::Arc;

use tracing::warn;

use ntkv_result::{Error, Result};
use ntkv_types::RawStatus;

use crate::traits::{EventId, Handle, ObjectStore};

/// Owns one asynchronous completion queue against the store. Events used
/// by concurrent operations are registered here; the queue is destroyed on
/// drop, which requires all children to have been polled or finalized
/// first.
pub struct EventQueue<S: ObjectStore> {
    store: Arc<S>,
    handle: Handle,
}

impl<S: ObjectStore> EventQueue<S> {
    pub(crate) fn new(store: Arc<S>) -> Result<Self> {
        let handle = store
            .eq_create()
            .map_err(|status| Error::IoInit { status })?;
        Ok(Self { store, handle })
    }

    /// Register a fresh event, optionally as a child of `parent`.
    pub fn init_event(&self, parent: Option<EventId>) -> Result<EventId, RawStatus> {
        self.store.event_init(self.handle, parent)
    }

    /// Release an event's registration.
    pub fn finalize_event(&self, event: EventId) -> RawStatus {
        self.store.event_fini(event)
    }

    /// Arm `parent` so it completes when all of its children complete.
    /// Must be called after every child has been initialized and launched;
    /// the parent needs at least one child.
    pub fn launch_parent_barrier(&self, parent: EventId) -> RawStatus {
        self.store.event_parent_barrier(parent)
    }

    /// Block until `event` completes, then finalize it. Returns `0` on
    /// success or the store's negative error.
    pub fn poll_event(&self, event: EventId) -> RawStatus {
        // Spin over the non-blocking test primitive.
        let status = loop {
            match self.store.event_test(event) {
                Ok(true) => break 0,
                Ok(false) => std::hint::spin_loop(),
                Err(status) => break status,
            }
        };
        let fini = self.finalize_event(event);
        if status < 0 {
            status
        } else {
            fini
        }
    }
}

impl<S: ObjectStore> Drop for EventQueue<S> {
    fn drop(&mut self) {
        let rc = self.store.eq_destroy(self.handle);
        if rc < 0 {
            warn!(status = rc, "event queue destroy failed");
        }
    }
}
