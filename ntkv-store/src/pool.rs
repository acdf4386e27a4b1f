//! Long-lived connection to a named storage pool.

use std::sync::Arc;

use tracing::{debug, warn};

use ntkv_result::{Error, Result};

use crate::event_queue::EventQueue;
use crate::traits::{Handle, ObjectStore};

/// One connection to a named pool. Owns exactly one [`EventQueue`]; shared
/// between containers by reference counting and disconnected on drop. Only
/// the pool may own its event queue; containers borrow it transiently for
/// batched operations.
pub struct Pool<S: ObjectStore> {
    store: Arc<S>,
    label: String,
    handle: Handle,
    event_queue: EventQueue<S>,
}

impl<S: ObjectStore> Pool<S> {
    /// Connect to the pool with the given label. The store's global
    /// library is initialized on the way in; implementations keep that
    /// idempotent so the first pool of the process pays the cost.
    pub fn connect(store: Arc<S>, label: &str) -> Result<Arc<Self>> {
        let rc = store.init();
        if rc < 0 {
            return Err(Error::IoInit { status: rc });
        }
        let handle = store
            .pool_connect(label)
            .map_err(|status| Error::IoOpen { status })?;
        let event_queue = EventQueue::new(Arc::clone(&store))?;
        debug!(pool = label, "connected to pool");
        Ok(Arc::new(Self {
            store,
            label: label.to_string(),
            handle,
            event_queue,
        }))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn event_queue(&self) -> &EventQueue<S> {
        &self.event_queue
    }

    pub(crate) fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub(crate) fn handle(&self) -> Handle {
        self.handle
    }
}

impl<S: ObjectStore> Drop for Pool<S> {
    fn drop(&mut self) {
        let rc = self.store.pool_disconnect(self.handle);
        if rc < 0 {
            warn!(pool = %self.label, status = rc, "pool disconnect failed");
        }
    }
}
