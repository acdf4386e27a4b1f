//! Containers: namespaces of objects inside a pool, with single-record
//! and batched vector I/O.

use std::sync::{Arc, RwLock};

use tracing::{debug, trace};

use ntkv_result::{Error, Result};
use ntkv_types::errno::ERR_EXIST;
use ntkv_types::oclass::ObjectClass;
use ntkv_types::{AttributeKey, DistributionKey, ObjectId, RawStatus};

use crate::object::Object;
use crate::pool::Pool;
use crate::traits::{FetchUpdateArgs, Handle, ObjectStore};

/// One read request against an object: a distribution key and the
/// attribute keys to gather, each with its destination buffer. Requests
/// that share `(oid, dkey)` can be coalesced into one op; per-entry result
/// ordering is preserved.
pub struct ReadOp<'a> {
    pub oid: ObjectId,
    pub dkey: DistributionKey,
    pub entries: Vec<(AttributeKey, &'a mut [u8])>,
}

impl<'a> ReadOp<'a> {
    pub fn new(oid: ObjectId, dkey: DistributionKey) -> Self {
        Self {
            oid,
            dkey,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, akey: AttributeKey, buffer: &'a mut [u8]) {
        self.entries.push((akey, buffer));
    }
}

/// One write request against an object; see [`ReadOp`].
pub struct WriteOp<'a> {
    pub oid: ObjectId,
    pub dkey: DistributionKey,
    pub entries: Vec<(AttributeKey, &'a [u8])>,
}

impl<'a> WriteOp<'a> {
    pub fn new(oid: ObjectId, dkey: DistributionKey) -> Self {
        Self {
            oid,
            dkey,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, akey: AttributeKey, buffer: &'a [u8]) {
        self.entries.push((akey, buffer));
    }
}

enum IoDir {
    Fetch,
    Update,
}

/// An opened (or created) container inside a pool. Holds the default
/// object class used for newly generated object ids; shares ownership of
/// its pool, so a container cannot outlive the pool it was opened against.
pub struct Container<S: ObjectStore> {
    pool: Arc<Pool<S>>,
    label: String,
    handle: Handle,
    default_class: RwLock<ObjectClass>,
}

impl<S: ObjectStore> Container<S> {
    /// Open the container with the given label, optionally creating it
    /// first. A create that races an existing container is not an error.
    /// Containers opened without `create` are opened read-only.
    pub fn open(pool: Arc<Pool<S>>, label: &str, create: bool) -> Result<Self> {
        let store = pool.store();
        if create {
            let rc = store.cont_create(pool.handle(), label);
            if rc < 0 && rc != ERR_EXIST {
                return Err(Error::IoOpen { status: rc });
            }
        }
        let handle = store
            .cont_open(pool.handle(), label, create)
            .map_err(|status| Error::IoOpen { status })?;
        debug!(pool = pool.label(), container = label, create, "opened container");
        Ok(Self {
            pool,
            label: label.to_string(),
            handle,
            default_class: RwLock::new(ObjectClass::SX),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn pool(&self) -> &Arc<Pool<S>> {
        &self.pool
    }

    pub(crate) fn handle(&self) -> Handle {
        self.handle
    }

    pub fn default_object_class(&self) -> ObjectClass {
        *self
            .default_class
            .read()
            .expect("Container class lock poisoned")
    }

    pub fn set_default_object_class(&self, class: ObjectClass) {
        *self
            .default_class
            .write()
            .expect("Container class lock poisoned") = class;
    }

    /// Read the record at `(oid, dkey, akey)` into `buffer` using the
    /// default object class. Returns the store's raw status.
    pub fn read_single(
        &self,
        buffer: &mut [u8],
        oid: ObjectId,
        dkey: DistributionKey,
        akey: AttributeKey,
    ) -> RawStatus {
        self.read_single_in_class(buffer, oid, dkey, akey, self.default_object_class())
    }

    pub fn read_single_in_class(
        &self,
        buffer: &mut [u8],
        oid: ObjectId,
        dkey: DistributionKey,
        akey: AttributeKey,
        class: ObjectClass,
    ) -> RawStatus {
        let object = match Object::open(self, oid, class) {
            Ok(object) => object,
            Err(rc) => return rc,
        };
        let mut args = FetchUpdateArgs::fetch(dkey, vec![(akey, buffer)]);
        object.fetch(&mut args)
    }

    /// Write `buffer` to the record at `(oid, dkey, akey)` using the
    /// default object class. Returns the store's raw status.
    pub fn write_single(
        &self,
        buffer: &[u8],
        oid: ObjectId,
        dkey: DistributionKey,
        akey: AttributeKey,
    ) -> RawStatus {
        self.write_single_in_class(buffer, oid, dkey, akey, self.default_object_class())
    }

    pub fn write_single_in_class(
        &self,
        buffer: &[u8],
        oid: ObjectId,
        dkey: DistributionKey,
        akey: AttributeKey,
        class: ObjectClass,
    ) -> RawStatus {
        let object = match Object::open(self, oid, class) {
            Ok(object) => object,
            Err(rc) => return rc,
        };
        let mut args = FetchUpdateArgs::update(dkey, vec![(akey, buffer)]);
        object.update(&mut args)
    }

    /// Perform a vector read: every op executes as a child of one parent
    /// event and the call returns once the parent barrier has completed.
    pub fn read_v(&self, ops: Vec<ReadOp<'_>>) -> RawStatus {
        let items = ops
            .into_iter()
            .map(|op| (op.oid, FetchUpdateArgs::fetch(op.dkey, op.entries)))
            .collect();
        self.vector_io(items, IoDir::Fetch)
    }

    /// Perform a vector write; see [`Container::read_v`].
    pub fn write_v(&self, ops: Vec<WriteOp<'_>>) -> RawStatus {
        let items = ops
            .into_iter()
            .map(|op| (op.oid, FetchUpdateArgs::update(op.dkey, op.entries)))
            .collect();
        self.vector_io(items, IoDir::Update)
    }

    fn vector_io(&self, items: Vec<(ObjectId, FetchUpdateArgs<'_>)>, dir: IoDir) -> RawStatus {
        if items.is_empty() {
            return 0;
        }
        trace!(n_ops = items.len(), "vector I/O");
        let class = self.default_object_class();
        let eq = self.pool.event_queue();
        let parent = match eq.init_event(None) {
            Ok(event) => event,
            Err(rc) => return rc,
        };

        // Every request tuple must stay alive until the parent event has
        // been polled: the store holds the submission's object handle,
        // key copies, and child event until completion.
        let mut requests: Vec<(Object<S>, FetchUpdateArgs<'_>)> = Vec::with_capacity(items.len());
        let mut status: RawStatus = 0;
        for (oid, mut args) in items {
            let object = match Object::open(self, oid, class) {
                Ok(object) => object,
                Err(rc) => {
                    status = rc;
                    break;
                }
            };
            match eq.init_event(Some(parent)) {
                Ok(event) => args.event = Some(event),
                Err(rc) => {
                    status = rc;
                    requests.push((object, args));
                    break;
                }
            }
            let rc = match dir {
                IoDir::Fetch => object.fetch(&mut args),
                IoDir::Update => object.update(&mut args),
            };
            requests.push((object, args));
            if rc < 0 {
                status = rc;
                break;
            }
        }

        let mut parent_polled = false;
        if status == 0 {
            status = eq.launch_parent_barrier(parent);
            if status == 0 {
                status = eq.poll_event(parent);
                parent_polled = true;
            }
        }

        // Release the request tuples in reverse order: finalize each child
        // event, then close the object handle.
        for (object, mut args) in requests.drain(..).rev() {
            if let Some(event) = args.event.take() {
                let _ = eq.finalize_event(event);
            }
            drop(object);
        }
        if !parent_polled {
            let _ = eq.finalize_event(parent);
        }
        status
    }
}

impl<S: ObjectStore> Drop for Container<S> {
    fn drop(&mut self) {
        let _ = self.pool.store().cont_close(self.handle);
    }
}
