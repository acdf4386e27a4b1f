//! In-memory object store used for tests and local development.
//!
//! `MemStore` keeps records in nested maps (pool → container → object →
//! dkey → akey → bytes) behind one lock and hands out opaque handle
//! cookies. Submissions execute eagerly; completion of event-attached
//! operations is additionally routed through the event table so the
//! parent/child barrier choreography of the vector engine can be observed
//! exactly as against a real store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use rustc_hash::FxHashMap;

use ntkv_types::errno::{ERR_BUSY, ERR_EXIST, ERR_INVAL, ERR_NONEXIST};
use ntkv_types::ids::OTYPE_MULTI_UINT64;
use ntkv_types::oclass::ObjectClass;
use ntkv_types::{AttributeKey, DistributionKey, ObjectClassId, ObjectId, RawStatus};

use crate::traits::{EventId, FetchUpdateArgs, Handle, IoSpan, ObjectStore};

/// Running operation counters, in the spirit of an instrumented backend.
#[derive(Debug, Default)]
pub struct StoreStats {
    pub init_calls: AtomicU64,
    pub pool_connects: AtomicU64,
    pub cont_opens: AtomicU64,
    pub obj_opens: AtomicU64,
    pub fetches: AtomicU64,
    pub updates: AtomicU64,
    pub eq_creates: AtomicU64,
    pub events_initialized: AtomicU64,
}

impl StoreStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

type Records = FxHashMap<DistributionKey, FxHashMap<AttributeKey, Vec<u8>>>;

#[derive(Default)]
struct ContainerData {
    objects: FxHashMap<ObjectId, Records>,
}

#[derive(Default)]
struct PoolData {
    containers: FxHashMap<String, ContainerData>,
}

enum HandleTarget {
    Pool {
        label: String,
    },
    Container {
        pool: String,
        label: String,
    },
    Object {
        pool: String,
        container: String,
        oid: ObjectId,
    },
    EventQueue,
}

struct EventSlot {
    queue: Handle,
    parent: Option<EventId>,
    children: Vec<EventId>,
    completed: bool,
    barrier_armed: bool,
    error: RawStatus,
}

#[derive(Default)]
struct Inner {
    next_cookie: u64,
    next_event: u64,
    pools: FxHashMap<String, PoolData>,
    handles: FxHashMap<Handle, HandleTarget>,
    events: FxHashMap<EventId, EventSlot>,
    fail_plan: FxHashMap<(DistributionKey, AttributeKey), RawStatus>,
}

impl Inner {
    fn new_cookie(&mut self) -> Handle {
        self.next_cookie += 1;
        self.next_cookie
    }

    fn container_mut(&mut self, pool: &str, container: &str) -> Option<&mut ContainerData> {
        self.pools.get_mut(pool)?.containers.get_mut(container)
    }

    /// Record a completion on `ev`, propagating the first error into a
    /// still-pending parent.
    fn deliver_completion(&mut self, ev: EventId, rc: RawStatus) {
        let parent = match self.events.get_mut(&ev) {
            Some(slot) => {
                slot.completed = true;
                slot.error = rc;
                slot.parent
            }
            None => return,
        };
        if rc < 0 {
            if let Some(pid) = parent {
                if let Some(p) = self.events.get_mut(&pid) {
                    if p.error == 0 {
                        p.error = rc;
                    }
                }
            }
        }
    }

    /// A child that has been finalized counts as complete.
    fn children_done(&self, slot: &EventSlot) -> bool {
        slot.children
            .iter()
            .all(|c| self.events.get(c).map(|s| s.completed).unwrap_or(true))
    }
}

/// In-memory [`ObjectStore`] with live-handle accounting and failure
/// injection for batch-abort tests.
#[derive(Default)]
pub struct MemStore {
    stats: StoreStats,
    inner: RwLock<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Number of events currently registered across all queues.
    pub fn live_events(&self) -> usize {
        self.read().events.len()
    }

    /// Number of open object handles.
    pub fn live_objects(&self) -> usize {
        self.read()
            .handles
            .values()
            .filter(|t| matches!(t, HandleTarget::Object { .. }))
            .count()
    }

    /// Number of open handles of any kind.
    pub fn live_handles(&self) -> usize {
        self.read().handles.len()
    }

    /// Make every operation against `(dkey, akey)` fail with `status`
    /// until cleared.
    pub fn inject_failure(&self, dkey: DistributionKey, akey: AttributeKey, status: RawStatus) {
        self.write().fail_plan.insert((dkey, akey), status);
    }

    pub fn clear_failures(&self) {
        self.write().fail_plan.clear();
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().expect("MemStore lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().expect("MemStore lock poisoned")
    }

    fn run_fetch(
        inner: &mut Inner,
        pool: &str,
        container: &str,
        oid: ObjectId,
        args: &mut FetchUpdateArgs<'_>,
    ) -> RawStatus {
        for iod in &args.iods {
            if let Some(&status) = inner.fail_plan.get(&(args.dkey, iod.akey)) {
                return status;
            }
        }
        let object = match inner
            .pools
            .get(pool)
            .and_then(|p| p.containers.get(container))
            .and_then(|c| c.objects.get(&oid))
        {
            Some(o) => o,
            None => return ERR_INVAL,
        };
        for (iod, span) in args.iods.iter_mut().zip(args.spans.iter_mut()) {
            let record = match object.get(&args.dkey).and_then(|m| m.get(&iod.akey)) {
                Some(r) => r,
                None => return ERR_NONEXIST,
            };
            iod.size = record.len() as u64;
            match span {
                IoSpan::Fetch(buf) => {
                    let n = buf.len().min(record.len());
                    buf[..n].copy_from_slice(&record[..n]);
                }
                IoSpan::Update(_) => return ERR_INVAL,
            }
        }
        0
    }

    fn run_update(
        inner: &mut Inner,
        pool: &str,
        container: &str,
        oid: ObjectId,
        args: &mut FetchUpdateArgs<'_>,
    ) -> RawStatus {
        for iod in &args.iods {
            if let Some(&status) = inner.fail_plan.get(&(args.dkey, iod.akey)) {
                return status;
            }
        }
        // Stage the record bytes first so a bad span leaves nothing behind.
        let mut staged: Vec<(AttributeKey, Vec<u8>)> = Vec::with_capacity(args.iods.len());
        for (iod, span) in args.iods.iter().zip(args.spans.iter()) {
            match span {
                IoSpan::Update(buf) => staged.push((iod.akey, buf.to_vec())),
                IoSpan::Fetch(_) => return ERR_INVAL,
            }
        }
        let dkey = args.dkey;
        let object = match inner
            .container_mut(pool, container)
            .and_then(|c| c.objects.get_mut(&oid))
        {
            Some(o) => o,
            None => return ERR_INVAL,
        };
        let records = object.entry(dkey).or_default();
        for (akey, bytes) in staged {
            records.insert(akey, bytes);
        }
        0
    }

    fn object_target(inner: &Inner, handle: Handle) -> Option<(String, String, ObjectId)> {
        match inner.handles.get(&handle) {
            Some(HandleTarget::Object {
                pool,
                container,
                oid,
            }) => Some((pool.clone(), container.clone(), *oid)),
            _ => None,
        }
    }
}

impl ObjectStore for MemStore {
    fn init(&self) -> RawStatus {
        StoreStats::bump(&self.stats.init_calls);
        0
    }

    fn fini(&self) -> RawStatus {
        0
    }

    fn pool_connect(&self, label: &str) -> Result<Handle, RawStatus> {
        StoreStats::bump(&self.stats.pool_connects);
        let mut inner = self.write();
        inner.pools.entry(label.to_string()).or_default();
        let handle = inner.new_cookie();
        inner.handles.insert(
            handle,
            HandleTarget::Pool {
                label: label.to_string(),
            },
        );
        Ok(handle)
    }

    fn pool_disconnect(&self, pool: Handle) -> RawStatus {
        let mut inner = self.write();
        match inner.handles.remove(&pool) {
            Some(HandleTarget::Pool { .. }) => 0,
            Some(other) => {
                inner.handles.insert(pool, other);
                ERR_INVAL
            }
            None => ERR_NONEXIST,
        }
    }

    fn cont_create(&self, pool: Handle, label: &str) -> RawStatus {
        let mut inner = self.write();
        let pool_label = match inner.handles.get(&pool) {
            Some(HandleTarget::Pool { label }) => label.clone(),
            _ => return ERR_INVAL,
        };
        let pool_data = inner.pools.entry(pool_label).or_default();
        if pool_data.containers.contains_key(label) {
            return ERR_EXIST;
        }
        pool_data
            .containers
            .insert(label.to_string(), ContainerData::default());
        0
    }

    fn cont_open(&self, pool: Handle, label: &str, _read_write: bool) -> Result<Handle, RawStatus> {
        StoreStats::bump(&self.stats.cont_opens);
        let mut inner = self.write();
        let pool_label = match inner.handles.get(&pool) {
            Some(HandleTarget::Pool { label }) => label.clone(),
            _ => return Err(ERR_INVAL),
        };
        let exists = inner
            .pools
            .get(&pool_label)
            .map(|p| p.containers.contains_key(label))
            .unwrap_or(false);
        if !exists {
            return Err(ERR_NONEXIST);
        }
        let handle = inner.new_cookie();
        inner.handles.insert(
            handle,
            HandleTarget::Container {
                pool: pool_label,
                label: label.to_string(),
            },
        );
        Ok(handle)
    }

    fn cont_close(&self, container: Handle) -> RawStatus {
        let mut inner = self.write();
        match inner.handles.remove(&container) {
            Some(HandleTarget::Container { .. }) => 0,
            Some(other) => {
                inner.handles.insert(container, other);
                ERR_INVAL
            }
            None => ERR_NONEXIST,
        }
    }

    fn obj_generate_oid(
        &self,
        container: Handle,
        oid: &mut ObjectId,
        class: ObjectClassId,
    ) -> RawStatus {
        let inner = self.read();
        if !matches!(inner.handles.get(&container), Some(HandleTarget::Container { .. })) {
            return ERR_INVAL;
        }
        if class == 0 {
            return ERR_INVAL;
        }
        oid.embed_reserved(OTYPE_MULTI_UINT64, class);
        0
    }

    fn obj_open(
        &self,
        container: Handle,
        oid: ObjectId,
        _read_write: bool,
    ) -> Result<Handle, RawStatus> {
        StoreStats::bump(&self.stats.obj_opens);
        let mut inner = self.write();
        let (pool, label) = match inner.handles.get(&container) {
            Some(HandleTarget::Container { pool, label }) => (pool.clone(), label.clone()),
            _ => return Err(ERR_INVAL),
        };
        match inner.container_mut(&pool, &label) {
            Some(data) => {
                data.objects.entry(oid).or_default();
            }
            None => return Err(ERR_NONEXIST),
        }
        let handle = inner.new_cookie();
        inner.handles.insert(
            handle,
            HandleTarget::Object {
                pool,
                container: label,
                oid,
            },
        );
        Ok(handle)
    }

    fn obj_close(&self, object: Handle) -> RawStatus {
        let mut inner = self.write();
        match inner.handles.remove(&object) {
            Some(HandleTarget::Object { .. }) => 0,
            Some(other) => {
                inner.handles.insert(object, other);
                ERR_INVAL
            }
            None => ERR_NONEXIST,
        }
    }

    fn obj_fetch(&self, object: Handle, args: &mut FetchUpdateArgs<'_>) -> RawStatus {
        StoreStats::bump(&self.stats.fetches);
        let mut inner = self.write();
        let (pool, container, oid) = match Self::object_target(&inner, object) {
            Some(t) => t,
            None => return ERR_INVAL,
        };
        let rc = Self::run_fetch(&mut inner, &pool, &container, oid, args);
        if let Some(ev) = args.event {
            inner.deliver_completion(ev, rc);
        }
        rc
    }

    fn obj_update(&self, object: Handle, args: &mut FetchUpdateArgs<'_>) -> RawStatus {
        StoreStats::bump(&self.stats.updates);
        let mut inner = self.write();
        let (pool, container, oid) = match Self::object_target(&inner, object) {
            Some(t) => t,
            None => return ERR_INVAL,
        };
        let rc = Self::run_update(&mut inner, &pool, &container, oid, args);
        if let Some(ev) = args.event {
            inner.deliver_completion(ev, rc);
        }
        rc
    }

    fn eq_create(&self) -> Result<Handle, RawStatus> {
        StoreStats::bump(&self.stats.eq_creates);
        let mut inner = self.write();
        let handle = inner.new_cookie();
        inner.handles.insert(handle, HandleTarget::EventQueue);
        Ok(handle)
    }

    fn eq_destroy(&self, queue: Handle) -> RawStatus {
        let mut inner = self.write();
        if !matches!(inner.handles.get(&queue), Some(HandleTarget::EventQueue)) {
            return ERR_NONEXIST;
        }
        if inner.events.values().any(|s| s.queue == queue) {
            return ERR_BUSY;
        }
        inner.handles.remove(&queue);
        0
    }

    fn event_init(&self, queue: Handle, parent: Option<EventId>) -> Result<EventId, RawStatus> {
        StoreStats::bump(&self.stats.events_initialized);
        let mut inner = self.write();
        if !matches!(inner.handles.get(&queue), Some(HandleTarget::EventQueue)) {
            return Err(ERR_INVAL);
        }
        if let Some(pid) = parent {
            if !inner.events.contains_key(&pid) {
                return Err(ERR_NONEXIST);
            }
        }
        inner.next_event += 1;
        let id = inner.next_event;
        inner.events.insert(
            id,
            EventSlot {
                queue,
                parent,
                children: Vec::new(),
                completed: false,
                barrier_armed: false,
                error: 0,
            },
        );
        if let Some(pid) = parent {
            if let Some(p) = inner.events.get_mut(&pid) {
                p.children.push(id);
            }
        }
        Ok(id)
    }

    fn event_fini(&self, event: EventId) -> RawStatus {
        let mut inner = self.write();
        let slot = match inner.events.remove(&event) {
            Some(slot) => slot,
            None => return ERR_NONEXIST,
        };
        if let Some(pid) = slot.parent {
            if let Some(p) = inner.events.get_mut(&pid) {
                p.children.retain(|c| *c != event);
            }
        }
        0
    }

    fn event_parent_barrier(&self, event: EventId) -> RawStatus {
        let mut inner = self.write();
        match inner.events.get_mut(&event) {
            Some(slot) => {
                if slot.children.is_empty() {
                    return ERR_INVAL;
                }
                slot.barrier_armed = true;
                0
            }
            None => ERR_NONEXIST,
        }
    }

    fn event_test(&self, event: EventId) -> Result<bool, RawStatus> {
        let mut inner = self.write();
        let (completed, error) = match inner.events.get(&event) {
            Some(slot) => {
                let done =
                    slot.completed || (slot.barrier_armed && inner.children_done(slot));
                (done, slot.error)
            }
            None => return Err(ERR_NONEXIST),
        };
        if completed {
            if let Some(slot) = inner.events.get_mut(&event) {
                slot.completed = true;
            }
            if error < 0 {
                return Err(error);
            }
            return Ok(true);
        }
        Ok(false)
    }

    fn oclass_name2id(&self, name: &str) -> ObjectClassId {
        ObjectClass::from_name(name).id()
    }

    fn oclass_id2name(&self, id: ObjectClassId) -> Option<String> {
        ObjectClass::from_id(id).name().map(str::to_string)
    }
}
