//! The raw object-store surface and the per-operation request bundle.

use ntkv_types::errno::RECORD_SIZE_ANY;
use ntkv_types::{AttributeKey, DistributionKey, ObjectClassId, ObjectId, RawStatus};

/// Opaque cookie for an open pool, container, object, or event queue.
pub type Handle = u64;

/// Opaque id of an event registered in an event queue.
pub type EventId = u64;

/// One record descriptor: the attribute key addressed by an I/O span and
/// the record size. On fetch entry the size is the "any length" sentinel;
/// the store writes back the actual stored size.
#[derive(Clone, Copy, Debug)]
pub struct RecordDescriptor {
    pub akey: AttributeKey,
    pub size: u64,
}

/// One scatter/gather span. Fetches carry destination buffers, updates
/// carry source buffers; submitting the wrong variant is an invalid
/// argument at the store.
#[derive(Debug)]
pub enum IoSpan<'a> {
    Fetch(&'a mut [u8]),
    Update(&'a [u8]),
}

impl IoSpan<'_> {
    pub fn len(&self) -> usize {
        match self {
            IoSpan::Fetch(b) => b.len(),
            IoSpan::Update(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Request bundle for a single fetch or update against one object.
///
/// The args own local copies of the distribution key and every attribute
/// key so the store can reference them without aliasing caller memory, and
/// they hold the operation's event id when submitted as part of a batch.
/// Whoever owns the args must keep them alive until the store has
/// delivered completion; the vector engine in `container` releases its
/// request tuples only after the parent event has been polled.
#[derive(Debug)]
pub struct FetchUpdateArgs<'a> {
    pub dkey: DistributionKey,
    pub iods: Vec<RecordDescriptor>,
    pub spans: Vec<IoSpan<'a>>,
    pub event: Option<EventId>,
}

impl<'a> FetchUpdateArgs<'a> {
    /// Build args for a fetch. Record sizes start at the any-length
    /// sentinel and are replaced with actual sizes by the store.
    pub fn fetch(dkey: DistributionKey, entries: Vec<(AttributeKey, &'a mut [u8])>) -> Self {
        let mut iods = Vec::with_capacity(entries.len());
        let mut spans = Vec::with_capacity(entries.len());
        for (akey, buf) in entries {
            iods.push(RecordDescriptor {
                akey,
                size: RECORD_SIZE_ANY,
            });
            spans.push(IoSpan::Fetch(buf));
        }
        Self {
            dkey,
            iods,
            spans,
            event: None,
        }
    }

    /// Build args for an update; record sizes are the span lengths.
    pub fn update(dkey: DistributionKey, entries: Vec<(AttributeKey, &'a [u8])>) -> Self {
        let mut iods = Vec::with_capacity(entries.len());
        let mut spans = Vec::with_capacity(entries.len());
        for (akey, buf) in entries {
            iods.push(RecordDescriptor {
                akey,
                size: buf.len() as u64,
            });
            spans.push(IoSpan::Update(buf));
        }
        Self {
            dkey,
            iods,
            spans,
            event: None,
        }
    }
}

/// Primitives the adapter requires from an object store.
///
/// All calls are synchronous from the caller's view. Control-plane calls
/// return a handle or the store's negative status; data-plane calls return
/// the raw status directly. When a [`FetchUpdateArgs`] carries an event,
/// the submission is accepted immediately and completion is additionally
/// delivered through that event, observable via [`ObjectStore::event_test`].
pub trait ObjectStore: Send + Sync + 'static {
    /// Initialize the store library. Idempotent; called on first pool
    /// connection.
    fn init(&self) -> RawStatus;

    /// Finalize the store library.
    fn fini(&self) -> RawStatus;

    fn pool_connect(&self, label: &str) -> Result<Handle, RawStatus>;
    fn pool_disconnect(&self, pool: Handle) -> RawStatus;

    /// Create a container; `ERR_EXIST` when the label is already taken.
    fn cont_create(&self, pool: Handle, label: &str) -> RawStatus;
    fn cont_open(&self, pool: Handle, label: &str, read_write: bool) -> Result<Handle, RawStatus>;
    fn cont_close(&self, container: Handle) -> RawStatus;

    /// Stamp the reserved bits of `oid` for the given class, leaving the
    /// caller-chosen bits untouched.
    fn obj_generate_oid(
        &self,
        container: Handle,
        oid: &mut ObjectId,
        class: ObjectClassId,
    ) -> RawStatus;
    fn obj_open(
        &self,
        container: Handle,
        oid: ObjectId,
        read_write: bool,
    ) -> Result<Handle, RawStatus>;
    fn obj_close(&self, object: Handle) -> RawStatus;

    fn obj_fetch(&self, object: Handle, args: &mut FetchUpdateArgs<'_>) -> RawStatus;
    fn obj_update(&self, object: Handle, args: &mut FetchUpdateArgs<'_>) -> RawStatus;

    fn eq_create(&self) -> Result<Handle, RawStatus>;
    /// Destroy an event queue; `ERR_BUSY` while events are still
    /// registered against it.
    fn eq_destroy(&self, queue: Handle) -> RawStatus;

    /// Register a fresh event, optionally as a child of `parent`.
    fn event_init(&self, queue: Handle, parent: Option<EventId>) -> Result<EventId, RawStatus>;
    fn event_fini(&self, event: EventId) -> RawStatus;
    /// Arm a parent so it completes once all of its children complete.
    /// The parent must have at least one child.
    fn event_parent_barrier(&self, event: EventId) -> RawStatus;
    /// Non-blocking completion probe. `Ok(true)` once the event completed
    /// successfully, `Ok(false)` while still in flight, `Err(status)` when
    /// it completed with the given store error.
    fn event_test(&self, event: EventId) -> Result<bool, RawStatus>;

    /// Name ↔ id resolution for object classes.
    fn oclass_name2id(&self, name: &str) -> ObjectClassId;
    fn oclass_id2name(&self, id: ObjectClassId) -> Option<String>;
}
