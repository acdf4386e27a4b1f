//! Per-operation bridge to one opened object.

use std::sync::Arc;

use ntkv_types::ids::OTYPE_MULTI_UINT64;
use ntkv_types::errno::RECORD_SIZE_ANY;
use ntkv_types::oclass::ObjectClass;
use ntkv_types::{ObjectId, RawStatus};

use crate::container::Container;
use crate::traits::{FetchUpdateArgs, Handle, ObjectStore};

/// Move-only owner of an open object handle; the handle is closed on drop.
///
/// Opening with a known class first runs the store's id generator to stamp
/// the reserved bits of the oid. With an unknown class the caller is
/// responsible for the oid being well-formed already.
pub struct Object<S: ObjectStore> {
    store: Arc<S>,
    handle: Handle,
}

impl<S: ObjectStore> Object<S> {
    /// Open `oid` inside `container`. Errors are the store's raw status,
    /// matching the data-plane convention of this layer.
    pub fn open(
        container: &Container<S>,
        mut oid: ObjectId,
        class: ObjectClass,
    ) -> Result<Self, RawStatus> {
        let store = Arc::clone(container.pool().store());
        if !class.is_unknown() {
            let rc = store.obj_generate_oid(container.handle(), &mut oid, class.id());
            if rc < 0 {
                return Err(rc);
            }
        }
        let handle = store.obj_open(container.handle(), oid, true)?;
        Ok(Self { store, handle })
    }

    /// Issue the read described by `args`. Every record descriptor is
    /// reset to the any-length sentinel on entry so the store reports
    /// actual sizes back.
    pub fn fetch(&self, args: &mut FetchUpdateArgs<'_>) -> RawStatus {
        for iod in &mut args.iods {
            iod.size = RECORD_SIZE_ANY;
        }
        self.store.obj_fetch(self.handle, args)
    }

    /// Issue the write described by `args`.
    pub fn update(&self, args: &mut FetchUpdateArgs<'_>) -> RawStatus {
        self.store.obj_update(self.handle, args)
    }

    /// Object type used for every object this layer creates: multi-level
    /// KV with `u64` dkeys and akeys.
    pub const OTYPE: u8 = OTYPE_MULTI_UINT64;
}

impl<S: ObjectStore> Drop for Object<S> {
    fn drop(&mut self) {
        let _ = self.store.obj_close(self.handle);
    }
}
