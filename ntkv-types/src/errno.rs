//! Raw status codes of the object-store surface.
//!
//! The store's data plane reports `0` for success and a negative code on
//! failure. The constants below cover the subset of codes the adapter and
//! the in-memory store need to agree on; anything else is passed through
//! verbatim.

/// Native status code returned by store operations. `0` is success, any
/// negative value a store error.
pub type RawStatus = i32;

const ERR_BASE: RawStatus = 1000;

/// Invalid argument (e.g. a fetch submitted with update buffers).
pub const ERR_INVAL: RawStatus = -(ERR_BASE + 3);

/// Entity already exists. Swallowed by callers that create-or-open.
pub const ERR_EXIST: RawStatus = -(ERR_BASE + 4);

/// Entity does not exist (unknown container, missing record).
pub const ERR_NONEXIST: RawStatus = -(ERR_BASE + 5);

/// Resource still in use (e.g. destroying a queue with live events).
pub const ERR_BUSY: RawStatus = -(ERR_BASE + 6);

/// Sentinel record size passed on fetch entry so the store reports the
/// actual stored size back in the record descriptor.
pub const RECORD_SIZE_ANY: u64 = 0;
