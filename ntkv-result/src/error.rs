use std::io;
use thiserror::Error;

/// Unified error type for all NTKV operations.
///
/// The variants mirror the failure planes of the stack: URI and option
/// validation, store control-plane failures (`IoInit`/`IoOpen`/`IoClose`),
/// store data-plane failures carrying the native status code
/// (`IoRead`/`IoWrite`), and deserialization failures for each persisted
/// metadata artifact.
///
/// # Error Handling Strategy
///
/// Errors propagate upward with the `?` operator. The object-store adapter
/// itself reports raw `i32` statuses on its data plane; those are converted
/// into `IoRead { status }` / `IoWrite { status }` where the page layer
/// consumes them, so the native code is never lost.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error from the standard library, e.g. raised by a compression
    /// codec operating over in-memory buffers.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A dataset URI did not match `scheme://pool/container`.
    #[error("invalid dataset URI: {0}")]
    BadUri(String),

    /// The named object class is not recognized by the store.
    #[error("unknown object class: {0}")]
    UnknownObjectClass(String),

    /// The store's global library or its event queue could not be brought
    /// up.
    #[error("store initialization failed (status {status})")]
    IoInit { status: i32 },

    /// A pool, container, or object could not be connected or opened.
    #[error("store open failed (status {status})")]
    IoOpen { status: i32 },

    /// A store handle could not be released cleanly.
    #[error("store close failed (status {status})")]
    IoClose { status: i32 },

    /// A read against the store failed; `status` is the store's native
    /// error code.
    #[error("store read failed (status {status})")]
    IoRead { status: i32 },

    /// A write against the store failed; `status` is the store's native
    /// error code.
    #[error("store write failed (status {status})")]
    IoWrite { status: i32 },

    /// The dataset anchor record could not be deserialized.
    #[error("malformed dataset anchor: {0}")]
    BadAnchor(String),

    /// The dataset header blob could not be deserialized.
    #[error("malformed dataset header: {0}")]
    BadHeader(String),

    /// The dataset footer blob could not be deserialized.
    #[error("malformed dataset footer: {0}")]
    BadFooter(String),

    /// A cluster-group page list blob could not be deserialized.
    #[error("malformed page list: {0}")]
    BadPageList(String),

    /// API misuse: the operation is not allowed in the current lifecycle
    /// state (e.g. committing a page before `create`).
    #[error("operation not allowed in current state: {0}")]
    BadState(String),

    /// A descriptor lookup (cluster, column, or page) found nothing.
    #[error("not found")]
    NotFound,

    /// Internal error indicating a bug or violated invariant.
    #[error("an internal operation failed: {0}")]
    Internal(String),
}
