//! Error types and result definitions for the NTKV storage stack.
//!
//! NTKV uses a single error enum ([`Error`]) and a shared result alias
//! ([`Result<T>`]) across all of its crates. Operations that could fail
//! return `Result<T>` so that failures propagate naturally with the `?`
//! operator from the object-store adapter up through the page layer.
//!
//! Two failure planes exist side by side:
//!
//! - **Raw store statuses**: the data-plane calls of the object-store
//!   adapter (`fetch`/`update` and the batched vector engine) report the
//!   store's native `i32` status codes directly, `0` for success and a
//!   negative number on failure. Nothing is retried.
//! - **[`Error`]**: everything above the raw data plane. Store statuses are
//!   folded into the `IoRead`/`IoWrite` variants at the page-layer boundary
//!   so callers see one error surface.

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
