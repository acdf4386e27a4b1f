//! Object-store adapter for NTKV.
//!
//! This crate bridges the page layer to a distributed object store that
//! exposes per-object multi-level keyed records. The raw store surface is
//! the [`ObjectStore`] trait; [`MemStore`] is the in-memory implementation
//! used for tests and local development.
//!
//! On top of the trait sit the handle owners: a [`Pool`] holds one
//! connection to a named storage pool and owns its [`EventQueue`]; a
//! [`Container`] is opened inside a pool and exposes single-record reads
//! and writes plus the batched [`Container::read_v`] / [`Container::write_v`]
//! vector operations, which issue every request as a child of one parent
//! event and block on the parent barrier.
//!
//! The data plane speaks raw store statuses (`0`/negative `i32`); see
//! `ntkv-result` for how those fold into the crate-wide error type.

pub mod container;
pub mod event_queue;
pub mod mem_store;
pub mod object;
pub mod pool;
pub mod traits;

pub use container::{Container, ReadOp, WriteOp};
pub use event_queue::EventQueue;
pub use mem_store::{MemStore, StoreStats};
pub use object::Object;
pub use pool::Pool;
pub use traits::{EventId, FetchUpdateArgs, Handle, IoSpan, ObjectStore, RecordDescriptor};
