//! NTKV: columnar-tuple page storage over an object key-value store.
//!
//! This crate is the single entrypoint for the NTKV workspace. It
//! re-exports the page layer and the object-store adapter from the
//! underlying `ntkv-*` crates so downstream applications see one surface.
//!
//! A dataset lives in one container of a storage pool: a stream of
//! compressed column pages grouped into clusters, page-list blobs per
//! cluster group, a header and footer, and a small fixed-layout anchor at
//! a well-known key. [`PageSink`] writes a dataset (the anchor is always
//! the last write, so observing it means the dataset is complete);
//! [`PageSource`] bootstraps from the anchor and reads pages back, either
//! one at a time or cluster-at-a-time as a single batched vector read.
//!
//! The store itself is behind the [`ObjectStore`] trait. [`MemStore`] is
//! the in-memory implementation used by tests; production deployments
//! plug in a client for their object store of choice. Batched reads and
//! writes run as children of one parent event on the owning pool's
//! [`EventQueue`] and return only once the parent barrier has completed.

pub use ntkv_result::{Error, Result};

pub use ntkv_types::{
    AttributeKey, DistributionKey, ObjectClass, ObjectClassId, ObjectId, RawStatus, StoreKey,
};

pub use ntkv_store::{
    Container, EventQueue, FetchUpdateArgs, MemStore, Object, ObjectStore, Pool, ReadOp, WriteOp,
};

pub use ntkv_pages::{
    BlockCodec, Cluster, ClusterCache, ClusterDescriptor, ClusterGroupDescriptor, ClusterId,
    ClusterIndex, ClusterKey, ColumnId, ColumnRange, DatasetAnchor, DatasetDescriptor, DatasetUri,
    DescriptorBuilder, FooterInfo, HeaderInfo, KeyMapping, MetadataKind, Page, PageInfo, PageKey,
    PageLocator, PageRange, PageSink, PageSource, ReadOptions, SealedPage, WriteOptions, ZstdCodec,
};
