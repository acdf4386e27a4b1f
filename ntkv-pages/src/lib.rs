//! Columnar-tuple page storage over an object key-value store.
//!
//! A dataset is a stream of compressed column pages grouped into clusters,
//! plus a small set of metadata records: a header, a footer, one page-list
//! blob per cluster group, and a fixed-layout [`anchor::DatasetAnchor`] at
//! a well-known key from which a reader rediscovers everything else.
//!
//! The write path is [`sink::PageSink`]: create the container, stamp the
//! header, write each sealed page at the key derived by the configured
//! [`strategy::KeyMapping`], write a page list per cluster group, and stamp
//! footer then anchor on close. The anchor is strictly the last write of a
//! dataset; its presence means the dataset is complete.
//!
//! The read path is [`source::PageSource`]: read the anchor, then header,
//! footer, and page lists into a [`meta::DatasetDescriptor`], then load
//! individual sealed pages or whole clusters. Cluster loads batch every
//! page of the cluster into a single vector read against the store.

pub mod anchor;
pub mod cluster;
pub mod codec;
pub mod meta;
pub mod options;
pub mod page;
pub mod sink;
pub mod source;
pub mod strategy;
pub mod uri;

mod wire;

pub use anchor::DatasetAnchor;
pub use cluster::{Cluster, ClusterKey, PageKey};
pub use codec::{BlockCodec, ZstdCodec};
pub use meta::{
    ClusterDescriptor, ClusterGroupDescriptor, ClusterId, ClusterIndex, ColumnId, ColumnRange,
    DatasetDescriptor, DescriptorBuilder, FooterInfo, HeaderInfo, PageInfo, PageLocator, PageRange,
};
pub use options::{ClusterCache, ReadOptions, WriteOptions};
pub use page::{Page, SealedPage};
pub use sink::PageSink;
pub use source::PageSource;
pub use strategy::{KeyMapping, MetadataKind};
pub use uri::DatasetUri;
