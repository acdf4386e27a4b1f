//! Read path: rediscover a dataset from its anchor and load its pages.

use std::sync::{Arc, Mutex, RwLock};

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use ntkv_result::{Error, Result};
use ntkv_store::{Container, ObjectStore, Pool, ReadOp};
use ntkv_types::oclass::ObjectClass;
use ntkv_types::{DistributionKey, ObjectId, StoreKey};

use crate::anchor::DatasetAnchor;
use crate::cluster::{Cluster, ClusterKey, PageKey};
use crate::codec::{BlockCodec, ZstdCodec};
use crate::meta::{
    deserialize_footer, deserialize_header, deserialize_page_list, ClusterGroupDescriptor,
    ClusterIndex, ColumnId, DatasetDescriptor, DescriptorBuilder,
};
use crate::options::{ClusterCache, ReadOptions};
use crate::page::{Page, SealedPage};
use crate::strategy::{MetadataKind, METADATA_CLASS};
use crate::uri::DatasetUri;

/// One page pending inside a cluster load, pointing at its slice of the
/// shared arena.
struct OnDiskPageDesc {
    column_id: ColumnId,
    page_no: u64,
    position: u64,
    size: usize,
    offset: usize,
}

/// Reads one dataset out of a container.
///
/// [`PageSource::attach`] bootstraps from the anchor: it restores the
/// default object class, decompresses header and footer, and folds every
/// cluster group's page list into a [`DatasetDescriptor`]. Pages can then
/// be read individually or cluster-at-a-time, the latter as one batched
/// vector read.
pub struct PageSource<S: ObjectStore> {
    name: String,
    uri: DatasetUri,
    options: ReadOptions,
    store: Arc<S>,
    codec: Box<dyn BlockCodec>,
    container: Container<S>,
    descriptor: RwLock<Option<Arc<DatasetDescriptor>>>,
    current_cluster: Mutex<Option<Arc<Cluster>>>,
}

impl<S: ObjectStore> PageSource<S> {
    /// Connect to the pool and open the container read-only.
    pub fn open(store: Arc<S>, name: &str, uri: &str, options: ReadOptions) -> Result<Self> {
        let uri = DatasetUri::parse(uri)?;
        let pool = Pool::connect(Arc::clone(&store), &uri.pool)?;
        let container = Container::open(pool, &uri.container, false)?;
        Ok(Self {
            name: name.to_string(),
            uri,
            options,
            store,
            codec: Box::new(ZstdCodec),
            container,
            descriptor: RwLock::new(None),
            current_cluster: Mutex::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn container(&self) -> &Container<S> {
        &self.container
    }

    /// The name of the container's current default object class.
    pub fn object_class(&self) -> Result<String> {
        let class = self.container.default_object_class();
        self.store
            .oclass_id2name(class.id())
            .ok_or_else(|| Error::UnknownObjectClass(class.id().to_string()))
    }

    /// Read and deserialize the anchor record.
    pub fn read_anchor(&self) -> Result<DatasetAnchor> {
        let key = self.options.key_mapping.metadata_key(MetadataKind::Anchor);
        let mut buf = vec![0u8; DatasetAnchor::max_size()];
        let rc =
            self.container
                .read_single_in_class(&mut buf, key.oid, key.dkey, key.akey, METADATA_CLASS);
        if rc < 0 {
            return Err(Error::IoRead { status: rc });
        }
        DatasetAnchor::deserialize(&buf)
    }

    /// Read and decompress the header blob described by `anchor`.
    pub fn read_header(&self, anchor: &DatasetAnchor) -> Result<Vec<u8>> {
        let key = self.options.key_mapping.metadata_key(MetadataKind::Header);
        self.read_metadata(key, anchor.n_bytes_header, anchor.len_header)
    }

    /// Read and decompress the footer blob described by `anchor`.
    pub fn read_footer(&self, anchor: &DatasetAnchor) -> Result<Vec<u8>> {
        let key = self.options.key_mapping.metadata_key(MetadataKind::Footer);
        self.read_metadata(key, anchor.n_bytes_footer, anchor.len_footer)
    }

    /// Read and decompress one cluster group's page list blob.
    pub fn read_page_list(&self, group: &ClusterGroupDescriptor) -> Result<Vec<u8>> {
        let key = self
            .options
            .key_mapping
            .page_list_key(group.page_list_locator.position);
        self.read_metadata(key, group.page_list_locator.bytes_on_storage, group.page_list_len)
    }

    /// Bootstrap the dataset descriptor from the anchor.
    pub fn attach(&self) -> Result<Arc<DatasetDescriptor>> {
        let anchor = self.read_anchor()?;
        let class_id = self.store.oclass_name2id(&anchor.object_class);
        if class_id == 0 {
            return Err(Error::UnknownObjectClass(anchor.object_class));
        }
        self.container
            .set_default_object_class(ObjectClass::from_id(class_id));

        let header = deserialize_header(&self.read_header(&anchor)?)?;
        let footer = deserialize_footer(&self.read_footer(&anchor)?)?;

        let mut builder = DescriptorBuilder::new();
        builder.set_header(header);
        for group in &footer.cluster_groups {
            let blob = self.read_page_list(group)?;
            builder.add_clusters(deserialize_page_list(&blob)?);
        }
        builder.set_footer(footer);
        let descriptor = Arc::new(builder.build()?);

        *self
            .descriptor
            .write()
            .expect("PageSource descriptor lock poisoned") = Some(Arc::clone(&descriptor));
        debug!(dataset = %self.name, pool = %self.uri.pool, container = %self.uri.container,
               n_clusters = descriptor.n_clusters(), "dataset attached");
        Ok(descriptor)
    }

    /// The attached descriptor; fails until [`PageSource::attach`] ran.
    pub fn descriptor(&self) -> Result<Arc<DatasetDescriptor>> {
        self.descriptor
            .read()
            .expect("PageSource descriptor lock poisoned")
            .clone()
            .ok_or_else(|| Error::BadState("source is not attached".to_string()))
    }

    /// Size on storage and element count of one page, without reading it.
    pub fn sealed_page_info(&self, column_id: ColumnId, at: ClusterIndex) -> Result<(u32, u32)> {
        let descriptor = self.descriptor()?;
        let cluster = descriptor.cluster(at.cluster_id)?;
        let page = cluster
            .page_range(column_id)?
            .find(at.index)
            .ok_or(Error::NotFound)?;
        Ok((page.info.locator.bytes_on_storage, page.info.n_elements))
    }

    /// Read one sealed page verbatim from storage.
    pub fn load_sealed_page(&self, column_id: ColumnId, at: ClusterIndex) -> Result<SealedPage> {
        let descriptor = self.descriptor()?;
        let cluster = descriptor.cluster(at.cluster_id)?;
        let page = cluster
            .page_range(column_id)?
            .find(at.index)
            .ok_or(Error::NotFound)?;
        let info = *page.info;
        let key = self
            .options
            .key_mapping
            .payload_key(at.cluster_id, column_id, info.locator.position);
        let mut buf = vec![0u8; info.locator.bytes_on_storage as usize];
        let rc = self
            .container
            .read_single(&mut buf, key.oid, key.dkey, key.akey);
        if rc < 0 {
            return Err(Error::IoRead { status: rc });
        }
        Ok(SealedPage::new(buf, info.n_elements))
    }

    /// Load whole clusters, batching all of their pages into one vector
    /// read per cluster.
    pub fn load_clusters(&self, keys: &[ClusterKey]) -> Result<Vec<Cluster>> {
        let descriptor = self.descriptor()?;
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let cluster_desc = descriptor.cluster(key.cluster_id)?;

            // Collect the page metadata and sum up the payload size.
            let mut pages: Vec<OnDiskPageDesc> = Vec::new();
            let mut total = 0usize;
            for &column_id in &key.columns {
                let range = cluster_desc.page_range(column_id)?;
                for (page_no, info) in range.pages.iter().enumerate() {
                    let size = info.locator.bytes_on_storage as usize;
                    pages.push(OnDiskPageDesc {
                        column_id,
                        page_no: page_no as u64,
                        position: info.locator.position,
                        size,
                        offset: total,
                    });
                    total += size;
                }
            }

            let mut arena = vec![0u8; total];
            {
                // Carve the arena into per-page spans and aggregate all
                // akeys sharing `(oid, dkey)` into one operation.
                let mut requests: FxHashMap<(ObjectId, DistributionKey), ReadOp<'_>> =
                    FxHashMap::default();
                let mut rest: &mut [u8] = &mut arena;
                for page in &pages {
                    let (span, tail) = std::mem::take(&mut rest).split_at_mut(page.size);
                    rest = tail;
                    let store_key: StoreKey = self.options.key_mapping.payload_key(
                        key.cluster_id,
                        page.column_id,
                        page.position,
                    );
                    requests
                        .entry((store_key.oid, store_key.dkey))
                        .or_insert_with(|| ReadOp::new(store_key.oid, store_key.dkey))
                        .push(store_key.akey, span);
                }
                let ops: Vec<ReadOp<'_>> = requests.into_values().collect();
                trace!(cluster = key.cluster_id, n_requests = ops.len(), bytes = total,
                       "loading cluster");
                let rc = self.container.read_v(ops);
                if rc < 0 {
                    return Err(Error::IoRead { status: rc });
                }
            }

            let mut page_map = FxHashMap::default();
            for page in &pages {
                page_map.insert(
                    PageKey {
                        column_id: page.column_id,
                        page_no: page.page_no,
                    },
                    (page.offset, page.size),
                );
            }
            let columns: FxHashSet<ColumnId> = key.columns.iter().copied().collect();
            out.push(Cluster::new(key.cluster_id, arena, page_map, columns));
        }
        Ok(out)
    }

    /// Materialize one uncompressed page. With the cluster cache off the
    /// sealed page is read directly; with it on, the page is served from
    /// the most recently loaded cluster, reloading it when needed.
    pub fn populate_page(&self, column_id: ColumnId, at: ClusterIndex) -> Result<Page> {
        let descriptor = self.descriptor()?;
        let cluster_desc = descriptor.cluster(at.cluster_id)?;
        let page = cluster_desc
            .page_range(column_id)?
            .find(at.index)
            .ok_or(Error::NotFound)?;
        let info = *page.info;
        let page_no = page.page_no;

        let sealed: Vec<u8> = match self.options.cluster_cache {
            ClusterCache::Off => {
                let key = self.options.key_mapping.payload_key(
                    at.cluster_id,
                    column_id,
                    info.locator.position,
                );
                let mut buf = vec![0u8; info.locator.bytes_on_storage as usize];
                let rc = self
                    .container
                    .read_single(&mut buf, key.oid, key.dkey, key.akey);
                if rc < 0 {
                    return Err(Error::IoRead { status: rc });
                }
                buf
            }
            ClusterCache::On => {
                let mut current = self
                    .current_cluster
                    .lock()
                    .expect("PageSource cluster lock poisoned");
                let stale = current
                    .as_ref()
                    .map(|c| c.id() != at.cluster_id || !c.has_column(column_id))
                    .unwrap_or(true);
                if stale {
                    let loaded = self
                        .load_clusters(&[ClusterKey {
                            cluster_id: at.cluster_id,
                            columns: cluster_desc.column_ids(),
                        }])?
                        .pop()
                        .ok_or_else(|| Error::Internal("cluster load returned nothing".to_string()))?;
                    *current = Some(Arc::new(loaded));
                }
                let cluster = current
                    .as_ref()
                    .ok_or_else(|| Error::Internal("cluster cache is empty".to_string()))?;
                cluster
                    .on_disk_page(&PageKey { column_id, page_no })
                    .ok_or(Error::NotFound)?
                    .to_vec()
            }
        };

        let buf = self.codec.decompress(&sealed, info.len as usize)?;
        Ok(Page::new(buf, info.n_elements))
    }

    /// Materialize the page holding `global_index` of `column_id`.
    pub fn populate_page_at(&self, column_id: ColumnId, global_index: u64) -> Result<Page> {
        let descriptor = self.descriptor()?;
        let at = descriptor
            .find_cluster(column_id, global_index)
            .ok_or(Error::NotFound)?;
        self.populate_page(column_id, at)
    }

    fn read_metadata(&self, key: StoreKey, n_bytes: u32, len: u32) -> Result<Vec<u8>> {
        let mut zipped = vec![0u8; n_bytes as usize];
        let rc = self.container.read_single_in_class(
            &mut zipped,
            key.oid,
            key.dkey,
            key.akey,
            METADATA_CLASS,
        );
        if rc < 0 {
            return Err(Error::IoRead { status: rc });
        }
        self.codec.decompress(&zipped, len as usize)
    }
}
