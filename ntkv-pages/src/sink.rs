//! Write path: seal pages into a dataset and stamp its metadata.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::debug;

use ntkv_result::{Error, Result};
use ntkv_store::{Container, ObjectStore, Pool};
use ntkv_types::oclass::ObjectClass;

use crate::anchor::DatasetAnchor;
use crate::codec::{BlockCodec, ZstdCodec};
use crate::meta::{ClusterId, ColumnId, PageLocator};
use crate::options::WriteOptions;
use crate::page::{Page, SealedPage};
use crate::strategy::{MetadataKind, METADATA_CLASS};
use crate::uri::DatasetUri;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SinkState {
    Fresh,
    Created,
    Writing,
    Closed,
}

/// Writes one dataset into a container.
///
/// Lifecycle: [`PageSink::create`] opens (or creates) the pool and
/// container and stamps the header; `commit_*` calls write sealed pages,
/// per-cluster-group page lists, and finally [`PageSink::commit_dataset`]
/// stamps the footer and then the anchor. The anchor is the last write; a
/// dataset without it is incomplete by definition.
pub struct PageSink<S: ObjectStore> {
    name: String,
    uri: DatasetUri,
    options: WriteOptions,
    store: Arc<S>,
    codec: Box<dyn BlockCodec>,
    container: Option<Container<S>>,
    anchor: DatasetAnchor,
    /// Monotonic sequence number for payload pages and page lists.
    position: AtomicU64,
    /// Bytes written into the cluster currently being filled.
    bytes_in_cluster: AtomicU64,
    n_committed_clusters: u64,
    state: SinkState,
}

impl<S: ObjectStore> PageSink<S> {
    pub fn new(store: Arc<S>, name: &str, uri: &str, options: WriteOptions) -> Result<Self> {
        let uri = DatasetUri::parse(uri)?;
        Ok(Self {
            name: name.to_string(),
            uri,
            options,
            store,
            codec: Box::new(ZstdCodec),
            container: None,
            anchor: DatasetAnchor::default(),
            position: AtomicU64::new(0),
            bytes_in_cluster: AtomicU64::new(0),
            n_committed_clusters: 0,
            state: SinkState::Fresh,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the cluster that pages are currently being committed into.
    pub fn current_cluster_id(&self) -> ClusterId {
        self.n_committed_clusters
    }

    /// Resolve the object class, open pool and container, and write the
    /// compressed header. The serialized header bytes are opaque to the
    /// sink.
    pub fn create(&mut self, serialized_header: &[u8]) -> Result<()> {
        if self.state != SinkState::Fresh {
            return Err(Error::BadState("create on an already-created sink".to_string()));
        }
        let class_id = self.store.oclass_name2id(&self.options.object_class);
        if class_id == 0 {
            return Err(Error::UnknownObjectClass(self.options.object_class.clone()));
        }

        let pool = Pool::connect(Arc::clone(&self.store), &self.uri.pool)?;
        let container = Container::open(pool, &self.uri.container, true)?;
        container.set_default_object_class(ObjectClass::from_id(class_id));
        self.anchor.object_class = self.options.object_class.clone();
        self.container = Some(container);

        let zipped = self.codec.compress(serialized_header, self.options.compression)?;
        self.write_header(&zipped, serialized_header.len())?;
        self.state = SinkState::Created;
        debug!(dataset = %self.name, pool = %self.uri.pool, container = %self.uri.container,
               "dataset created");
        Ok(())
    }

    /// Compress and frame a page; no I/O.
    pub fn seal_page(&self, page: &Page) -> Result<SealedPage> {
        let buf = self.codec.compress(&page.buf, self.options.compression)?;
        Ok(SealedPage::new(buf, page.n_elements))
    }

    pub fn commit_page(&mut self, column_id: ColumnId, page: &Page) -> Result<PageLocator> {
        let sealed = self.seal_page(page)?;
        self.commit_sealed_page(column_id, &sealed)
    }

    /// Write one sealed page at the key derived for the current cluster,
    /// the column, and a freshly issued sequence number.
    pub fn commit_sealed_page(
        &mut self,
        column_id: ColumnId,
        sealed: &SealedPage,
    ) -> Result<PageLocator> {
        self.enter_writing("commit_sealed_page")?;
        let position = self.position.fetch_add(1, Ordering::Relaxed);
        let key = self
            .options
            .key_mapping
            .payload_key(self.n_committed_clusters, column_id, position);
        let container = self.container()?;
        let rc = container.write_single(&sealed.buf, key.oid, key.dkey, key.akey);
        if rc < 0 {
            return Err(Error::IoWrite { status: rc });
        }
        self.bytes_in_cluster
            .fetch_add(sealed.size() as u64, Ordering::Relaxed);
        Ok(PageLocator {
            position,
            bytes_on_storage: sealed.size() as u32,
        })
    }

    /// Close the cluster currently being filled: returns the exact number
    /// of payload bytes written into it and resets the accumulator. No
    /// I/O of its own.
    pub fn commit_cluster(&mut self, _n_entries: u64) -> Result<u64> {
        self.enter_writing("commit_cluster")?;
        self.n_committed_clusters += 1;
        Ok(self.bytes_in_cluster.swap(0, Ordering::Relaxed))
    }

    /// Compress and write a cluster group's serialized page list at a
    /// freshly issued sequence number.
    pub fn commit_cluster_group(&mut self, serialized_page_list: &[u8]) -> Result<PageLocator> {
        self.enter_writing("commit_cluster_group")?;
        let zipped = self
            .codec
            .compress(serialized_page_list, self.options.compression)?;
        let position = self.position.fetch_add(1, Ordering::Relaxed);
        let key = self.options.key_mapping.page_list_key(position);
        let container = self.container()?;
        let rc = container.write_single_in_class(&zipped, key.oid, key.dkey, key.akey, METADATA_CLASS);
        if rc < 0 {
            return Err(Error::IoWrite { status: rc });
        }
        Ok(PageLocator {
            position,
            bytes_on_storage: zipped.len() as u32,
        })
    }

    /// Compress and write the footer, then the anchor. After this the
    /// dataset is complete and the sink is closed.
    pub fn commit_dataset(&mut self, serialized_footer: &[u8]) -> Result<()> {
        if self.state != SinkState::Writing {
            return Err(Error::BadState(format!(
                "commit_dataset in state {:?}",
                self.state
            )));
        }
        let zipped = self
            .codec
            .compress(serialized_footer, self.options.compression)?;
        self.write_footer(&zipped, serialized_footer.len())?;
        self.write_anchor()?;
        self.state = SinkState::Closed;
        debug!(dataset = %self.name, "dataset committed");
        Ok(())
    }

    fn enter_writing(&mut self, operation: &str) -> Result<()> {
        match self.state {
            SinkState::Created | SinkState::Writing => {
                self.state = SinkState::Writing;
                Ok(())
            }
            state => Err(Error::BadState(format!("{operation} in state {state:?}"))),
        }
    }

    fn container(&self) -> Result<&Container<S>> {
        self.container
            .as_ref()
            .ok_or_else(|| Error::BadState("sink has no container".to_string()))
    }

    fn write_header(&mut self, zipped: &[u8], len: usize) -> Result<()> {
        let key = self.options.key_mapping.metadata_key(MetadataKind::Header);
        let rc = self.container()?.write_single_in_class(
            zipped,
            key.oid,
            key.dkey,
            key.akey,
            METADATA_CLASS,
        );
        if rc < 0 {
            return Err(Error::IoWrite { status: rc });
        }
        self.anchor.n_bytes_header = zipped.len() as u32;
        self.anchor.len_header = len as u32;
        Ok(())
    }

    fn write_footer(&mut self, zipped: &[u8], len: usize) -> Result<()> {
        let key = self.options.key_mapping.metadata_key(MetadataKind::Footer);
        let rc = self.container()?.write_single_in_class(
            zipped,
            key.oid,
            key.dkey,
            key.akey,
            METADATA_CLASS,
        );
        if rc < 0 {
            return Err(Error::IoWrite { status: rc });
        }
        self.anchor.n_bytes_footer = zipped.len() as u32;
        self.anchor.len_footer = len as u32;
        Ok(())
    }

    fn write_anchor(&self) -> Result<()> {
        let bytes = self.anchor.serialize();
        let key = self.options.key_mapping.metadata_key(MetadataKind::Anchor);
        let rc = self.container()?.write_single_in_class(
            &bytes,
            key.oid,
            key.dkey,
            key.akey,
            METADATA_CLASS,
        );
        if rc < 0 {
            return Err(Error::IoWrite { status: rc });
        }
        Ok(())
    }
}
