//! Dataset descriptor model and the wire codecs of the header, footer,
//! and page-list blobs.
//!
//! The descriptor is assembled on attach from three kinds of blobs: the
//! header names the dataset and its columns, the footer lists the cluster
//! groups, and each cluster group's page list carries the per-cluster,
//! per-column page ranges. All layouts are fixed little-endian records,
//! interpreted with the bounds-checked helpers in `wire`.

use rustc_hash::FxHashMap;

use ntkv_result::{Error, Result};

use crate::wire::{get_string, get_u32, get_u64, put_string, put_u32, put_u64};

/// Identifier of a column within a dataset.
pub type ColumnId = u64;

/// Identifier of a cluster within a dataset.
pub type ClusterId = u64;

/// Current wire version of the metadata blobs.
pub const META_VERSION: u32 = 1;

/// Where a written blob landed: the monotonically issued sequence number
/// it was keyed under (an attribute key for metadata blobs) and its size
/// on storage.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PageLocator {
    pub position: u64,
    pub bytes_on_storage: u32,
}

/// One page of a column inside a cluster.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PageInfo {
    /// Number of elements packed into the page.
    pub n_elements: u32,
    /// Uncompressed size in bytes.
    pub len: u32,
    pub locator: PageLocator,
}

/// The dense, ordered pages of one column in one cluster. Page numbers
/// are implicit indexes `[0..N)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageRange {
    pub pages: Vec<PageInfo>,
}

/// Result of a [`PageRange::find`]: the page holding a given element.
#[derive(Copy, Clone, Debug)]
pub struct PageAt<'a> {
    pub page_no: u64,
    pub first_in_page: u64,
    pub info: &'a PageInfo,
}

impl PageRange {
    /// Locate the page containing the element at `index` (relative to the
    /// cluster), by walking the cumulative element counts.
    pub fn find(&self, index: u64) -> Option<PageAt<'_>> {
        let mut first = 0u64;
        for (no, info) in self.pages.iter().enumerate() {
            let next = first + u64::from(info.n_elements);
            if index < next {
                return Some(PageAt {
                    page_no: no as u64,
                    first_in_page: first,
                    info,
                });
            }
            first = next;
        }
        None
    }

    pub fn n_elements(&self) -> u64 {
        self.pages.iter().map(|p| u64::from(p.n_elements)).sum()
    }
}

/// Span of a column's elements within the dataset-global element index.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnRange {
    pub first_element_index: u64,
    pub n_elements: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ColumnEntry {
    range: ColumnRange,
    pages: PageRange,
}

/// Pages and element ranges of every column present in one cluster.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClusterDescriptor {
    pub cluster_id: ClusterId,
    pub first_entry: u64,
    pub n_entries: u64,
    columns: FxHashMap<ColumnId, ColumnEntry>,
}

impl ClusterDescriptor {
    pub fn new(cluster_id: ClusterId, first_entry: u64, n_entries: u64) -> Self {
        Self {
            cluster_id,
            first_entry,
            n_entries,
            columns: FxHashMap::default(),
        }
    }

    pub fn add_column(&mut self, column_id: ColumnId, range: ColumnRange, pages: PageRange) {
        self.columns.insert(column_id, ColumnEntry { range, pages });
    }

    pub fn has_column(&self, column_id: ColumnId) -> bool {
        self.columns.contains_key(&column_id)
    }

    /// Column ids present in this cluster, in ascending order.
    pub fn column_ids(&self) -> Vec<ColumnId> {
        let mut ids: Vec<ColumnId> = self.columns.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn page_range(&self, column_id: ColumnId) -> Result<&PageRange> {
        self.columns
            .get(&column_id)
            .map(|e| &e.pages)
            .ok_or(Error::NotFound)
    }

    pub fn column_range(&self, column_id: ColumnId) -> Result<ColumnRange> {
        self.columns
            .get(&column_id)
            .map(|e| e.range)
            .ok_or(Error::NotFound)
    }
}

/// Footer-resident record of one cluster group: how many clusters it
/// owns and where its page list blob lives.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClusterGroupDescriptor {
    pub group_id: u64,
    pub n_clusters: u32,
    /// Uncompressed size of the page list blob.
    pub page_list_len: u32,
    pub page_list_locator: PageLocator,
}

/// Decoded header blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderInfo {
    pub version: u32,
    pub name: String,
    pub columns: Vec<ColumnId>,
}

/// Decoded footer blob.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FooterInfo {
    pub version: u32,
    pub n_entries: u64,
    pub cluster_groups: Vec<ClusterGroupDescriptor>,
}

/// Address of one element: its cluster and the element index within it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClusterIndex {
    pub cluster_id: ClusterId,
    pub index: u64,
}

/// Fully assembled view of a dataset, built on attach.
#[derive(Clone, Debug)]
pub struct DatasetDescriptor {
    header: HeaderInfo,
    n_entries: u64,
    cluster_groups: Vec<ClusterGroupDescriptor>,
    /// Sorted by first entry index.
    clusters: Vec<ClusterDescriptor>,
    by_id: FxHashMap<ClusterId, usize>,
}

impl DatasetDescriptor {
    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn columns(&self) -> &[ColumnId] {
        &self.header.columns
    }

    pub fn n_entries(&self) -> u64 {
        self.n_entries
    }

    pub fn cluster_groups(&self) -> &[ClusterGroupDescriptor] {
        &self.cluster_groups
    }

    pub fn n_clusters(&self) -> usize {
        self.clusters.len()
    }

    pub fn clusters(&self) -> impl Iterator<Item = &ClusterDescriptor> {
        self.clusters.iter()
    }

    pub fn cluster(&self, cluster_id: ClusterId) -> Result<&ClusterDescriptor> {
        self.by_id
            .get(&cluster_id)
            .map(|&i| &self.clusters[i])
            .ok_or(Error::NotFound)
    }

    /// Find the cluster holding `global_index` of `column_id` and the
    /// element's index within that cluster.
    pub fn find_cluster(&self, column_id: ColumnId, global_index: u64) -> Option<ClusterIndex> {
        for cluster in &self.clusters {
            if let Ok(range) = cluster.column_range(column_id) {
                let end = range.first_element_index + range.n_elements;
                if global_index >= range.first_element_index && global_index < end {
                    return Some(ClusterIndex {
                        cluster_id: cluster.cluster_id,
                        index: global_index - range.first_element_index,
                    });
                }
            }
        }
        None
    }
}

/// Assembles a [`DatasetDescriptor`] from decoded header, footer, and
/// page-list blobs.
#[derive(Default)]
pub struct DescriptorBuilder {
    header: Option<HeaderInfo>,
    footer: Option<FooterInfo>,
    clusters: Vec<ClusterDescriptor>,
}

impl DescriptorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_header(&mut self, header: HeaderInfo) -> &mut Self {
        self.header = Some(header);
        self
    }

    pub fn set_footer(&mut self, footer: FooterInfo) -> &mut Self {
        self.footer = Some(footer);
        self
    }

    pub fn add_clusters(&mut self, clusters: Vec<ClusterDescriptor>) -> &mut Self {
        self.clusters.extend(clusters);
        self
    }

    pub fn build(self) -> Result<DatasetDescriptor> {
        let header = self
            .header
            .ok_or_else(|| Error::Internal("descriptor builder has no header".to_string()))?;
        let footer = self
            .footer
            .ok_or_else(|| Error::Internal("descriptor builder has no footer".to_string()))?;
        let expected: u64 = footer.cluster_groups.iter().map(|g| u64::from(g.n_clusters)).sum();
        if expected != self.clusters.len() as u64 {
            return Err(Error::Internal(format!(
                "cluster groups announce {} clusters, page lists carried {}",
                expected,
                self.clusters.len()
            )));
        }
        let mut clusters = self.clusters;
        clusters.sort_by_key(|c| c.first_entry);
        let mut by_id = FxHashMap::default();
        for (i, cluster) in clusters.iter().enumerate() {
            if by_id.insert(cluster.cluster_id, i).is_some() {
                return Err(Error::Internal(format!(
                    "duplicate cluster id {}",
                    cluster.cluster_id
                )));
            }
        }
        Ok(DatasetDescriptor {
            header,
            n_entries: footer.n_entries,
            cluster_groups: footer.cluster_groups,
            clusters,
            by_id,
        })
    }
}

// --- wire codecs ------------------------------------------------------

pub fn serialize_header(header: &HeaderInfo) -> Vec<u8> {
    let mut buf = Vec::new();
    put_u32(&mut buf, header.version);
    put_string(&mut buf, &header.name);
    put_u32(&mut buf, header.columns.len() as u32);
    for &column in &header.columns {
        put_u64(&mut buf, column);
    }
    buf
}

pub fn deserialize_header(bytes: &[u8]) -> Result<HeaderInfo> {
    let bad = |what: &str| Error::BadHeader(what.to_string());
    let mut o = 0usize;
    let version = get_u32(bytes, &mut o).ok_or_else(|| bad("header truncated"))?;
    let name = get_string(bytes, &mut o).ok_or_else(|| bad("dataset name overruns buffer"))?;
    let n_columns = get_u32(bytes, &mut o).ok_or_else(|| bad("header truncated"))?;
    let mut columns = Vec::new();
    for _ in 0..n_columns {
        columns.push(get_u64(bytes, &mut o).ok_or_else(|| bad("column list truncated"))?);
    }
    Ok(HeaderInfo {
        version,
        name,
        columns,
    })
}

pub fn serialize_footer(footer: &FooterInfo) -> Vec<u8> {
    let mut buf = Vec::new();
    put_u32(&mut buf, footer.version);
    put_u64(&mut buf, footer.n_entries);
    put_u32(&mut buf, footer.cluster_groups.len() as u32);
    for group in &footer.cluster_groups {
        put_u64(&mut buf, group.group_id);
        put_u32(&mut buf, group.n_clusters);
        put_u32(&mut buf, group.page_list_len);
        put_u64(&mut buf, group.page_list_locator.position);
        put_u32(&mut buf, group.page_list_locator.bytes_on_storage);
    }
    buf
}

pub fn deserialize_footer(bytes: &[u8]) -> Result<FooterInfo> {
    let bad = |what: &str| Error::BadFooter(what.to_string());
    let mut o = 0usize;
    let version = get_u32(bytes, &mut o).ok_or_else(|| bad("footer truncated"))?;
    let n_entries = get_u64(bytes, &mut o).ok_or_else(|| bad("footer truncated"))?;
    let n_groups = get_u32(bytes, &mut o).ok_or_else(|| bad("footer truncated"))?;
    let mut cluster_groups = Vec::new();
    for _ in 0..n_groups {
        let group_id = get_u64(bytes, &mut o).ok_or_else(|| bad("cluster group truncated"))?;
        let n_clusters = get_u32(bytes, &mut o).ok_or_else(|| bad("cluster group truncated"))?;
        let page_list_len = get_u32(bytes, &mut o).ok_or_else(|| bad("cluster group truncated"))?;
        let position = get_u64(bytes, &mut o).ok_or_else(|| bad("cluster group truncated"))?;
        let bytes_on_storage =
            get_u32(bytes, &mut o).ok_or_else(|| bad("cluster group truncated"))?;
        cluster_groups.push(ClusterGroupDescriptor {
            group_id,
            n_clusters,
            page_list_len,
            page_list_locator: PageLocator {
                position,
                bytes_on_storage,
            },
        });
    }
    Ok(FooterInfo {
        version,
        n_entries,
        cluster_groups,
    })
}

pub fn serialize_page_list(clusters: &[ClusterDescriptor]) -> Vec<u8> {
    let mut buf = Vec::new();
    put_u32(&mut buf, clusters.len() as u32);
    for cluster in clusters {
        put_u64(&mut buf, cluster.cluster_id);
        put_u64(&mut buf, cluster.first_entry);
        put_u64(&mut buf, cluster.n_entries);
        let column_ids = cluster.column_ids();
        put_u32(&mut buf, column_ids.len() as u32);
        for column_id in column_ids {
            let entry = &cluster.columns[&column_id];
            put_u64(&mut buf, column_id);
            put_u64(&mut buf, entry.range.first_element_index);
            put_u64(&mut buf, entry.range.n_elements);
            put_u32(&mut buf, entry.pages.pages.len() as u32);
            for page in &entry.pages.pages {
                put_u32(&mut buf, page.n_elements);
                put_u32(&mut buf, page.len);
                put_u64(&mut buf, page.locator.position);
                put_u32(&mut buf, page.locator.bytes_on_storage);
            }
        }
    }
    buf
}

pub fn deserialize_page_list(bytes: &[u8]) -> Result<Vec<ClusterDescriptor>> {
    let bad = |what: &str| Error::BadPageList(what.to_string());
    let mut o = 0usize;
    let n_clusters = get_u32(bytes, &mut o).ok_or_else(|| bad("page list truncated"))?;
    let mut clusters = Vec::new();
    for _ in 0..n_clusters {
        let cluster_id = get_u64(bytes, &mut o).ok_or_else(|| bad("cluster record truncated"))?;
        let first_entry = get_u64(bytes, &mut o).ok_or_else(|| bad("cluster record truncated"))?;
        let n_entries = get_u64(bytes, &mut o).ok_or_else(|| bad("cluster record truncated"))?;
        let mut cluster = ClusterDescriptor::new(cluster_id, first_entry, n_entries);
        let n_columns = get_u32(bytes, &mut o).ok_or_else(|| bad("cluster record truncated"))?;
        for _ in 0..n_columns {
            let column_id = get_u64(bytes, &mut o).ok_or_else(|| bad("column record truncated"))?;
            let first_element_index =
                get_u64(bytes, &mut o).ok_or_else(|| bad("column record truncated"))?;
            let n_elements = get_u64(bytes, &mut o).ok_or_else(|| bad("column record truncated"))?;
            let n_pages = get_u32(bytes, &mut o).ok_or_else(|| bad("column record truncated"))?;
            let mut pages = PageRange::default();
            for _ in 0..n_pages {
                let page_elements =
                    get_u32(bytes, &mut o).ok_or_else(|| bad("page record truncated"))?;
                let len = get_u32(bytes, &mut o).ok_or_else(|| bad("page record truncated"))?;
                let position = get_u64(bytes, &mut o).ok_or_else(|| bad("page record truncated"))?;
                let bytes_on_storage =
                    get_u32(bytes, &mut o).ok_or_else(|| bad("page record truncated"))?;
                pages.pages.push(PageInfo {
                    n_elements: page_elements,
                    len,
                    locator: PageLocator {
                        position,
                        bytes_on_storage,
                    },
                });
            }
            cluster.add_column(
                column_id,
                ColumnRange {
                    first_element_index,
                    n_elements,
                },
                pages,
            );
        }
        clusters.push(cluster);
    }
    Ok(clusters)
}
